//! # Procesamiento de Tareas
//! src/tasks/processor.rs
//!
//! La rutina que ejecuta un worker por cada tarea. El procesamiento se
//! asume infalible: no hay estado FAILED ni reintentos.

use crate::tasks::types::Task;
use std::thread;
use std::time::Duration;

/// Rutina de procesamiento que corre dentro de un worker
pub trait TaskProcessor: Send + Sync {
    fn process(&self, task: &Task);
}

/// Trabajo simulado: duerme un tiempo proporcional al largo del payload,
/// con un tope máximo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedWork {
    /// Costo por byte del payload
    pub per_byte: Duration,

    /// Tope del tiempo de procesamiento
    pub max: Duration,
}

impl SimulatedWork {
    pub fn new(per_byte: Duration, max: Duration) -> Self {
        Self { per_byte, max }
    }

    /// Duración determinística para un payload
    pub fn duration_for(&self, payload: &str) -> Duration {
        let bytes = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        self.per_byte.saturating_mul(bytes).min(self.max)
    }
}

impl Default for SimulatedWork {
    /// 100ms por byte, máximo 3s
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(3000))
    }
}

impl TaskProcessor for SimulatedWork {
    fn process(&self, task: &Task) {
        thread::sleep(self.duration_for(&task.payload));
    }
}

/// Cualquier closure `Fn(&Task)` sirve como procesador
impl<F> TaskProcessor for F
where
    F: Fn(&Task) + Send + Sync,
{
    fn process(&self, task: &Task) {
        self(task)
    }
}
