//! # Servicio de Tareas
//! src/tasks/service.rs
//!
//! Frontera que usan los handlers HTTP: traduce envíos y consultas a
//! operaciones sobre el registro, la cola y las estadísticas.

use crate::error::SubmitError;
use crate::tasks::id::{IdGenerator, SequentialIds};
use crate::tasks::reaper;
use crate::tasks::queue::WorkQueue;
use crate::tasks::registry::Registry;
use crate::tasks::stats::{Statistics, StatsSnapshot};
use crate::tasks::types::{StatusCounts, Task};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Envío y consulta de tareas
#[derive(Clone)]
pub struct TaskService {
    ids: Arc<dyn IdGenerator>,
    registry: Registry<String, Task>,
    queue: WorkQueue<String>,
    stats: Statistics,
}

impl TaskService {
    /// Crea el servicio con registro, estadísticas y una cola de `capacity`
    pub fn new(capacity: usize) -> Self {
        Self::with_parts(
            Arc::new(SequentialIds::new()),
            Registry::new(),
            WorkQueue::new(capacity),
            Statistics::new(),
        )
    }

    /// Crea el servicio con piezas inyectadas
    pub fn with_parts(
        ids: Arc<dyn IdGenerator>,
        registry: Registry<String, Task>,
        queue: WorkQueue<String>,
        stats: Statistics,
    ) -> Self {
        Self {
            ids,
            registry,
            queue,
            stats,
        }
    }

    /// Registra una tarea PENDING y la encola, bloqueando si la cola está llena
    pub fn submit(&self, payload: &str) -> Result<Task, SubmitError> {
        let task = self.new_task(payload)?;
        self.registry.set(task.id.clone(), task.clone());

        // Se cuenta bajo el lock de la cola, antes de que un worker pueda
        // tomarla: completed <= submitted sin tener que revertir nada
        if let Err(e) = self
            .queue
            .enqueue_with(task.id.clone(), || self.stats.increment_submitted())
        {
            // Solo ocurre si la cola se cerró (apagado)
            self.registry.remove(&task.id);
            debug!(task_id = %task.id, error = %e, "Task rejected");
            return Err(e.into());
        }

        debug!(task_id = %task.id, "Task submitted");
        Ok(task)
    }

    /// Igual que `submit` pero rechaza de inmediato si la cola está llena
    pub fn try_submit(&self, payload: &str) -> Result<Task, SubmitError> {
        let task = self.new_task(payload)?;
        self.registry.set(task.id.clone(), task.clone());

        if let Err(e) = self
            .queue
            .try_enqueue_with(task.id.clone(), || self.stats.increment_submitted())
        {
            self.registry.remove(&task.id);
            debug!(task_id = %task.id, error = %e, "Task rejected");
            return Err(e.into());
        }

        debug!(task_id = %task.id, "Task submitted");
        Ok(task)
    }

    fn new_task(&self, payload: &str) -> Result<Task, SubmitError> {
        if payload.is_empty() {
            return Err(SubmitError::EmptyPayload);
        }
        Ok(Task::new(self.ids.next_id(), payload))
    }

    /// Snapshot de una tarea
    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.registry.get(&id.to_string())
    }

    /// Snapshot de todas las tareas, ordenado por ID
    ///
    /// Efecto lateral: recalcula `in_progress` en las estadísticas.
    pub fn list_tasks(&self) -> Vec<Task> {
        let mut tasks = self.registry.get_all();
        self.refresh_stats(&tasks);
        tasks.sort_by(|a, b| compare_ids(&a.id, &b.id));
        tasks
    }

    /// Contadores actuales, con `in_progress` recalculado
    pub fn get_stats(&self) -> StatsSnapshot {
        let tasks = self.registry.get_all();
        self.refresh_stats(&tasks)
    }

    fn refresh_stats(&self, tasks: &[Task]) -> StatsSnapshot {
        let counts = StatusCounts::tally(tasks);
        self.stats.refresh(counts.in_progress as u64)
    }

    /// Elimina tareas terminadas más viejas que `older_than`
    pub fn evict_finished(&self, older_than: Duration) -> usize {
        reaper::evict_finished(&self.registry, older_than)
    }

    /// Deja de aceptar tareas; los workers drenan lo que quede
    pub fn close_intake(&self) -> bool {
        self.queue.close()
    }

    pub fn registry(&self) -> &Registry<String, Task> {
        &self.registry
    }

    pub fn queue(&self) -> &WorkQueue<String> {
        &self.queue
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }
}

/// Orden numérico para IDs numéricos, lexicográfico para el resto
fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
