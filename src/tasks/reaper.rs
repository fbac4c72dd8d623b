//! # Retención de Tareas
//! src/tasks/reaper.rs
//!
//! Hilo de fondo que elimina del registro las tareas DONE cuyo `finished_at`
//! supera la retención configurada. Las estadísticas son acumuladas y no se
//! ven afectadas.

use crate::tasks::registry::Registry;
use crate::tasks::signal::StopSignal;
use crate::tasks::types::{Task, TaskStatus};
use chrono::Utc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuración de la retención
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Cada cuánto se revisa el registro
    pub interval: Duration,

    /// Antigüedad máxima de una tarea DONE
    pub retention: Duration,
}

/// Hilo de retención
pub struct RetentionReaper {
    stop: StopSignal,
    handle: Option<JoinHandle<()>>,
}

impl RetentionReaper {
    pub fn start(config: ReaperConfig, registry: Registry<String, Task>) -> std::io::Result<Self> {
        let stop = StopSignal::new();
        let handle = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("retention-reaper".to_string())
                .spawn(move || {
                    while !stop.wait_timeout(config.interval) {
                        let evicted = evict_finished(&registry, config.retention);
                        if evicted > 0 {
                            info!(evicted, "Evicted finished tasks past retention");
                        }
                    }
                    debug!("Retention reaper stopped");
                })?
        };

        info!(
            interval_ms = config.interval.as_millis() as u64,
            retention_secs = config.retention.as_secs(),
            "Started retention reaper"
        );
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Retention reaper panicked");
            }
        }
    }
}

/// Elimina tareas DONE cuyo `finished_at` sea más viejo que `older_than`
pub fn evict_finished(registry: &Registry<String, Task>, older_than: Duration) -> usize {
    let Ok(max_age) = chrono::Duration::from_std(older_than) else {
        return 0;
    };
    let now = Utc::now();

    registry.retain(|_, task| match (task.status, task.finished_at) {
        (TaskStatus::Done, Some(finished_at)) => now - finished_at < max_age,
        _ => true,
    })
}
