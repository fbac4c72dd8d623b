//! # Monitor de Estado
//! src/tasks/monitor.rs
//!
//! Hilo de fondo que cada `interval` toma un snapshot del registro, cuenta
//! tareas por estado y lo emite por `tracing`. Solo lectura: la retención de
//! tareas terminadas vive en `reaper`.

use crate::tasks::registry::Registry;
use crate::tasks::signal::StopSignal;
use crate::tasks::types::{StatusCounts, Task};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Configuración del monitor
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Período entre reportes
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Monitor periódico
pub struct StatusMonitor {
    stop: StopSignal,
    handle: Option<JoinHandle<()>>,
    last: Arc<Mutex<Option<StatusCounts>>>,
}

impl StatusMonitor {
    pub fn start(config: MonitorConfig, registry: Registry<String, Task>) -> std::io::Result<Self> {
        let stop = StopSignal::new();
        let last = Arc::new(Mutex::new(None));

        let handle = {
            let stop = stop.clone();
            let last = Arc::clone(&last);
            thread::Builder::new()
                .name("status-monitor".to_string())
                .spawn(move || run(config, &registry, &stop, &last))?
        };

        info!(interval_ms = config.interval.as_millis() as u64, "Started monitoring worker");
        Ok(Self {
            stop,
            handle: Some(handle),
            last,
        })
    }

    /// Último conteo emitido, `None` si aún no hubo ningún tick
    pub fn last_counts(&self) -> Option<StatusCounts> {
        *self.last.lock()
    }

    /// Detiene el timer y espera al hilo
    pub fn stop(mut self) {
        info!("Stopping monitoring worker...");
        self.stop.trigger();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Monitoring worker panicked");
            }
        }
    }
}

fn run(
    config: MonitorConfig,
    registry: &Registry<String, Task>,
    stop: &StopSignal,
    last: &Mutex<Option<StatusCounts>>,
) {
    // `wait_timeout` actúa como ticker interrumpible
    while !stop.wait_timeout(config.interval) {
        let counts = tick(registry);
        *last.lock() = Some(counts);
    }
    info!("Monitoring worker stopped");
}

/// Un reporte: cuenta por estado y lo registra
pub fn tick(registry: &Registry<String, Task>) -> StatusCounts {
    let counts = StatusCounts::tally(&registry.get_all());
    info!(
        pending = counts.pending,
        in_progress = counts.in_progress,
        done = counts.done,
        "Task Status"
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::TaskStatus;
    use chrono::Utc;
    use std::time::Instant;

    fn registry_with(statuses: &[TaskStatus]) -> Registry<String, Task> {
        let registry = Registry::new();
        for (i, status) in statuses.iter().enumerate() {
            let mut task = Task::new(i.to_string(), "p");
            while task.status < *status {
                let next = task.status.next().unwrap();
                task = task.advance(next);
            }
            registry.set(task.id.clone(), task);
        }
        registry
    }

    #[test]
    fn test_tick_counts_by_status() {
        let registry = registry_with(&[
            TaskStatus::Pending,
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Done,
        ]);
        registry.update(&"3".to_string(), |t| {
            let mut old = t.clone();
            old.finished_at = Some(Utc::now() - chrono::Duration::days(30));
            old
        });

        let counts = tick(&registry);
        assert_eq!(
            counts,
            StatusCounts {
                pending: 2,
                in_progress: 1,
                done: 1
            }
        );
        // Solo lectura: ni las tareas DONE viejas se tocan
        assert_eq!(registry.len(), 4);
        assert!(registry.get(&"3".to_string()).is_some());
    }

    #[test]
    fn test_monitor_ticks_and_stops() {
        let registry = registry_with(&[TaskStatus::Pending, TaskStatus::Done]);
        let monitor = StatusMonitor::start(
            MonitorConfig {
                interval: Duration::from_millis(20),
            },
            registry,
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while monitor.last_counts().is_none() {
            assert!(Instant::now() < deadline, "monitor never ticked");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(monitor.last_counts().unwrap().total(), 2);

        let start = Instant::now();
        monitor.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_monitor_stop_is_prompt_with_long_interval() {
        let monitor = StatusMonitor::start(
            MonitorConfig {
                interval: Duration::from_secs(60),
            },
            Registry::new(),
        )
        .unwrap();

        let start = Instant::now();
        monitor.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
