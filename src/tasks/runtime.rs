//! # Runtime de Tareas
//! src/tasks/runtime.rs
//!
//! Construye una sola vez el registro, la cola y las estadísticas del
//! proceso, arranca el pool, el monitor y la retención, y los apaga en orden.

use crate::config::Config;
use crate::tasks::monitor::{MonitorConfig, StatusMonitor};
use crate::tasks::pool::{PoolConfig, ShutdownReport, WorkerPool};
use crate::tasks::processor::{SimulatedWork, TaskProcessor};
use crate::tasks::reaper::{ReaperConfig, RetentionReaper};
use crate::tasks::service::TaskService;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Parámetros del runtime
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    pub queue_capacity: usize,
    pub pool: PoolConfig,
    pub monitor: MonitorConfig,
    /// Antigüedad máxima de las tareas DONE (`None` = conservarlas siempre)
    pub retention: Option<Duration>,
    pub shutdown_grace: Duration,
    pub work: SimulatedWork,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            pool: PoolConfig::default(),
            monitor: MonitorConfig::default(),
            retention: Some(Duration::from_secs(3600)),
            shutdown_grace: Duration::from_secs(5),
            work: SimulatedWork::default(),
        }
    }
}

impl RuntimeSettings {
    /// Crea los parámetros desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        let retention = match config.retention_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            queue_capacity: config.queue_capacity,
            pool: PoolConfig {
                workers: config.workers,
                poll_interval: Duration::from_millis(config.worker_poll_ms),
            },
            monitor: MonitorConfig {
                interval: Duration::from_millis(config.monitor_interval_ms),
            },
            retention,
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
            work: SimulatedWork::new(
                Duration::from_millis(config.work_per_byte_ms),
                Duration::from_millis(config.max_work_ms),
            ),
        }
    }
}

/// Núcleo en ejecución: servicio + pool + monitor + retención
pub struct TaskRuntime {
    service: TaskService,
    pool: WorkerPool,
    monitor: StatusMonitor,
    reaper: Option<RetentionReaper>,
    shutdown_grace: Duration,
}

impl TaskRuntime {
    /// Arranca con el procesador simulado
    pub fn start(settings: RuntimeSettings) -> std::io::Result<Self> {
        let processor: Arc<dyn TaskProcessor> = Arc::new(settings.work);
        Self::start_with_processor(settings, processor)
    }

    /// Arranca con un procesador propio
    pub fn start_with_processor(
        settings: RuntimeSettings,
        processor: Arc<dyn TaskProcessor>,
    ) -> std::io::Result<Self> {
        let service = TaskService::new(settings.queue_capacity);

        let pool = WorkerPool::start(
            settings.pool,
            service.queue().clone(),
            service.registry().clone(),
            service.stats().clone(),
            processor,
        )?;

        let monitor = match StatusMonitor::start(settings.monitor, service.registry().clone()) {
            Ok(monitor) => monitor,
            Err(e) => {
                pool.stop(settings.shutdown_grace);
                return Err(e);
            }
        };

        let reaper = match settings.retention {
            Some(retention) => {
                let config = ReaperConfig {
                    interval: settings.monitor.interval,
                    retention,
                };
                match RetentionReaper::start(config, service.registry().clone()) {
                    Ok(reaper) => Some(reaper),
                    Err(e) => {
                        pool.stop(settings.shutdown_grace);
                        monitor.stop();
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        Ok(Self {
            service,
            pool,
            monitor,
            reaper,
            shutdown_grace: settings.shutdown_grace,
        })
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn monitor(&self) -> &StatusMonitor {
        &self.monitor
    }

    /// Apaga en orden: cerrar la cola, parar workers, parar monitor y retención
    pub fn shutdown(self) -> ShutdownReport {
        info!("Shutting down task runtime...");
        self.service.close_intake();
        let report = self.pool.stop(self.shutdown_grace);
        self.monitor.stop();
        if let Some(reaper) = self.reaper {
            reaper.stop();
        }
        info!(
            exited = report.exited,
            still_running = report.still_running,
            "Task runtime stopped"
        );
        report
    }
}
