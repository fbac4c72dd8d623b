//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./task_queue_server --port 8080 \
//!   --workers 3 \
//!   --queue-capacity 100 \
//!   --monitor-interval-ms 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKERS=8 REJECT_WHEN_FULL=true ./task_queue_server
//! ```

use crate::error::ConfigError;
use clap::Parser;
use tracing::info;

/// Configuración del servidor de tareas
#[derive(Debug, Clone, Parser)]
#[command(name = "task_queue_server")]
#[command(about = "Servidor HTTP con cola acotada de tareas y pool de workers")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Workers y cola ===

    /// Número de workers del pool
    #[arg(long, default_value = "3", env = "WORKERS")]
    pub workers: usize,

    /// Capacidad máxima de la cola de trabajo
    #[arg(long = "queue-capacity", default_value = "100", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Cada cuánto un worker ocioso revisa la señal de stop (ms)
    #[arg(long = "worker-poll-ms", default_value = "100", env = "WORKER_POLL_MS")]
    pub worker_poll_ms: u64,

    /// Tiempo máximo de espera al apagar el pool (ms)
    #[arg(long = "shutdown-grace-ms", default_value = "5000", env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,

    // === Trabajo simulado ===

    /// Costo de procesamiento por byte de payload (ms)
    #[arg(long = "work-per-byte-ms", default_value = "100", env = "WORK_PER_BYTE_MS")]
    pub work_per_byte_ms: u64,

    /// Tope del tiempo de procesamiento por tarea (ms)
    #[arg(long = "max-work-ms", default_value = "3000", env = "MAX_WORK_MS")]
    pub max_work_ms: u64,

    // === Monitor ===

    /// Intervalo del monitor de estado (ms)
    #[arg(long = "monitor-interval-ms", default_value = "5000", env = "MONITOR_INTERVAL_MS")]
    pub monitor_interval_ms: u64,

    /// Antigüedad a partir de la cual se eliminan tareas DONE (0 = nunca)
    #[arg(long = "retention-secs", default_value = "3600", env = "RETENTION_SECS")]
    pub retention_secs: u64,

    // === Backpressure ===

    /// Rechazar con 503 cuando la cola está llena en vez de bloquear
    #[arg(long = "reject-when-full", default_value_t = false, env = "REJECT_WHEN_FULL")]
    pub reject_when_full: bool,

    /// Tiempo de reintento sugerido en milisegundos cuando la cola está llena
    #[arg(long = "retry-after-ms", default_value = "5000", env = "RETRY_AFTER_MS")]
    pub retry_after_ms: u64,

    // === Logging ===

    /// Nivel de logging (trace, debug, info, warn, error) o directiva de filtro
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use task_queue_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::invalid("workers", "must be >= 1"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid("queue_capacity", "must be >= 1"));
        }
        if self.monitor_interval_ms == 0 {
            return Err(ConfigError::invalid("monitor_interval_ms", "must be > 0"));
        }
        if self.worker_poll_ms == 0 {
            return Err(ConfigError::invalid("worker_poll_ms", "must be > 0"));
        }
        if self.max_work_ms < self.work_per_byte_ms {
            return Err(ConfigError::invalid(
                "max_work_ms",
                format!(
                    "must be >= work_per_byte_ms ({} < {})",
                    self.max_work_ms, self.work_per_byte_ms
                ),
            ));
        }
        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        info!(address = %self.address(), "Network");
        info!(
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            worker_poll_ms = self.worker_poll_ms,
            shutdown_grace_ms = self.shutdown_grace_ms,
            "Worker pool"
        );
        info!(
            per_byte_ms = self.work_per_byte_ms,
            max_ms = self.max_work_ms,
            "Simulated work"
        );
        info!(
            interval_ms = self.monitor_interval_ms,
            retention_secs = self.retention_secs,
            "Status monitor"
        );
        info!(
            reject_when_full = self.reject_when_full,
            retry_after_ms = self.retry_after_ms,
            "Backpressure"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: 3,
            queue_capacity: 100,
            worker_poll_ms: 100,
            shutdown_grace_ms: 5_000,
            work_per_byte_ms: 100,
            max_work_ms: 3_000,
            monitor_interval_ms: 5_000,
            retention_secs: 3600,
            reject_when_full: false,
            retry_after_ms: 5_000,
            log_level: "info".to_string(),
        }
    }
}
