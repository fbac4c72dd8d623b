//! # Task Queue Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 concurrente con un núcleo de procesamiento de tareas:
//! cola acotada, pool fijo de workers, registro concurrente de tareas,
//! estadísticas y un monitor periódico.
//!
//! ## Arquitectura
//!
//! - `tasks`: núcleo (registro, cola, pool, estadísticas, monitor) y handlers
//! - `http`: parsing y construcción de mensajes HTTP
//! - `router`: enrutamiento por método y path
//! - `server`: servidor TCP, un thread por conexión
//! - `config`, `error`, `logging`: configuración, errores y trazas
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use task_queue_server::config::Config;
//! use task_queue_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("bind");
//! let report = server.run().expect("run");
//! assert!(report.is_clean());
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod tasks;

pub use config::Config;
pub use error::{ConfigError, QueueError, ServerError, SubmitError};
