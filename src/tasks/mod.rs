//! # Sistema de Tareas
//!
//! Núcleo del servidor: registro, cola acotada, pool de workers,
//! estadísticas y monitor periódico.
//!
//! ```text
//! POST /tasks ──► TaskService ──► Registry (PENDING)
//!                     │
//!                     └──► WorkQueue ──► Worker 0..N ──► IN_PROGRESS ──► DONE
//!                                                         │
//! StatusMonitor ◄── Registry ◄─────────────────────────────┘
//! RetentionReaper ──► Registry (elimina DONE viejas)
//! ```
//!
//! ## Endpoints
//!
//! - `POST /tasks` - Enviar tarea
//! - `GET /tasks` - Listar tareas
//! - `GET /tasks/{id}` - Consultar una tarea
//! - `GET /stats` - Contadores

pub mod handlers;
pub mod id;
pub mod monitor;
pub mod pool;
pub mod processor;
pub mod queue;
pub mod reaper;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod signal;
pub mod stats;
pub mod types;

pub use handlers::{build_router, ApiSettings};
pub use id::{IdGenerator, SequentialIds};
pub use monitor::{MonitorConfig, StatusMonitor};
pub use pool::{PoolConfig, ShutdownReport, WorkerPool};
pub use processor::{SimulatedWork, TaskProcessor};
pub use queue::{Dequeued, WorkQueue};
pub use reaper::{ReaperConfig, RetentionReaper};
pub use registry::Registry;
pub use runtime::{RuntimeSettings, TaskRuntime};
pub use service::TaskService;
pub use signal::{ExitLatch, StopSignal};
pub use stats::{Statistics, StatsSnapshot};
pub use types::{StatusCounts, Task, TaskStatus};
