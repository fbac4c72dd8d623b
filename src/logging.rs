//! # Logging Estructurado
//! src/logging.rs
//!
//! Inicializa `tracing` con salida a consola. `RUST_LOG` tiene prioridad
//! sobre el nivel configurado por CLI.

use tracing_subscriber::{fmt, EnvFilter};

/// Inicializa el subscriber global
///
/// Es seguro llamarla varias veces (p.ej. desde tests): si ya existe un
/// subscriber global, se conserva el existente.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .try_init();

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized - keeping existing one");
    }
}
