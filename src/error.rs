//! # Errores del Servidor de Tareas
//! src/error.rs
//!
//! Taxonomía de errores. Las operaciones del núcleo no lanzan pánicos en el
//! camino normal: una búsqueda fallida es `None`, un update sin clave es
//! `false`, y lo demás se reporta con estos tipos.

use thiserror::Error;

/// Errores de la cola de trabajo
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// La cola está llena (solo en el camino no bloqueante)
    #[error("Queue is full (capacity: {capacity})")]
    Full { capacity: usize },

    /// La cola fue cerrada; no se aceptan más elementos
    #[error("Queue is closed")]
    Closed,
}

/// Errores al enviar una tarea al núcleo
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Payload is required")]
    EmptyPayload,

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Errores de validación de configuración
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errores a nivel de proceso
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to install signal handler: {0}")]
    Signal(String),
}
