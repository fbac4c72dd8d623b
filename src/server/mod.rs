//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea requests HTTP
//! 4. Despacha al router de tareas y envía la respuesta
//! 5. Al apagarse, detiene el runtime de tareas en orden

pub mod tcp;

pub use tcp::{Server, ShutdownHandle};
