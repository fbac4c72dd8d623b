//! # Estadísticas Agregadas
//! src/tasks/stats.rs
//!
//! Contadores compartidos: enviadas, completadas y en progreso. `in_progress`
//! no se lleva incrementalmente; se recalcula desde un snapshot del registro
//! y se sobrescribe.
//!
//! `submitted` solo crece: se incrementa una vez que la tarea entra en la
//! cola (ver `WorkQueue::enqueue_with`), nunca se revierte.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Copia consistente de los tres contadores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    pub in_progress: u64,
}

/// Contadores protegidos por un RwLock
#[derive(Clone, Default)]
pub struct Statistics {
    inner: Arc<RwLock<StatsSnapshot>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_submitted(&self) {
        self.inner.write().submitted += 1;
    }

    pub fn increment_completed(&self) {
        self.inner.write().completed += 1;
    }

    /// Sobrescribe el conteo en progreso
    pub fn set_in_progress(&self, count: u64) {
        self.inner.write().in_progress = count;
    }

    /// Lectura consistente de los tres contadores
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.read()
    }

    /// Sobrescribe `in_progress` y lee los tres contadores en una sola operación
    pub fn refresh(&self, in_progress: u64) -> StatsSnapshot {
        let mut inner = self.inner.write();
        inner.in_progress = in_progress;
        *inner
    }
}
