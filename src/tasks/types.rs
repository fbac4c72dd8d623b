//! # Tipos del Sistema de Tareas
//! src/tasks/types.rs
//!
//! Define la tarea, su estado y el conteo por estado que usan el monitor y
//! las estadísticas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de una tarea
///
/// El único recorrido válido es `Pending -> InProgress -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Registrada y en cola, ningún worker la ha tomado
    Pending,

    /// Un worker la está procesando
    InProgress,

    /// Procesamiento terminado
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Siguiente estado permitido, `None` si el estado es terminal
    pub fn next(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Pending => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Done),
            TaskStatus::Done => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Una unidad de trabajo enviada por un cliente
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// ID único, emitido en orden creciente
    pub id: String,

    /// Contenido opaco enviado por el cliente
    pub payload: String,

    /// Estado actual
    pub status: TaskStatus,

    /// Momento de creación (inmutable)
    pub created_at: DateTime<Utc>,

    /// Momento en que un worker la tomó
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Momento en que terminó su procesamiento
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Crea una tarea nueva en estado `Pending`
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Avanza al estado `to` si es el sucesor inmediato del actual
    ///
    /// Devuelve la tarea sin cambios si la transición no es válida, así una
    /// tarea nunca retrocede ni se salta `InProgress`.
    pub fn advance(&self, to: TaskStatus) -> Task {
        let mut next = self.clone();
        if self.status.next() != Some(to) {
            return next;
        }

        let now = Utc::now();
        next.status = to;
        match to {
            TaskStatus::InProgress => next.started_at = Some(now),
            TaskStatus::Done => next.finished_at = Some(now),
            TaskStatus::Pending => {}
        }
        next
    }
}

/// Cantidad de tareas por estado en un momento dado
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    /// Cuenta las tareas de un snapshot
    pub fn tally<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut counts = StatusCounts::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.done
    }
}
