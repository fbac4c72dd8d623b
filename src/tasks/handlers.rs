//! # Handlers HTTP para Tareas
//! src/tasks/handlers.rs
//!
//! Implementa los endpoints de la API:
//! - `POST /tasks`
//! - `GET /tasks`
//! - `GET /tasks/{id}`
//! - `GET /stats`

use crate::config::Config;
use crate::error::{QueueError, SubmitError};
use crate::http::{Method, Request, Response, StatusCode};
use crate::router::Router;
use crate::tasks::service::TaskService;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Body esperado en `POST /tasks`
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub payload: String,
}

/// Comportamiento de la API ante una cola llena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// `true`: rechazar con 503; `false`: bloquear hasta que haya lugar
    pub reject_when_full: bool,
    /// Valor del header `Retry-After` en los 503
    pub retry_after: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            reject_when_full: false,
            retry_after: Duration::from_secs(5),
        }
    }
}

impl ApiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reject_when_full: config.reject_when_full,
            retry_after: Duration::from_millis(config.retry_after_ms),
        }
    }

    /// Segundos para `Retry-After`, redondeando hacia arriba
    fn retry_after_secs(&self) -> u64 {
        let millis = self.retry_after.as_millis() as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Handler para `POST /tasks`
///
/// # Ejemplo de response
/// ```json
/// {"id": "1", "status": "PENDING", "message": "Task created successfully"}
/// ```
pub fn create_task_handler(req: &Request, service: &TaskService, settings: &ApiSettings) -> Response {
    // `null` es JSON válido: cae en la validación de payload vacío
    let body = match serde_json::from_slice::<Option<CreateTaskRequest>>(req.body()) {
        Ok(body) => body.unwrap_or_default(),
        Err(_) => return Response::error(StatusCode::BadRequest, "Invalid JSON"),
    };

    let result = if settings.reject_when_full {
        service.try_submit(&body.payload)
    } else {
        service.submit(&body.payload)
    };

    match result {
        Ok(task) => Response::json(
            StatusCode::Created,
            &json!({
                "id": task.id,
                "status": task.status,
                "message": "Task created successfully",
            }),
        ),
        Err(SubmitError::EmptyPayload) => {
            Response::error(StatusCode::BadRequest, "Payload is required")
        }
        Err(SubmitError::Queue(e @ QueueError::Full { .. })) => {
            warn!(error = %e, "Rejecting task");
            Response::error(StatusCode::ServiceUnavailable, &e.to_string())
                .with_header("Retry-After", &settings.retry_after_secs().to_string())
        }
        Err(SubmitError::Queue(QueueError::Closed)) => Response::error(
            StatusCode::ServiceUnavailable,
            "Server is shutting down",
        ),
    }
}

/// Handler para `GET /tasks`
pub fn list_tasks_handler(_req: &Request, service: &TaskService) -> Response {
    Response::json(StatusCode::Ok, &service.list_tasks())
}

/// Handler para `GET /tasks/{id}`
pub fn get_task_handler(_req: &Request, id: &str, service: &TaskService) -> Response {
    let id = id.trim_matches('/');
    if id.is_empty() {
        return Response::error(StatusCode::BadRequest, "Task ID required");
    }

    match service.get_task(id) {
        Some(task) => Response::json(StatusCode::Ok, &task),
        None => Response::error(StatusCode::NotFound, "Task not found"),
    }
}

/// Handler para `GET /stats`
///
/// ```json
/// {"submitted": 10, "completed": 7, "in_progress": 3}
/// ```
pub fn stats_handler(_req: &Request, service: &TaskService) -> Response {
    Response::json(StatusCode::Ok, &service.get_stats())
}

/// Registra las rutas de la API sobre un servicio compartido
pub fn build_router(service: TaskService, settings: ApiSettings) -> Router {
    let mut router = Router::new();

    let create = service.clone();
    router.route(Method::POST, "/tasks", move |req: &Request, _: &str| {
        create_task_handler(req, &create, &settings)
    });

    let list = service.clone();
    router.route(Method::GET, "/tasks", move |req: &Request, _: &str| {
        list_tasks_handler(req, &list)
    });

    let get = service.clone();
    router.route_prefix(Method::GET, "/tasks/", move |req: &Request, id: &str| {
        get_task_handler(req, id, &get)
    });

    router.route(Method::GET, "/stats", move |req: &Request, _: &str| {
        stats_handler(req, &service)
    });

    router
}
