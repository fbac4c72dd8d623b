//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea método + path a un handler.
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Hay dos tipos de ruta:
//!
//! - **Exacta** (`/tasks`): el path debe coincidir completo.
//! - **Prefijo** (`/tasks/`): coincide con todo lo que empiece igual; el
//!   resto del path llega al handler como parámetro (`/tasks/7` → `"7"`).
//!
//! Si el path existe pero con otro método se responde 405; si no existe, 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Handler: recibe el request y el resto del path (vacío en rutas exactas)
pub type Handler = Box<dyn Fn(&Request, &str) -> Response + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    /// Devuelve el resto del path si coincide
    fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            PathPattern::Exact(expected) => (path == expected).then_some(""),
            PathPattern::Prefix(prefix) => path.strip_prefix(prefix.as_str()),
        }
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Handler,
}

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<Route>,
    server_name: String,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            server_name: format!("TaskQueue/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Registra una ruta exacta
    ///
    /// # Ejemplo
    /// ```
    /// use task_queue_server::router::Router;
    /// use task_queue_server::http::{Method, Request, Response, StatusCode};
    ///
    /// let mut router = Router::new();
    /// router.route(Method::GET, "/hello", |_req: &Request, _: &str| {
    ///     Response::json(StatusCode::Ok, &serde_json::json!({"message": "hello"}))
    /// });
    ///
    /// let request = Request::parse(b"GET /hello HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(router.dispatch(&request).status(), StatusCode::Ok);
    /// ```
    pub fn route<F>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        self.push(method, PathPattern::Exact(path.to_string()), handler)
    }

    /// Registra una ruta de prefijo
    pub fn route_prefix<F>(&mut self, method: Method, prefix: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        self.push(method, PathPattern::Prefix(prefix.to_string()), handler)
    }

    fn push<F>(&mut self, method: Method, pattern: PathPattern, handler: F) -> &mut Self
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        self
    }

    /// Ejecuta el handler que corresponde al request
    ///
    /// Las rutas exactas tienen prioridad sobre las de prefijo.
    pub fn dispatch(&self, request: &Request) -> Response {
        let path = request.path();
        let mut path_known = false;

        let exact = self
            .routes
            .iter()
            .filter(|r| matches!(r.pattern, PathPattern::Exact(_)));
        let prefix = self
            .routes
            .iter()
            .filter(|r| matches!(r.pattern, PathPattern::Prefix(_)));

        for route in exact.chain(prefix) {
            let Some(rest) = route.pattern.matches(path) else {
                continue;
            };
            if route.method == request.method() {
                let mut response = (route.handler)(request, rest);
                self.add_common_headers(&mut response);
                return response;
            }
            path_known = true;
        }

        let mut response = if path_known {
            Response::error(StatusCode::MethodNotAllowed, "Method not allowed")
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        };
        self.add_common_headers(&mut response);
        response
    }

    /// Headers comunes a todas las respuestas
    pub fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", &self.server_name);
        response.add_header("Connection", "close");
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    fn echo_rest(_req: &Request, rest: &str) -> Response {
        Response::json(StatusCode::Ok, &serde_json::json!({ "rest": rest }))
    }

    fn ok(_req: &Request, _rest: &str) -> Response {
        Response::json(StatusCode::Ok, &serde_json::json!({ "test": "ok" }))
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert!(router.is_empty());
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.route(Method::GET, "/test", ok);
        assert_eq!(router.len(), 1);

        let response = router.dispatch(&parse(b"GET /test HTTP/1.0\r\n\r\n"));
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Connection"), Some("close"));
        assert!(response.header("Server").is_some());
    }

    #[test]
    fn test_route_not_found() {
        let router = Router::new();
        let response = router.dispatch(&parse(b"GET /nonexistent HTTP/1.0\r\n\r\n"));
        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.header("Connection"), Some("close"));
    }

    #[test]
    fn test_wrong_method_is_405() {
        let mut router = Router::new();
        router.route(Method::GET, "/stats", ok);

        let response = router.dispatch(&parse(b"POST /stats HTTP/1.0\r\n\r\n"));
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    #[test]
    fn test_prefix_route_passes_rest() {
        let mut router = Router::new();
        router.route_prefix(Method::GET, "/tasks/", echo_rest);

        let response = router.dispatch(&parse(b"GET /tasks/42 HTTP/1.0\r\n\r\n"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["rest"], "42");

        let response = router.dispatch(&parse(b"GET /tasks/ HTTP/1.0\r\n\r\n"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["rest"], "");
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let mut router = Router::new();
        router
            .route_prefix(Method::GET, "/tasks", echo_rest)
            .route(Method::GET, "/tasks", ok);

        let response = router.dispatch(&parse(b"GET /tasks HTTP/1.0\r\n\r\n"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["test"], "ok");
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut router = Router::new();
        router
            .route(Method::GET, "/tasks", ok)
            .route(Method::POST, "/tasks", |_: &Request, _: &str| {
                Response::new(StatusCode::Created)
            });

        let get = router.dispatch(&parse(b"GET /tasks HTTP/1.0\r\n\r\n"));
        let post = router.dispatch(&parse(b"POST /tasks HTTP/1.0\r\n\r\n"));
        let delete = router.dispatch(&parse(b"DELETE /tasks HTTP/1.0\r\n\r\n"));
        assert_eq!(get.status(), StatusCode::Ok);
        assert_eq!(post.status(), StatusCode::Created);
        assert_eq!(delete.status(), StatusCode::MethodNotAllowed);
    }
}
