//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Acepta conexiones y procesa cada una en su propio thread. El listener
//! trabaja en modo no bloqueante para poder revisar el `ShutdownHandle`
//! entre accepts.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::request::{declared_content_length, header_end};
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::router::Router;
use crate::tasks::handlers::{build_router, ApiSettings};
use crate::tasks::pool::ShutdownReport;
use crate::tasks::runtime::{RuntimeSettings, TaskRuntime};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Tamaño máximo de un request (headers + body)
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Pausa del accept loop cuando no hay conexiones pendientes
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Timeout de lectura por conexión
const READ_TIMEOUT: Duration = Duration::from_secs(5);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Señal para detener el accept loop desde otro thread (p. ej. Ctrl-C)
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Servidor HTTP con el runtime de tareas
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    runtime: TaskRuntime,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Valida la config, arranca el runtime y hace bind
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        config.validate()?;
        let runtime = TaskRuntime::start(RuntimeSettings::from_config(config))?;
        Self::with_runtime(&config.address(), runtime, ApiSettings::from_config(config))
    }

    /// Hace bind sobre un runtime ya arrancado
    ///
    /// Si el bind falla el runtime se apaga antes de devolver el error.
    pub fn with_runtime(
        address: &str,
        runtime: TaskRuntime,
        api: ApiSettings,
    ) -> Result<Self, ServerError> {
        let listener = match TcpListener::bind(address) {
            Ok(listener) => listener,
            Err(e) => {
                runtime.shutdown();
                return Err(e.into());
            }
        };

        let router = build_router(runtime.service().clone(), api);

        Ok(Self {
            listener,
            router: Arc::new(router),
            runtime,
            shutdown: ShutdownHandle::default(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn runtime(&self) -> &TaskRuntime {
        &self.runtime
    }

    /// Atiende conexiones hasta que se dispare el `ShutdownHandle`
    ///
    /// Al salir deja de aceptar, cierra la cola, detiene el pool (con gracia)
    /// y el monitor.
    pub fn run(self) -> Result<ShutdownReport, ServerError> {
        let Server {
            listener,
            router,
            runtime,
            shutdown,
        } = self;

        if let Err(e) = listener.set_nonblocking(true) {
            runtime.shutdown();
            return Err(e.into());
        }

        match listener.local_addr() {
            Ok(addr) => info!(%addr, "Server listening (one thread per connection)"),
            Err(e) => warn!(error = %e, "Server listening on unknown address"),
        }

        while !shutdown.is_triggered() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&router);
                    let spawned = thread::Builder::new()
                        .name("conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &router) {
                                debug!(%peer, error = %e, "Connection error");
                            }
                        });
                    if let Err(e) = spawned {
                        error!(%peer, error = %e, "Failed to spawn connection thread");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!("Shutdown requested, no longer accepting connections");
        drop(listener);
        Ok(runtime.shutdown())
    }
}

/// Lee un request, lo despacha y escribe la respuesta
fn handle_connection(mut stream: TcpStream, router: &Router) -> io::Result<()> {
    let start = Instant::now();
    let request_id = next_request_id();

    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let raw = match read_request(&mut stream)? {
        ReadOutcome::Complete(raw) => raw,
        ReadOutcome::Empty => {
            debug!(request_id = %request_id, "Connection closed without data");
            return Ok(());
        }
        ReadOutcome::TooLarge => {
            let mut response = Response::error(StatusCode::PayloadTooLarge, "Request too large");
            return respond(&mut stream, router, &mut response, &request_id, "-", "-", start);
        }
    };

    let (mut response, method, path) = match Request::parse(&raw) {
        Ok(request) => {
            let response = router.dispatch(&request);
            (response, request.method().as_str(), request.path().to_string())
        }
        Err(e @ ParseError::UnsupportedMethod(_)) => {
            debug!(request_id = %request_id, error = %e, "Unsupported method");
            (
                Response::error(StatusCode::MethodNotAllowed, "Method not allowed"),
                "-",
                "-".to_string(),
            )
        }
        Err(e) => {
            debug!(request_id = %request_id, error = %e, "Parse error");
            (
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e)),
                "-",
                "-".to_string(),
            )
        }
    };

    respond(&mut stream, router, &mut response, &request_id, method, &path, start)
}

fn respond(
    stream: &mut TcpStream,
    router: &Router,
    response: &mut Response,
    request_id: &str,
    method: &str,
    path: &str,
    start: Instant,
) -> io::Result<()> {
    router.add_common_headers(response);
    response.add_header("X-Request-Id", request_id);

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    info!(
        request_id = %request_id,
        method,
        path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Request handled"
    );
    Ok(())
}

#[derive(Debug)]
enum ReadOutcome {
    Complete(Vec<u8>),
    Empty,
    TooLarge,
}

/// Lee hasta tener los headers y `Content-Length` bytes de body
fn read_request(stream: &mut impl Read) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    let mut expected: Option<usize> = None;

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if expected.is_none() {
            if let Some(end) = header_end(&buffer) {
                match end.checked_add(declared_content_length(&buffer[..end])) {
                    Some(total) => expected = Some(total),
                    None => return Ok(ReadOutcome::TooLarge),
                }
            }
        }

        match expected {
            Some(total) if total > MAX_REQUEST_BYTES => return Ok(ReadOutcome::TooLarge),
            Some(total) if buffer.len() >= total => break,
            None if buffer.len() > MAX_REQUEST_BYTES => return Ok(ReadOutcome::TooLarge),
            _ => {}
        }
    }

    if buffer.is_empty() {
        Ok(ReadOutcome::Empty)
    } else {
        Ok(ReadOutcome::Complete(buffer))
    }
}

fn next_request_id() -> String {
    let mut hasher = DefaultHasher::new();
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    thread::current().id().hash(&mut hasher);
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
