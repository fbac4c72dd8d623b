//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser mínimo para HTTP/1.0 y HTTP/1.1:
//!
//! ```text
//! POST /tasks HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 20\r\n
//! \r\n
//! {"payload": "hello"}
//! ```
//!
//! El body se toma de los bytes que siguen a la línea vacía, recortado a
//! `Content-Length` si viene. El query string se descarta: las rutas solo
//! miran el path.

use std::collections::HashMap;
use thiserror::Error;

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
    OPTIONS,
}

impl Method {
    fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

/// Errores de parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Request parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    /// Nombres en minúsculas
    headers: HashMap<String, String>,
    version: String,
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request completo
    ///
    /// ```
    /// use task_queue_server::http::Request;
    ///
    /// let raw = b"GET /tasks/7 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    /// assert_eq!(request.path(), "/tasks/7");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        let (head, rest) = match header_end(buffer) {
            Some(end) => (&buffer[..end - 4], &buffer[end..]),
            // Sin línea vacía: se acepta un request sin headers ni body
            None => (buffer, &buffer[buffer.len()..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;
        let mut lines = head.split("\r\n");

        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;
        let (method, path, version) = parse_request_line(request_line)?;
        let headers = parse_headers(lines)?;

        let body = match headers.get("content-length") {
            Some(value) => {
                let length: usize = value
                    .parse()
                    .map_err(|_| ParseError::InvalidHeader(format!("Content-Length: {}", value)))?;
                if rest.len() < length {
                    return Err(ParseError::IncompleteRequest);
                }
                rest[..length].to_vec()
            }
            None => rest.to_vec(),
        };

        Ok(Request {
            method,
            path,
            headers,
            version,
            body,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header por nombre, sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Posición justo después de `\r\n\r\n`, si ya llegó
pub fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// `Content-Length` declarado en los headers crudos (0 si no viene)
pub fn declared_content_length(head: &[u8]) -> usize {
    let Ok(head) = std::str::from_utf8(head) else {
        return 0;
    };
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Formato: `METHOD /path?query HTTP/1.x`
fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidRequestLine);
    }

    let method = Method::parse(parts[0])?;
    if !parts[1].starts_with('/') {
        return Err(ParseError::InvalidRequestLine);
    }

    let version = parts[2].to_string();
    if version != "HTTP/1.0" && version != "HTTP/1.1" {
        return Err(ParseError::InvalidHttpVersion(version));
    }

    let path = match parts[1].split_once('?') {
        Some((path, _)) => path.to_string(),
        None => parts[1].to_string(),
    };

    Ok((method, path, version))
}

fn parse_headers<'a, I>(lines: I) -> Result<HashMap<String, String>, ParseError>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    Ok(headers)
}
