//! # Módulo HTTP
//!
//! Implementación mínima del protocolo HTTP/1.0 sobre `TcpStream`, sin
//! librerías de alto nivel:
//!
//! - Parsing de requests (con body según `Content-Length`)
//! - Construcción de responses JSON
//! - Códigos de estado
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 201 Created\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 60\r\n
//! \r\n
//! {"id":"1","status":"PENDING","message":"Task created successfully"}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
