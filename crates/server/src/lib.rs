//! fragsim HTTP server: image upload and histogram comparison.
//!
//! This crate serves the comparison pipeline over a minimal, hand-built
//! HTTP/1.1 surface. There is no web framework: the request line and
//! headers are scanned byte by byte off the socket, the body is read in
//! a `Content-Length` loop, and the uploaded file is carved out of the
//! multipart body with a literal boundary scan. That byte-level path is
//! the point of the exercise, not an omission.
//!
//! # Endpoints
//!
//! - `GET /` — HTML upload form
//! - `POST /compare` — run both execution modes, show both timings
//! - `POST /singlethread` — sequential extraction only
//! - `POST /multithread` — worker-pool extraction only
//!
//! Everything else is `404`; any parse or pipeline failure during a
//! request becomes a `500` with the error message as plain text. The
//! connection closes after each response.

pub mod config;
pub mod error;
pub mod multipart;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod templates;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use request::RawRequest;
pub use response::HttpResponse;
pub use server::{handle_connection, run, serve};
pub use state::ServerState;
