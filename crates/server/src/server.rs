//! Listener loop and the connection-handling boundary.
//!
//! The listener is deliberately thin: accept, spawn a thread, parse,
//! dispatch, respond, close. One request per connection, no keep-alive.
//! Every per-request failure is converted to a response at this
//! boundary; nothing a client sends can take the listener down.

use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::request;
use crate::response::HttpResponse;
use crate::routes;
use crate::state::ServerState;

/// Build state from the configuration, bind, and serve forever.
pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let state = Arc::new(ServerState::new(config)?);
    let listener = TcpListener::bind(addr)?;
    tracing::info!(
        %addr,
        workers = state.config.worker_count,
        "fragsim server listening"
    );
    serve(listener, state)
}

/// Accept loop over an already-bound listener.
///
/// Exposed separately so tests can bind an ephemeral port themselves.
pub fn serve(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&state);
                thread::spawn(move || handle_connection(stream, &state));
            }
            Err(err) => tracing::warn!(%err, "accept failed"),
        }
    }
    Ok(())
}

/// Process one connection to completion: parse, dispatch, respond.
pub fn handle_connection(mut stream: TcpStream, state: &ServerState) {
    let response = match request::read_request(&mut stream) {
        Ok(request) => {
            tracing::info!(method = %request.method, path = %request.path, "request");
            match routes::dispatch(state, &request) {
                Ok(response) => response,
                Err(ServerError::NotFound) => HttpResponse::text("404 Not Found", "404 Not Found"),
                Err(err) => {
                    tracing::error!(%err, path = %request.path, "request failed");
                    HttpResponse::text(err.status_line(), err.to_string())
                }
            }
        }
        Err(err) => {
            tracing::error!(%err, "request parsing failed");
            HttpResponse::text(err.status_line(), err.to_string())
        }
    };

    if let Err(err) = response.write_to(&mut stream) {
        tracing::warn!(%err, "failed to write response");
    }
    let _ = stream.shutdown(Shutdown::Both);
}
