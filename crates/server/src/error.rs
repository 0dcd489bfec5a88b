use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types.
///
/// Every per-request failure is caught at the connection boundary and
/// converted into a response; none of these crash the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request line had fewer than two tokens, or the header block
    /// never terminated before the stream closed.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A POST aimed at a comparison route without the multipart
    /// metadata the handler needs.
    #[error("missing request metadata: {0}")]
    MissingMetadata(&'static str),

    /// The stream closed before `Content-Length` bytes arrived.
    #[error("request body ended after {received} of {expected} bytes")]
    IncompleteBody { expected: usize, received: usize },

    /// The multipart framing was broken: a boundary occurrence or the
    /// part-header terminator could not be located.
    #[error("multipart framing broken: {0}")]
    BoundaryNotFound(&'static str),

    #[error("comparison failed: {0}")]
    Pipeline(#[from] fragsim::PipelineError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,
}

impl ServerError {
    /// HTTP status line for this error.
    pub fn status_line(&self) -> &'static str {
        match self {
            ServerError::NotFound => "404 Not Found",
            _ => "500 Internal Server Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failures_map_to_500() {
        let err = ServerError::MalformedRequest("no terminator".into());
        assert_eq!(err.status_line(), "500 Internal Server Error");

        let err = ServerError::IncompleteBody {
            expected: 100,
            received: 10,
        };
        assert_eq!(err.status_line(), "500 Internal Server Error");
    }

    #[test]
    fn unknown_route_maps_to_404() {
        assert_eq!(ServerError::NotFound.status_line(), "404 Not Found");
    }
}
