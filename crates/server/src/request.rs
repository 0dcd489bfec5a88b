//! Request line, header, and body reading off a raw byte stream.
//!
//! There is no framework and no delimiter-aware stream reader here: the
//! header block is scanned byte by byte until the CRLFCRLF terminator,
//! leaving the stream positioned exactly at the start of the body, and
//! the body is then accumulated in a read loop until `Content-Length`
//! bytes have arrived.

use std::io::Read;

use crate::error::{ServerError, ServerResult};

/// Upper bound on the header block. A request that has not terminated
/// its headers by then is treated as malformed rather than buffered
/// indefinitely.
const MAX_HEADER_BYTES: usize = 8 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// One parsed request: immutable once constructed, consumed once by the
/// handler, then discarded with the connection.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawRequest {
    /// Look up a header value; name match is case-insensitive, values
    /// preserve their order of appearance (first wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parsed `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")?.trim().parse().ok()
    }

    /// Multipart boundary token: the substring of `Content-Type`
    /// following `boundary=`.
    pub fn boundary(&self) -> Option<&str> {
        let content_type = self.header("content-type")?;
        let (_, boundary) = content_type.split_once("boundary=")?;
        let boundary = boundary.trim();
        if boundary.is_empty() {
            None
        } else {
            Some(boundary)
        }
    }
}

/// Read and parse one request from a connected stream.
///
/// A POST carrying a positive `Content-Length` has its body read in
/// full; a POST without one is treated as an empty-body request (the
/// route handler decides whether that is fatal), mirroring how the
/// comparison form is actually submitted.
pub fn read_request<R: Read>(stream: &mut R) -> ServerResult<RawRequest> {
    let header_block = read_header_block(stream)?;
    let mut request = parse_header_block(&header_block)?;

    if request.method == "POST" {
        match request.content_length() {
            Some(length) if length > 0 => {
                request.body = read_body(stream, length)?;
            }
            _ => {
                tracing::warn!(
                    path = %request.path,
                    "POST without a usable content length; treating body as empty"
                );
            }
        }
    }

    Ok(request)
}

/// Consume bytes up to and including the CRLFCRLF header terminator.
fn read_header_block<R: Read>(stream: &mut R) -> ServerResult<Vec<u8>> {
    let mut block = Vec::with_capacity(512);
    let mut byte = [0u8; 1];

    loop {
        match stream.read(&mut byte)? {
            0 => {
                return Err(ServerError::MalformedRequest(
                    "stream closed before the header terminator".into(),
                ))
            }
            _ => block.push(byte[0]),
        }
        if block.ends_with(HEADER_TERMINATOR) {
            return Ok(block);
        }
        if block.len() >= MAX_HEADER_BYTES {
            return Err(ServerError::MalformedRequest(format!(
                "header block exceeded {MAX_HEADER_BYTES} bytes"
            )));
        }
    }
}

fn parse_header_block(block: &[u8]) -> ServerResult<RawRequest> {
    let text = String::from_utf8_lossy(block);
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut tokens = request_line.split_whitespace();
    let method = tokens
        .next()
        .ok_or_else(|| ServerError::MalformedRequest("empty request line".into()))?;
    let path = tokens.next().ok_or_else(|| {
        ServerError::MalformedRequest(format!("request line has a single token: {request_line}"))
    })?;
    let version = tokens.next().unwrap_or("HTTP/1.1");

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok(RawRequest {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: Vec::new(),
    })
}

/// Accumulate exactly `expected` body bytes from the stream.
///
/// A single read is not guaranteed to return everything, so this loops
/// until the target is met or the stream signals end-of-data.
fn read_body<R: Read>(stream: &mut R, expected: usize) -> ServerResult<Vec<u8>> {
    let mut body = vec![0u8; expected];
    let mut received = 0;

    while received < expected {
        let read = stream.read(&mut body[received..])?;
        if read == 0 {
            return Err(ServerError::IncompleteBody { expected, received });
        }
        received += read;
    }

    Ok(body)
}
