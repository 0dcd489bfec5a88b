//! Multipart body extraction by literal byte-sequence scanning.
//!
//! The uploaded file is framed as
//! `--boundary \r\n part-headers \r\n\r\n payload \r\n --boundary...`.
//! This module locates the first two occurrences of `--boundary`, then
//! the CRLFCRLF that ends the part's own headers, and returns the bytes
//! between the header terminator and the second boundary occurrence.
//! No regex, no streaming parser: a plain subsequence scan that also
//! copes with boundary tokens whose characters appear inside the
//! payload, because only exact full-token matches count.

use crate::error::{ServerError, ServerResult};

const PART_HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Locate the single file part inside `body` and return its payload as
/// a borrowed byte range.
///
/// The payload runs up to, but not including, the second boundary
/// occurrence, so a well-formed part keeps the CRLF that precedes the
/// closing boundary. Raster decoders stop at their own end markers and
/// ignore those trailing bytes.
pub fn extract_file_payload<'a>(body: &'a [u8], boundary: &str) -> ServerResult<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let first = find_bytes(body, delimiter, 0)
        .ok_or(ServerError::BoundaryNotFound("first boundary missing"))?;
    let second = find_bytes(body, delimiter, first + delimiter.len())
        .ok_or(ServerError::BoundaryNotFound("closing boundary missing"))?;

    let header_end = find_bytes(&body[..second], PART_HEADER_TERMINATOR, first)
        .ok_or(ServerError::BoundaryNotFound("part header terminator missing"))?;

    // The terminator was found inside body[..second], so payload_start
    // can reach second but never exceed it; equality means the part
    // carries no payload at all.
    let payload_start = header_end + PART_HEADER_TERMINATOR.len();
    if payload_start >= second {
        return Err(ServerError::BoundaryNotFound(
            "part has no payload before the closing boundary",
        ));
    }

    Ok(&body[payload_start..second])
}

/// First exact occurrence of `needle` in `haystack` at or after `from`.
fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|position| position + from)
}
