//! HTTP/1.1 response framing.
//!
//! Responses are written as
//! `HTTP/1.1 <status>\r\nContent-Type: <type>\r\nContent-Length: <n>\r\n\r\n<body>`
//! and the connection is closed afterwards; there is no keep-alive.

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl HttpResponse {
    /// A plain-text response with an explicit status line.
    pub fn text(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into().into_bytes(),
        }
    }

    /// A `200 OK` HTML page.
    pub fn html(body: String) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/html",
            body: body.into_bytes(),
        }
    }

    pub fn status(&self) -> &'static str {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Write the full response, header and body, to the stream.
    pub fn write_to<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.status,
            self.content_type,
            self.body.len()
        )?;
        stream.write_all(&self.body)?;
        stream.flush()
    }
}
