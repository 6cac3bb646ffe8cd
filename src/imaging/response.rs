//! A byte sink that remembers whether its headers have been committed.
//!
//! [`Thumbnail::show`](super::operations::Thumbnail::show) writes a
//! `Content-Type` header before the image bytes and refuses to run once a
//! header block has gone out.

use std::io::{self, Write};

pub struct Response<W: Write> {
    writer: W,
    headers_sent: bool,
}

impl<W: Write> Response<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            headers_sent: false,
        }
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Write the header block and commit it. Callers check
    /// [`headers_sent`](Self::headers_sent) first.
    pub fn send_headers(&mut self, headers: &[(&str, &str)]) -> io::Result<()> {
        for (name, value) in headers {
            write!(self.writer, "{name}: {value}\r\n")?;
        }
        self.writer.write_all(b"\r\n")?;
        self.headers_sent = true;
        Ok(())
    }

    /// Body bytes. Writing a body also commits the (empty) header block.
    pub fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.headers_sent = true;
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
