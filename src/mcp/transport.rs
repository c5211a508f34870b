//! Message transports for the MCP server
//!
//! The server only needs to pull one inbound message at a time and push
//! responses back. [`LineTransport`] frames JSON-RPC messages as one JSON
//! document per line, which is what MCP's stdio transport specifies.

use std::io;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

#[async_trait]
pub trait Transport: Send {
    /// Next raw inbound message, or `None` once the peer has closed the stream.
    /// Bytes are passed through undecoded; invalid UTF-8 is the parser's
    /// problem, not the transport's.
    async fn receive(&mut self) -> io::Result<Option<Vec<u8>>>;

    async fn send(&mut self, message: &Value) -> io::Result<()>;
}

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

impl LineTransport<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if self.reader.read_until(b'\n', &mut line).await? == 0 {
                return Ok(None);
            }

            let trimmed = line.trim_ascii();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_vec()));
            }
        }
    }

    async fn send(&mut self, message: &Value) -> io::Result<()> {
        let mut encoded = serde_json::to_vec(message)?;
        encoded.push(b'\n');
        self.writer.write_all(&encoded).await?;
        self.writer.flush().await
    }
}
