// src/client.rs

//! A small asynchronous client for the bridge protocol, as used by the
//! controllers that drive marker bits remotely.

use crate::core::protocol::LineCodec;
use anyhow::{Result, anyhow};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{Duration, timeout};
use tokio_util::codec::{Decoder, Encoder};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// One request/response connection to a bridge.
#[derive(Debug)]
pub struct BridgeClient {
    stream: TcpStream,
    codec: LineCodec,
    read_buf: BytesMut,
}

impl BridgeClient {
    /// Attempts to connect to a bridge with a configured timeout.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await??;
        Ok(Self {
            stream,
            codec: LineCodec::default(),
            read_buf: BytesMut::with_capacity(256),
        })
    }

    /// Sends a raw request line and returns the raw response line.
    pub async fn send(&mut self, line: &str) -> Result<String> {
        let mut write_buf = BytesMut::new();
        self.codec.encode(line, &mut write_buf)?;
        self.stream.write_all(&write_buf).await?;

        loop {
            if let Some(reply) = self.codec.decode(&mut self.read_buf)? {
                return Ok(reply);
            }
            let read_fut = self.stream.read_buf(&mut self.read_buf);
            match timeout(READ_TIMEOUT, read_fut).await {
                Ok(Ok(0)) => return Err(anyhow!("Connection closed by bridge")),
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(anyhow!("Read timeout while waiting for response")),
            }
        }
    }

    /// Reads one bit, e.g. `read_bit("M", 0, 3)` for `%M0.3`.
    pub async fn read_bit(&mut self, area: &str, byte: i32, bit: i32) -> Result<bool> {
        let reply = self.send(&format!("READ {area} {byte} {bit}")).await?;
        match reply.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(reply_error(other)),
        }
    }

    /// Sets or clears one bit.
    pub async fn write_bit(&mut self, area: &str, byte: i32, bit: i32, value: bool) -> Result<()> {
        let reply = self
            .send(&format!("WRITE {area} {byte} {bit} {}", u8::from(value)))
            .await?;
        if reply != "OK" {
            return Err(reply_error(&reply));
        }
        Ok(())
    }
}

fn reply_error(reply: &str) -> anyhow::Error {
    match reply.strip_prefix("ERROR: ") {
        Some(reason) => anyhow!("Bridge error: {reason}"),
        None => anyhow!("Unexpected reply: {reply:?}"),
    }
}
