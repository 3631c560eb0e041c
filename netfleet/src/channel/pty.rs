//! PTY channel abstraction for interactive sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Search depth for pattern matching.
    pub search_depth: usize,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self { search_depth: 1000 }
    }
}

/// High-level PTY channel for interactive device sessions.
///
/// Wraps an open russh shell channel and provides pattern-based reads with
/// timeout handling.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
    is_open: bool,
}

impl PtyChannel {
    /// Wrap an already opened shell channel.
    pub fn new(channel: Channel<Msg>, config: PtyConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            channel,
            is_open: true,
        }
    }

    /// Write a line to the remote shell.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        if !self.is_open {
            return Err(ChannelError::Closed.into());
        }

        trace!("send: {:?}", line);
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        self.channel
            .data(bytes.as_slice())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` appears in the tail of the output.
    ///
    /// Returns everything accumulated since the previous successful read,
    /// including the matched prompt.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }

            if !self.is_open {
                return Err(ChannelError::Closed.into());
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => self.buffer.extend(&data[..]),
                Some(ChannelMsg::ExtendedData { data, .. }) => self.buffer.extend(&data[..]),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    self.is_open = false;
                }
                Some(_) => {}
            }
        }
    }

    /// Close the channel.
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        self.channel.eof().await.map_err(ChannelError::Ssh)?;
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
