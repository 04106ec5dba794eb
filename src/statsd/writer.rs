use std::fmt::{self, Write as _};

use super::MetricType;

/// A metric value as rendered on the wire.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MetricValue {
    /// Rendered in decimal.
    Int(u64),
    /// Rendered with exactly two decimal places.
    Rate(f64),
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for MetricValue {
    fn from(value: u32) -> Self {
        Self::Int(u64::from(value))
    }
}

/// Writes statsd lines into a fixed byte buffer.
///
/// Bytes that do not fit are dropped and the writer is marked truncated; later writes are
/// no-ops. The buffer therefore never holds more than its capacity.
pub struct PacketWriter<'buf> {
    buf: &'buf mut [u8],
    len: usize,
    truncated: bool,
}

impl<'buf> PacketWriter<'buf> {
    pub fn new(buf: &'buf mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Whether some output was dropped because the buffer was full.
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Copies as much of `bytes` as fits. Returns `false` if anything was dropped.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        let n = bytes.len().min(self.remaining());
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        if n < bytes.len() {
            self.truncated = true;
        }
        !self.truncated
    }

    /// Writes `<prefix>.<name>:<value>|<type><tags>\n`.
    pub fn write_metric(
        &mut self,
        prefix: &str,
        name: &str,
        value: MetricValue,
        metric_type: MetricType,
        tags: &str,
    ) {
        if !prefix.is_empty() {
            self.push(prefix.as_bytes());
            self.push(b".");
        }
        self.push(name.as_bytes());
        self.push(b":");
        match value {
            MetricValue::Int(value) => {
                let mut buffer = itoa::Buffer::new();
                self.push(buffer.format(value).as_bytes());
            }
            MetricValue::Rate(value) => {
                // `write_str` never fails, dropped bytes only set `truncated`
                let _ = write!(self, "{value:.2}");
            }
        }
        self.push(b"|");
        self.push(metric_type.as_str().as_bytes());
        self.push(tags.as_bytes());
        self.push(b"\n");
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.truncated = false;
    }
}

impl fmt::Write for PacketWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s.as_bytes());
        Ok(())
    }
}
