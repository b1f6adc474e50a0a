//! Read-side framing
//!
//! Bytes arrive in arbitrary chunks. [`MessageFramer`] accumulates them and
//! releases everything up to and including the last delimiter as a batch;
//! [`extract_messages`] then splits a batch into individual wire messages.
//!
//! Splitting happens on bytes, and the delimiter is ASCII, so a multi-byte
//! character split across reads is never cut in half.

use bytes::{Buf, BytesMut};
use codec::checksum::is_checksum_field;

/// Read accumulator for one connection
#[derive(Debug)]
pub struct MessageFramer {
    buffer: BytesMut,
    delimiter: u8,
    max_pending: usize,
}

impl MessageFramer {
    /// `delimiter` must be ASCII; `max_pending` bounds bytes held without one
    pub fn new(delimiter: char, max_pending: usize) -> Self {
        debug_assert!(delimiter.is_ascii());
        Self {
            buffer: BytesMut::with_capacity(1024),
            delimiter: delimiter as u8,
            max_pending,
        }
    }

    /// Append freshly read bytes and return the complete part, if any.
    ///
    /// When more than `max_pending` bytes accumulate with no delimiter the
    /// whole buffer is released so validation can reject it.
    pub fn push(&mut self, data: &[u8]) -> Option<String> {
        self.buffer.extend_from_slice(data);

        let cut = match self.buffer.iter().rposition(|&b| b == self.delimiter) {
            Some(last) => last + 1,
            None if self.buffer.len() > self.max_pending => self.buffer.len(),
            None => return None,
        };

        let batch = self.buffer.split_to(cut);
        Some(String::from_utf8_lossy(&batch).into_owned())
    }

    /// Bytes held back waiting for more input
    pub fn pending(&self) -> usize {
        self.buffer.remaining()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Split a batch into individual messages.
///
/// Carriage returns are dropped and lines are split on `\n`. Within a line a
/// message ends right after each checksum field; whatever follows the last
/// checksum field is emitted as its own unit so validation can reject it.
/// Every unit is complete: the framer only releases bytes up to a delimiter.
pub fn extract_messages(batch: &str, delimiter: char) -> Vec<String> {
    let mut messages = Vec::new();
    let cleaned: String = batch.chars().filter(|&c| c != '\r').collect();

    for line in cleaned.split('\n') {
        let mut current = String::new();

        for piece in line.split_inclusive(delimiter) {
            current.push_str(piece);
            let closes_message = piece
                .strip_suffix(delimiter)
                .is_some_and(is_checksum_field);
            if closes_message {
                messages.push(std::mem::take(&mut current));
            }
        }

        if !current.trim().is_empty() {
            messages.push(current);
        }
    }

    messages
}
