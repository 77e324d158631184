// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CRLF record framing for the RMonitor byte stream.
//!
//! Relays forward raw socket reads, so a record can arrive split across
//! chunks. The assembler buffers until a delimiter is seen and yields one
//! complete line at a time.

/// Accumulates bytes and yields complete CRLF-terminated lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line it closes.
    ///
    /// Lines are returned without their delimiter. A trailing `\r` is
    /// stripped so lone-`\n` input from misconfigured relays still frames.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // the \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Bytes buffered waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
