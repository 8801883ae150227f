//! Content line folding for iCalendar (RFC 5545 §3.1).
//!
//! [`FoldingWriter`] is a streaming transform: content lines are written to it
//! in arbitrary chunks and it forwards them to the inner writer with `CRLF SP`
//! continuation markers inserted so no physical line exceeds the configured
//! width. Widths are counted in UTF-8 octets and a multi-byte character is
//! never split, even when its bytes arrive in different `write` calls.

use std::io::{self, Write};

/// Maximum line length in octets, excluding the line break.
pub const DEFAULT_LINE_WIDTH: usize = 75;

/// Smallest usable width: the folding space plus one 4-byte character.
const MIN_LINE_WIDTH: usize = 5;

const CRLF: &[u8] = b"\r\n";
const FOLD: &[u8] = b"\r\n ";

/// Folds content lines written to it before passing them on.
///
/// Input line terminators (`LF` or `CRLF`) are emitted as `CRLF` and start a
/// new unfolded line. Output for a given input does not depend on how the
/// input is split across `write` calls.
#[derive(Debug)]
pub struct FoldingWriter<W: Write> {
    inner: W,
    max_width: usize,
    /// Octets on the current physical line.
    width: usize,
    /// An incomplete UTF-8 sequence, or a `CR` waiting for its `LF`.
    pending: Vec<u8>,
}

impl<W: Write> FoldingWriter<W> {
    /// Creates a writer folding at [`DEFAULT_LINE_WIDTH`].
    pub fn new(inner: W) -> Self {
        Self::with_width(inner, DEFAULT_LINE_WIDTH)
    }

    /// Creates a writer folding at `max_width` octets (at least 5).
    pub fn with_width(inner: W, max_width: usize) -> Self {
        Self {
            inner,
            max_width: max_width.max(MIN_LINE_WIDTH),
            width: 0,
            pending: Vec::with_capacity(4),
        }
    }

    /// Returns the width lines are folded at.
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Returns a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Emits anything still pending and returns the inner writer.
    ///
    /// A truncated UTF-8 sequence is passed through as-is.
    pub fn finish(mut self) -> io::Result<W> {
        let mut out = Vec::with_capacity(self.pending.len() + FOLD.len());
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            self.emit_unit(&pending, &mut out);
        }
        self.inner.write_all(&out)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn push(&mut self, byte: u8, out: &mut Vec<u8>) {
        if self.pending.first() == Some(&b'\r') {
            self.pending.clear();
            if byte == b'\n' {
                self.end_line(out);
                return;
            }
            self.emit_unit(b"\r", out);
        }

        if !self.pending.is_empty() {
            if is_continuation(byte) {
                self.pending.push(byte);
                if self.pending.len() == sequence_len(self.pending[0]) {
                    let unit = std::mem::take(&mut self.pending);
                    self.emit_unit(&unit, out);
                }
                return;
            }
            // Broken sequence: pass the stray bytes through unchanged.
            let unit = std::mem::take(&mut self.pending);
            self.emit_unit(&unit, out);
        }

        match byte {
            b'\n' => self.end_line(out),
            b'\r' => self.pending.push(byte),
            lead if sequence_len(lead) > 1 => self.pending.push(lead),
            _ => self.emit_unit(&[byte], out),
        }
    }

    fn emit_unit(&mut self, unit: &[u8], out: &mut Vec<u8>) {
        if self.width + unit.len() > self.max_width {
            out.extend_from_slice(FOLD);
            self.width = 1;
        }
        out.extend_from_slice(unit);
        self.width += unit.len();
    }

    fn end_line(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(CRLF);
        self.width = 0;
    }
}

impl<W: Write> Write for FoldingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = Vec::with_capacity(buf.len() + buf.len() / self.max_width * FOLD.len() + 4);
        for &byte in buf {
            self.push(byte, &mut out);
        }
        self.inner.write_all(&out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Length of the UTF-8 sequence introduced by `lead`; 1 for anything else.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}
