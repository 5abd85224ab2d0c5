//! Physical line reading: separated lines or fixed-size records.

use std::io::{self, BufRead};

use crate::error::{CodecError, CodecResult};

pub(crate) struct LineReader<R> {
    inner: R,
    separator: Vec<u8>,
    record_length: Option<usize>,
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R, separator: &str, record_length: Option<usize>) -> Self {
        Self {
            inner,
            separator: separator.as_bytes().to_vec(),
            record_length,
            line_number: 0,
            buf: Vec::new(),
        }
    }

    /// 1-based number of the line most recently returned.
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    pub(crate) fn next_line(&mut self) -> CodecResult<Option<String>> {
        let line = match self.record_length {
            Some(len) => self.read_record(len)?,
            None => self.read_separated()?,
        };
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    fn read_separated(&mut self) -> CodecResult<Option<String>> {
        self.buf.clear();
        let Some(&last) = self.separator.last() else {
            return Err(CodecError::config("empty line separator"));
        };
        loop {
            let n = self.inner.read_until(last, &mut self.buf)?;
            if n == 0 || self.buf.ends_with(&self.separator) {
                break;
            }
            // A partial multi-byte separator match; keep reading.
            if self.buf.last() != Some(&last) {
                break;
            }
        }
        if self.buf.is_empty() {
            return Ok(None);
        }
        if self.buf.ends_with(&self.separator) {
            self.buf.truncate(self.buf.len() - self.separator.len());
            if self.separator == b"\n" && self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let text = std::str::from_utf8(&self.buf).map_err(invalid_utf8)?;
        Ok(Some(text.to_owned()))
    }

    /// Read `len` characters. A short final record is returned as is.
    fn read_record(&mut self, len: usize) -> CodecResult<Option<String>> {
        let mut out = String::with_capacity(len);
        let mut count = 0;
        while count < len {
            let Some(first) = self.read_byte()? else {
                break;
            };
            let width = utf8_width(first).ok_or_else(|| invalid_data("invalid UTF-8 lead byte"))?;
            let mut bytes = [first, 0, 0, 0];
            for slot in bytes.iter_mut().take(width).skip(1) {
                *slot = self
                    .read_byte()?
                    .ok_or_else(|| invalid_data("truncated UTF-8 sequence"))?;
            }
            let c = std::str::from_utf8(&bytes[..width]).map_err(invalid_utf8)?;
            out.push_str(c);
            count += 1;
        }
        Ok((count > 0).then_some(out))
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        self.inner.consume(1);
        Ok(Some(b))
    }
}

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

fn invalid_data(message: &str) -> CodecError {
    CodecError::Io(io::Error::new(io::ErrorKind::InvalidData, message.to_owned()))
}

fn invalid_utf8(e: std::str::Utf8Error) -> CodecError {
    CodecError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
}
