//! Byte cursor over a legacy VTK file.
//!
//! Keyword lines are always text; data blocks are either whitespace
//! separated text or raw big-endian bytes starting right after the
//! keyword line's newline.

use super::data_type::DataType;
use crate::error::{DecodeError, DecodeResult};

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            line: 1,
        }
    }

    /// 1-based line of the cursor position.
    pub fn line(&self) -> usize {
        self.line
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if !b.is_ascii_whitespace() {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    /// Read the current line verbatim (without the terminator) and move past it.
    pub fn raw_line(&mut self) -> Option<&'a str> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        let line = &rest[..end];
        self.pos += end;
        if self.pos < self.bytes.len() {
            self.pos += 1;
            self.line += 1;
        }
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        std::str::from_utf8(line).ok()
    }

    /// Skip blank space, then split the next non-empty line into tokens.
    ///
    /// Returns the line number together with the tokens, or `None` at end of file.
    pub fn keyword_line(&mut self) -> DecodeResult<Option<(usize, Vec<&'a str>)>> {
        self.skip_whitespace();
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }
        let line = self.line;
        let text = self
            .raw_line()
            .ok_or_else(|| DecodeError::header(line, "keyword line is not valid text"))?;
        Ok(Some((line, text.split_whitespace().collect())))
    }

    /// First token of the next non-empty line, without consuming anything.
    pub fn peek_keyword(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = &self.bytes[self.pos..];
        let end = rest
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(rest.len());
        std::str::from_utf8(&rest[..end]).ok()
    }

    /// Whether the bytes at the cursor start with `keyword` and a whitespace byte.
    ///
    /// Unlike [`Cursor::peek_keyword`] this never moves past blank space, so
    /// it is safe right before a binary block whose first bytes may be `\n`.
    pub fn at_keyword(&self, keyword: &str) -> bool {
        let rest = &self.bytes[self.pos..];
        rest.len() > keyword.len()
            && rest[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
            && rest[keyword.len()].is_ascii_whitespace()
    }

    /// Skip lines until an empty one (used for `METADATA` blocks).
    pub fn skip_block(&mut self) {
        while let Some(line) = self.raw_line() {
            if line.trim().is_empty() {
                break;
            }
        }
    }

    pub fn ascii_values(&mut self, count: usize, context: &str) -> DecodeResult<Vec<f64>> {
        // every value takes at least one byte plus a separator
        let remaining = self.bytes.len() - self.pos;
        let mut values = Vec::with_capacity(count.min(remaining / 2 + 1));
        for _ in 0..count {
            self.skip_whitespace();
            let rest = &self.bytes[self.pos..];
            let end = rest
                .iter()
                .position(|b| b.is_ascii_whitespace())
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(DecodeError::UnexpectedEof {
                    context: context.to_string(),
                });
            }
            let token = String::from_utf8_lossy(&rest[..end]);
            let value = parse_number(&token).ok_or_else(|| DecodeError::InvalidNumber {
                line: self.line,
                token: token.to_string(),
                context: context.to_string(),
            })?;
            values.push(value);
            self.pos += end;
        }
        Ok(values)
    }

    pub fn binary_values(
        &mut self,
        count: usize,
        data_type: DataType,
        context: &str,
    ) -> DecodeResult<Vec<f64>> {
        let width = data_type.size();
        let needed = count.checked_mul(width).ok_or_else(|| DecodeError::UnexpectedEof {
            context: context.to_string(),
        })?;
        let end = self.pos.checked_add(needed).filter(|&end| end <= self.bytes.len());
        let Some(end) = end else {
            return Err(DecodeError::UnexpectedEof {
                context: context.to_string(),
            });
        };
        let block = &self.bytes[self.pos..end];
        self.line += block.iter().filter(|&&b| b == b'\n').count();
        self.pos = end;
        Ok(block
            .chunks_exact(width)
            .map(|chunk| data_type.read_be(chunk))
            .collect())
    }
}

/// Parse a text number, accepting Fortran `D` exponents.
fn parse_number(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['D', 'd'], "E").parse::<f64>().ok())
}
