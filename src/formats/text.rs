//! Whitespace tokenizer over a byte buffer.
//!
//! PLY switches to raw binary right after its text header, so this works on
//! `&[u8]` and hands back the unread bytes.

use std::str::FromStr;

pub(crate) struct Tokens<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.buf.len() && self.buf[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Next whitespace separated token. Tokens that are not UTF-8 come back
    /// as a replacement character so they never match a keyword or number.
    pub fn next_token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.pos >= self.buf.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.buf.len() && !self.buf[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some(std::str::from_utf8(&self.buf[start..self.pos]).unwrap_or("\u{fffd}"))
    }

    /// Parse the next token.
    pub fn parse<T: FromStr>(&mut self) -> Option<T> {
        self.next_token().and_then(|t| t.parse().ok())
    }

    /// Text up to the end of the current line, trimmed. Consumes the newline.
    pub fn line(&mut self) -> &'a str {
        let start = self.pos;
        match self.buf[self.pos..].iter().position(|&b| b == b'\n') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.buf.len(),
        }
        std::str::from_utf8(&self.buf[start..self.pos])
            .unwrap_or("")
            .trim()
    }

    /// Unconsumed bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}
