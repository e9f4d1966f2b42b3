// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Line-level reading and writing of the model text format.
//!
//! Every content line is `<field name> <token> <token> ...` separated by single spaces.
//! A blank line closes a record. Raw text lines (the payload of a text field) are
//! written verbatim.

use std::io::{BufRead, Write};

pub struct LineWriter<W: Write> {
    sink: W,
    lines: usize,
}

impl<W: Write> LineWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, lines: 0 }
    }

    /// Writes `name` followed by each token.
    pub fn field<I, T>(&mut self, name: &str, tokens: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut line = String::with_capacity(name.len() + 16);
        line.push_str(name);
        for token in tokens {
            line.push(' ');
            line.push_str(token.as_ref());
        }
        self.raw(&line)
    }

    pub fn raw(&mut self, text: &str) -> std::io::Result<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn blank(&mut self) -> std::io::Result<()> {
        self.raw("")
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn finish(mut self) -> std::io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// One line of input with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Field name and the remaining tokens.
    pub fn split(&self) -> (&str, Vec<&str>) {
        let mut tokens = self.text.split_whitespace();
        let name = tokens.next().unwrap_or("");
        (name, tokens.collect())
    }
}

pub struct LineReader<R: BufRead> {
    source: R,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(source: R) -> Self {
        Self::starting_at(source, 1)
    }

    /// Numbers lines from `first_line`, for sources whose leading lines were consumed.
    pub fn starting_at(source: R, first_line: usize) -> Self {
        Self {
            source,
            line: first_line.saturating_sub(1),
        }
    }

    /// Next line without its terminator (`\n` or `\r\n`), `None` at end of input.
    pub fn next_line(&mut self) -> std::io::Result<Option<Line>> {
        let mut text = String::new();
        if self.source.read_line(&mut text)? == 0 {
            return Ok(None);
        }
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        self.line += 1;
        Ok(Some(Line {
            number: self.line,
            text,
        }))
    }

    /// Number of the last line returned.
    pub fn line_number(&self) -> usize {
        self.line
    }
}
