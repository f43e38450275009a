//! Client commands: a multibulk array of bulk strings, or an inline line.

use std::borrow::Cow;
use std::ops::Range;

use bytes::Bytes;

use crate::error::{ParseError, ParseResult};
use crate::error_value::ErrorValue;
use crate::inline::tokenize;
use crate::scan::{MAX_MULTIBULK_LENGTH, is_blank, scan_bulk, scan_integer};

/// One command read off a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    data: Bytes,
    parts: Vec<Bytes>,
}

impl Command {
    pub(crate) fn new(data: Bytes, parts: Vec<Bytes>) -> Self {
        Self { data, parts }
    }

    /// The raw bytes the command was read from.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn parts(&self) -> &[Bytes] {
        &self.parts
    }

    /// The first argument, if any.
    pub fn name(&self) -> Option<&[u8]> {
        self.parts.first().map(|part| &part[..])
    }

    /// True for a multibulk `*0` with no arguments.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn into_parts(self) -> Vec<Bytes> {
        self.parts
    }
}

/// Where a parsed argument lives: a range of the unit it was read from, or
/// bytes decoded out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Span(Range<usize>),
    Owned(Vec<u8>),
}

impl Arg {
    fn shift(self, offset: usize) -> Self {
        match self {
            Arg::Span(range) => Arg::Span(range.start + offset..range.end + offset),
            owned => owned,
        }
    }

    pub(crate) fn into_bytes(self, unit: &Bytes) -> Bytes {
        match self {
            Arg::Span(range) => unit.slice(range),
            Arg::Owned(part) => Bytes::from(part),
        }
    }
}

/// Parse the first command in `data`, returning its length and arguments.
/// Multibulk arguments borrow from `data`; inline ones are decoded copies.
pub fn parse_command(data: &[u8]) -> ParseResult<(usize, Vec<Cow<'_, [u8]>>)> {
    let (len, args) = command_args(data)?;
    let parts = args
        .into_iter()
        .map(|arg| match arg {
            Arg::Span(range) => Cow::Borrowed(&data[range]),
            Arg::Owned(part) => Cow::Owned(part),
        })
        .collect();
    Ok((len, parts))
}

pub(crate) fn command_args(data: &[u8]) -> ParseResult<(usize, Vec<Arg>)> {
    let Some(&lead) = data.first() else {
        return Err(ParseError::Incomplete);
    };
    if lead == b'*' {
        return multibulk(data);
    }

    // blank lines before a command are skipped
    let mut pos = 0;
    let line_len = loop {
        let Some(newline) = data[pos..].iter().position(|&b| b == b'\n') else {
            return Err(ParseError::Incomplete);
        };
        if !data[pos..pos + newline].iter().all(|&c| is_blank(c)) {
            break newline + 1;
        }
        pos += newline + 1;
        if pos == data.len() {
            return Err(ParseError::Incomplete);
        }
    };

    if pos > 0 {
        let (len, args) = command_args(&data[pos..])?;
        let args = args.into_iter().map(|arg| arg.shift(pos)).collect();
        return Ok((pos + len, args));
    }

    let parts = tokenize(&data[..line_len])?;
    Ok((line_len, parts.into_iter().map(Arg::Owned).collect()))
}

fn multibulk(data: &[u8]) -> ParseResult<(usize, Vec<Arg>)> {
    let (header, count) = match scan_integer(&data[1..]) {
        Ok((_, count)) if count > MAX_MULTIBULK_LENGTH => {
            return Err(ErrorValue::INVALID_MULTIBULK_LENGTH.into());
        }
        Ok(scanned) => scanned,
        Err(ParseError::Incomplete) => return Err(ParseError::Incomplete),
        Err(_) => return Err(ErrorValue::INVALID_MULTIBULK_LENGTH.into()),
    };

    let mut len = 1 + header;
    // the count is untrusted, so it does not size the allocation
    let mut args = Vec::with_capacity((count as usize).min(16));
    for _ in 0..count {
        let rest = &data[len..];
        match rest.first() {
            None => return Err(ParseError::Incomplete),
            Some(b'$') => {}
            Some(&other) => return Err(ErrorValue::expected_bulk(other).into()),
        }
        let (bulk_len, payload) = scan_bulk(&rest[1..])?;
        let start = len + 1;
        args.push(Arg::Span(start + payload.start..start + payload.end));
        len = start + bulk_len;
    }
    Ok((len, args))
}
