//! Primitive scanners for the fixed-grammar tokens of RESP.
//!
//! Every scanner takes the bytes following a lead byte and returns the number
//! of bytes consumed together with the scanned token, or
//! [`ParseError::Incomplete`] when the token is not fully buffered yet.

use std::ops::Range;

use crate::error::{ParseError, ParseResult};
use crate::error_value::ErrorValue;

/// Largest bulk string payload accepted, in bytes.
pub const MAX_BULK_LENGTH: i64 = 512 * 1024 * 1024;

/// Largest element count accepted for a multibulk command.
pub const MAX_MULTIBULK_LENGTH: i64 = 1024 * 1024;

const CRLF_LEN: usize = 2;

/// Length of the line up to and including its `\r\n`.
fn line_end(data: &[u8]) -> ParseResult<usize> {
    let Some(cr) = data.iter().position(|&b| b == b'\r') else {
        return Err(ParseError::Incomplete);
    };
    match data.get(cr + 1) {
        None => Err(ParseError::Incomplete),
        Some(b'\n') => Ok(cr + CRLF_LEN),
        Some(_) => Err(ParseError::InvalidValue),
    }
}

/// Scan an unsigned decimal integer terminated by `\r\n`.
///
/// Overflow is only caught when the accumulator goes down after adding a
/// digit, so some wrapped values are accepted.
pub fn scan_integer(data: &[u8]) -> ParseResult<(usize, i64)> {
    let len = line_end(data).map_err(|err| match err {
        ParseError::Incomplete => err,
        _ => ParseError::InvalidInteger,
    })?;
    let digits = &data[..len - CRLF_LEN];
    if digits.is_empty() {
        return Err(ParseError::InvalidInteger);
    }

    let mut n: i64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return Err(ParseError::InvalidInteger);
        }
        let prev = n;
        n = n.wrapping_mul(10).wrapping_add(i64::from(c - b'0'));
        if n < prev {
            return Err(ParseError::InvalidInteger);
        }
    }
    Ok((len, n))
}

/// Scan an integer that may carry a leading `-`.
pub(crate) fn scan_signed(data: &[u8]) -> ParseResult<(usize, i64)> {
    match data.first() {
        Some(b'-') => {
            let (len, n) = scan_integer(&data[1..])?;
            Ok((len + 1, -n))
        }
        _ => scan_integer(data),
    }
}

/// Scan a line terminated by `\r\n`, returning its content unparsed.
pub fn scan_line(data: &[u8]) -> ParseResult<(usize, &[u8])> {
    let len = line_end(data)?;
    Ok((len, &data[..len - CRLF_LEN]))
}

/// Scan `<len>\r\n<payload>\r\n`, returning the payload's range in `data`.
///
/// Only non-negative lengths up to [`MAX_BULK_LENGTH`] are accepted; callers
/// that allow the null form check for it first.
pub fn scan_bulk(data: &[u8]) -> ParseResult<(usize, Range<usize>)> {
    let (header, n) = match scan_integer(data) {
        Ok((_, n)) if n > MAX_BULK_LENGTH => return Err(ErrorValue::INVALID_BULK_LENGTH.into()),
        Ok(scanned) => scanned,
        Err(ParseError::Incomplete) => return Err(ParseError::Incomplete),
        Err(_) => return Err(ErrorValue::INVALID_BULK_LENGTH.into()),
    };
    // n is bounded above, so this cannot overflow
    let n = n as usize;
    let len = header + n + CRLF_LEN;
    if data.len() < len {
        return Err(ParseError::Incomplete);
    }
    if &data[header + n..len] != b"\r\n" {
        return Err(ErrorValue::INVALID_BULK_LENGTH.into());
    }
    Ok((len, header..header + n))
}

/// Blank bytes separating inline command arguments.
pub(crate) fn is_blank(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

pub(crate) fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_integer() {
        assert_eq!(scan_integer(b"1234\r\n"), Ok((6, 1234)));
        assert_eq!(scan_integer(b"0\r\nrest"), Ok((3, 0)));
        assert_eq!(scan_integer(b"\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(scan_integer(b"-1\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(scan_integer(b"12a\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(scan_integer(b"12\rx"), Err(ParseError::InvalidInteger));
    }

    #[test]
    fn test_scan_integer_incomplete() {
        for input in [&b""[..], b"12", b"12\r"] {
            assert_eq!(scan_integer(input), Err(ParseError::Incomplete));
        }
    }

    #[test]
    fn test_scan_integer_overflow() {
        assert_eq!(
            scan_integer(b"9223372036854775807\r\n"),
            Ok((21, i64::MAX))
        );
        assert_eq!(
            scan_integer(b"9223372036854775808\r\n"),
            Err(ParseError::InvalidInteger)
        );
        assert_eq!(
            scan_integer(b"99999999999999999999\r\n"),
            Err(ParseError::InvalidInteger)
        );
    }

    #[test]
    fn test_scan_signed() {
        assert_eq!(scan_signed(b"-1\r\n"), Ok((4, -1)));
        assert_eq!(scan_signed(b"42\r\n"), Ok((4, 42)));
        assert_eq!(scan_signed(b"-\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(scan_signed(b"-"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_scan_line() {
        assert_eq!(scan_line(b"OK\r\n"), Ok((4, &b"OK"[..])));
        assert_eq!(scan_line(b"\r\n"), Ok((2, &b""[..])));
        assert_eq!(scan_line(b"OK\r"), Err(ParseError::Incomplete));
        assert_eq!(scan_line(b"OK"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_scan_bulk() {
        let data = b"5\r\nhello\r\n";
        assert_eq!(scan_bulk(data), Ok((10, 3..8)));
        assert_eq!(scan_bulk(b"0\r\n\r\n"), Ok((5, 3..3)));
        for n in 0..data.len() {
            assert_eq!(scan_bulk(&data[..n]), Err(ParseError::Incomplete));
        }
    }

    #[test]
    fn test_scan_bulk_rejects_bad_lengths() {
        let invalid = ParseError::Protocol(ErrorValue::INVALID_BULK_LENGTH);
        assert_eq!(scan_bulk(b"-1\r\n"), Err(invalid.clone()));
        assert_eq!(scan_bulk(b"abc\r\n"), Err(invalid.clone()));
        assert_eq!(scan_bulk(b"\r\n"), Err(invalid.clone()));
        assert_eq!(scan_bulk(b"3\r\nabcd\r\n"), Err(invalid.clone()));
        // 600 MiB is refused without waiting for the payload
        assert_eq!(scan_bulk(b"629145600\r\n"), Err(invalid.clone()));
        assert_eq!(scan_bulk(b"536870913\r\n"), Err(invalid));
        assert_eq!(scan_bulk(b"536870912\r\n"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_hex_value() {
        assert_eq!(hex_value(b'0'), Some(0));
        assert_eq!(hex_value(b'a'), Some(10));
        assert_eq!(hex_value(b'F'), Some(15));
        assert_eq!(hex_value(b'g'), None);
    }
}
