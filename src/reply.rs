//! RESP reply values, as sent by a server.
//!
//! [`parse_reply`] only measures one reply unit; [`Reply::decode`] builds the
//! value tree from it.

use bytes::{Bytes, BytesMut};

use crate::error::{ParseError, ParseResult};
use crate::error_value::ErrorValue;
use crate::scan::{scan_bulk, scan_integer, scan_line, scan_signed};

/// Default limit on how deeply reply arrays may nest.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Simple string: +OK\r\n
    Simple(Bytes),
    /// Error: -ERR message\r\n
    Error(ErrorValue),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $5\r\nhello\r\n or $-1\r\n (null)
    Bulk(Option<Bytes>),
    /// Array: *2\r\n... or *-1\r\n (null)
    Array(Option<Vec<Reply>>),
}

/// Return the length of the first reply unit in `data`.
pub fn parse_reply(data: &[u8]) -> ParseResult<usize> {
    reply_len(data, DEFAULT_MAX_DEPTH)
}

pub(crate) fn reply_len(data: &[u8], max_depth: usize) -> ParseResult<usize> {
    scan_value(data, 0, max_depth)
}

fn scan_value(data: &[u8], depth: usize, max_depth: usize) -> ParseResult<usize> {
    let Some(&lead) = data.first() else {
        return Err(ParseError::Incomplete);
    };
    let rest = &data[1..];

    let len = match lead {
        b'+' | b'-' => scan_line(rest)?.0,
        b':' => scan_integer(rest)?.0,
        b'$' => scan_reply_bulk(rest)?.0,
        b'*' => {
            if depth == max_depth {
                return Err(ParseError::TooDeep(max_depth));
            }
            let (mut len, count) = scan_signed(rest)?;
            for _ in 0..count.max(0) {
                len += scan_value(&rest[len..], depth + 1, max_depth)?;
            }
            len
        }
        _ => return Err(ParseError::InvalidValue),
    };
    Ok(len + 1)
}

/// Scan a reply bulk string, where a negative length is the null marker.
fn scan_reply_bulk(data: &[u8]) -> ParseResult<(usize, Option<std::ops::Range<usize>>)> {
    if data.first() == Some(&b'-') {
        return match scan_signed(data) {
            Ok((len, _)) => Ok((len, None)),
            Err(ParseError::Incomplete) => Err(ParseError::Incomplete),
            Err(_) => Err(ErrorValue::INVALID_BULK_LENGTH.into()),
        };
    }
    let (len, payload) = scan_bulk(data)?;
    Ok((len, Some(payload)))
}

impl Reply {
    /// Decode the first reply in `data`, returning its length and value.
    /// Strings in the result share `data`'s storage.
    pub fn decode(data: &Bytes) -> ParseResult<(usize, Reply)> {
        decode_value(data, 0, 0, DEFAULT_MAX_DEPTH)
    }

    pub(crate) fn decode_with_depth(data: &Bytes, max_depth: usize) -> ParseResult<Reply> {
        decode_value(data, 0, 0, max_depth).map(|(_, reply)| reply)
    }

    /// Encode a reply to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf
    }

    /// Encode a reply into an existing buffer
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Reply::Simple(s) => {
                buf.extend_from_slice(b"+");
                buf.extend_from_slice(s);
                buf.extend_from_slice(b"\r\n");
            }
            Reply::Error(err) => err.encode_into(buf),
            Reply::Integer(n) => {
                buf.extend_from_slice(b":");
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Reply::Bulk(None) => buf.extend_from_slice(b"$-1\r\n"),
            Reply::Bulk(Some(data)) => {
                buf.extend_from_slice(b"$");
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            Reply::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
            Reply::Array(Some(items)) => {
                buf.extend_from_slice(b"*");
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.encode_into(buf);
                }
            }
        }
    }

}

fn decode_value(
    data: &Bytes,
    start: usize,
    depth: usize,
    max_depth: usize,
) -> ParseResult<(usize, Reply)> {
    let Some(&lead) = data.get(start) else {
        return Err(ParseError::Incomplete);
    };
    let body = start + 1;
    let rest = &data[body..];

    let (len, reply) = match lead {
        b'+' => {
            let (len, line) = scan_line(rest)?;
            (len, Reply::Simple(data.slice_ref(line)))
        }
        b'-' => {
            let (len, line) = scan_line(rest)?;
            (len, Reply::Error(ErrorValue::new(data.slice_ref(line))))
        }
        b':' => {
            let (len, n) = scan_integer(rest)?;
            (len, Reply::Integer(n))
        }
        b'$' => {
            let (len, payload) = scan_reply_bulk(rest)?;
            let bulk = payload.map(|range| data.slice(body + range.start..body + range.end));
            (len, Reply::Bulk(bulk))
        }
        b'*' => {
            if depth == max_depth {
                return Err(ParseError::TooDeep(max_depth));
            }
            let (mut len, count) = scan_signed(rest)?;
            if count < 0 {
                (len, Reply::Array(None))
            } else {
                let mut items = Vec::new();
                for _ in 0..count {
                    let (item_len, item) = decode_value(data, body + len, depth + 1, max_depth)?;
                    len += item_len;
                    items.push(item);
                }
                (len, Reply::Array(Some(items)))
            }
        }
        _ => return Err(ParseError::InvalidValue),
    };
    Ok((len + 1, reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replies() -> Vec<(&'static [u8], Reply)> {
        vec![
            (&b"+OK\r\n"[..], Reply::Simple(Bytes::from_static(b"OK"))),
            (&b"+\r\n"[..], Reply::Simple(Bytes::new())),
            (
                &b"-ERR unknown command\r\n"[..],
                Reply::Error(ErrorValue::from("ERR unknown command")),
            ),
            (&b":1000\r\n"[..], Reply::Integer(1000)),
            (&b"$5\r\nhello\r\n"[..], Reply::Bulk(Some(Bytes::from_static(b"hello")))),
            (&b"$0\r\n\r\n"[..], Reply::Bulk(Some(Bytes::new()))),
            (&b"$-1\r\n"[..], Reply::Bulk(None)),
            (&b"*-1\r\n"[..], Reply::Array(None)),
            (&b"*0\r\n"[..], Reply::Array(Some(vec![]))),
            (
                &b"*3\r\n:1\r\n:2\r\n:3\r\n"[..],
                Reply::Array(Some(vec![
                    Reply::Integer(1),
                    Reply::Integer(2),
                    Reply::Integer(3),
                ])),
            ),
            (
                &b"*2\r\n*1\r\n+a\r\n$-1\r\n"[..],
                Reply::Array(Some(vec![
                    Reply::Array(Some(vec![Reply::Simple(Bytes::from_static(b"a"))])),
                    Reply::Bulk(None),
                ])),
            ),
        ]
    }

    #[test]
    fn test_parse_reply_length() {
        for (input, _) in replies() {
            assert_eq!(parse_reply(input), Ok(input.len()), "{:?}", input);
        }
    }

    #[test]
    fn test_parse_reply_ignores_trailing_data() {
        assert_eq!(parse_reply(b"*3\r\n:1\r\n:2\r\n:3\r\n+next\r\n"), Ok(16));
    }

    #[test]
    fn test_every_prefix_is_incomplete() {
        for (input, _) in replies() {
            for n in 0..input.len() {
                assert_eq!(
                    parse_reply(&input[..n]),
                    Err(ParseError::Incomplete),
                    "{:?}",
                    &input[..n]
                );
            }
        }
    }

    #[test]
    fn test_decode_reply() {
        for (input, expected) in replies() {
            let data = Bytes::from_static(input);
            assert_eq!(Reply::decode(&data), Ok((input.len(), expected)));
        }
    }

    #[test]
    fn test_encode_reply() {
        for (input, reply) in replies() {
            assert_eq!(&reply.encode()[..], input);
        }
    }

    #[test]
    fn test_reply_grammar_errors() {
        assert_eq!(parse_reply(b"?\r\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_reply(b":\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(parse_reply(b":12x\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(parse_reply(b":-2\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(
            Reply::decode(&Bytes::from_static(b":-2\r\n")),
            Err(ParseError::InvalidInteger)
        );
        assert_eq!(parse_reply(b"*x\r\n"), Err(ParseError::InvalidInteger));
        assert_eq!(
            parse_reply(b"$abc\r\n"),
            Err(ErrorValue::INVALID_BULK_LENGTH.into())
        );
        assert_eq!(
            parse_reply(b"$-\r\n"),
            Err(ErrorValue::INVALID_BULK_LENGTH.into())
        );
        assert_eq!(
            parse_reply(b"$629145600\r\n"),
            Err(ErrorValue::INVALID_BULK_LENGTH.into())
        );
    }

    #[test]
    fn test_bulk_length_bound() {
        assert_eq!(parse_reply(b"$536870912\r\n"), Err(ParseError::Incomplete));
        assert_eq!(
            parse_reply(b"$536870913\r\n"),
            Err(ErrorValue::INVALID_BULK_LENGTH.into())
        );
    }

    #[test]
    fn test_bare_carriage_return_is_invalid() {
        assert_eq!(parse_reply(b"+a\rb\r\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_reply(b"-ERR\rx\r\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_reply(b":12\r3\r\n"), Err(ParseError::InvalidInteger));
    }

    #[test]
    fn test_array_element_error_propagates() {
        assert_eq!(parse_reply(b"*2\r\n:1\r\n?\r\n"), Err(ParseError::InvalidValue));
        assert_eq!(parse_reply(b"*2\r\n:1\r\n"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_nesting_limit() {
        let mut deep = b"*1\r\n".repeat(4);
        deep.extend_from_slice(b":1\r\n");
        assert_eq!(reply_len(&deep, 4), Ok(deep.len()));
        assert_eq!(reply_len(&deep, 3), Err(ParseError::TooDeep(3)));

        let data = Bytes::from(deep);
        assert_eq!(
            Reply::decode_with_depth(&data, 3),
            Err(ParseError::TooDeep(3))
        );
    }

    #[test]
    fn test_decoded_strings_share_storage() {
        let data = Bytes::from_static(b"$5\r\nhello\r\n");
        let Ok((_, Reply::Bulk(Some(payload)))) = Reply::decode(&data) else {
            panic!("expected bulk string");
        };
        assert_eq!(payload.as_ptr(), data[4..].as_ptr());
    }
}
