//! RESP error values.
//!
//! An error value is the text of a `-` reply: `"<prefix> <message>"`, where
//! the prefix is everything before the first space. The stored text must not
//! contain `\r` or `\n`; encoding does not escape them.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// An error that can be sent to a client verbatim as a RESP error reply.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorValue(Bytes);

impl ErrorValue {
    pub const UNBALANCED_QUOTES: ErrorValue =
        ErrorValue(Bytes::from_static(b"ERR Protocol error: unbalanced quotes in request"));
    pub const INVALID_MULTIBULK_LENGTH: ErrorValue =
        ErrorValue(Bytes::from_static(b"ERR Protocol error: invalid multibulk length"));
    pub const INVALID_BULK_LENGTH: ErrorValue =
        ErrorValue(Bytes::from_static(b"ERR Protocol error: invalid bulk length"));

    pub fn new<B: Into<Bytes>>(text: B) -> Self {
        ErrorValue(text.into())
    }

    /// Error for a multibulk element that does not start with `$`.
    pub fn expected_bulk(got: u8) -> Self {
        // keep the error line itself free of control bytes
        let got = if got.is_ascii_control() { ' ' } else { char::from(got) };
        ErrorValue(Bytes::from(format!(
            "ERR Protocol error: expected '$', got '{got}'"
        )))
    }

    /// Decode an error from its wire form. The input is expected to start
    /// with `-` and end with `\r\n`; anything of three bytes or fewer is the
    /// empty error.
    pub fn parse(wire: &[u8]) -> Self {
        if wire.len() <= 3 {
            return ErrorValue::default();
        }
        ErrorValue(Bytes::copy_from_slice(&wire[1..wire.len() - 2]))
    }

    /// Text before the first space, or all of it.
    pub fn prefix(&self) -> &[u8] {
        match self.0.iter().position(|&b| b == b' ') {
            Some(pos) => &self.0[..pos],
            None => &self.0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Wire form: `-<text>\r\n`.
    pub fn resp(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.0.len() + 3);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u8(b'-');
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(b"\r\n");
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorValue({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl std::error::Error for ErrorValue {}

impl From<&'static str> for ErrorValue {
    fn from(text: &'static str) -> Self {
        ErrorValue(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for ErrorValue {
    fn from(text: String) -> Self {
        ErrorValue(Bytes::from(text))
    }
}
