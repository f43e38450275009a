//! Incremental readers for the Redis Serialization Protocol.
//!
//! [`ReplyReader`] reads server replies the way a client does, and
//! [`CommandReader`] reads client commands (multibulk or inline) the way a
//! server does. Both work over a blocking [`std::io::Read`] or a
//! [`tokio::io::AsyncRead`], tolerate arbitrarily fragmented input, and hand
//! out each unit as the exact bytes it was read from.
//!
//! ```
//! use resp_reader::CommandReader;
//!
//! let mut reader = CommandReader::new(&b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\nPING\r\n"[..]);
//! let get = reader.read().unwrap();
//! assert_eq!(get.name(), Some(&b"GET"[..]));
//! let ping = reader.read().unwrap();
//! assert_eq!(ping.parts(), &["PING"]);
//! ```

pub mod command;
pub mod error;
pub mod error_value;
pub mod inline;
pub mod reader;
pub mod reply;
pub mod scan;

pub use command::{Command, parse_command};
pub use error::{Error, ParseError, ParseResult, Result};
pub use error_value::ErrorValue;
pub use reader::{CommandReader, Decode, Reader, ReaderConfig, ReplyReader};
pub use reply::{Reply, parse_reply};
