//! Buffered readers that pull bytes from a source until one whole protocol
//! unit is available.
//!
//! A reader keeps the bytes it has read but not yet returned. Each `read`
//! parses from the front of that buffer; when the parser needs more data the
//! reader reads from its source and tries again, otherwise the unit is split
//! off the buffer and handed out. A grammar error leaves the buffer as it is,
//! so every later `read` fails the same way.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

use crate::command::{Arg, Command, command_args};
use crate::error::{Error, ParseResult, Result};
use crate::reply::{DEFAULT_MAX_DEPTH, Reply, reply_len};

/// Tuning knobs shared by all readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Bytes requested from the source per read.
    pub read_size: usize,
    /// Ceiling on buffered, unconsumed bytes.
    pub max_buffer_size: usize,
    /// How deeply reply arrays may nest.
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_size: 1024,
            max_buffer_size: 1024 * 1024 * 1024,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReaderConfig {
    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size.max(1);
        self
    }

    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// The grammar a [`Reader`] reads.
pub trait Decode {
    /// What parsing learns about a unit besides its length.
    type Parsed;
    /// What the reader hands out per unit.
    type Output;

    /// Measure the first unit in `data`.
    fn parse(&self, data: &[u8], config: &ReaderConfig) -> ParseResult<(usize, Self::Parsed)>;

    /// Build the output once the unit has been split off the buffer.
    fn finish(&self, unit: Bytes, parsed: Self::Parsed) -> Self::Output;
}

/// Reads whole server replies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplyDecoder;

impl Decode for ReplyDecoder {
    type Parsed = ();
    type Output = Bytes;

    fn parse(&self, data: &[u8], config: &ReaderConfig) -> ParseResult<(usize, ())> {
        reply_len(data, config.max_depth).map(|len| (len, ()))
    }

    fn finish(&self, unit: Bytes, _parsed: ()) -> Bytes {
        unit
    }
}

/// Reads client commands, multibulk or inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandDecoder;

impl Decode for CommandDecoder {
    type Parsed = Vec<Arg>;
    type Output = Command;

    fn parse(&self, data: &[u8], _config: &ReaderConfig) -> ParseResult<(usize, Vec<Arg>)> {
        command_args(data)
    }

    fn finish(&self, unit: Bytes, parsed: Vec<Arg>) -> Command {
        let parts = parsed.into_iter().map(|arg| arg.into_bytes(&unit)).collect();
        Command::new(unit, parts)
    }
}

/// A reader of server replies, as a client sees them.
pub type ReplyReader<R> = Reader<R, ReplyDecoder>;

/// A reader of client commands, as a server sees them.
pub type CommandReader<R> = Reader<R, CommandDecoder>;

/// Buffers bytes from `R` and yields one unit of `D`'s grammar per read.
///
/// Not meant to be shared; wrap one reader around one connection.
#[derive(Debug)]
pub struct Reader<R, D> {
    src: R,
    decoder: D,
    buf: BytesMut,
    scratch: Vec<u8>,
    config: ReaderConfig,
}

impl<R, D: Decode + Default> Reader<R, D> {
    pub fn new(src: R) -> Self {
        Self::with_config(src, ReaderConfig::default())
    }

    pub fn with_config(src: R, config: ReaderConfig) -> Self {
        Self {
            src,
            decoder: D::default(),
            buf: BytesMut::new(),
            scratch: vec![0; config.read_size.max(1)],
            config,
        }
    }
}

impl<R, D: Decode> Reader<R, D> {
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Bytes read from the source but not yet returned.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    pub fn get_ref(&self) -> &R {
        &self.src
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.src
    }

    pub fn into_inner(self) -> R {
        self.src
    }

    /// Split the next unit off the buffer, or `None` if it is not all here.
    fn next_unit(&mut self) -> Result<Option<D::Output>> {
        match self.decoder.parse(&self.buf, &self.config) {
            Ok((len, parsed)) => {
                let unit = self.buf.split_to(len).freeze();
                Ok(Some(self.decoder.finish(unit, parsed)))
            }
            Err(err) if err.is_incomplete() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Append the first `n` scratch bytes to the buffer.
    fn append(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(Error::Eof);
        }
        let limit = self.config.max_buffer_size;
        if self.buf.len() + n > limit {
            warn!("Read buffer limit of {} bytes reached", limit);
            return Err(Error::BufferTooLarge { limit });
        }
        self.buf.extend_from_slice(&self.scratch[..n]);
        trace!("Read {} bytes, {} buffered", n, self.buf.len());
        Ok(())
    }
}

impl<R: io::Read, D: Decode> Reader<R, D> {
    /// Read one unit, blocking on the source as needed.
    pub fn read(&mut self) -> Result<D::Output> {
        loop {
            if let Some(output) = self.next_unit()? {
                return Ok(output);
            }
            let n = match io::Read::read(&mut self.src, &mut self.scratch) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.append(n)?;
        }
    }
}

impl<R: AsyncRead + Unpin, D: Decode> Reader<R, D> {
    /// Read one unit from an async source.
    ///
    /// Cancel safe: bytes are only buffered once a read has completed, so
    /// dropping the future loses nothing.
    pub async fn read_async(&mut self) -> Result<D::Output> {
        loop {
            if let Some(output) = self.next_unit()? {
                return Ok(output);
            }
            let n = AsyncReadExt::read(&mut self.src, &mut self.scratch).await?;
            self.append(n)?;
        }
    }
}

impl<R: io::Read> ReplyReader<R> {
    /// Read one reply and decode it.
    pub fn read_reply(&mut self) -> Result<Reply> {
        let unit = self.read()?;
        Ok(Reply::decode_with_depth(&unit, self.config.max_depth)?)
    }
}

impl<R: AsyncRead + Unpin> ReplyReader<R> {
    pub async fn read_reply_async(&mut self) -> Result<Reply> {
        let unit = self.read_async().await?;
        Ok(Reply::decode_with_depth(&unit, self.config.max_depth)?)
    }
}
