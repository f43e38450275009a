//! Tokenizer for inline commands: whitespace separated arguments on a single
//! line, with shell-like quoting.
//!
//! Double quotes support `\xHH` and the usual C escapes, single quotes only
//! `\'`. A closing quote must be followed by a blank or the end of the line,
//! and quoted and unquoted fragments directly next to each other form one
//! argument.

use crate::error::{ParseError, ParseResult};
use crate::error_value::ErrorValue;
use crate::scan::{hex_value, is_blank};

/// Split one line (including its trailing `\n`) into arguments.
pub fn tokenize(line: &[u8]) -> ParseResult<Vec<Vec<u8>>> {
    let mut parts = Vec::new();
    let mut pos = skip_blanks(line, 0);
    while pos < line.len() {
        let (len, part) = token(&line[pos..])?;
        parts.push(part);
        pos = skip_blanks(line, pos + len);
    }
    Ok(parts)
}

fn skip_blanks(line: &[u8], mut pos: usize) -> usize {
    while pos < line.len() && (line[pos] == 0 || is_blank(line[pos])) {
        pos += 1;
    }
    pos
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Double,
    Single,
}

/// Read one argument from the start of `data`, returning the number of bytes
/// it spans and its decoded content.
fn token(data: &[u8]) -> ParseResult<(usize, Vec<u8>)> {
    let unbalanced = || ParseError::Protocol(ErrorValue::UNBALANCED_QUOTES);
    // a closing quote must end the argument
    let closes = |at: usize| data.get(at).is_none_or(|&c| is_blank(c));

    let mut part = Vec::new();
    let mut quote = Quote::None;
    let mut pos = 0;
    while pos < data.len() {
        let c = data[pos];
        match quote {
            Quote::Double => match c {
                b'\\' => {
                    let hex = match (data.get(pos + 1), data.get(pos + 2), data.get(pos + 3)) {
                        (Some(b'x'), Some(&hi), Some(&lo)) => {
                            hex_value(hi).zip(hex_value(lo)).map(|(hi, lo)| (hi << 4) | lo)
                        }
                        _ => None,
                    };
                    if let Some(byte) = hex {
                        part.push(byte);
                        pos += 3;
                    } else if let Some(&escaped) = data.get(pos + 1) {
                        part.push(match escaped {
                            b'n' => b'\n',
                            b'r' => b'\r',
                            b't' => b'\t',
                            b'b' => 0x08,
                            b'a' => 0x07,
                            other => other,
                        });
                        pos += 1;
                    }
                }
                b'"' => {
                    if !closes(pos + 1) {
                        return Err(unbalanced());
                    }
                    quote = Quote::None;
                }
                0 => return Err(unbalanced()),
                _ => part.push(c),
            },
            Quote::Single => match c {
                b'\\' if data.get(pos + 1) == Some(&b'\'') => {
                    part.push(b'\'');
                    pos += 1;
                }
                b'\'' => {
                    if !closes(pos + 1) {
                        return Err(unbalanced());
                    }
                    quote = Quote::None;
                }
                _ => part.push(c),
            },
            Quote::None => match c {
                0 => return Ok((pos + 1, part)),
                c if is_blank(c) => return Ok((pos + 1, part)),
                b'"' => quote = Quote::Double,
                b'\'' => quote = Quote::Single,
                _ => part.push(c),
            },
        }
        pos += 1;
    }

    if quote != Quote::None {
        return Err(unbalanced());
    }
    Ok((pos, part))
}
