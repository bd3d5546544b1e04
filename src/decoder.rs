use std::io::{self, BufRead, ErrorKind, Read};

use log::trace;

/// Longest ASCII token accepted as a number, in bytes.
pub const MAX_TOKEN_LEN: usize = 127;

/// Encoding of the incoming stream. Binary records use native byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Ascii,
    F32,
    F64,
    I16,
    I32,
    I64,
}

impl Format {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.chars().next()? {
            'a' => Some(Format::Ascii),
            'f' => Some(Format::F32),
            'd' => Some(Format::F64),
            's' => Some(Format::I16),
            'i' => Some(Format::I32),
            'l' => Some(Format::I64),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::F32 => "float",
            Format::F64 => "double",
            Format::I16 => "short",
            Format::I32 => "int",
            Format::I64 => "long",
        }
    }
}

/// Pulls one value at a time out of a byte stream.
#[derive(Clone, Debug)]
pub struct Decoder {
    format: Format,
    max_token_len: usize,
    escapes: bool,
}

impl Decoder {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            max_token_len: MAX_TOKEN_LEN,
            escapes: false,
        }
    }

    pub fn with_max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len.max(1);
        self
    }

    /// Treat infinities as in-band control markers instead of data.
    pub fn with_escapes(mut self, escapes: bool) -> Self {
        self.escapes = escapes;
        self
    }

    /// Next value, or `None` at end of stream.
    pub fn read_next<R: BufRead>(&self, reader: &mut R) -> io::Result<Option<f64>> {
        loop {
            let value = match self.read_value(reader)? {
                Some(value) => value,
                None => return Ok(None),
            };
            if self.escapes && value.is_infinite() {
                // Markers carry no payload yet; consume and keep reading.
                trace!("skipping escape marker {value}");
                continue;
            }
            return Ok(Some(value));
        }
    }

    fn read_value<R: BufRead>(&self, reader: &mut R) -> io::Result<Option<f64>> {
        let value = match self.format {
            Format::Ascii => return self.read_ascii(reader),
            Format::F32 => read_record(reader)?.map(|b| f32::from_ne_bytes(b) as f64),
            Format::F64 => read_record(reader)?.map(f64::from_ne_bytes),
            Format::I16 => read_record(reader)?.map(|b| i16::from_ne_bytes(b) as f64),
            Format::I32 => read_record(reader)?.map(|b| i32::from_ne_bytes(b) as f64),
            Format::I64 => read_record(reader)?.map(|b| i64::from_ne_bytes(b) as f64),
        };
        Ok(value)
    }

    fn read_ascii<R: BufRead>(&self, reader: &mut R) -> io::Result<Option<f64>> {
        let mut token = Vec::with_capacity(self.max_token_len);
        loop {
            skip_while(reader, |b| b.is_ascii_whitespace())?;
            token.clear();
            match read_token(reader, &mut token, self.max_token_len)? {
                Token::Complete => {}
                // A token cut short by the end of the stream may be a partial
                // number; never report it.
                Token::Eof => return Ok(None),
                Token::Overflow => {
                    skip_while(reader, |b| !b.is_ascii_whitespace())?;
                    continue;
                }
            }
            if let Some(value) = parse_leading_number(&token) {
                return Ok(Some(value));
            }
        }
    }
}

enum Token {
    Complete,
    Eof,
    Overflow,
}

fn read_record<const N: usize, R: Read>(reader: &mut R) -> io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf)),
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err),
    }
}

fn peek_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf.first().copied()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

fn skip_while<R: BufRead>(reader: &mut R, pred: impl Fn(u8) -> bool) -> io::Result<()> {
    while let Some(byte) = peek_byte(reader)? {
        if !pred(byte) {
            break;
        }
        reader.consume(1);
    }
    Ok(())
}

fn read_token<R: BufRead>(reader: &mut R, token: &mut Vec<u8>, max: usize) -> io::Result<Token> {
    while token.len() < max {
        match peek_byte(reader)? {
            None => return Ok(Token::Eof),
            Some(byte) if byte.is_ascii_whitespace() => return Ok(Token::Complete),
            Some(byte) => {
                token.push(byte);
                reader.consume(1);
            }
        }
    }
    match peek_byte(reader)? {
        None => Ok(Token::Eof),
        Some(byte) if byte.is_ascii_whitespace() => Ok(Token::Complete),
        Some(_) => Ok(Token::Overflow),
    }
}

/// Parse the longest numeric prefix of `token`, so "12.5ms" reads as 12.5
/// and "0x10" as 16. Bytes past the first invalid UTF-8 sequence are ignored.
pub fn parse_leading_number(token: &[u8]) -> Option<f64> {
    let text = match std::str::from_utf8(token) {
        Ok(text) => text,
        Err(err) => std::str::from_utf8(&token[..err.valid_up_to()]).ok()?,
    };
    if let Some(value) = parse_hex(text) {
        return Some(value);
    }
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
}

/// `[+-]0x` hex mantissa with optional fraction and binary `p` exponent.
fn parse_hex(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let (negative, mut at) = match bytes.first() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    };
    if !matches!(bytes.get(at..at + 2), Some([b'0', b'x' | b'X'])) {
        return None;
    }
    at += 2;

    let mut mantissa = 0.0f64;
    let mut digits = 0;
    let mut scale = 0i32;
    let mut fraction = false;
    while let Some(&byte) = bytes.get(at) {
        if byte == b'.' && !fraction {
            fraction = true;
        } else if let Some(digit) = (byte as char).to_digit(16) {
            mantissa = mantissa * 16.0 + f64::from(digit);
            digits += 1;
            if fraction {
                scale -= 4;
            }
        } else {
            break;
        }
        at += 1;
    }
    if digits == 0 {
        // Only the leading "0" is numeric.
        return Some(if negative { -0.0 } else { 0.0 });
    }

    if let Some(b'p' | b'P') = bytes.get(at) {
        let rest = &text[at + 1..];
        let sign = usize::from(rest.starts_with(['+', '-']));
        let len = sign + rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
        if len > sign {
            let exponent = rest[..len].parse::<i32>().unwrap_or(if rest.starts_with('-') {
                i32::MIN / 2
            } else {
                i32::MAX / 2
            });
            scale = scale.saturating_add(exponent);
        }
    }
    let value = mantissa * 2f64.powi(scale);
    Some(if negative { -value } else { value })
}
