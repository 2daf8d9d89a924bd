//! Input sources and output sinks the engine talks to.
//!
//! The engine reads one unit per `,` and writes one character per `.`; it never
//! touches stdin or stdout directly except as the fallback when no sink is set.

use std::io::{self, BufRead, Seek, SeekFrom, Write};

use crate::tape::Cell;

/// A sequential source of input units.
pub trait InputSource {
    /// Next unit as a character code, or `None` once the source is exhausted.
    fn next_unit(&mut self) -> io::Result<Option<Cell>>;

    /// Reposition to the start. Returns `false` when the source cannot rewind.
    fn rewind(&mut self) -> io::Result<bool> {
        Ok(false)
    }

    /// Units consumed so far, when the source keeps track.
    fn position(&self) -> Option<u64> {
        None
    }
}

/// A sequential character sink.
pub trait OutputSink {
    fn put_char(&mut self, ch: char) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> OutputSink for W {
    fn put_char(&mut self, ch: char) -> io::Result<()> {
        let mut buf = [0u8; 4];
        self.write_all(ch.encode_utf8(&mut buf).as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

/// In-memory text input; each Unicode scalar value is one unit.
#[derive(Debug, Clone, Default)]
pub struct StrInput {
    chars: Vec<char>,
    pos: usize,
}

impl StrInput {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }
}

impl InputSource for StrInput {
    fn next_unit(&mut self) -> io::Result<Option<Cell>> {
        let Some(&ch) = self.chars.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;
        Ok(Some(Cell::from(u32::from(ch))))
    }

    fn rewind(&mut self) -> io::Result<bool> {
        self.pos = 0;
        Ok(true)
    }

    fn position(&self) -> Option<u64> {
        Some(self.pos as u64)
    }
}

/// UTF-8 decoding reader over any buffered stream, e.g. locked stdin.
pub struct CharReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: BufRead> CharReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.inner.consume(1);
        Ok(Some(byte))
    }

    fn read_char(&mut self) -> io::Result<Option<char>> {
        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };
        let width = match lead {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Err(invalid_utf8()),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            *slot = self.read_byte()?.ok_or_else(invalid_utf8)?;
        }
        let decoded = std::str::from_utf8(&bytes[..width]).map_err(|_| invalid_utf8())?;
        self.consumed += 1;
        Ok(decoded.chars().next())
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "input is not valid UTF-8")
}

impl<R: BufRead> InputSource for CharReader<R> {
    fn next_unit(&mut self) -> io::Result<Option<Cell>> {
        Ok(self.read_char()?.map(|ch| Cell::from(u32::from(ch))))
    }

    fn position(&self) -> Option<u64> {
        Some(self.consumed)
    }
}

/// [`CharReader`] over a seekable stream, such as an opened file; supports rewinding.
pub struct SeekableCharReader<R> {
    reader: CharReader<R>,
}

impl<R: BufRead + Seek> SeekableCharReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: CharReader::new(inner),
        }
    }
}

impl<R: BufRead + Seek> InputSource for SeekableCharReader<R> {
    fn next_unit(&mut self) -> io::Result<Option<Cell>> {
        self.reader.next_unit()
    }

    fn rewind(&mut self) -> io::Result<bool> {
        self.reader.inner.seek(SeekFrom::Start(0))?;
        self.reader.consumed = 0;
        Ok(true)
    }

    fn position(&self) -> Option<u64> {
        self.reader.position()
    }
}
