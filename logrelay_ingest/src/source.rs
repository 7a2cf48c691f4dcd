//! Pull-based line reading with a declared text encoding.
//!
//! Nothing is read until `next_line` is awaited, so a consumer that awaits
//! other work between calls applies backpressure to the file.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use logrelay_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_BOM: u16 = 0xFEFF;
const LF: u16 = 0x000A;
const CR: u16 = 0x000D;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "utf-16le", alias = "utf16le")]
    Utf16Le,
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16le" | "utf16le" => Ok(Self::Utf16Le),
            other => Err(format!(
                "unsupported encoding '{other}', expected utf-8 or utf-16le"
            )),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf-8"),
            Self::Utf16Le => f.write_str("utf-16le"),
        }
    }
}

/// Lines of a text stream, decoded one at a time.
///
/// Accepts `\n` and `\r\n` terminators and skips a leading byte-order mark.
/// A final line without a terminator is still returned.
pub struct LineSource<R = BufReader<File>> {
    reader: R,
    encoding: TextEncoding,
    origin: PathBuf,
    lines_read: usize,
}

impl LineSource<BufReader<File>> {
    pub async fn open(path: &Path, encoding: TextEncoding) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| Error::filesystem(path, e))?;
        Ok(Self::from_reader(BufReader::new(file), encoding, path))
    }
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn from_reader(reader: R, encoding: TextEncoding, origin: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            encoding,
            origin: origin.into(),
            lines_read: 0,
        }
    }

    #[must_use]
    pub const fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Number of lines returned so far.
    #[must_use]
    pub const fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Read and decode the next line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let line = match self.encoding {
            TextEncoding::Utf8 => self.next_utf8().await,
            TextEncoding::Utf16Le => self.next_utf16le().await,
        }
        .map_err(|e| Error::filesystem(&self.origin, e))?;

        if line.is_some() {
            self.lines_read += 1;
        }
        Ok(line)
    }

    async fn next_utf8(&mut self) -> io::Result<Option<String>> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes).await? == 0 {
            return Ok(None);
        }

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        if self.lines_read == 0 && bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn next_utf16le(&mut self) -> io::Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            if self.reader.read_until(b'\n', &mut bytes).await? == 0 {
                break;
            }
            // A 0x0A at an odd offset is the high byte of some other code unit.
            if bytes.len() % 2 == 0 {
                continue;
            }
            let mut high = [0u8; 1];
            if self.reader.read(&mut high).await? == 0 {
                break;
            }
            bytes.push(high[0]);
            if bytes.ends_with(&[0x0A, 0x00]) {
                break;
            }
        }

        if bytes.is_empty() {
            return Ok(None);
        }
        if bytes.len() % 2 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated UTF-16 code unit at end of stream",
            ));
        }

        let mut units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if units.last() == Some(&LF) {
            units.pop();
            if units.last() == Some(&CR) {
                units.pop();
            }
        }
        if self.lines_read == 0 && units.first() == Some(&UTF16_BOM) {
            units.remove(0);
        }

        String::from_utf16(&units)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    async fn collect<R: AsyncBufRead + Unpin>(mut source: LineSource<R>) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    #[tokio::test]
    async fn utf8_lines_with_mixed_terminators() {
        let input: &[u8] = b"\xEF\xBB\xBFfirst\r\nsecond\n\nlast";
        let lines = collect(LineSource::from_reader(input, TextEncoding::Utf8, "mem"))
            .await
            .unwrap();
        assert_eq!(lines, vec!["first", "second", "", "last"]);
    }

    #[tokio::test]
    async fn trailing_newline_does_not_add_an_empty_line() {
        let input: &[u8] = b"a\nb\n";
        let lines = collect(LineSource::from_reader(input, TextEncoding::Utf8, "mem"))
            .await
            .unwrap();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_filesystem_error() {
        let input: &[u8] = b"ok\n\xFF\xFE\xFD\n";
        let mut source = LineSource::from_reader(input, TextEncoding::Utf8, "bad.log");
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("ok"));
        let err = source.next_line().await.unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[tokio::test]
    async fn utf16le_lines_with_bom_and_crlf() {
        let bytes = utf16le("\u{FEFF}héllo\r\nwörld\nend");
        let lines = collect(LineSource::from_reader(
            bytes.as_slice(),
            TextEncoding::Utf16Le,
            "mem",
        ))
        .await
        .unwrap();
        assert_eq!(lines, vec!["héllo", "wörld", "end"]);
    }

    #[tokio::test]
    async fn utf16le_ignores_0a_bytes_inside_other_units() {
        // U+0A0A encodes as [0x0A, 0x0A] and U+010A as [0x0A, 0x01].
        let bytes = utf16le("\u{0A0A}\u{010A}x\ny");
        let lines = collect(LineSource::from_reader(
            bytes.as_slice(),
            TextEncoding::Utf16Le,
            "mem",
        ))
        .await
        .unwrap();
        assert_eq!(lines, vec!["\u{0A0A}\u{010A}x", "y"]);
    }

    #[tokio::test]
    async fn utf16le_odd_length_is_rejected() {
        let mut bytes = utf16le("abc");
        bytes.push(0x41);
        let err = collect(LineSource::from_reader(
            bytes.as_slice(),
            TextEncoding::Utf16Le,
            "odd.log",
        ))
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
    }

    #[tokio::test]
    async fn lines_read_counts_returned_lines() {
        let input: &[u8] = b"1\n2\n3\n";
        let mut source = LineSource::from_reader(input, TextEncoding::Utf8, "mem");
        source.next_line().await.unwrap();
        source.next_line().await.unwrap();
        assert_eq!(source.lines_read(), 2);
    }

    #[test]
    fn encoding_parses_common_spellings() {
        assert_eq!("UTF-8".parse::<TextEncoding>(), Ok(TextEncoding::Utf8));
        assert_eq!("utf16le".parse::<TextEncoding>(), Ok(TextEncoding::Utf16Le));
        assert!("latin1".parse::<TextEncoding>().is_err());
        assert_eq!(TextEncoding::Utf16Le.to_string(), "utf-16le");
    }
}
