//! Line-oriented input with transparent gzip decompression
//!
//! Flat-file decoders pull one line at a time through [`LineSource`]; the
//! XML extractor reads the decompressed byte stream from [`open_reader`]
//! directly.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// First two bytes of every gzip member
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Decompressed, buffered input shared by every decoder
pub type BoxedBufRead = Box<dyn BufRead + Send>;

/// A stream of text lines with their terminators removed
pub trait LineSource {
    /// Read the next line, or `Ok(None)` once the stream is exhausted
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// 1-based number of the last line returned (0 before the first read)
    fn line_number(&self) -> usize;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        (**self).next_line()
    }

    fn line_number(&self) -> usize {
        (**self).line_number()
    }
}

/// [`LineSource`] over any buffered reader
///
/// Strips `\n` and `\r\n`. Bytes that are not valid UTF-8 are replaced
/// rather than rejected.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(128),
            line_number: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn line_number(&self) -> usize {
        self.line_number
    }
}

/// Check for the gzip magic number without consuming any input
pub fn is_gzip<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let head = reader.fill_buf()?;
    Ok(head.len() >= 2 && head[..2] == GZIP_MAGIC)
}

/// Wrap a reader, decompressing it when it starts with the gzip magic number
///
/// Concatenated gzip members (as produced by `bgzip` and `cat a.gz b.gz`)
/// are read as one stream.
pub fn decompress<R>(mut reader: R) -> io::Result<BoxedBufRead>
where
    R: BufRead + Send + 'static,
{
    if is_gzip(&mut reader)? {
        debug!("gzip input detected");
        Ok(Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiGzDecoder::new(reader),
        )))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open a file as a decompressed byte stream
pub fn open_reader(path: impl AsRef<Path>) -> io::Result<BoxedBufRead> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!(path = %path.display(), "opened input");
    decompress(BufReader::with_capacity(READ_BUFFER_SIZE, file))
}

/// Open a file as a [`LineSource`]
pub fn open_path(path: impl AsRef<Path>) -> io::Result<LineReader<BoxedBufRead>> {
    Ok(LineReader::new(open_reader(path)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn collect(source: &mut impl LineSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_strips_line_terminators() {
        let mut reader = LineReader::new(Cursor::new("ID   X;\r\nAC   Y;\n\nlast"));
        assert_eq!(collect(&mut reader), vec!["ID   X;", "AC   Y;", "", "last"]);
        assert_eq!(reader.line_number(), 4);
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut reader = LineReader::new(Cursor::new(b"KW   caf\xe9;\n".to_vec()));
        assert_eq!(reader.next_line().unwrap().unwrap(), "KW   caf\u{fffd};");
    }

    #[test]
    fn test_plain_input_passes_through() {
        let reader = decompress(Cursor::new(b"LOCUS       X\n//\n".to_vec())).unwrap();
        let mut lines = LineReader::new(reader);
        assert_eq!(collect(&mut lines), vec!["LOCUS       X", "//"]);
    }

    #[test]
    fn test_gzip_detected_by_magic_bytes() {
        let mut cursor = Cursor::new(gzip(b"ID   X;\n//\n"));
        assert!(is_gzip(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);

        let mut lines = LineReader::new(decompress(cursor).unwrap());
        assert_eq!(collect(&mut lines), vec!["ID   X;", "//"]);
    }

    #[test]
    fn test_concatenated_gzip_members() {
        let mut data = gzip(b"first\n");
        data.extend(gzip(b"second\n"));
        let mut lines = LineReader::new(decompress(Cursor::new(data)).unwrap());
        assert_eq!(collect(&mut lines), vec!["first", "second"]);
    }

    #[test]
    fn test_single_byte_input_is_not_gzip() {
        let mut cursor = Cursor::new(vec![0x1f]);
        assert!(!is_gzip(&mut cursor).unwrap());
    }

    #[test]
    fn test_open_path_reads_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.embl.gz");
        std::fs::write(&path, gzip(b"ID   Z;\n")).unwrap();

        let mut lines = open_path(&path).unwrap();
        assert_eq!(collect(&mut lines), vec!["ID   Z;"]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(open_path("/nonexistent/records.embl").is_err());
    }
}
