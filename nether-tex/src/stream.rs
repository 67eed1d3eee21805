//! Bounds-checked byte stream access
//!
//! Containers are parsed from a [`ByteStream`]: a seekable, random-access
//! view of a file or memory blob. Every read is bounds-checked against the
//! declared size; a request past the end yields a short count or a
//! [`TexError::ShortRead`], never out-of-range memory access.
//!
//! Decoders borrow the stream for the duration of the decode. The caller
//! keeps ownership and must not close or mutate it while a decode is in
//! flight.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::error::TexError;

/// Random access to an immutable byte source.
pub trait ByteStream {
    /// Total length of the stream in bytes.
    fn size(&self) -> u64;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// # Returns
    /// Number of bytes actually read. Zero when `offset` is at or past the
    /// end; a short count when fewer than `buf.len()` bytes remain.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, TexError>;

    /// Read exactly `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    /// [`TexError::ShortRead`] if the stream ends first.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), TexError> {
        let n = self.read_at(offset, buf)?;
        if n != buf.len() {
            return Err(TexError::ShortRead {
                offset,
                expected: buf.len(),
            });
        }
        Ok(())
    }
}

/// In-memory byte stream over a borrowed blob.
pub struct MemStream<'a> {
    data: &'a [u8],
}

impl<'a> MemStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteStream for MemStream<'_> {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, TexError> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let end = self.data.len().min(start.saturating_add(buf.len()));
        let n = end - start;
        buf[..n].copy_from_slice(&self.data[start..end]);
        Ok(n)
    }
}

/// File-backed byte stream with positioned reads.
///
/// The size is captured at open time. Uses a `Mutex` for interior mutability
/// since reads take `&self` but seeking mutates the file cursor.
pub struct FileStream {
    file: Mutex<File>,
    size: u64,
}

impl FileStream {
    /// Open a file for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TexError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }
}

impl ByteStream for FileStream {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, TexError> {
        if offset >= self.size {
            return Ok(0);
        }
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))?;
        let mut read = 0;
        while read < buf.len() {
            let n = file.read(&mut buf[read..])?;
            if n == 0 {
                break;
            }
            read += n;
        }
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mem_stream_size() {
        let stream = MemStream::new(b"abcdef");
        assert_eq!(stream.size(), 6);
    }

    #[test]
    fn test_mem_stream_read_at() {
        let stream = MemStream::new(b"abcdef");
        let mut buf = [0u8; 3];
        assert_eq!(stream.read_at(2, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"cde");
    }

    #[test]
    fn test_mem_stream_short_read() {
        let stream = MemStream::new(b"abcdef");
        let mut buf = [0u8; 4];
        // Only two bytes remain at offset 4
        assert_eq!(stream.read_at(4, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_mem_stream_past_end() {
        let stream = MemStream::new(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(stream.read_at(6, &mut buf).unwrap(), 0);
        assert_eq!(stream.read_at(u64::MAX, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_exact_at_fails_short() {
        let stream = MemStream::new(b"abcdef");
        let mut buf = [0u8; 4];
        let result = stream.read_exact_at(4, &mut buf);
        assert!(matches!(
            result,
            Err(TexError::ShortRead {
                offset: 4,
                expected: 4
            })
        ));
    }

    #[test]
    fn test_file_stream() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello stream").unwrap();
        tmp.flush().unwrap();

        let stream = FileStream::open(tmp.path()).unwrap();
        assert_eq!(stream.size(), 12);

        let mut buf = [0u8; 6];
        stream.read_exact_at(6, &mut buf).unwrap();
        assert_eq!(&buf, b"stream");

        // Past the end
        assert_eq!(stream.read_at(12, &mut buf).unwrap(), 0);
    }
}
