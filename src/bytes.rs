use std::io;

/// Bytes wraps a reader, keeping track of the number of bytes consumed so packets
/// can be located by their byte offset in the stream.
pub struct Bytes<R> {
    reader: R,
    num_read: usize,
}

impl<R: io::Read> Bytes<R> {
    pub fn new(reader: R) -> Self {
        Bytes {
            reader,
            num_read: 0,
        }
    }

    /// Read until `buf` is full or the reader is exhausted, returning the number of
    /// bytes read. A count less than `buf.len()` always means EOF.
    ///
    /// # Errors
    /// Any ``std::io::Error`` other than ``Interrupted``.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        let mut total = 0;
        while total < buf.len() {
            match self.reader.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        self.num_read += total;
        Ok(total)
    }

    /// Offset of the next byte to be read.
    pub fn offset(&self) -> usize {
        self.num_read
    }
}
