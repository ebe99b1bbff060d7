//! Byte-source and transport abstractions consumed by the decoders.

use std::io::{self, Read};

/// Anything that can hand out bytes in bounded chunks.
pub trait ByteSource {
    /// Read up to `max` bytes. An empty result means the source is
    /// exhausted.
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>>;

    /// Release the underlying resource after an aborted transfer.
    fn release(&mut self) {}
}

/// Text-command instrument connection.
pub trait Transport: ByteSource {
    fn write(&mut self, command: &str) -> io::Result<()>;

    /// Read one response line including its `\n` terminator. The line may
    /// run into binary block data, so it is returned as raw bytes.
    fn read_raw_line(&mut self) -> io::Result<Vec<u8>>;

    /// Read one text response line without its terminator.
    fn read_line(&mut self) -> io::Result<String> {
        let raw = self.read_raw_line()?;
        Ok(String::from_utf8_lossy(trim_line_end(&raw)).into_owned())
    }

    fn query(&mut self, command: &str) -> io::Result<String> {
        self.write(command)?;
        self.read_line()
    }

    fn close(&mut self);
}

/// Strip trailing `\r` and `\n` bytes.
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Adapts any `Read` (a file, a cursor) into a `ByteSource`.
pub struct ReadSource<R: Read> {
    reader: R,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        let n = loop {
            match self.reader.read(&mut buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other?,
            }
        };
        buf.truncate(n);
        Ok(buf)
    }
}
