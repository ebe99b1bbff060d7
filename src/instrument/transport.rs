//! Raw TCP socket transport for `TCPIP0::host::port::SOCKET` instruments.

use crate::config::SocketEndpoint;
use dso_io::{ByteSource, Transport};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Read/write timeout for socket instruments.
pub const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

const READ_TERMINATION: u8 = b'\n';

pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    resource_name: String,
    closed: bool,
}

impl TcpTransport {
    pub fn connect(endpoint: &SocketEndpoint) -> io::Result<Self> {
        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, endpoint.to_string()))?;
        let stream = TcpStream::connect_timeout(&addr, SOCKET_TIMEOUT)?;
        stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
        stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;
        stream.set_nodelay(true)?;
        log::info!("Connected to {}", endpoint.resource_name());
        Ok(Self {
            reader: BufReader::new(stream),
            resource_name: endpoint.resource_name(),
            closed: false,
        })
    }
}

impl ByteSource for TcpTransport {
    fn read_bytes(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max];
        let n = self.reader.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn release(&mut self) {
        self.close();
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, command: &str) -> io::Result<()> {
        log::debug!("-> {}", command);
        let stream = self.reader.get_mut();
        stream.write_all(command.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()
    }

    fn read_raw_line(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_until(READ_TERMINATION, &mut buf)?;
        if buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by instrument",
            ));
        }
        log::debug!("<- {} bytes", buf.len());
        Ok(buf)
    }

    fn close(&mut self) {
        if !self.closed {
            let _ = self.reader.get_ref().shutdown(Shutdown::Both);
            self.closed = true;
            log::info!("Closed {}", self.resource_name);
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}
