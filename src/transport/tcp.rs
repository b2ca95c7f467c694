//! # LAN Transport
//!
//! Raw TCP to the printer's data port (9100 unless the address names one).
//! Status queries use the same socket: the device answers `DLE EOT n` with
//! one byte each, out of band from the print buffer. `GS I n` identification
//! replies arrive the same way, as `_ text NUL`.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{FirmwareInfo, Port, PortAddress, PortHandle, RawStatus, read_id_reply};
use crate::error::PortError;
use crate::protocol::commands::{self, PrinterInfo, StatusKind};

/// Raw printing port
pub const DEFAULT_PORT: u16 = 9100;

/// Bytes handed to the socket per write call
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPort;

impl TcpPort {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `host` or `host:port`.
    pub fn resolve(address: &str) -> Result<Vec<SocketAddr>, PortError> {
        let has_port = address
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
        let with_port = if has_port {
            address.to_string()
        } else {
            format!("{address}:{DEFAULT_PORT}")
        };
        let addrs: Vec<SocketAddr> = with_port.to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(PortError::Protocol(format!("{address} did not resolve")));
        }
        Ok(addrs)
    }
}

fn remaining(deadline: Instant) -> Result<Duration, PortError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(PortError::TimedOut);
    }
    Ok(left)
}

fn map_io(e: io::Error) -> PortError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => PortError::TimedOut,
        _ => PortError::Io(e),
    }
}

impl Port for TcpPort {
    type Handle = TcpHandle;

    fn open(&self, address: &PortAddress, timeout: Duration) -> Result<TcpHandle, PortError> {
        let deadline = Instant::now() + timeout;
        let mut last = PortError::TimedOut;
        for addr in Self::resolve(&address.address)? {
            match TcpStream::connect_timeout(&addr, remaining(deadline)?) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(%addr, "connected");
                    return Ok(TcpHandle {
                        stream: Some(stream),
                    });
                }
                Err(e) => last = map_io(e),
            }
        }
        Err(last)
    }
}

pub struct TcpHandle {
    stream: Option<TcpStream>,
}

impl TcpHandle {
    fn stream(&mut self) -> Result<&mut TcpStream, PortError> {
        self.stream.as_mut().ok_or(PortError::Closed)
    }

    fn send(&mut self, data: &[u8], deadline: Instant) -> Result<usize, PortError> {
        let mut written = 0;
        for chunk in data.chunks(CHUNK_SIZE) {
            let left = remaining(deadline)?;
            let stream = self.stream()?;
            stream.set_write_timeout(Some(left))?;
            stream.write_all(chunk).map_err(map_io)?;
            written += chunk.len();
        }
        Ok(written)
    }

    fn read_byte(&mut self, deadline: Instant) -> Result<u8, PortError> {
        let left = remaining(deadline)?;
        let stream = self.stream()?;
        stream.set_read_timeout(Some(left))?;
        let mut one = [0u8; 1];
        match stream.read(&mut one) {
            Ok(0) => Err(PortError::Closed),
            Ok(_) => Ok(one[0]),
            Err(e) => Err(map_io(e)),
        }
    }

    fn printer_id(&mut self, info: PrinterInfo, deadline: Instant) -> Result<String, PortError> {
        self.send(&commands::printer_id(info), deadline)?;
        read_id_reply(|| self.read_byte(deadline))
    }
}

impl PortHandle for TcpHandle {
    fn write(&mut self, bytes: &[u8], timeout: Duration) -> Result<usize, PortError> {
        let deadline = Instant::now() + timeout;
        let written = self.send(bytes, deadline)?;
        self.stream()?.flush().map_err(map_io)?;
        Ok(written)
    }

    fn query_status(&mut self, timeout: Duration) -> Result<RawStatus, PortError> {
        let deadline = Instant::now() + timeout;
        let mut bytes = [0u8; 4];
        for (slot, kind) in bytes.iter_mut().zip(StatusKind::ALL) {
            self.send(&commands::status_request(kind), deadline)?;
            *slot = self.read_byte(deadline)?;
        }
        Ok(RawStatus {
            printer: bytes[0],
            offline_cause: bytes[1],
            error_cause: bytes[2],
            paper: bytes[3],
        })
    }

    fn query_firmware(&mut self, timeout: Duration) -> Result<FirmwareInfo, PortError> {
        let deadline = Instant::now() + timeout;
        Ok(FirmwareInfo {
            model_name: self.printer_id(PrinterInfo::ModelName, deadline)?,
            firmware_version: self.printer_id(PrinterInfo::FirmwareVersion, deadline)?,
        })
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_resolve_adds_default_port() {
        let addrs = TcpPort::resolve("127.0.0.1").unwrap();
        assert_eq!(addrs[0].port(), DEFAULT_PORT);
        let addrs = TcpPort::resolve("127.0.0.1:9101").unwrap();
        assert_eq!(addrs[0].port(), 9101);
    }

    #[test]
    fn test_write_and_status_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let local = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut job = [0u8; 3];
            sock.read_exact(&mut job).unwrap();
            for answer in [0x12u8, 0x12, 0x12, 0x72] {
                let mut req = [0u8; 3];
                sock.read_exact(&mut req).unwrap();
                assert_eq!(&req[..2], &[0x10, 0x04]);
                sock.write_all(&[answer]).unwrap();
            }
            job
        });

        let address: PortAddress = format!("TCP:{local}").parse().unwrap();
        let mut handle = TcpPort::new().open(&address, Duration::from_secs(2)).unwrap();
        assert_eq!(handle.write(b"abc", Duration::from_secs(2)).unwrap(), 3);
        let raw = handle.query_status(Duration::from_secs(2)).unwrap();
        assert_eq!(raw.paper, 0x72);
        handle.close();
        handle.close();

        assert_eq!(&server.join().unwrap(), b"abc");
    }

    #[test]
    fn test_firmware_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let local = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut asked = Vec::new();
            for answer in [&b"_SM-T300i\0"[..], &b"_Ver1.3\0"[..]] {
                let mut req = [0u8; 3];
                sock.read_exact(&mut req).unwrap();
                asked.push(req);
                sock.write_all(answer).unwrap();
            }
            asked
        });

        let address: PortAddress = format!("TCP:{local}").parse().unwrap();
        let mut handle = TcpPort::new().open(&address, Duration::from_secs(2)).unwrap();
        let info = handle.query_firmware(Duration::from_secs(2)).unwrap();
        handle.close();

        assert_eq!(info.model_name, "SM-T300i");
        assert_eq!(info.firmware_version, "Ver1.3");
        assert_eq!(
            server.join().unwrap(),
            vec![[0x1D, 0x49, 0x43], [0x1D, 0x49, 0x41]]
        );
    }
}
