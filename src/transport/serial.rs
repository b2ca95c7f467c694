//! # Serial Transport (Bluetooth RFCOMM and USB)
//!
//! Talks to portable printers through a tty device: an RFCOMM binding for
//! Bluetooth SPP, or a USB serial/printer node.
//!
//! ## Bluetooth Setup (Linux)
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX
//! # creates /dev/rfcomm0
//! ```
//!
//! A `BT:` address may be either the device path or the MAC; a MAC is
//! resolved to its bound `/dev/rfcommN`.
//!
//! ## TTY Configuration
//!
//! The device is put in raw mode so binary data passes untouched: no
//! input or output processing, 8-bit characters, no echo, non-canonical.
//! XON/XOFF is disabled since 0x11 and 0x13 appear in raster data.
//!
//! ## Timeouts
//!
//! The descriptor is opened non-blocking and every read and write waits
//! with `poll(2)` against a deadline, so no call blocks past its timeout.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::{FirmwareInfo, Port, PortAddress, PortHandle, PortKind, RawStatus, read_id_reply};
use crate::error::PortError;
use crate::protocol::commands::{self, PrinterInfo, StatusKind};

/// Default RFCOMM device path
pub const DEFAULT_DEVICE: &str = "/dev/rfcomm0";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Serial Port
///
/// Opens tty devices for `BT:` and `USB:` addresses.
#[derive(Debug, Clone)]
pub struct SerialPort {
    chunk_size: usize,
    chunk_delay: Duration,
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort {
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        }
    }

    /// Larger chunks are faster but may overflow the Bluetooth buffer.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Device path for an address, resolving Bluetooth MACs.
    pub fn device_path(address: &PortAddress) -> Result<String, PortError> {
        if address.kind == PortKind::Bluetooth && is_valid_mac(&address.address) {
            return find_rfcomm_for_mac(&address.address)?.ok_or_else(|| {
                PortError::Protocol(format!("no rfcomm device bound to {}", address.address))
            });
        }
        Ok(address.address.clone())
    }
}

impl Port for SerialPort {
    type Handle = SerialHandle;

    fn open(&self, address: &PortAddress, timeout: Duration) -> Result<SerialHandle, PortError> {
        if address.kind == PortKind::Lan {
            return Err(PortError::Protocol(format!(
                "{address} is not a serial address"
            )));
        }
        let path = Self::device_path(address)?;
        let deadline = Instant::now() + timeout;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)?;
        let fd = file.as_raw_fd();

        // USB printer-class nodes are not ttys
        if unsafe { libc::isatty(fd) } == 1 {
            configure_tty_raw(fd)?;
        }
        if !wait_for(fd, libc::POLLOUT, deadline)? {
            return Err(PortError::TimedOut);
        }

        debug!(path = %path, settings = %address.settings, "serial port open");
        Ok(SerialHandle {
            file: Some(file),
            chunk_size: self.chunk_size,
            chunk_delay: self.chunk_delay,
        })
    }
}

/// An open tty.
pub struct SerialHandle {
    file: Option<File>,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialHandle {
    fn file(&mut self) -> Result<&mut File, PortError> {
        self.file.as_mut().ok_or(PortError::Closed)
    }

    fn write_until(&mut self, data: &[u8], deadline: Instant) -> Result<usize, PortError> {
        let file = self.file()?;
        let fd = file.as_raw_fd();
        let mut written = 0;
        while written < data.len() {
            match file.write(&data[written..]) {
                Ok(0) => return Err(PortError::Closed),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !wait_for(fd, libc::POLLOUT, deadline)? {
                        return Err(PortError::TimedOut);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(written)
    }

    fn read_byte(&mut self, deadline: Instant) -> Result<u8, PortError> {
        let file = self.file()?;
        let fd = file.as_raw_fd();
        let mut buf = [0u8; 1];
        loop {
            match file.read(&mut buf) {
                Ok(0) => return Err(PortError::Closed),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !wait_for(fd, libc::POLLIN, deadline)? {
                        return Err(PortError::TimedOut);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Drop unread input so the next reply lines up with its request.
    fn discard_input(&mut self) -> Result<(), PortError> {
        let fd = self.file()?.as_raw_fd();
        unsafe { libc::tcflush(fd, libc::TCIFLUSH) };
        Ok(())
    }

    fn printer_id(&mut self, info: PrinterInfo, deadline: Instant) -> Result<String, PortError> {
        self.write_until(&commands::printer_id(info), deadline)?;
        read_id_reply(|| self.read_byte(deadline))
    }
}

impl PortHandle for SerialHandle {
    fn write(&mut self, bytes: &[u8], timeout: Duration) -> Result<usize, PortError> {
        let deadline = Instant::now() + timeout;
        let mut total = 0;
        let chunks = bytes.len().div_ceil(self.chunk_size);
        for (i, chunk) in bytes.chunks(self.chunk_size).enumerate() {
            total += self.write_until(chunk, deadline)?;
            trace!(chunk = i, of = chunks, total, "chunk written");
            if i + 1 < chunks && !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        self.file()?.flush()?;
        Ok(total)
    }

    fn query_status(&mut self, timeout: Duration) -> Result<RawStatus, PortError> {
        let deadline = Instant::now() + timeout;
        self.discard_input()?;

        let mut bytes = [0u8; 4];
        for (slot, kind) in bytes.iter_mut().zip(StatusKind::ALL) {
            self.write_until(&commands::status_request(kind), deadline)?;
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
        self.discard_input()?;
        Ok(FirmwareInfo {
            model_name: self.printer_id(PrinterInfo::ModelName, deadline)?,
            firmware_version: self.printer_id(PrinterInfo::FirmwareVersion, deadline)?,
        })
    }

    fn close(&mut self) {
        self.file.take();
    }
}

/// Wait until `fd` is ready for `events` or `deadline` passes.
///
/// Returns `false` on timeout.
fn wait_for(fd: RawFd, events: libc::c_short, deadline: Instant) -> Result<bool, PortError> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let ms = remaining.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let mut pfd = libc::pollfd {
            fd,
            events,
            revents: 0,
        };
        let rc = unsafe { libc::poll(&mut pfd, 1, ms) };
        if rc > 0 {
            if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                return Err(PortError::Closed);
            }
            return Ok(true);
        }
        if rc == 0 {
            return Ok(false);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err.into());
        }
    }
}

/// Configure a file descriptor for raw TTY mode.
///
/// - **Input flags**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXOFF, IXANY
/// - **Output flags**: OPOST
/// - **Local flags**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
/// - **Control flags**: CSIZE, PARENB (then CS8 is set)
fn configure_tty_raw(fd: RawFd) -> Result<(), PortError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error().into());
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8 | libc::CREAD | libc::CLOCAL;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

// ============================================================================
// RFCOMM HELPERS
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Device path from an `rfcomm0: XX:XX:... channel N` style line.
fn rfcomm_device_in(listing: &str, mac: &str) -> Option<String> {
    let mac_upper = mac.to_uppercase();
    listing
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .filter_map(|line| line.split(':').next())
        .map(|name| format!("/dev/{}", name.trim()))
        .find(|path| Path::new(path).exists())
}

/// Find the RFCOMM device bound to `mac`.
///
/// Checks `/proc/net/rfcomm`, then falls back to `rfcomm -a`.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, PortError> {
    if let Ok(contents) = fs::read_to_string("/proc/net/rfcomm")
        && let Some(path) = rfcomm_device_in(&contents, mac)
    {
        return Ok(Some(path));
    }

    let output = Command::new("rfcomm").arg("-a").output()?;
    Ok(rfcomm_device_in(&String::from_utf8_lossy(&output.stdout), mac))
}
