//! # Transport Session
//!
//! Owns one open port handle for the length of a print job.
//!
//! ```text
//! Closed ──open──▶ Opening ──ok──▶ Open ──I/O error──▶ Faulted
//!                     │              │                    │
//!                     └──fail──▶ Closed ◀──close──────────┘
//! ```
//!
//! `close` is idempotent and also runs on drop, so every exit path out of a
//! print releases the handle exactly once.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use super::status::{DeviceStatus, SensorActive};
use super::{FirmwareInfo, Port, PortAddress, PortHandle};
use crate::error::{PortError, TransportError};

/// Lifecycle step, carried by errors so callers know where a job stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Open,
    Preflight,
    Write,
    FinalStatus,
    Firmware,
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Preflight => "pre-flight status",
            Self::Write => "write",
            Self::FinalStatus => "final status",
            Self::Firmware => "firmware query",
            Self::Close => "close",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Open,
    Faulted,
}

/// # Transport Session
///
/// ## Example
///
/// ```no_run
/// use std::time::Duration;
/// use estrellita::transport::{PortAddress, Stage, TransportSession};
/// use estrellita::transport::tcp::TcpPort;
///
/// let address: PortAddress = "TCP:192.168.1.50".parse().unwrap();
/// let mut session = TransportSession::open(&TcpPort::new(), &address, Duration::from_secs(5))?;
/// let status = session.query_status(Stage::Preflight, Duration::from_secs(2))?;
/// if status.can_print() {
///     session.write(&[0x1B, 0x40], Duration::from_secs(10))?;
/// }
/// session.close();
/// # Ok::<(), estrellita::error::TransportError>(())
/// ```
pub struct TransportSession<H: PortHandle> {
    handle: Option<H>,
    state: SessionState,
    address: String,
    sensor: SensorActive,
}

impl<H: PortHandle> TransportSession<H> {
    /// Open `address` on `port`. On failure nothing is left open.
    pub fn open<P>(
        port: &P,
        address: &PortAddress,
        timeout: Duration,
    ) -> Result<Self, TransportError>
    where
        P: Port<Handle = H>,
    {
        let mut session = Self {
            handle: None,
            state: SessionState::Opening,
            address: address.to_string(),
            sensor: SensorActive::default(),
        };
        debug!(address = %session.address, ?timeout, "opening port");

        match port.open(address, timeout) {
            Ok(handle) => {
                session.handle = Some(handle);
                session.state = SessionState::Open;
                Ok(session)
            }
            Err(source) => {
                session.state = SessionState::Closed;
                warn!(address = %session.address, error = %source, "open failed");
                Err(match source {
                    PortError::TimedOut => TransportError::OpenTimeout {
                        address: session.address.clone(),
                        timeout,
                    },
                    source => TransportError::PortOpen {
                        address: session.address.clone(),
                        source,
                    },
                })
            }
        }
    }

    /// Polarity used to interpret the drawer sensor.
    pub fn with_sensor_active(mut self, sensor: SensorActive) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn handle(&mut self) -> Result<&mut H, TransportError> {
        match (self.state, self.handle.as_mut()) {
            (SessionState::Open, Some(handle)) => Ok(handle),
            _ => Err(TransportError::NotOpen),
        }
    }

    /// Read and decode the device status. `stage` only labels errors.
    pub fn query_status(
        &mut self,
        stage: Stage,
        timeout: Duration,
    ) -> Result<DeviceStatus, TransportError> {
        let sensor = self.sensor;
        let result = self.handle()?.query_status(timeout);
        match result {
            Ok(raw) => {
                let status = DeviceStatus::decode(&raw, sensor);
                debug!(%stage, ?raw, %status, "status");
                Ok(status)
            }
            Err(source) => {
                self.state = SessionState::Faulted;
                warn!(%stage, error = %source, "status query failed");
                Err(match source {
                    PortError::TimedOut => TransportError::StatusTimeout { stage, timeout },
                    source => TransportError::StatusQuery { stage, source },
                })
            }
        }
    }

    /// Read the model name and firmware version.
    ///
    /// Failures are reported like status failures, labelled
    /// [`Stage::Firmware`].
    pub fn query_firmware(&mut self, timeout: Duration) -> Result<FirmwareInfo, TransportError> {
        let stage = Stage::Firmware;
        let result = self.handle()?.query_firmware(timeout);
        match result {
            Ok(info) => {
                debug!(%info, "firmware");
                Ok(info)
            }
            Err(source) => {
                self.state = SessionState::Faulted;
                warn!(%stage, error = %source, "firmware query failed");
                Err(match source {
                    PortError::TimedOut => TransportError::StatusTimeout { stage, timeout },
                    source => TransportError::StatusQuery { stage, source },
                })
            }
        }
    }

    /// Write the whole buffer or fail. A short write is a failure.
    pub fn write(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportError> {
        let len = bytes.len();
        let result = self.handle()?.write(bytes, timeout);
        match result {
            Ok(n) if n == len => {
                debug!(len, "wrote job");
                Ok(())
            }
            Ok(n) => {
                self.state = SessionState::Faulted;
                warn!(len, written = n, "short write");
                Err(TransportError::PortWrite {
                    source: PortError::Protocol(format!("port accepted {n} of {len} bytes")),
                })
            }
            Err(PortError::TimedOut) => {
                self.state = SessionState::Faulted;
                warn!(len, ?timeout, "write timed out");
                Err(TransportError::WriteTimeout { timeout, len })
            }
            Err(source) => {
                self.state = SessionState::Faulted;
                warn!(len, error = %source, "write failed");
                Err(TransportError::PortWrite { source })
            }
        }
    }

    /// Release the handle. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
            debug!(address = %self.address, "port closed");
        }
        self.state = SessionState::Closed;
    }
}

impl<H: PortHandle> Drop for TransportSession<H> {
    fn drop(&mut self) {
        self.close();
    }
}
