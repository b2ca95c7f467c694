//! # Print Orchestrator
//!
//! Runs one composed job through one transport session:
//!
//! 1. open the port
//! 2. pre-flight status (skippable): refuse to send if paper is out or the
//!    cover is open
//! 3. write the whole buffer
//! 4. read the final status and hand it back, faults included
//! 5. close, on every path
//!
//! Nothing is retried, and [`print_job`] takes the [`PrintJob`] by value: a
//! job goes to at most one session, so a failed send is never silently
//! repeated. Cancellation is checked only between steps, never in the middle
//! of a write, so the device never sees a truncated command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::PrintError;
use crate::job::PrintJob;
use crate::transport::{
    DeviceStatus, FirmwareInfo, Port, PortAddress, SensorActive, Stage, TransportSession,
};

/// Shared flag a caller sets to stop a job at the next safe point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-job knobs. Timeouts left as `None` use the write timeout.
#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    pub skip_preflight: bool,
    pub sensor_active: SensorActive,
    pub open_timeout: Option<Duration>,
    pub status_timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl PrintOptions {
    fn check_cancel(&self, stage: Stage, sent: bool) -> Result<(), PrintError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                warn!(%stage, sent, "print cancelled");
                Err(PrintError::Cancelled { stage, sent })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrintOutcome {
    pub sent: bool,
    pub final_status: DeviceStatus,
}

/// # Print a Job
///
/// `timeout` bounds the write. A failed final status query after a
/// successful write is reported as
/// [`crate::error::TransportError::StatusQuery`] with
/// [`Stage::FinalStatus`]. A cancellation seen right after the write is
/// `Cancelled { sent: true, .. }`. [`PrintError::job_sent`] is true for
/// both, so a caller can tell the paper already came out.
///
/// The job is consumed, so it cannot be handed to a second call:
///
/// ```compile_fail,E0382
/// use std::time::Duration;
/// use estrellita::job::{compose, PrintPrimitive};
/// use estrellita::print::{print_job, PrintOptions};
/// use estrellita::printer::Limits;
/// use estrellita::protocol::text::FormattingState;
/// use estrellita::transport::tcp::TcpPort;
///
/// let job = compose(
///     &[PrintPrimitive::text("HELLO", FormattingState::new())],
///     &[],
///     &Limits::default(),
/// )?;
/// let address = "TCP:192.168.1.50".parse().map_err(estrellita::Error::Address)?;
/// let options = PrintOptions::default();
/// let first = print_job(&TcpPort::new(), &address, job, Duration::from_secs(5), &options);
/// let again = print_job(&TcpPort::new(), &address, job, Duration::from_secs(5), &options);
/// # Ok::<(), estrellita::Error>(())
/// ```
pub fn print_job<P: Port>(
    port: &P,
    address: &PortAddress,
    job: PrintJob,
    timeout: Duration,
    options: &PrintOptions,
) -> Result<PrintOutcome, PrintError> {
    let span = info_span!("print_job", address = %address, bytes = job.len());
    let _enter = span.enter();

    let open_timeout = options.open_timeout.unwrap_or(timeout);
    let status_timeout = options.status_timeout.unwrap_or(timeout);

    options.check_cancel(Stage::Open, false)?;
    let mut session = TransportSession::open(port, address, open_timeout)?
        .with_sensor_active(options.sensor_active);

    if !options.skip_preflight {
        let status = session.query_status(Stage::Preflight, status_timeout)?;
        if !status.can_print() {
            warn!(%status, "device not ready, nothing sent");
            return Err(PrintError::DeviceNotReady {
                paper_empty: status.paper_empty,
                cover_open: status.cover_open,
                status,
            });
        }
    }

    options.check_cancel(Stage::Write, false)?;
    session.write(job.as_bytes(), timeout)?;
    info!(bytes = job.len(), primitives = job.primitive_count(), "sent");

    options.check_cancel(Stage::FinalStatus, true)?;
    let final_status = session.query_status(Stage::FinalStatus, status_timeout)?;
    if final_status.has_error() || !final_status.can_print() {
        warn!(%final_status, "device reports a fault after printing");
    }
    session.close();

    Ok(PrintOutcome {
        sent: true,
        final_status,
    })
}

/// # Check Firmware
///
/// Open `address`, read the model name and firmware version, close.
pub fn check_firmware<P: Port>(
    port: &P,
    address: &PortAddress,
    open_timeout: Duration,
    timeout: Duration,
) -> Result<FirmwareInfo, PrintError> {
    let span = info_span!("check_firmware", address = %address);
    let _enter = span.enter();

    let mut session = TransportSession::open(port, address, open_timeout)?;
    let info = session.query_firmware(timeout)?;
    session.close();
    info!(%info, "firmware");
    Ok(info)
}
