//! # Print Lifecycle Tests
//!
//! `print_job` and `check_firmware` against a scripted port that records
//! every call, so each test can assert exactly which port operations
//! happened and in what order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use estrellita::error::{PortError, PrintError, TransportError};
use estrellita::job::{PrintJob, PrintPrimitive, TrailingAction, compose};
use estrellita::print::{CancelToken, PrintOptions, check_firmware, print_job};
use estrellita::printer::Limits;
use estrellita::protocol::text::FormattingState;
use estrellita::transport::{
    FirmwareInfo, Port, PortAddress, PortHandle, RawStatus, SensorActive, Stage,
};
use pretty_assertions::assert_eq;

// ============================================================================
// MOCK PORT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open(String),
    Status,
    Firmware,
    Write(usize),
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
enum Fail {
    #[default]
    Never,
    TimedOut,
    Io,
}

impl Fail {
    fn check(self) -> Result<(), PortError> {
        match self {
            Fail::Never => Ok(()),
            Fail::TimedOut => Err(PortError::TimedOut),
            Fail::Io => Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "link dropped",
            ))),
        }
    }
}

#[derive(Default)]
struct Script {
    open: Fail,
    write: Fail,
    /// Status answers in order; `READY` once exhausted
    statuses: VecDeque<RawStatus>,
    /// Fail the n-th status query (0-based)
    status_fail: Option<(usize, Fail)>,
    /// Cancelled while the write is in flight
    cancel_during_write: Option<CancelToken>,
    firmware: Fail,
}

#[derive(Clone, Default)]
struct MockPort {
    calls: Arc<Mutex<Vec<Call>>>,
    written: Arc<Mutex<Vec<u8>>>,
    script: Arc<Mutex<Script>>,
}

struct MockHandle {
    port: MockPort,
    status_queries: usize,
}

impl MockPort {
    fn with(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Port for MockPort {
    type Handle = MockHandle;

    fn open(&self, address: &PortAddress, _timeout: Duration) -> Result<MockHandle, PortError> {
        self.record(Call::Open(address.to_string()));
        self.script.lock().unwrap().open.check()?;
        Ok(MockHandle {
            port: self.clone(),
            status_queries: 0,
        })
    }
}

impl PortHandle for MockHandle {
    fn write(&mut self, bytes: &[u8], _timeout: Duration) -> Result<usize, PortError> {
        self.port.record(Call::Write(bytes.len()));
        let script = self.port.script.lock().unwrap();
        if let Some(token) = &script.cancel_during_write {
            token.cancel();
        }
        script.write.check()?;
        self.port.written.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn query_status(&mut self, _timeout: Duration) -> Result<RawStatus, PortError> {
        self.port.record(Call::Status);
        let n = self.status_queries;
        self.status_queries += 1;
        let mut script = self.port.script.lock().unwrap();
        if let Some((at, fail)) = script.status_fail
            && at == n
        {
            fail.check()?;
        }
        Ok(script.statuses.pop_front().unwrap_or(RawStatus::READY))
    }

    fn query_firmware(&mut self, _timeout: Duration) -> Result<FirmwareInfo, PortError> {
        self.port.record(Call::Firmware);
        self.port.script.lock().unwrap().firmware.check()?;
        Ok(FirmwareInfo {
            model_name: "SM-S230i".to_string(),
            firmware_version: "Ver1.1".to_string(),
        })
    }

    fn close(&mut self) {
        self.port.record(Call::Close);
    }
}

// ============================================================================
// HELPERS
// ============================================================================

const PAPER_EMPTY: RawStatus = RawStatus {
    offline_cause: 0x12 | 0x20,
    paper: 0x12 | 0x60,
    ..RawStatus::READY
};

const COVER_OPEN: RawStatus = RawStatus {
    printer: 0x12 | 0x08,
    offline_cause: 0x12 | 0x04,
    ..RawStatus::READY
};

const TIMEOUT: Duration = Duration::from_millis(200);

fn address() -> PortAddress {
    "BT:/dev/rfcomm0".parse().unwrap()
}

fn job() -> PrintJob {
    compose(
        &[PrintPrimitive::text("HELLO", FormattingState::new().emphasized(true))],
        &[TrailingAction::Feed { lines: 2 }],
        &Limits::PORTABLE_2INCH,
    )
    .unwrap()
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_happy_path_sequence() {
    let port = MockPort::default();
    let outcome = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap();

    assert!(outcome.sent);
    assert!(outcome.final_status.can_print());
    assert_eq!(
        port.calls(),
        vec![
            Call::Open("BT:/dev/rfcomm0".to_string()),
            Call::Status,
            Call::Write(job().len()),
            Call::Status,
            Call::Close,
        ]
    );
    assert_eq!(port.written.lock().unwrap().as_slice(), job().as_bytes());
}

#[test]
fn test_paper_empty_never_writes() {
    let port = MockPort::with(Script {
        statuses: VecDeque::from([PAPER_EMPTY]),
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();

    match err {
        PrintError::DeviceNotReady {
            paper_empty,
            cover_open,
            status,
        } => {
            assert!(paper_empty);
            assert!(!cover_open);
            assert!(status.paper_empty);
        }
        other => panic!("expected DeviceNotReady, got {other:?}"),
    }
    assert_eq!(port.count(&Call::Write(job().len())), 0);
    assert_eq!(port.count(&Call::Close), 1);
}

#[test]
fn test_cover_open_never_writes() {
    let port = MockPort::with(Script {
        statuses: VecDeque::from([COVER_OPEN]),
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PrintError::DeviceNotReady {
            cover_open: true,
            paper_empty: false,
            ..
        }
    ));
    assert_eq!(port.calls(), vec![Call::Open(address().to_string()), Call::Status, Call::Close]);
}

#[test]
fn test_skip_preflight_reports_final_fault() {
    let port = MockPort::with(Script {
        statuses: VecDeque::from([PAPER_EMPTY]),
        ..Script::default()
    });
    let options = PrintOptions {
        skip_preflight: true,
        ..PrintOptions::default()
    };
    let outcome = print_job(&port, &address(), job(), TIMEOUT, &options).unwrap();

    assert!(outcome.sent);
    assert!(outcome.final_status.paper_empty);
    assert_eq!(
        port.calls(),
        vec![
            Call::Open(address().to_string()),
            Call::Write(job().len()),
            Call::Status,
            Call::Close,
        ]
    );
}

#[test]
fn test_write_timeout_still_closes_once() {
    let port = MockPort::with(Script {
        write: Fail::TimedOut,
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();

    assert!(!err.job_sent());
    match err {
        PrintError::Transport(TransportError::WriteTimeout { timeout, len }) => {
            assert_eq!(timeout, TIMEOUT);
            assert_eq!(len, job().len());
        }
        other => panic!("expected WriteTimeout, got {other:?}"),
    }
    assert_eq!(port.count(&Call::Close), 1);
    assert_eq!(port.calls().last(), Some(&Call::Close));
}

#[test]
fn test_write_error_is_not_a_timeout() {
    let port = MockPort::with(Script {
        write: Fail::Io,
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();
    match err {
        PrintError::Transport(e) => {
            assert!(matches!(e, TransportError::PortWrite { .. }));
            assert!(!e.is_timeout());
        }
        other => panic!("expected PortWrite, got {other:?}"),
    }
    assert_eq!(port.count(&Call::Close), 1);
}

#[test]
fn test_open_timeout_uses_open_timeout() {
    let port = MockPort::with(Script {
        open: Fail::TimedOut,
        ..Script::default()
    });
    let options = PrintOptions {
        open_timeout: Some(Duration::from_millis(5)),
        ..PrintOptions::default()
    };
    let err = print_job(&port, &address(), job(), TIMEOUT, &options).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Transport(TransportError::OpenTimeout { timeout, .. })
            if timeout == Duration::from_millis(5)
    ));
    // Nothing was opened, so there is nothing to close
    assert_eq!(port.calls(), vec![Call::Open(address().to_string())]);
}

#[test]
fn test_preflight_timeout_names_stage() {
    let port = MockPort::with(Script {
        status_fail: Some((0, Fail::TimedOut)),
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Transport(TransportError::StatusTimeout {
            stage: Stage::Preflight,
            ..
        })
    ));
    assert_eq!(port.count(&Call::Close), 1);
}

#[test]
fn test_final_status_failure_after_write() {
    let port = MockPort::with(Script {
        status_fail: Some((1, Fail::Io)),
        ..Script::default()
    });
    let err = print_job(&port, &address(), job(), TIMEOUT, &PrintOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Transport(TransportError::StatusQuery {
            stage: Stage::FinalStatus,
            ..
        })
    ));
    assert!(err.job_sent());
    assert_eq!(port.written.lock().unwrap().len(), job().len());
    assert_eq!(port.count(&Call::Close), 1);
}

#[test]
fn test_cancel_before_open() {
    let port = MockPort::default();
    let token = CancelToken::new();
    token.cancel();
    let options = PrintOptions {
        cancel: Some(token),
        ..PrintOptions::default()
    };
    let err = print_job(&port, &address(), job(), TIMEOUT, &options).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Cancelled {
            stage: Stage::Open,
            sent: false
        }
    ));
    assert!(!err.job_sent());
    assert!(port.calls().is_empty());
}

#[test]
fn test_cancel_during_write_is_honored_after_it() {
    let token = CancelToken::new();
    let port = MockPort::with(Script {
        cancel_during_write: Some(token.clone()),
        ..Script::default()
    });
    let options = PrintOptions {
        cancel: Some(token),
        ..PrintOptions::default()
    };
    let err = print_job(&port, &address(), job(), TIMEOUT, &options).unwrap_err();

    assert!(matches!(
        err,
        PrintError::Cancelled {
            stage: Stage::FinalStatus,
            sent: true
        }
    ));
    assert!(err.job_sent());
    assert!(err.to_string().contains("job sent: true"));
    // The write ran to completion; only the final status was skipped
    assert_eq!(port.written.lock().unwrap().len(), job().len());
    assert_eq!(
        port.calls(),
        vec![
            Call::Open(address().to_string()),
            Call::Status,
            Call::Write(job().len()),
            Call::Close,
        ]
    );
}

#[test]
fn test_sensor_polarity_applied() {
    let drawer_high = RawStatus {
        printer: 0x12 | 0x04,
        ..RawStatus::READY
    };
    for (sensor, open) in [(SensorActive::High, true), (SensorActive::Low, false)] {
        let port = MockPort::with(Script {
            statuses: VecDeque::from([drawer_high, drawer_high]),
            ..Script::default()
        });
        let options = PrintOptions {
            sensor_active: sensor,
            ..PrintOptions::default()
        };
        let outcome = print_job(&port, &address(), job(), TIMEOUT, &options).unwrap();
        assert_eq!(outcome.final_status.drawer_open, open);
    }
}

#[test]
fn test_independent_sessions_in_parallel() {
    let ports: Vec<MockPort> = (0..4).map(|_| MockPort::default()).collect();
    let handles: Vec<_> = ports
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, port)| {
            thread::spawn(move || {
                let address: PortAddress = format!("TCP:10.0.0.{i}").parse().unwrap();
                print_job(&port, &address, job(), TIMEOUT, &PrintOptions::default())
                    .map(|o| o.sent)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().unwrap());
    }
    for (i, port) in ports.iter().enumerate() {
        assert_eq!(port.calls().first(), Some(&Call::Open(format!("TCP:10.0.0.{i}"))));
        assert_eq!(port.count(&Call::Close), 1);
    }
}

#[test]
fn test_one_job_one_write() {
    let port = MockPort::default();
    let job = job();
    let len = job.len();
    print_job(&port, &address(), job, TIMEOUT, &PrintOptions::default()).unwrap();
    // `job` has moved into print_job; sending it again does not compile
    assert_eq!(port.count(&Call::Write(len)), 1);
    assert_eq!(port.written.lock().unwrap().len(), len);
}

#[test]
fn test_check_firmware() {
    let port = MockPort::default();
    let info = check_firmware(&port, &address(), TIMEOUT, TIMEOUT).unwrap();
    assert_eq!(
        info,
        FirmwareInfo {
            model_name: "SM-S230i".to_string(),
            firmware_version: "Ver1.1".to_string(),
        }
    );
    assert_eq!(
        port.calls(),
        vec![Call::Open(address().to_string()), Call::Firmware, Call::Close]
    );
}

#[test]
fn test_firmware_timeout_names_stage() {
    let port = MockPort::with(Script {
        firmware: Fail::TimedOut,
        ..Script::default()
    });
    let err = check_firmware(&port, &address(), TIMEOUT, TIMEOUT).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Transport(TransportError::StatusTimeout {
            stage: Stage::Firmware,
            ..
        })
    ));
    assert!(!err.job_sent());
    assert_eq!(port.count(&Call::Close), 1);
}

#[test]
fn test_firmware_open_failure_never_queries() {
    let port = MockPort::with(Script {
        open: Fail::Io,
        ..Script::default()
    });
    let err = check_firmware(&port, &address(), TIMEOUT, TIMEOUT).unwrap_err();
    assert!(matches!(
        err,
        PrintError::Transport(TransportError::PortOpen { .. })
    ));
    assert_eq!(port.calls(), vec![Call::Open(address().to_string())]);
}
