//! # Estrellita - Portable Receipt Printer Encoder
//!
//! Estrellita turns structured print requests into the ESC/POS-style command
//! stream Star portable printers understand, and sends it over Bluetooth,
//! USB, or LAN with status checks and timeouts.
//!
//! - **Encoding**: text runs, barcodes, QR and PDF417 codes, raster bitmaps
//! - **Composition**: one buffer per job, formatting state threaded through
//! - **Transport**: timeout-bounded sessions with pre-flight and final status
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use estrellita::{
//!     job::{compose, PrintPrimitive, TrailingAction},
//!     print::{print_job, PrintOptions},
//!     printer::{CorrectionLevel, Limits},
//!     protocol::text::FormattingState,
//!     transport::{serial::SerialPort, PortAddress},
//! };
//!
//! let limits = Limits::PORTABLE_2INCH;
//! let job = compose(
//!     &[
//!         PrintPrimitive::text("HELLO", FormattingState::new().emphasized(true).center()),
//!         PrintPrimitive::QrCode {
//!             correction_level: CorrectionLevel::M,
//!             module_size: 4,
//!             size_by_ec_level: 0,
//!             payload: b"https://example.com".to_vec(),
//!         },
//!     ],
//!     &[TrailingAction::Feed { lines: 3 }],
//!     &limits,
//! )?;
//!
//! let address: PortAddress = "BT:/dev/rfcomm0".parse().map_err(estrellita::Error::Address)?;
//! let outcome = print_job(
//!     &SerialPort::new(),
//!     &address,
//!     job,
//!     Duration::from_secs(30),
//!     &PrintOptions::default(),
//! )?;
//! println!("final status: {}", outcome.final_status);
//! # Ok::<(), estrellita::Error>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`printer`] | Model classes and their limits |
//! | [`protocol`] | Command builders (text, codes, raster, page mode) |
//! | [`render`] | Image scaling, dithering, bit packing |
//! | [`job`] | Primitives, trailing actions, the composer, JSON jobs |
//! | [`encode`] | One-shot encoders for single primitives |
//! | [`transport`] | Ports, status decoding, the session state machine |
//! | [`print`] | The open / check / write / check / close lifecycle |
//! | [`receipt`] | Sample receipts |
//! | [`signature`] | Signature-pad strokes to bitmap |
//! | [`error`] | Error types |

pub mod encode;
pub mod error;
pub mod job;
pub mod print;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod render;
pub mod signature;
pub mod transport;

// Re-exports for convenience
pub use encode::{encode_barcode, encode_bitmap, encode_pdf417, encode_qr, encode_text_print};
pub use error::Error;
pub use print::print_job;
pub use printer::{Limits, ModelClass};
