//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for Star portable printers running the
//! ESC/POS emulation.
//!
//! ## Module Structure
//!
//! - [`commands`]: Control bytes, init, feed, cut, drawer, status requests
//! - [`text`]: Text attributes, [`text::FormattingState`], text-run encoders
//! - [`codepage`]: Unicode to PC437 for single-byte text
//! - [`barcode`]: Linear barcodes, QR codes, PDF417
//! - [`graphics`]: Raw and compressed raster images
//! - [`page`]: Page mode wrapping
//!
//! ## Usage Example
//!
//! ```
//! use estrellita::printer::Limits;
//! use estrellita::protocol::{commands, text};
//!
//! let limits = Limits::default();
//! let mut data = commands::init();
//! data.extend(text::encode_text(
//!     &text::FormattingState::new().center().emphasized(true),
//!     b"RECEIPT",
//!     &limits,
//! ));
//! data.extend(commands::feed_lines(3));
//! ```

pub mod barcode;
pub mod codepage;
pub mod commands;
pub mod graphics;
pub mod page;
pub mod text;
