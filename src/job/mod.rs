//! # Print Jobs
//!
//! Primitives in, one immutable byte stream out.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────┐     ┌──────────┐
//! │ PrintPrimitive[] │ ──► │ compose  │ ──► │ PrintJob │
//! │ TrailingAction[] │     │ (state)  │     │ (bytes)  │
//! └──────────────────┘     └──────────┘     └──────────┘
//! ```
//!
//! - [`primitive`]: The primitive sum type, trailing actions, [`PrintJob`]
//! - [`compose`](mod@compose): Encoding with [`FormattingState`] threading
//! - [`schema`]: JSON documents
//!
//! [`FormattingState`]: crate::protocol::text::FormattingState

pub mod compose;
pub mod primitive;
pub mod schema;

pub use compose::{compose, encode_primitive, encode_trailing};
pub use primitive::{PrintJob, PrintPrimitive, TrailingAction};
pub use schema::JobDocument;
