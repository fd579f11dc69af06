//! # LinePort
//!
//! A line-oriented serial transmission tool: compose or load multiline text,
//! pick lines, and send them one-by-one or in bulk over a serial connection,
//! with live feedback of received data.
//!
//! ## Architecture
//!
//! The project is organized into the following modules:
//!
//! - [`buffer`]: Editable text with caret/selection and line resolution
//! - [`send`]: Line framing, the optional per-line transform, and dispatch
//! - [`serial`]: Connection lifecycle, frame writes, and the read loop
//! - [`display`]: The receive-side display log and session capture
//! - [`settings`]: Persisted preferences
//! - [`console`]: The interactive front end
//! - [`error`]: Custom error types for the application

pub mod buffer;
pub mod console;
pub mod display;
pub mod error;
pub mod send;
pub mod serial;
pub mod settings;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::buffer::TextBuffer;
    pub use crate::display::{DisplayLog, SessionLog};
    pub use crate::error::*;
    pub use crate::send::transform::{SendMode, apply};
    pub use crate::send::{Frame, FrameSink, send_text};
    pub use crate::serial::{Connection, ConnectionState};
    pub use crate::settings::Preferences;
}
