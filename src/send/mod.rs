//! # Send Module
//!
//! Turns a resolved text unit into framed serial writes: split on line
//! terminators, drop blank lines, terminate every frame with a single `\n`,
//! and write the frames sequentially in source order.

pub mod transform;

use crate::display::DisplayLog;
use crate::error::{LinePortError, Result};
use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

/// Line terminator pattern shared by the dispatcher and the transform.
pub(crate) static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n").expect("Invalid regex pattern"));

/// One newline-terminated line of text written as a single transmission
/// unit.
///
/// A frame is never blank: construction rejects lines that are empty after
/// trimming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    line: String,
}

impl Frame {
    /// Builds a frame from one line, rejecting blank lines.
    pub fn new(line: &str) -> Option<Self> {
        if line.trim().is_empty() {
            None
        } else {
            Some(Frame {
                line: line.to_string(),
            })
        }
    }

    /// The frame's line, without the terminator.
    pub fn as_line(&self) -> &str {
        &self.line
    }

    /// UTF-8 payload bytes: the line plus a single `\n` terminator.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.line.clone().into_bytes();
        bytes.push(b'\n');
        bytes
    }
}

/// Write side of an open connection, as seen by the dispatcher.
///
/// The seam keeps dispatch testable without a live transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameSink {
    /// True when the underlying connection is open for writing.
    fn is_open(&self) -> bool;

    /// Writes one frame payload, completing only when the write finishes.
    async fn write_frame(&mut self, payload: Vec<u8>) -> Result<()>;
}

/// Sends `text` as individual line frames and returns how many were sent.
///
/// Fails fast with [`LinePortError::NotConnected`] when the sink is not
/// open; nothing is queued for later. Blank lines are dropped. The display
/// log is cleared before a non-empty batch on the assumption that a fresh
/// request/response exchange is about to begin; a "nothing to send" outcome
/// (`Ok(0)`) leaves the log untouched.
///
/// Frames are written one at a time in source order. A write failure aborts
/// the remaining frames in the batch; frames already written stay sent.
pub async fn send_text<S: FrameSink + ?Sized>(
    sink: &mut S,
    log: &DisplayLog,
    text: &str,
) -> Result<usize> {
    if !sink.is_open() {
        return Err(LinePortError::NotConnected);
    }

    let frames: Vec<Frame> = LINE_BREAK.split(text).filter_map(Frame::new).collect();
    if frames.is_empty() {
        debug!("Nothing to send: no non-blank lines");
        return Ok(0);
    }

    log.clear();
    let mut sent = 0;
    for frame in &frames {
        sink.write_frame(frame.to_bytes()).await?;
        sent += 1;
    }
    info!("Sent {sent} frame(s)");
    Ok(sent)
}
