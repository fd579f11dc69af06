//! # Transform Module
//!
//! Mode-dependent per-line mapping applied to a resolved unit before it is
//! split into frames. Pure string work, no I/O.

use super::LINE_BREAK;
use crate::error::LinePortError;
use std::fmt;
use std::str::FromStr;

/// Fixed tag prepended to each non-blank line in [`SendMode::Decorated`].
pub const LINE_TAG: &str = "br";

/// Transmission mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SendMode {
    /// Lines are sent unchanged.
    #[default]
    Plain,
    /// Each non-blank line is prefixed with [`LINE_TAG`] and a space.
    Decorated,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Plain => write!(f, "plain"),
            SendMode::Decorated => write!(f, "decorated"),
        }
    }
}

impl FromStr for SendMode {
    type Err = LinePortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(SendMode::Plain),
            "decorated" => Ok(SendMode::Decorated),
            other => Err(LinePortError::invalid_config(format!(
                "unknown send mode '{other}', expected 'plain' or 'decorated'"
            ))),
        }
    }
}

/// Applies the mode's per-line mapping to `text`.
///
/// Plain is the identity. Decorated splits on line terminators, prefixes
/// each non-blank line with [`LINE_TAG`] plus a space, maps blank lines to
/// empty strings, and rejoins with `\n`.
///
/// # Examples
///
/// ```
/// use lineport::send::transform::{apply, SendMode};
///
/// assert_eq!(apply(SendMode::Plain, "hello"), "hello");
/// assert_eq!(apply(SendMode::Decorated, "hello"), "br hello");
/// ```
#[must_use]
pub fn apply(mode: SendMode, text: &str) -> String {
    match mode {
        SendMode::Plain => text.to_string(),
        SendMode::Decorated => LINE_BREAK
            .split(text)
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{LINE_TAG} {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_is_identity() {
        assert_eq!(apply(SendMode::Plain, "a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_decorated_empty_stays_empty() {
        assert_eq!(apply(SendMode::Decorated, ""), "");
    }

    #[test]
    fn test_decorated_single_line() {
        assert_eq!(apply(SendMode::Decorated, "x"), "br x");
    }

    #[test]
    fn test_decorated_multiline() {
        assert_eq!(apply(SendMode::Decorated, "a\nb"), "br a\nbr b");
    }

    #[test]
    fn test_decorated_blank_lines_become_empty() {
        assert_eq!(apply(SendMode::Decorated, "a\n  \nb"), "br a\n\nbr b");
    }

    #[test]
    fn test_decorated_normalizes_crlf() {
        assert_eq!(apply(SendMode::Decorated, "a\r\nb"), "br a\nbr b");
    }

    #[test]
    fn test_mode_round_trips_through_str() {
        assert_eq!("plain".parse::<SendMode>().unwrap(), SendMode::Plain);
        assert_eq!("decorated".parse::<SendMode>().unwrap(), SendMode::Decorated);
        assert!("hex".parse::<SendMode>().is_err());
    }
}
