//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive shell session, including
//! pattern-based prompt detection and terminal control stripping.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{combine_patterns, last_prompt};
pub use pty::{PtyChannel, PtyConfig};
