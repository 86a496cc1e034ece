//! Terminal module: escape sequences, output buffering and streams.
//!
//! This module contains:
//! - [`ansi`]: Pure builders for the control sequences the display uses
//! - [`OutputBuffer`]: Accumulates one operation's output for a single write
//! - [`TermStream`]: The byte sink contract, with [`StdStream`] and
//!   [`CaptureStream`] implementations

pub mod ansi;
mod output;
mod stream;

pub use output::OutputBuffer;
pub use stream::{CaptureStream, StdStream, StreamId, TermSize, TermStream};
