//! Error types.

use crate::terminal::StreamId;
use std::io;
use thiserror::Error;

/// Errors from the display engine.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Another display engine already owns this stream.
    #[error("a display is already active on {0}")]
    AlreadyActive(StreamId),

    /// The display has been shut down.
    #[error("display has been shut down")]
    Closed,

    /// Writing to the stream failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from building meter bars.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeterError {
    /// `add_remaining` asked for a total below what is already accumulated.
    #[error("new total {total} is less than accumulated total {accumulated}")]
    TotalBelowAccumulated {
        /// Requested grand total.
        total: u64,
        /// Sum of the segments already added.
        accumulated: u64,
    },
}

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The display engine could not be created.
    #[error(transparent)]
    Display(#[from] DisplayError),

    /// A log file or start marker could not be opened.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A global tracing subscriber is already installed.
    #[error("could not install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
