//! Errors raised by [`InverterServer`](super::InverterServer) operations.

use std::io;

use thiserror::Error;

use crate::{frame::FrameError, publish::PublishError};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or configuring the listener failed.
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
}

/// Failures in the decode → convert → publish pipeline for one frame.
///
/// These never leave the dispatch task; they are logged and counted.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}
