//! File relay core: destination resolution, the progress bridge, the SFTP
//! transport and the pipeline that ties them together.
//!
//! A relay runs validate → retrieve → upload → publish, and removes its
//! scratch file on every exit path. The upload itself is blocking and runs on
//! a worker thread; progress flows back to the caller's task over a bounded
//! channel.

pub mod destination;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod scratch;
pub mod sftp;
pub mod transport;

pub use {
    destination::{Destination, MissingFields},
    pipeline::{FileRelayPipeline, FileSource, RelayOutcome, RelayRequest, SourceHandle},
    progress::{ProgressBridge, ProgressReporter, ProgressUpdate, StatusSink},
    sftp::SftpTransport,
    transport::{ConnectionErrorKind, Transport, TransportError},
};
