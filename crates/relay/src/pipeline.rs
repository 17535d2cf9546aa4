use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    async_trait::async_trait,
    tgrelay_config::{DestinationConfig, RelayConfig},
    tracing::{debug, error, info, warn},
};

use crate::{
    destination::{Destination, MissingFields},
    naming::{MediaCategory, sanitize_file_name, synthesize_name},
    progress::{DEFAULT_MIN_INTERVAL, ProgressBridge, StatusSink, progress_channel},
    scratch::ScratchFile,
    sftp::SftpTransport,
    transport::{ConnectionErrorKind, Transport},
};

/// Opaque reference to a file held by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle(pub String);

#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub source: SourceHandle,
    /// Name for the uploaded file. Sanitized again before use.
    pub suggested_name: String,
    pub size_hint: Option<u64>,
}

/// Downloads a platform-held file to local storage.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Write the file behind `source` to `dest`, returning its size.
    async fn fetch(&self, source: &SourceHandle, dest: &Path) -> anyhow::Result<u64>;
}

/// Terminal result of one relay operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Success {
        public_url: String,
    },
    ConfigurationError {
        missing_fields: Vec<String>,
    },
    ConnectionError {
        kind: ConnectionErrorKind,
        detail: String,
    },
    UnexpectedError {
        detail: String,
    },
}

impl RelayOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// validate → retrieve → upload → publish, with the scratch file removed on
/// every exit path.
pub struct FileRelayPipeline {
    destination: DestinationConfig,
    source: Arc<dyn FileSource>,
    transport: Arc<dyn Transport>,
    scratch_dir: PathBuf,
    min_interval: Duration,
}

impl FileRelayPipeline {
    pub fn new(
        destination: DestinationConfig,
        source: Arc<dyn FileSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            destination,
            source,
            transport,
            scratch_dir: std::env::temp_dir(),
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    /// Build the production pipeline: SFTP transport, configured scratch
    /// directory and progress interval.
    pub fn from_config(config: &RelayConfig, source: Arc<dyn FileSource>) -> Self {
        Self::new(
            config.destination.clone(),
            source,
            Arc::new(SftpTransport::new()),
        )
        .with_scratch_dir(config.relay.scratch_dir())
        .with_min_interval(Duration::from_millis(config.relay.progress_interval_ms))
    }

    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Check the destination without relaying anything.
    pub fn validate(&self) -> Result<Destination, MissingFields> {
        Destination::resolve(&self.destination)
    }

    /// Relay one file. Progress and nothing else is written to `status`;
    /// rendering the outcome is left to the caller.
    pub async fn relay(&self, request: RelayRequest, status: Arc<dyn StatusSink>) -> RelayOutcome {
        let destination = match self.validate() {
            Ok(destination) => destination,
            Err(MissingFields(fields)) => {
                warn!(missing = ?fields, "relay refused, destination incomplete");
                return RelayOutcome::ConfigurationError {
                    missing_fields: fields.into_iter().map(String::from).collect(),
                };
            },
        };

        let name = sanitize_file_name(&request.suggested_name)
            .unwrap_or_else(|| synthesize_name(MediaCategory::Document, None));
        info!(file = %name, size_hint = ?request.size_hint, "relay started");

        let scratch = match ScratchFile::create(&self.scratch_dir, &name) {
            Ok(scratch) => scratch,
            Err(e) => {
                error!(dir = %self.scratch_dir.display(), error = %e, "cannot prepare scratch file");
                return RelayOutcome::UnexpectedError {
                    detail: format!("cannot prepare scratch file: {e}"),
                };
            },
        };

        match self.source.fetch(&request.source, scratch.path()).await {
            Ok(bytes) => debug!(file = %name, bytes, "source retrieved"),
            Err(e) => {
                error!(file = %name, error = %e, "source retrieval failed");
                return RelayOutcome::UnexpectedError {
                    detail: format!("could not retrieve the file: {e}"),
                };
            },
        }

        let remote_path = destination.remote_path(&name);
        let (reporter, rx) = progress_channel();
        let bridge = ProgressBridge::new(status, self.min_interval);
        let transport = Arc::clone(&self.transport);
        let worker_destination = destination.clone();
        // The guard moves into the worker so a panic or a cancelled relay
        // still removes the file once the worker stops using it.
        let upload = tokio::task::spawn_blocking(move || {
            transport.upload(&worker_destination, scratch.path(), &remote_path, &reporter)
        });

        let (joined, rendered) = tokio::join!(upload, bridge.run(rx));
        debug!(file = %name, rendered, "progress bridge closed");

        match joined {
            Ok(Ok(bytes)) => {
                let public_url = destination.public_url(&name);
                info!(file = %name, bytes, url = %public_url, "relay complete");
                RelayOutcome::Success { public_url }
            },
            Ok(Err(e)) => {
                warn!(file = %name, kind = %e.kind(), error = %e, "upload failed");
                RelayOutcome::ConnectionError {
                    kind: e.kind(),
                    detail: e.detail().to_string(),
                }
            },
            Err(e) => {
                error!(file = %name, error = %e, "upload worker failed");
                RelayOutcome::UnexpectedError {
                    detail: format!("upload worker failed: {e}"),
                }
            },
        }
    }
}
