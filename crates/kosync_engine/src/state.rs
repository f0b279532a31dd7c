//! Sync engine state machine.

use crate::client::ReqwestClient;
use crate::config::{DownloadPolicy, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::fetcher::Fetcher;
use crate::http::HttpTransport;
use crate::library::Library;
use crate::transport::SyncTransport;
use kosync_protocol::{BookId, SyncRequest};
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine is idle, not syncing.
    Idle,
    /// Engine is listing the local library.
    Scanning,
    /// Engine is exchanging the inventory with the server.
    Reconciling,
    /// Engine is downloading missing books.
    Downloading,
    /// Engine has completed a run.
    Synced,
    /// Engine encountered an error.
    Error,
}

impl SyncState {
    /// Returns true if the engine is in an active sync state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Scanning | SyncState::Reconciling | SyncState::Downloading
        )
    }

    /// Returns true if the engine can start a new run.
    pub fn can_start_sync(&self) -> bool {
        matches!(self, SyncState::Idle | SyncState::Synced | SyncState::Error)
    }
}

/// Statistics accumulated over the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total number of runs completed.
    pub runs_completed: u64,
    /// Total number of books downloaded.
    pub books_downloaded: u64,
    /// Total number of bytes written to the library.
    pub bytes_downloaded: u64,
    /// Total number of downloads that failed.
    pub failed_downloads: u64,
    /// Last successful run time.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// A download that failed under [`DownloadPolicy::Continue`].
#[derive(Debug)]
pub struct DownloadFailure {
    /// Book that could not be fetched.
    pub id: BookId,
    /// Why.
    pub error: SyncError,
}

/// Result of one sync run.
#[derive(Debug)]
pub struct SyncReport {
    /// Number of books found locally before the run.
    pub local_books: usize,
    /// Number of download instructions the server returned.
    pub requested: usize,
    /// Number of books downloaded successfully.
    pub downloaded: usize,
    /// Bytes written to the library.
    pub bytes: u64,
    /// Downloads that failed. Always empty under [`DownloadPolicy::FailFast`].
    pub failures: Vec<DownloadFailure>,
    /// Duration of the run.
    pub duration: Duration,
}

impl SyncReport {
    fn new(local_books: usize, requested: usize) -> Self {
        Self {
            local_books,
            requested,
            downloaded: 0,
            bytes: 0,
            failures: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the server had nothing new.
    pub fn is_up_to_date(&self) -> bool {
        self.requested == 0
    }

    /// Returns true if every requested book was downloaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.downloaded == self.requested
    }
}

/// The sync engine runs the scan → reconcile → download pipeline.
///
/// One engine owns one library and one transport. Runs are sequential: the
/// server is asked once, then each instruction is fetched to completion, in
/// the order the server returned them, before the next one starts.
pub struct SyncEngine<T: SyncTransport> {
    config: SyncConfig,
    transport: T,
    library: Library,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl SyncEngine<HttpTransport<ReqwestClient>> {
    /// Creates an engine talking to the configured server over HTTP.
    pub fn over_http(config: SyncConfig) -> SyncResult<Self> {
        let client = ReqwestClient::from_config(&config)?;
        let transport = HttpTransport::from_config(&config, client);
        Ok(Self::new(config, transport))
    }
}

impl<T: SyncTransport> SyncEngine<T> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        let library = Library::new(config.credentials.books_dir.clone());
        Self {
            config,
            transport,
            library,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the library.
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sets the state.
    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Performs one full run.
    ///
    /// Returns how many books were obtained. Zero means the library was
    /// already up to date. Under [`DownloadPolicy::FailFast`] the first
    /// failed download aborts the run; files fetched before it stay on disk
    /// and are not requested again next time.
    pub fn run(&self) -> SyncResult<SyncReport> {
        let start = Instant::now();

        {
            let mut state = self.state.write();
            if !state.can_start_sync() {
                return Err(SyncError::InvalidStateTransition {
                    from: format!("{:?}", *state),
                    to: format!("{:?}", SyncState::Scanning),
                });
            }
            *state = SyncState::Scanning;
        }

        match self.run_cycle() {
            Ok(mut report) => {
                report.duration = start.elapsed();
                self.set_state(SyncState::Synced);

                let mut stats = self.stats.write();
                stats.runs_completed += 1;
                stats.books_downloaded += report.downloaded as u64;
                stats.bytes_downloaded += report.bytes;
                stats.failed_downloads += report.failures.len() as u64;
                stats.last_sync_time = Some(Instant::now());
                stats.last_error = None;
                drop(stats);

                info!(
                    downloaded = report.downloaded,
                    failed = report.failures.len(),
                    elapsed_ms = report.duration.as_millis() as u64,
                    "sync finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.handle_error(&e);
                Err(e)
            }
        }
    }

    fn run_cycle(&self) -> SyncResult<SyncReport> {
        self.library.ensure()?;
        let local = self.library.scan()?;
        info!(dir = %self.library.path().display(), books = local.len(), "scanned library");

        self.set_state(SyncState::Reconciling);
        let request = SyncRequest::new(local);
        let response = self.transport.reconcile(&request)?;
        info!(missing = response.len(), "server reported missing books");

        self.set_state(SyncState::Downloading);
        let mut report = SyncReport::new(request.len(), response.len());
        let fetcher = Fetcher::new(&self.library);

        for instruction in &response.instructions {
            match fetcher.fetch(&self.transport, instruction) {
                Ok(bytes) => {
                    info!(id = %instruction.id, bytes, "downloaded book");
                    report.downloaded += 1;
                    report.bytes += bytes;
                }
                Err(error) => match self.config.policy {
                    DownloadPolicy::FailFast => return Err(error),
                    DownloadPolicy::Continue => {
                        warn!(id = %instruction.id, %error, "download failed, continuing");
                        report.failures.push(DownloadFailure {
                            id: instruction.id,
                            error,
                        });
                    }
                },
            }
        }

        Ok(report)
    }

    fn handle_error(&self, error: &SyncError) {
        warn!(%error, "sync failed");
        self.set_state(SyncState::Error);
        self.stats.write().last_error = Some(error.to_string());
    }
}
