//! Configuration for the sync engine.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on a whole HTTP exchange (connect, request and response).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Credentials and location for one sync run.
///
/// Immutable for the duration of a run. The token is redacted from `Debug`
/// output so configs can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncCredentials {
    /// Server base URL, e.g. `https://books.example.com/`.
    pub endpoint: String,
    /// Bearer token attached to every request.
    pub token: String,
    /// Directory holding the downloaded books.
    pub books_dir: PathBuf,
}

impl SyncCredentials {
    /// Creates a new set of credentials.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        books_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            books_dir: books_dir.into(),
        }
    }
}

impl fmt::Debug for SyncCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("books_dir", &self.books_dir)
            .finish()
    }
}

/// What the engine does when one download fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPolicy {
    /// Abort the run and return the first download error.
    #[default]
    FailFast,
    /// Record the failure in the report and carry on with the next book.
    Continue,
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server, token and library directory.
    pub credentials: SyncCredentials,
    /// Request timeout.
    pub timeout: Duration,
    /// Behavior on a failed download.
    pub policy: DownloadPolicy,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(credentials: SyncCredentials) -> Self {
        Self {
            credentials,
            timeout: DEFAULT_TIMEOUT,
            policy: DownloadPolicy::default(),
            user_agent: format!("kosync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the download failure policy.
    pub fn with_policy(mut self, policy: DownloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SyncCredentials {
        SyncCredentials::new("https://books.example.com/", "s3cret", "/mnt/onboard/kosync")
    }

    #[test]
    fn sync_config_defaults() {
        let config = SyncConfig::new(credentials());
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.policy, DownloadPolicy::FailFast);
        assert!(config.user_agent.starts_with("kosync/"));
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new(credentials())
            .with_timeout(Duration::from_secs(60))
            .with_policy(DownloadPolicy::Continue)
            .with_user_agent("test-agent");

        assert_eq!(config.credentials.endpoint, "https://books.example.com/");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.policy, DownloadPolicy::Continue);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", SyncConfig::new(credentials()));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("books.example.com"));
    }
}
