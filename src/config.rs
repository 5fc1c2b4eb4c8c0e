use std::time::Duration;

/// Quiet period after which an unused archive descriptor is released.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

/// What to do when the archive file is found replaced on reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityPolicy {
    /// Log and terminate the process with exit status 1.
    #[default]
    Exit,
    /// Return [`ZipFsError::IdentityMismatch`](crate::ZipFsError::IdentityMismatch)
    /// and refuse every later operation on the archive.
    Error,
}

/// Tunables for a mounted archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFsConfig {
    pub idle_timeout: Duration,
    pub identity_policy: IdentityPolicy,
}

impl Default for ZipFsConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            identity_policy: IdentityPolicy::default(),
        }
    }
}

impl ZipFsConfig {
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_identity_policy(mut self, policy: IdentityPolicy) -> Self {
        self.identity_policy = policy;
        self
    }
}
