use thiserror::Error;

// Basic error handling with thiserror
#[derive(Error, Debug)]
pub enum TabletError {
    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("device is offline")]
    Offline,

    #[error("invalid device address `{0}` (expected host:port)")]
    InvalidAddress(String),

    #[error("failed to parse `{command}` output: {detail}")]
    Parse {
        command: &'static str,
        detail: String,
    },

    #[error("failed to resolve display name for `{url}`")]
    Resolution {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("task panicked or cancelled")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl TabletError {
    /// Wrap an arbitrary transport-layer failure without losing the source.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TabletError::Transport(Box::new(err))
    }

    pub(crate) fn parse(command: &'static str, detail: impl Into<String>) -> Self {
        TabletError::Parse {
            command,
            detail: detail.into(),
        }
    }
}
