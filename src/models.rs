use serde::Serialize;
use std::fmt;

/// Minimal serializable view of a tablet: identity and display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabletSnapshot {
    pub id: String,
    pub name: String,
}

/// What the device is currently playing, as observed by the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NowPlaying {
    /// No media URL in the foreground activity stack.
    #[default]
    Nothing,
    /// A URL is playing and its display name resolved.
    Media { url: String, name: String },
    /// A URL is playing but the host failed to resolve a name for it.
    ResolutionFailed { url: String },
}

impl NowPlaying {
    pub fn url(&self) -> Option<&str> {
        match self {
            NowPlaying::Nothing => None,
            NowPlaying::Media { url, .. } => Some(url),
            NowPlaying::ResolutionFailed { url } => Some(url),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, NowPlaying::Nothing)
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NowPlaying::Nothing => write!(f, "<nothing>"),
            NowPlaying::Media { name, .. } => write!(f, "{}", name),
            NowPlaying::ResolutionFailed { .. } => write!(f, "Err"),
        }
    }
}
