use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TabletError;

/// Device property holding the marketing model name.
pub const PROP_MODEL: &str = "ro.product.model";
/// Device property holding the Android release string.
pub const PROP_OS_VERSION: &str = "ro.build.version.release";

/// Remote-execution channel to an ADB-style daemon.
///
/// The library never talks to a device directly; everything goes through an
/// implementation of this trait injected at construction. Implementations
/// should surface their native failures via [`TabletError::transport`] so the
/// underlying error stays available as the source.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish (or re-establish) the connection to a networked device.
    async fn connect(&self, host: &str, port: u16) -> Result<(), TabletError>;

    /// Run a shell command on the device and return its raw output.
    async fn shell(&self, device_id: &str, command: &str) -> Result<Bytes, TabletError>;

    /// Fetch the device property map (`ro.*` keys).
    async fn properties(&self, device_id: &str) -> Result<HashMap<String, String>, TabletError>;
}
