use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::TabletError;
use crate::state::ConnectionState;
use crate::transport::{Transport, PROP_MODEL, PROP_OS_VERSION};

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^([^:]+):(\d+)$").unwrap();
}

fn parse_address(id: &str) -> Result<(String, u16), TabletError> {
    let caps = ADDRESS_RE
        .captures(id)
        .ok_or_else(|| TabletError::InvalidAddress(id.to_string()))?;
    let host = caps[1].to_string();
    let port = caps[2]
        .parse::<u16>()
        .map_err(|_| TabletError::InvalidAddress(id.to_string()))?;
    Ok((host, port))
}

/// Connection lifecycle plus the shell command channel for one device.
///
/// At most one connection attempt is ever in flight; callers that race an
/// attempt wait for it and reuse its outcome instead of dialing again.
pub(crate) struct Connection {
    id: String,
    transport: Arc<dyn Transport>,
    auto_reconnect: bool,
    state_tx: watch::Sender<ConnectionState>,
    connect_lock: Mutex<()>,
}

impl Connection {
    pub(crate) fn new(id: &str, transport: Arc<dyn Transport>, auto_reconnect: bool) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Offline);
        Self {
            id: id.to_string(),
            transport,
            auto_reconnect,
            state_tx,
            connect_lock: Mutex::new(()),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    pub(crate) fn is_online(&self) -> bool {
        self.state_tx.borrow().is_online()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Explicit connect, regardless of the auto-reconnect flag.
    pub(crate) async fn establish(&self) -> Result<(), TabletError> {
        self.connect_if_needed(true).await
    }

    /// Lazy connect on behalf of a command; honors the auto-reconnect flag.
    pub(crate) async fn ensure_connected(&self) -> Result<(), TabletError> {
        self.connect_if_needed(false).await
    }

    async fn connect_if_needed(&self, explicit: bool) -> Result<(), TabletError> {
        if self.state_tx.borrow().is_online() {
            return Ok(());
        }
        if !explicit && !self.auto_reconnect {
            return Err(TabletError::Offline);
        }

        let _guard = self.connect_lock.lock().await;
        // A concurrent caller may have completed the handshake while we
        // waited for the lock.
        if self.state_tx.borrow().is_online() {
            return Ok(());
        }

        let (host, port) = parse_address(&self.id)?;
        info!(id = %self.id, "connecting");
        let _ = self.state_tx.send(ConnectionState::Connecting);

        match self.handshake(&host, port).await {
            Ok(online) => {
                let _ = self.state_tx.send(online);
                Ok(())
            }
            Err(e) => {
                warn!(id = %self.id, error = %e, "connection attempt failed");
                let _ = self.state_tx.send(ConnectionState::Offline);
                Err(e)
            }
        }
    }

    async fn handshake(&self, host: &str, port: u16) -> Result<ConnectionState, TabletError> {
        self.transport.connect(host, port).await?;
        let props = self.transport.properties(&self.id).await?;
        let name = props
            .get(PROP_MODEL)
            .cloned()
            .unwrap_or_else(|| self.id.clone());
        let os_version = props
            .get(PROP_OS_VERSION)
            .cloned()
            .unwrap_or_else(|| "<Unknown>".to_string());
        info!(id = %self.id, %name, %os_version, "device online");
        Ok(ConnectionState::Online { name, os_version })
    }

    /// Run a shell command on the device, reconnecting first if needed.
    ///
    /// Transport errors propagate unchanged; retry policy belongs to the
    /// caller.
    pub(crate) async fn shell(&self, command: &str) -> Result<String, TabletError> {
        self.ensure_connected().await?;
        debug!(id = %self.id, %command, "shell");
        let raw = self.transport.shell(&self.id, command).await?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub(crate) fn mark_offline(&self) {
        let _ = self.state_tx.send(ConnectionState::Offline);
    }
}
