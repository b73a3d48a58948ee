mod commands;
pub use commands::TabletCommand;
mod connection;
use connection::Connection;
mod error;
pub use error::TabletError;
mod models;
pub use models::{NowPlaying, TabletSnapshot};
mod parsers;
pub use parsers::{parse_battery_level, parse_music_volume, parse_playing_url, parse_screen_awake};
mod properties;
pub use properties::Property;
mod screen;
use screen::ScreenRelay;
mod settings;
pub use settings::{Settings, SETTINGS};
mod state;
pub use state::ConnectionState;
mod transport;
pub use transport::{Transport, PROP_MODEL, PROP_OS_VERSION};
mod volume;
use volume::VolumeControl;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Display label used while the device is not online.
const OFFLINE_LABEL: &str = "Offline";

/// Host-side collaborator for playback decisions and URL naming.
///
/// The tablet itself never decides what a URL means; frontends hand
/// user-entered URLs to the host via [`TabletHost::play_url`] (which
/// typically calls back into [`Tablet::play_url`]), and the poll loop asks
/// the host for a display name of whatever the device is playing.
#[async_trait]
pub trait TabletHost: Send + Sync {
    async fn play_url(
        &self,
        tablet: &TabletSnapshot,
        url: &str,
        name: &str,
    ) -> Result<(), TabletError>;

    async fn name_from_url(&self, url: &str) -> Result<String, TabletError>;
}

/// Client for one Android tablet reachable over an ADB-style shell transport.
///
/// Synchronizes screen power, audio volume, battery level and the currently
/// playing media with in-process observable properties, and exposes actuation
/// operations that converge the device to a desired state. The transport
/// offers no structured feedback; state is recovered by parsing diagnostic
/// command output on a fixed polling interval.
///
/// # Logging
///
/// This library uses the `tracing` crate for logging. To enable logs,
/// initialize a tracing subscriber in your application:
/// ```no_run
/// use tracing::Level;
/// use tracing_subscriber::FmtSubscriber;
///
/// let subscriber = FmtSubscriber::builder()
///     .with_max_level(Level::DEBUG)
///     .finish();
///
/// tracing::subscriber::set_global_default(subscriber)
///     .expect("Failed to set tracing subscriber");
/// ```
pub struct Tablet {
    id: String,
    short_name: String,
    connection: Arc<Connection>,
    host: Arc<dyn TabletHost>,
    volume: Arc<VolumeControl>,
    screen: Arc<ScreenRelay>,
    battery: Property<Option<u8>>,
    now_playing: Property<NowPlaying>,
    // Exactly one poll task per device, alive only while online.
    poll_task: Mutex<Option<JoinHandle<()>>>,
    // Flag to signal the poll task to stop
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

/// Everything the spawned poll task needs, detached from `&self`.
struct PollerContext {
    connection: Arc<Connection>,
    host: Arc<dyn TabletHost>,
    volume: Arc<VolumeControl>,
    screen: Arc<ScreenRelay>,
    battery: Property<Option<u8>>,
    now_playing: Property<NowPlaying>,
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl Tablet {
    /// Create a client for the device at `id` (`host:port`).
    ///
    /// `auto_reconnect` permits commands to lazily re-establish a lost
    /// connection; when false, operations simply fail while offline.
    pub fn new(
        id: &str,
        short_name: &str,
        host: Arc<dyn TabletHost>,
        auto_reconnect: bool,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            id: id.to_string(),
            short_name: short_name.to_string(),
            connection: Arc::new(Connection::new(id, transport, auto_reconnect)),
            host,
            volume: Arc::new(VolumeControl::new()),
            screen: Arc::new(ScreenRelay::new()),
            battery: Property::new(None),
            now_playing: Property::new(NowPlaying::Nothing),
            poll_task: Mutex::new(None),
            stop_signal: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Display name: `"<model>, android <version>"` once the properties have
    /// been fetched, the fixed offline label otherwise.
    pub fn name(&self) -> String {
        match self.connection.state() {
            ConnectionState::Online { name, os_version } => {
                format!("{}, android {}", name, os_version)
            }
            _ => OFFLINE_LABEL.to_string(),
        }
    }

    pub fn online(&self) -> bool {
        self.connection.is_online()
    }

    pub fn current_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn state_receiver(&self) -> tokio::sync::watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Minimal serializable view: identity and display name only.
    pub fn snapshot(&self) -> TabletSnapshot {
        TabletSnapshot {
            id: self.id.clone(),
            name: self.name(),
        }
    }

    // --- Observable properties ---

    pub fn battery(&self) -> &Property<Option<u8>> {
        &self.battery
    }

    pub fn screen_on(&self) -> &Property<bool> {
        self.screen.on()
    }

    pub fn volume_level(&self) -> &Property<u8> {
        self.volume.level()
    }

    pub fn now_playing(&self) -> &Property<NowPlaying> {
        &self.now_playing
    }

    // --- Query shortcuts ---

    pub fn battery_level(&self) -> Option<u8> {
        self.battery.get()
    }

    pub fn screen_is_on(&self) -> bool {
        self.screen.on().get()
    }

    pub fn volume(&self) -> u8 {
        self.volume.level().get()
    }

    pub fn playing_url(&self) -> Option<String> {
        self.now_playing.get().url().map(str::to_string)
    }

    // --- Lifecycle ---

    /// Connect to the device and start the polling scheduler.
    pub async fn init(&self) -> Result<(), TabletError> {
        self.connection.establish().await?;
        self.ensure_poller().await;
        Ok(())
    }

    /// Cancel the polling scheduler and mark the device offline.
    ///
    /// In-flight command futures are dropped; their results are discarded.
    /// Calling `stop` twice is a no-op the second time.
    pub async fn stop(&self) -> Result<(), TabletError> {
        info!(id = %self.id, "stopping");
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
        let handle = self.poll_task.lock().await.take();
        if let Some(handle) = handle {
            handle.await?;
        }
        self.connection.mark_offline();
        Ok(())
    }

    // --- Actuation ---

    /// Set the desired logical volume (0-100, clamped) and converge the
    /// device's hardware volume toward it.
    pub async fn set_volume(&self, percent: i32) -> Result<(), TabletError> {
        let result = self.volume.set_desired(&self.connection, percent).await;
        if result.is_ok() {
            self.ensure_poller().await;
        }
        result
    }

    /// Switch the screen on or off, verifying the result after the settle
    /// delay. The published state is what the device reports, not what was
    /// requested.
    pub async fn set_screen_on(&self, desired: bool) -> Result<(), TabletError> {
        let result = self.screen.switch_to(&self.connection, desired).await;
        if result.is_ok() {
            self.ensure_poller().await;
        }
        result
    }

    /// Stop whatever is playing, then start playback of `url` fullscreen.
    pub async fn play_url(&self, url: &str) -> Result<(), TabletError> {
        self.stop_playing().await?;
        self.shell_cmd(&TabletCommand::PlayUrl {
            url: url.to_string(),
        })
        .await
        .map(|_| ())
    }

    pub async fn stop_playing(&self) -> Result<(), TabletError> {
        self.shell_cmd(&TabletCommand::StopPlayback).await.map(|_| ())
    }

    pub async fn pause(&self) -> Result<(), TabletError> {
        self.shell_cmd(&TabletCommand::Pause).await.map(|_| ())
    }

    pub async fn resume(&self) -> Result<(), TabletError> {
        self.shell_cmd(&TabletCommand::Resume).await.map(|_| ())
    }

    pub async fn reboot(&self) -> Result<(), TabletError> {
        self.shell_cmd(&TabletCommand::Reboot).await.map(|_| ())
    }

    /// Run one command over the channel; a success implies the device is
    /// online, so make sure the poll task is running.
    async fn shell_cmd(&self, command: &TabletCommand) -> Result<String, TabletError> {
        let output = self.connection.shell(&command.shell()).await?;
        self.ensure_poller().await;
        Ok(output)
    }

    // --- Polling scheduler ---

    /// Idempotent: spawns the poll task only if none is running.
    async fn ensure_poller(&self) {
        let mut guard = self.poll_task.lock().await;
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        info!(id = %self.id, "starting poll task");
        // Clear any stop signal left over from a previous lifecycle.
        self.stop_signal.store(false, Ordering::SeqCst);
        let ctx = PollerContext {
            connection: self.connection.clone(),
            host: self.host.clone(),
            volume: self.volume.clone(),
            screen: self.screen.clone(),
            battery: self.battery.clone(),
            now_playing: self.now_playing.clone(),
            stop_signal: self.stop_signal.clone(),
            shutdown_notify: self.shutdown_notify.clone(),
        };
        *guard = Some(tokio::spawn(async move {
            Self::poll_loop(ctx).await;
        }));
    }

    async fn poll_loop(ctx: PollerContext) {
        let mut ticker = interval(SETTINGS.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if ctx.stop_signal.load(Ordering::SeqCst) {
                debug!("poll task stopping due to stop signal");
                break;
            }

            tokio::select! {
                biased;

                _ = ctx.shutdown_notify.notified() => {
                    debug!("poll task received shutdown");
                    // Loop back around; the stop flag decides.
                    continue;
                }

                // Cancellable at every await point inside the tick.
                _ = async {
                    ticker.tick().await;
                    Self::poll_tick(&ctx).await;
                } => {}
            }

            if !ctx.connection.is_online() {
                debug!("device offline, poll task exiting");
                break;
            }
        }
        debug!("poll task finished");
    }

    /// One refresh pass: screen, volume, battery, now-playing, in that order.
    /// Each step fails independently and leaves its property stale rather
    /// than aborting the rest of the tick.
    async fn poll_tick(ctx: &PollerContext) {
        if let Err(e) = ctx.screen.refresh(&ctx.connection).await {
            warn!(error = %e, "screen refresh failed");
        }
        if let Err(e) = ctx.volume.poll_refresh(&ctx.connection).await {
            warn!(error = %e, "volume refresh failed");
        }
        if let Err(e) = Self::refresh_battery(ctx).await {
            warn!(error = %e, "battery refresh failed");
        }
        if let Err(e) = Self::refresh_now_playing(ctx).await {
            warn!(error = %e, "now-playing refresh failed");
        }
    }

    async fn refresh_battery(ctx: &PollerContext) -> Result<(), TabletError> {
        let output = ctx
            .connection
            .shell(&TabletCommand::DumpBattery.shell())
            .await?;
        let level = parsers::parse_battery_level(&output)?;
        ctx.battery.set(Some(level));
        Ok(())
    }

    async fn refresh_now_playing(ctx: &PollerContext) -> Result<(), TabletError> {
        let output = ctx
            .connection
            .shell(&TabletCommand::DumpForegroundIntent.shell())
            .await?;
        match parsers::parse_playing_url(&output) {
            Some(url) => match ctx.host.name_from_url(&url).await {
                Ok(name) => {
                    ctx.now_playing.set(NowPlaying::Media { url, name });
                }
                Err(e) => {
                    // Publish an explicit error marker, never stale data.
                    debug!(error = %e, %url, "name resolution failed");
                    ctx.now_playing.set(NowPlaying::ResolutionFailed { url });
                }
            },
            None => {
                ctx.now_playing.set(NowPlaying::Nothing);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tablet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tablet")
            .field("id", &self.id)
            .field("short_name", &self.short_name)
            .field("state", &self.connection.state())
            .finish()
    }
}

// Make sure the poll task does not outlive the client.
impl Drop for Tablet {
    fn drop(&mut self) {
        // Signal the poll task to stop; drop must not block to await it.
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }
}
