use tokio::time::sleep;
use tracing::{debug, warn};

use crate::commands::TabletCommand;
use crate::connection::Connection;
use crate::error::TabletError;
use crate::parsers;
use crate::properties::Property;
use crate::settings::SETTINGS;

/// Screen power relay with a verify-after-toggle contract.
///
/// The relay publishes what the device reports after the settle delay, not
/// what was requested: a toggle that did not take effect shows up as "no
/// change" rather than an error.
pub(crate) struct ScreenRelay {
    on: Property<bool>,
}

impl ScreenRelay {
    pub(crate) fn new() -> Self {
        Self {
            on: Property::new(false),
        }
    }

    pub(crate) fn on(&self) -> &Property<bool> {
        &self.on
    }

    async fn read(&self, conn: &Connection) -> Result<bool, TabletError> {
        let output = conn.shell(&TabletCommand::DumpPower.shell()).await?;
        Ok(parsers::parse_screen_awake(&output))
    }

    /// Poll-driven refresh of the screen-on observable.
    pub(crate) async fn refresh(&self, conn: &Connection) -> Result<(), TabletError> {
        let now = self.read(conn).await?;
        self.on.set(now);
        Ok(())
    }

    /// Drive the screen toward `desired`, then re-read and publish reality.
    pub(crate) async fn switch_to(&self, conn: &Connection, desired: bool) -> Result<(), TabletError> {
        let now = self.read(conn).await?;
        if now == desired {
            debug!(desired, "screen already in requested state");
            self.on.set(now);
            return Ok(());
        }

        conn.shell(&TabletCommand::TogglePower.shell()).await?;
        // Let the device finish its own power transition before verifying.
        sleep(SETTINGS.settle_delay).await;

        let verified = self.read(conn).await?;
        if verified != desired {
            warn!(desired, verified, "screen toggle did not take effect");
        }
        self.on.set(verified);
        Ok(())
    }
}
