use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::commands::TabletCommand;
use crate::connection::Connection;
use crate::error::TabletError;
use crate::parsers;
use crate::properties::Property;

/// The hardware exposes 16 discrete steps (0-15) behind the 0-100 logical
/// volume.
const HARDWARE_STEPS: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumePhase {
    Idle,
    Converging,
}

struct VolumeInner {
    /// Last-known hardware step, unknown until first sampled.
    hardware: Option<i32>,
    phase: VolumePhase,
}

/// Closed-loop controller driving the discrete hardware volume toward the
/// desired logical volume via repeated key-event steps.
///
/// While a convergence loop runs, the poll path must not overwrite the
/// observable; the phase flag provides that mutual exclusion.
pub(crate) struct VolumeControl {
    level: Property<u8>,
    desired: AtomicU8,
    inner: Mutex<VolumeInner>,
}

impl VolumeControl {
    pub(crate) fn new() -> Self {
        Self {
            level: Property::new(0),
            desired: AtomicU8::new(0),
            inner: Mutex::new(VolumeInner {
                hardware: None,
                phase: VolumePhase::Idle,
            }),
        }
    }

    pub(crate) fn level(&self) -> &Property<u8> {
        &self.level
    }

    fn target_for(desired: u8) -> i32 {
        (f64::from(desired) * f64::from(HARDWARE_STEPS) / 100.0).round() as i32
    }

    /// Set the desired logical volume (clamped to 0-100) and converge the
    /// hardware toward it.
    ///
    /// The observable is published immediately for responsive feedback; the
    /// poll loop re-synchronizes it with hardware later. If a convergence
    /// loop is already running it picks up the new value on its next step
    /// and no second loop is started.
    pub(crate) async fn set_desired(
        &self,
        conn: &Connection,
        requested: i32,
    ) -> Result<(), TabletError> {
        let clamped = requested.clamp(0, 100) as u8;
        self.desired.store(clamped, Ordering::SeqCst);
        self.level.set(clamped);

        {
            let mut inner = self.inner.lock().await;
            if inner.phase == VolumePhase::Converging {
                return Ok(());
            }
            inner.phase = VolumePhase::Converging;
        }

        let result = self.converge(conn).await;
        self.inner.lock().await.phase = VolumePhase::Idle;
        result
    }

    async fn converge(&self, conn: &Connection) -> Result<(), TabletError> {
        let mut hardware = match self.inner.lock().await.hardware {
            Some(known) => known,
            None => {
                let sampled = Self::sample(conn).await?;
                self.inner.lock().await.hardware = Some(sampled);
                sampled
            }
        };

        loop {
            // Re-read the desired value each step so a mid-loop update
            // redirects the loop instead of spawning another one.
            let target = Self::target_for(self.desired.load(Ordering::SeqCst));
            if (hardware - target).abs() < 1 {
                break;
            }
            let step = if hardware < target {
                TabletCommand::VolumeUp
            } else {
                TabletCommand::VolumeDown
            };
            trace!(hardware, target, ?step, "volume step");
            conn.shell(&step.shell()).await?;
            // One key event moves the hardware exactly one step; trust the
            // bookkeeping rather than re-sampling after every step. Only the
            // poll path re-synchronizes with ground truth.
            hardware += if step == TabletCommand::VolumeUp { 1 } else { -1 };
            self.inner.lock().await.hardware = Some(hardware);
        }

        debug!(hardware, "volume converged");
        Ok(())
    }

    /// Poll-driven refresh: re-sample the hardware step and publish it as a
    /// logical volume. Skipped entirely while a convergence loop is active.
    pub(crate) async fn poll_refresh(&self, conn: &Connection) -> Result<(), TabletError> {
        {
            let inner = self.inner.lock().await;
            if inner.phase != VolumePhase::Idle {
                trace!("volume refresh skipped, convergence in progress");
                return Ok(());
            }
        }

        let sampled = Self::sample(conn).await?;

        let mut inner = self.inner.lock().await;
        if inner.phase != VolumePhase::Idle {
            // A convergence loop started while we were sampling; its
            // bookkeeping wins.
            return Ok(());
        }
        inner.hardware = Some(sampled);
        let percent = (f64::from(sampled) * 100.0 / f64::from(HARDWARE_STEPS))
            .round()
            .clamp(0.0, 100.0) as u8;
        self.level.set(percent);
        Ok(())
    }

    async fn sample(conn: &Connection) -> Result<i32, TabletError> {
        let output = conn.shell(&TabletCommand::DumpAudio.shell()).await?;
        parsers::parse_music_volume(&output)
    }
}
