// Shared in-memory doubles for the transport and host collaborators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use adb_tablet_rs::{TabletError, TabletHost, TabletSnapshot, Transport};

/// Simulated device state the mock transport renders dump output from.
pub struct FakeDevice {
    pub hardware_volume: i32,
    pub muted: bool,
    pub mute_count: u32,
    pub screen_awake: bool,
    /// When false, KEYCODE_POWER is swallowed by the device.
    pub power_key_works: bool,
    pub battery: u8,
    pub playing_url: Option<String>,
    /// Use the bare `2:` entry format instead of `2 (speaker):`.
    pub bare_index_format: bool,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            hardware_volume: 7,
            muted: false,
            mute_count: 0,
            screen_awake: false,
            power_key_works: true,
            battery: 42,
            playing_url: None,
            bare_index_format: false,
        }
    }
}

impl FakeDevice {
    fn audio_dump(&self) -> String {
        let index = if self.bare_index_format {
            "2"
        } else {
            "2 (speaker)"
        };
        format!(
            "- STREAM_VOICE_CALL:\n   Muted: false\n   Mute count: 0\n   Current: {index}: 4\n\
             - STREAM_MUSIC:\n   Muted: {muted}\n   Mute count: {count}\n   \
             Current: 1 (headset): 10, {index}: {vol}, 40000000 (default): {vol}\n",
            index = index,
            muted = self.muted,
            count = self.mute_count,
            vol = self.hardware_volume,
        )
    }

    fn power_dump(&self) -> String {
        let wakefulness = if self.screen_awake { "Awake" } else { "Asleep" };
        format!(
            "  mHoldingWakeLockSuspendBlocker=true\n  mWakefulness={}\n",
            wakefulness
        )
    }

    fn battery_dump(&self) -> String {
        format!("  level: {}\n", self.battery)
    }

    fn activity_dump(&self) -> String {
        match &self.playing_url {
            Some(url) => format!(
                "    Intent {{ act=android.intent.action.VIEW dat={} flg=0x10000000 \
                 cmp=org.videolan.vlc/.gui.video.VideoPlayerActivity }}\n",
                url
            ),
            None => "    Intent { act=android.intent.action.MAIN \
                     cat=[android.intent.category.HOME] cmp=com.android.launcher/.Launcher }\n"
                .to_string(),
        }
    }
}

/// Transport double: renders dump output from a `FakeDevice` and records
/// every command it is asked to run.
pub struct MockTransport {
    pub device: Mutex<FakeDevice>,
    pub commands: Mutex<Vec<String>>,
    pub connect_calls: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_properties: AtomicBool,
    /// Commands containing this substring fail with a transport error.
    pub fail_command_containing: Mutex<Option<String>>,
    pub connect_delay: Mutex<Option<Duration>>,
    pub volume_step_delay: Mutex<Option<Duration>>,
    pub model: String,
    pub os_version: String,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            device: Mutex::new(FakeDevice::default()),
            commands: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            fail_properties: AtomicBool::new(false),
            fail_command_containing: Mutex::new(None),
            connect_delay: Mutex::new(None),
            volume_step_delay: Mutex::new(None),
            model: "Pixel Tab".to_string(),
            os_version: "13".to_string(),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }

    fn transport_err(detail: &str) -> TabletError {
        TabletError::transport(io::Error::new(io::ErrorKind::ConnectionReset, detail.to_string()))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _host: &str, _port: u16) -> Result<(), TabletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Self::transport_err("connection refused"));
        }
        Ok(())
    }

    async fn shell(&self, _device_id: &str, command: &str) -> Result<Bytes, TabletError> {
        self.commands.lock().unwrap().push(command.to_string());

        if let Some(needle) = self.fail_command_containing.lock().unwrap().clone() {
            if command.contains(&needle) {
                return Err(Self::transport_err("command failed"));
            }
        }

        if command.contains("KEYCODE_VOLUME") {
            let delay = *self.volume_step_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        let mut device = self.device.lock().unwrap();
        let output = if command.contains("KEYCODE_VOLUME_UP") {
            device.hardware_volume = (device.hardware_volume + 1).min(15);
            String::new()
        } else if command.contains("KEYCODE_VOLUME_DOWN") {
            device.hardware_volume = (device.hardware_volume - 1).max(0);
            String::new()
        } else if command.contains("KEYCODE_POWER") {
            if device.power_key_works {
                device.screen_awake = !device.screen_awake;
            }
            String::new()
        } else if command.starts_with("dumpsys battery") {
            device.battery_dump()
        } else if command.starts_with("dumpsys power") {
            device.power_dump()
        } else if command.starts_with("dumpsys audio") {
            device.audio_dump()
        } else if command.starts_with("dumpsys activity") {
            device.activity_dump()
        } else if command.starts_with("am force-stop") {
            device.playing_url = None;
            String::new()
        } else {
            String::new()
        };
        Ok(Bytes::from(output))
    }

    async fn properties(&self, _device_id: &str) -> Result<HashMap<String, String>, TabletError> {
        if self.fail_properties.load(Ordering::SeqCst) {
            return Err(Self::transport_err("properties unavailable"));
        }
        let mut props = HashMap::new();
        props.insert("ro.product.model".to_string(), self.model.clone());
        props.insert("ro.build.version.release".to_string(), self.os_version.clone());
        Ok(props)
    }
}

/// Host double: resolves names deterministically unless told to fail, and
/// records play requests.
pub struct MockHost {
    pub fail_resolution: AtomicBool,
    pub played: Mutex<Vec<(TabletSnapshot, String, String)>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            fail_resolution: AtomicBool::new(false),
            played: Mutex::new(Vec::new()),
        }
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TabletHost for MockHost {
    async fn play_url(
        &self,
        tablet: &TabletSnapshot,
        url: &str,
        name: &str,
    ) -> Result<(), TabletError> {
        self.played
            .lock()
            .unwrap()
            .push((tablet.clone(), url.to_string(), name.to_string()));
        Ok(())
    }

    async fn name_from_url(&self, url: &str) -> Result<String, TabletError> {
        if self.fail_resolution.load(Ordering::SeqCst) {
            return Err(TabletError::Resolution {
                url: url.to_string(),
                source: Box::new(io::Error::new(io::ErrorKind::NotFound, "no such title")),
            });
        }
        Ok(format!("Title of {}", url))
    }
}
