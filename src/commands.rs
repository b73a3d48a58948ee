use crate::parsers::{WAKE_LOCK_MARKER, WAKEFULNESS_MARKER};

// Commands issued over the shell channel. The rendered strings are the wire
// contract with the device and must match the markers the parsers expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabletCommand {
    VolumeUp,
    VolumeDown,
    TogglePower,
    DumpBattery,
    DumpPower,
    DumpAudio,
    DumpForegroundIntent,
    Pause,
    Resume,
    StopPlayback,
    PlayUrl { url: String },
    Reboot,
}

impl TabletCommand {
    /// Render the exact shell command line for this operation.
    pub fn shell(&self) -> String {
        match self {
            TabletCommand::VolumeUp => "input keyevent KEYCODE_VOLUME_UP".to_string(),
            TabletCommand::VolumeDown => "input keyevent KEYCODE_VOLUME_DOWN".to_string(),
            TabletCommand::TogglePower => "input keyevent KEYCODE_POWER".to_string(),
            TabletCommand::DumpBattery => "dumpsys battery | grep level".to_string(),
            TabletCommand::DumpPower => format!(
                "dumpsys power | grep -E '{}|{}'",
                WAKE_LOCK_MARKER, WAKEFULNESS_MARKER
            ),
            TabletCommand::DumpAudio => "dumpsys audio | grep -E 'STREAM|Current|Mute'".to_string(),
            TabletCommand::DumpForegroundIntent => {
                "dumpsys activity activities | grep 'Intent {'".to_string()
            }
            TabletCommand::Pause => "am broadcast -a org.videolan.vlc.remote.Pause".to_string(),
            TabletCommand::Resume => "am broadcast -a org.videolan.vlc.remote.Play".to_string(),
            TabletCommand::StopPlayback => "am force-stop org.videolan.vlc".to_string(),
            TabletCommand::PlayUrl { url } => format!(
                "am start -n org.videolan.vlc/org.videolan.vlc.gui.video.VideoPlayerActivity \
                 -a android.intent.action.VIEW -d \"{}\" --ez force_fullscreen true",
                url.replace('&', "\\&")
            ),
            TabletCommand::Reboot => "reboot".to_string(),
        }
    }
}
