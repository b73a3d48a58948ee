//! Pure parsers over the free-text output of the diagnostic dump commands.
//!
//! Each function consumes the full text returned by exactly one command from
//! [`crate::TabletCommand`]. All literal markers live here as named constants;
//! they are part of the wire contract with the device and must not drift.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::TabletError;

// Marker strings located in command output.
pub(crate) const BATTERY_LEVEL_MARKER: &str = "level";
pub(crate) const WAKE_LOCK_MARKER: &str = "mHoldingWakeLockSuspendBlocker";
pub(crate) const WAKEFULNESS_MARKER: &str = "mWakefulness";
const WAKEFULNESS_AWAKE: &str = "Awake";
const STREAM_DELIMITER: &str = "- STREAM_";
const MUSIC_STREAM_PREFIX: &str = "MUSIC:";
const MUTED_MARKER: &str = "Muted:";
const MUTED_FALSE: &str = "Muted: false";
const MUTE_COUNT_MARKER: &str = "Mute count:";
const MUTE_COUNT_ZERO: &str = "Mute count: 0";
const CURRENT_MARKER: &str = "Current:";
const INTENT_MARKER: &str = "Intent {";

// Command names used in parse errors.
const BATTERY_DUMP: &str = "dumpsys battery";
const AUDIO_DUMP: &str = "dumpsys audio";

lazy_static! {
    // `dat=<url> ` inside an Intent line; the URL runs to the next whitespace.
    static ref INTENT_DATA_RE: Regex = Regex::new(r"dat=(\S*)\s").unwrap();
}

/// Extract the battery percentage from `dumpsys battery | grep level` output.
pub fn parse_battery_level(output: &str) -> Result<u8, TabletError> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(BATTERY_LEVEL_MARKER))
        .ok_or_else(|| TabletError::parse(BATTERY_DUMP, "no `level` line"))?;
    let value = line
        .split(':')
        .nth(1)
        .ok_or_else(|| TabletError::parse(BATTERY_DUMP, "`level` line has no value"))?;
    value
        .trim()
        .parse::<u8>()
        .map_err(|e| TabletError::parse(BATTERY_DUMP, format!("bad level `{}`: {}", value.trim(), e)))
}

/// Decide whether the screen is on from the filtered `dumpsys power` output.
///
/// The device counts as awake iff the `mWakefulness` property reads `Awake`.
/// A missing marker means "screen off", never an error.
pub fn parse_screen_awake(output: &str) -> bool {
    let prefix = format!("{}=", WAKEFULNESS_MARKER);
    let mut wakefulness = None;
    for line in output.lines() {
        if let Some(value) = line.trim().strip_prefix(&prefix) {
            wakefulness = Some(value);
        }
    }
    wakefulness == Some(WAKEFULNESS_AWAKE)
}

/// Extract the hardware volume step (0-15) of the MUSIC stream from the
/// filtered `dumpsys audio` output.
///
/// A muted stream reports 0 regardless of its numeric level. The speaker
/// entry appears in two formats in the wild, `2: N` and `2 (speaker): N`.
pub fn parse_music_volume(output: &str) -> Result<i32, TabletError> {
    let music = output
        .split(STREAM_DELIMITER)
        .find(|block| block.starts_with(MUSIC_STREAM_PREFIX))
        .ok_or_else(|| TabletError::parse(AUDIO_DUMP, "no MUSIC stream block"))?;

    let lines: Vec<&str> = music.lines().map(str::trim).collect();

    if let Some(muted) = lines.iter().find(|l| l.starts_with(MUTED_MARKER)) {
        if *muted != MUTED_FALSE {
            return Ok(0);
        }
    }
    if let Some(count) = lines.iter().find(|l| l.starts_with(MUTE_COUNT_MARKER)) {
        if *count != MUTE_COUNT_ZERO {
            return Ok(0);
        }
    }

    let current = lines
        .iter()
        .find_map(|l| l.strip_prefix(CURRENT_MARKER))
        .ok_or_else(|| TabletError::parse(AUDIO_DUMP, "no `Current:` line in MUSIC block"))?;

    for entry in current.trim().split(", ") {
        let value = entry
            .strip_prefix("2:")
            .or_else(|| entry.strip_prefix("2 (speaker):"));
        if let Some(value) = value {
            let value = value.trim().trim_end_matches(',');
            return value.parse::<i32>().map_err(|e| {
                TabletError::parse(AUDIO_DUMP, format!("bad volume `{}`: {}", value, e))
            });
        }
    }

    Err(TabletError::parse(
        AUDIO_DUMP,
        "no index-2 entry in `Current:` line",
    ))
}

/// Extract the playing media URL from the filtered activity dump.
///
/// Only the first `Intent {` line is consulted. No match means nothing is
/// playing, never an error.
pub fn parse_playing_url(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains(INTENT_MARKER))?;
    INTENT_DATA_RE
        .captures(line)
        .map(|cap| cap[1].to_string())
}
