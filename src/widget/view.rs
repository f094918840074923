//! What the player's control panel should display.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualState {
    Loading,
    Error,
    ReadyStopped,
    ReadyPlaying,
}

/// A snapshot of the control panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPanel {
    pub state: VisualState,
    /// Play button and seek bar accept input.
    pub controls_enabled: bool,
    pub seek_max: f64,
    pub seek_value: f64,
    pub current_time_label: String,
    pub total_time_label: String,
    /// Error text shown while in the error state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up. Fractions are truncated.
///
/// # Example
/// ```rust
/// use midi_player::format_time;
///
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(75.9), "1:15");
/// assert_eq!(format_time(3725.0), "1:02:05");
/// assert_eq!(format_time(-5.0), "-0:05");
/// ```
pub fn format_time(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total = if seconds.is_finite() {
        seconds.abs().floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}{}:{:02}:{:02}", sign, h, m, s)
    } else {
        format!("{}{}:{:02}", sign, m, s)
    }
}
