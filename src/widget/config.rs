//! Widget configuration
//!
//! The widget's settings live in one [`WidgetConfig`]. Hosts change them through a
//! [`ConfigPatch`]; the attribute adapter ([`ConfigPatch::from_attribute`]) and the
//! typed property setters on the player both build patches, so every change takes the
//! same path.

use serde::{Deserialize, Serialize};

use crate::playback::DEFAULT_INSTRUMENT_BANK_URL;

/// Attribute names understood by [`ConfigPatch::from_attribute`].
pub const OBSERVED_ATTRIBUTES: [&str; 4] = ["src", "sound-font", "loop", "visualizer"];

/// Resolved instrument-bank setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSetting {
    /// No bank configured: audio is off and loads fail fast.
    Disabled,
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WidgetConfig {
    /// Where to fetch the MIDI file from.
    pub src: Option<String>,
    /// Instrument bank URL. `None` disables audio, an empty string picks the default.
    #[serde(rename = "sound-font")]
    pub instrument_bank: Option<String>,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    /// Selector naming the visualizers the host should bind.
    pub visualizer: Option<String>,
}

impl WidgetConfig {
    pub fn bank_setting(&self) -> BankSetting {
        match self.instrument_bank.as_deref() {
            None => BankSetting::Disabled,
            Some("") => BankSetting::Url(DEFAULT_INSTRUMENT_BANK_URL.to_string()),
            Some(url) => BankSetting::Url(url.to_string()),
        }
    }

    /// Apply `patch`, reporting which kinds of setting actually changed.
    pub fn apply(&mut self, patch: ConfigPatch) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        if let Some(src) = patch.src {
            if src != self.src {
                self.src = src;
                changes.content = true;
            }
        }
        if let Some(bank) = patch.instrument_bank {
            if bank != self.instrument_bank {
                self.instrument_bank = bank;
                changes.content = true;
            }
        }
        if let Some(loop_playback) = patch.loop_playback {
            if loop_playback != self.loop_playback {
                self.loop_playback = loop_playback;
                changes.looping = true;
            }
        }
        if let Some(visualizer) = patch.visualizer {
            if visualizer != self.visualizer {
                self.visualizer = visualizer;
                changes.visualizer = true;
            }
        }
        changes
    }
}

/// A partial configuration update. `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigPatch {
    pub src: Option<Option<String>>,
    pub instrument_bank: Option<Option<String>>,
    pub loop_playback: Option<bool>,
    pub visualizer: Option<Option<String>>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(mut self, src: Option<&str>) -> Self {
        self.src = Some(src.map(str::to_string));
        self
    }

    pub fn instrument_bank(mut self, bank: Option<&str>) -> Self {
        self.instrument_bank = Some(bank.map(str::to_string));
        self
    }

    pub fn loop_playback(mut self, loop_playback: bool) -> Self {
        self.loop_playback = Some(loop_playback);
        self
    }

    pub fn visualizer(mut self, selector: Option<&str>) -> Self {
        self.visualizer = Some(selector.map(str::to_string));
        self
    }

    /// Patch for an HTML-style attribute change. `value` is `None` when the attribute
    /// was removed. `loop` is a boolean attribute: present means on.
    ///
    /// Returns `None` for attributes the widget does not observe.
    ///
    /// # Example
    /// ```rust
    /// use midi_player::ConfigPatch;
    ///
    /// let patch = ConfigPatch::from_attribute("sound-font", Some("")).unwrap();
    /// assert_eq!(patch.instrument_bank, Some(Some(String::new())));
    /// assert!(ConfigPatch::from_attribute("title", Some("x")).is_none());
    /// ```
    pub fn from_attribute(name: &str, value: Option<&str>) -> Option<Self> {
        let patch = Self::new();
        match name {
            "src" => Some(patch.src(value)),
            "sound-font" => Some(patch.instrument_bank(value)),
            "loop" => Some(patch.loop_playback(value.is_some())),
            "visualizer" => Some(patch.visualizer(value)),
            _ => None,
        }
    }
}

/// Which settings a patch changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigChanges {
    /// Source or instrument bank: the widget must reload.
    pub content: bool,
    pub looping: bool,
    /// The visualizer selector: current bindings are dropped for the host to redo.
    pub visualizer: bool,
}
