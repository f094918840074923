use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct PlayerErrorJson {
    message: String,
    kind: &'static str,
}

fn error_to_js(e: midi_player::PlayerError) -> JsValue {
    let json = PlayerErrorJson {
        message: e.to_string(),
        kind: e.kind(),
    };
    match serde_json::to_string(&json) {
        Ok(text) => JsValue::from_str(&text),
        Err(_) => JsValue::from_str(&json.message),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract the note timeline of a MIDI file as a JSON string: 16 arrays of notes,
/// one per channel
#[wasm_bindgen]
pub fn extract_notes(bytes: &[u8]) -> Result<String, JsValue> {
    let timeline = midi_player::decode_and_extract(bytes).map_err(error_to_js)?;
    to_json(&timeline)
}

/// Same as `extract_notes`, returned as a JS object instead of a string
#[wasm_bindgen]
pub fn extract_notes_value(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let timeline = midi_player::decode_and_extract(bytes).map_err(error_to_js)?;
    serde_wasm_bindgen::to_value(&timeline).map_err(JsValue::from)
}

/// Summarize a MIDI file: duration, tempo, tracks and per-channel note counts
#[wasm_bindgen]
pub fn describe(bytes: &[u8]) -> Result<String, JsValue> {
    let summary = midi_player::describe(bytes).map_err(error_to_js)?;
    to_json(&summary)
}

/// Format seconds for a time label, e.g. `1:05`
#[wasm_bindgen]
pub fn format_time(seconds: f64) -> String {
    midi_player::format_time(seconds)
}

/// The instrument bank used when the `sound-font` attribute is present but empty
#[wasm_bindgen]
pub fn default_instrument_bank() -> String {
    midi_player::DEFAULT_INSTRUMENT_BANK_URL.to_string()
}
