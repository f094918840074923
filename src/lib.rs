pub mod api;
pub mod document;
pub mod error;
pub mod notes;
pub mod playback;
pub mod smf;
pub mod tempo;
pub mod widget;

pub use api::{decode, decode_and_extract, describe, ChannelSummary, DocumentSummary};
pub use document::{EventKind, MidiDecoder, MidiDocument, MidiEvent, META_SET_TEMPO};
pub use error::*;
pub use notes::{
    extract_notes, NoteInterval, NoteTimeline, CHANNEL_COUNT, MIN_PERCUSSION_LENGTH,
    PERCUSSION_CHANNEL,
};
pub use playback::{
    AudioBackend, BackendFactory, InstrumentBank, PlaybackController, PlaybackState,
    TransportSignal, TransportStats, VirtualClock, VirtualTransport, VirtualTransportFactory,
    DEFAULT_INSTRUMENT_BANK_URL,
};
pub use smf::SmfDecoder;
pub use tempo::{parse_tempo, TempoTrack, DEFAULT_US_PER_QUARTER};
pub use widget::{
    format_time, BankSetting, ConfigChanges, ConfigPatch, ControlPanel, LoadOutcome,
    LoadRequest, LoadedResources, MidiPlayer, PlaybackOwner, PlaybackRegistry, PlayerEvent,
    SubscriptionId, VisualState, Visualizer, WidgetConfig, WidgetId, OBSERVED_ATTRIBUTES,
};
