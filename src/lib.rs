pub mod config;
pub mod core;
pub mod transmit;

pub use crate::core::keymap::transliterate;
pub use crate::core::segmenter::{
    process_text, LanguageMode, ProcessedDocument, Segment, TOGGLE_MARKER,
};
pub use crate::transmit::{Scheduler, SendCallbacks, SendError, SessionOutcome, Transport};
