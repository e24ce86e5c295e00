use serde::{Deserialize, Serialize};

/// One transcribed word. Times are seconds in content-relative time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }
}

/// Word of the authoritative script with the punctuation that trailed it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub word: String,
    pub punctuation: Option<char>,
}

/// Caption unit spanning one or more consecutive words. Invariant: `end >= start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Phrase {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A caption as it will be displayed, before shifting into global time.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionItem {
    pub text: String,
    /// Content-relative start in seconds.
    pub start: f64,
    pub duration: f64,
}

/// Authoritative durations for one run. Every placement decision reads from this.
///
/// Invariants: `total_duration == intro_duration + content_duration`,
/// `content_duration > 0` and `total_duration <= configured maximum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSpec {
    pub intro_duration: f64,
    pub content_duration: f64,
    pub total_duration: f64,
}

/// Visual layers handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    Background,
    Intro,
    IntroLogo,
    Watermark,
    /// Index into [`Composition::caption_texts`].
    Caption(usize),
}

/// A layer resolved to global time. Invariant: `start >= 0 && start + duration <= total`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTrack {
    pub layer_id: LayerId,
    pub start: f64,
    pub duration: f64,
}

impl PlacedTrack {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Fully resolved timeline passed to the external encode step.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub timeline: TimelineSpec,
    pub tracks: Vec<PlacedTrack>,
    pub caption_texts: Vec<String>,
    pub audio: Option<crate::timeline::mixer::MixPlan>,
}
