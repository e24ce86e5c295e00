use std::path::Path;

use crate::config::IntroTimingConfig;
use crate::error::PipelineError;
use crate::pipeline::entry::EntryInfo;
use crate::types::{CaptionItem, Composition, Phrase, WordTimestamp};

/// Restores script punctuation onto transcribed words.
pub trait PunctuationAligner: Send + Sync {
    fn align(&self, reference_text: &str, words: &[WordTimestamp]) -> Vec<WordTimestamp>;
}

/// Groups punctuated words into phrases and the captions shown for them.
pub trait PhraseSegmenter: Send + Sync {
    fn phrases(&self, words: &[WordTimestamp]) -> Vec<Phrase>;

    /// Content-relative captions derived from the same words.
    fn captions(&self, words: &[WordTimestamp]) -> Vec<CaptionItem>;
}

/// Decoder-backed media held open while a run composes its timeline.
/// `release` is called exactly once by the owning scope.
pub trait MediaResource: Send {
    fn label(&self) -> String;

    fn duration_s(&self) -> f64;

    fn release(&mut self) -> Result<(), PipelineError>;
}

/// Text-to-speech collaborator.
pub trait NarrationSynthesizer: Send + Sync {
    /// Writes narration audio to `output` and returns its duration in seconds.
    fn synthesize(&self, text: &str, output: &Path) -> Result<f64, PipelineError>;
}

/// Speech-to-text collaborator returning raw word intervals.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &Path) -> Result<Vec<WordTimestamp>, PipelineError>;
}

pub struct RenderedIntro {
    pub track: Box<dyn MediaResource>,
    /// Authoritative intro length fed to the timeline arbiter.
    pub duration_s: f64,
}

pub trait IntroRenderer: Send + Sync {
    /// `timing` carries the configured typing model; renderers that type the
    /// intro text can size it with [`IntroTimingConfig::duration_for`].
    fn render_intro(
        &self,
        entry: &EntryInfo,
        timing: &IntroTimingConfig,
    ) -> Result<RenderedIntro, PipelineError>;
}

pub trait BackgroundRenderer: Send + Sync {
    /// Writes a background video of at least `duration_s` seconds to `output`.
    fn render_background(&self, duration_s: f64, output: &Path) -> Result<(), PipelineError>;
}

/// Reads durations and opens media artifacts produced by earlier runs.
pub trait MediaProbe: Send + Sync {
    fn audio_duration(&self, path: &Path) -> Result<f64, PipelineError>;

    fn open_video(&self, path: &Path) -> Result<Box<dyn MediaResource>, PipelineError>;
}

pub struct EncodeRequest<'a> {
    pub composition: &'a Composition,
    pub intro: &'a dyn MediaResource,
    pub background: &'a dyn MediaResource,
    pub output: &'a Path,
}

/// Final audio/video write of a fully resolved composition.
pub trait Encoder: Send + Sync {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<(), PipelineError>;
}
