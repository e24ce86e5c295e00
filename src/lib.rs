pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod segmentation;
pub mod timeline;
pub mod types;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Stage};
pub use pipeline::builder::RenderPipelineBuilder;
pub use pipeline::runtime::{RenderOutcome, RenderPipeline, RenderSummary};
pub use pipeline::traits::{
    BackgroundRenderer, EncodeRequest, Encoder, IntroRenderer, MediaProbe, MediaResource,
    NarrationSynthesizer, PhraseSegmenter, PunctuationAligner, RenderedIntro, Transcriber,
};
pub use timeline::{resolve_timeline, AudioMixer, MixPlan, TrackPlacer};
pub use types::{
    CaptionItem, Composition, LayerId, Phrase, PlacedTrack, TimelineSpec, WordTimestamp,
};
