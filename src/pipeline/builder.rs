use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pipeline::defaults::{segmenter_for, SequencePunctuationAligner};
use crate::pipeline::runtime::{RenderPipeline, RenderPipelineParts};
use crate::pipeline::traits::{
    BackgroundRenderer, Encoder, IntroRenderer, MediaProbe, NarrationSynthesizer,
    PhraseSegmenter, PunctuationAligner, Transcriber,
};

pub struct RenderPipelineBuilder {
    config: PipelineConfig,
    synthesizer: Option<Box<dyn NarrationSynthesizer>>,
    transcriber: Option<Box<dyn Transcriber>>,
    intro_renderer: Option<Box<dyn IntroRenderer>>,
    background_renderer: Option<Box<dyn BackgroundRenderer>>,
    probe: Option<Box<dyn MediaProbe>>,
    encoder: Option<Box<dyn Encoder>>,
    punctuation_aligner: Option<Box<dyn PunctuationAligner>>,
    segmenter: Option<Box<dyn PhraseSegmenter>>,
}

impl RenderPipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            synthesizer: None,
            transcriber: None,
            intro_renderer: None,
            background_renderer: None,
            probe: None,
            encoder: None,
            punctuation_aligner: None,
            segmenter: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Box<dyn NarrationSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_intro_renderer(mut self, intro_renderer: Box<dyn IntroRenderer>) -> Self {
        self.intro_renderer = Some(intro_renderer);
        self
    }

    pub fn with_background_renderer(
        mut self,
        background_renderer: Box<dyn BackgroundRenderer>,
    ) -> Self {
        self.background_renderer = Some(background_renderer);
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_punctuation_aligner(
        mut self,
        punctuation_aligner: Box<dyn PunctuationAligner>,
    ) -> Self {
        self.punctuation_aligner = Some(punctuation_aligner);
        self
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn PhraseSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn build(self) -> Result<RenderPipeline, PipelineError> {
        self.config.validate()?;

        let segmenter = self
            .segmenter
            .unwrap_or_else(|| segmenter_for(&self.config.captions));

        Ok(RenderPipeline::from_parts(RenderPipelineParts {
            synthesizer: required(self.synthesizer, "narration synthesizer")?,
            transcriber: required(self.transcriber, "transcriber")?,
            intro_renderer: required(self.intro_renderer, "intro renderer")?,
            background_renderer: required(self.background_renderer, "background renderer")?,
            probe: required(self.probe, "media probe")?,
            encoder: required(self.encoder, "encoder")?,
            punctuation_aligner: self
                .punctuation_aligner
                .unwrap_or_else(|| Box::new(SequencePunctuationAligner)),
            segmenter,
            config: self.config,
        }))
    }
}

fn required<T: ?Sized>(slot: Option<Box<T>>, name: &str) -> Result<Box<T>, PipelineError> {
    slot.ok_or_else(|| PipelineError::configuration(format!("no {name} configured")))
}
