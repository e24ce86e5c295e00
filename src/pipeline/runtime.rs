use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::alignment::{clamp_to_duration, sanitize_words};
use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError, Stage};
use crate::pipeline::artifacts::{is_present, load_words, save_words, ArtifactStore};
use crate::pipeline::entry::EntryInfo;
use crate::pipeline::resources::ResourceScope;
use crate::pipeline::traits::{
    BackgroundRenderer, EncodeRequest, Encoder, IntroRenderer, MediaProbe, MediaResource,
    NarrationSynthesizer, PhraseSegmenter, PunctuationAligner, Transcriber,
};
use crate::timeline::{resolve_timeline, AudioInput, AudioMixer, MusicInput, TrackPlacer};
use crate::types::{CaptionItem, Composition, TimelineSpec, WordTimestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub entry: EntryInfo,
    pub timeline: TimelineSpec,
    pub caption_count: usize,
    pub has_audio: bool,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderSummary),
    /// The final video already exists and overwriting is disabled.
    AlreadyRendered(PathBuf),
}

pub struct RenderPipeline {
    config: PipelineConfig,
    synthesizer: Box<dyn NarrationSynthesizer>,
    transcriber: Box<dyn Transcriber>,
    intro_renderer: Box<dyn IntroRenderer>,
    background_renderer: Box<dyn BackgroundRenderer>,
    probe: Box<dyn MediaProbe>,
    encoder: Box<dyn Encoder>,
    punctuation_aligner: Box<dyn PunctuationAligner>,
    segmenter: Box<dyn PhraseSegmenter>,
}

pub(crate) struct RenderPipelineParts {
    pub config: PipelineConfig,
    pub synthesizer: Box<dyn NarrationSynthesizer>,
    pub transcriber: Box<dyn Transcriber>,
    pub intro_renderer: Box<dyn IntroRenderer>,
    pub background_renderer: Box<dyn BackgroundRenderer>,
    pub probe: Box<dyn MediaProbe>,
    pub encoder: Box<dyn Encoder>,
    pub punctuation_aligner: Box<dyn PunctuationAligner>,
    pub segmenter: Box<dyn PhraseSegmenter>,
}

impl RenderPipeline {
    pub(crate) fn from_parts(parts: RenderPipelineParts) -> Self {
        Self {
            config: parts.config,
            synthesizer: parts.synthesizer,
            transcriber: parts.transcriber,
            intro_renderer: parts.intro_renderer,
            background_renderer: parts.background_renderer,
            probe: parts.probe,
            encoder: parts.encoder,
            punctuation_aligner: parts.punctuation_aligner,
            segmenter: parts.segmenter,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Renders the video for one script file. Entry identity comes from the
    /// file stem.
    pub fn render(&self, script_path: &Path) -> Result<RenderOutcome, PipelineError> {
        let script = std::fs::read_to_string(script_path)
            .map_err(|e| PipelineError::io("read script", e).at_stage(Stage::Narration))?;
        let entry = EntryInfo::from_path(script_path);
        self.render_entry(&entry, &script)
    }

    pub fn render_entry(
        &self,
        entry: &EntryInfo,
        script: &str,
    ) -> Result<RenderOutcome, PipelineError> {
        if script.trim().is_empty() {
            return Err(PipelineError::resource("script", "script text is empty")
                .at_stage(Stage::Narration));
        }

        let store = ArtifactStore::new(
            &self.config.output_dir,
            entry.artifact_id(),
            self.config.artifacts.clone(),
        );
        store.ensure_dir().map_err(|e| e.at_stage(Stage::Narration))?;

        let final_path = store.final_video();
        if is_present(&final_path) && !self.config.overwrite_final {
            info!(
                entry = %entry.number,
                path = %final_path.display(),
                "final video already present; skipping"
            );
            return Ok(RenderOutcome::AlreadyRendered(final_path));
        }

        info!(
            entry = %entry.number,
            name = %entry.name,
            class = %entry.class,
            artifacts = %store.root().display(),
            "render: start"
        );

        let narration = self
            .narration(&store, script)
            .map_err(|e| e.at_stage(Stage::Narration))?;
        let words = fallback_to_no_captions(
            Stage::Alignment,
            self.timestamps(&store, script, &narration.path),
        )?;

        let mut scope = ResourceScope::new();
        let intro = self
            .intro_renderer
            .render_intro(entry, &self.config.intro)
            .map_err(|e| e.at_stage(Stage::Intro))?;
        let intro_duration = intro.duration_s;
        let intro_id = scope.acquire(intro.track);

        let timeline = resolve_timeline(
            intro_duration,
            narration.natural_duration_s,
            self.config.dev_duration_cap_s,
            self.config.max_total_duration_s,
        )
        .map_err(|e| e.at_stage(Stage::Timeline))?;

        let background = self
            .background(&store, &timeline)
            .map_err(|e| e.at_stage(Stage::Background))?;
        let background_id = scope.acquire(background);

        let captions =
            fallback_to_no_captions(Stage::Captions, self.captions(&words, &timeline))?;

        let placer = TrackPlacer::new(&self.config.placement);
        let layers = placer.place(&captions, &timeline, &placer.default_overlays());

        let music = self.music();
        let audio = AudioMixer::new(self.config.audio.narration_tolerance_s).mix(
            Some(&narration),
            music.as_ref(),
            &timeline,
        );

        let composition = Composition {
            timeline,
            tracks: layers.tracks,
            caption_texts: layers.caption_texts,
            audio,
        };
        let (Some(intro_track), Some(background_track)) =
            (scope.get(intro_id), scope.get(background_id))
        else {
            return Err(PipelineError::resource("media scope", "acquired track is no longer held")
                .at_stage(Stage::Encode));
        };
        let staging_path = store.staging_final_video();
        let encoded = self
            .encoder
            .encode(&EncodeRequest {
                composition: &composition,
                intro: intro_track,
                background: background_track,
                output: &staging_path,
            })
            .and_then(|()| publish(&staging_path, &final_path));
        if let Err(e) = encoded {
            discard_partial(&staging_path);
            return Err(e.at_stage(Stage::Encode));
        }

        info!(
            entry = %entry.number,
            total_s = format!("{:.3}", timeline.total_duration),
            captions = composition.caption_texts.len(),
            has_audio = composition.audio.is_some(),
            path = %final_path.display(),
            "render: done"
        );

        Ok(RenderOutcome::Rendered(RenderSummary {
            entry: entry.clone(),
            timeline,
            caption_count: composition.caption_texts.len(),
            has_audio: composition.audio.is_some(),
            output: final_path,
        }))
    }

    fn narration(&self, store: &ArtifactStore, script: &str) -> Result<AudioInput, PipelineError> {
        let path = store.narration();
        let natural_duration_s = if is_present(&path) {
            debug!(path = %path.display(), "reusing narration artifact");
            self.probe.audio_duration(&path)?
        } else {
            self.synthesizer.synthesize(script, &path)?
        };
        if !natural_duration_s.is_finite() || natural_duration_s <= 0.0 {
            return Err(PipelineError::resource(
                "narration",
                format!("unusable narration duration {natural_duration_s}"),
            ));
        }
        Ok(AudioInput {
            path,
            natural_duration_s,
        })
    }

    /// Punctuated timestamps, resumed from the most advanced artifact present.
    fn timestamps(
        &self,
        store: &ArtifactStore,
        script: &str,
        narration: &Path,
    ) -> Result<Vec<WordTimestamp>, PipelineError> {
        let punctuated_path = store.subtitles();
        if is_present(&punctuated_path) {
            match load_words(&punctuated_path).and_then(|words| sanitize_words(&words)) {
                Ok(words) => {
                    debug!(words = words.len(), "reusing punctuated timestamps");
                    return Ok(words);
                }
                Err(e) => warn!(error = %e, "cached punctuated timestamps unusable; rebuilding"),
            }
        }

        let raw = self.raw_words(store, narration)?;
        let words = sanitize_words(&raw)?;
        let punctuated = self.punctuation_aligner.align(script, &words);
        if let Err(e) = save_words(&punctuated_path, &punctuated) {
            warn!(error = %e, "could not persist punctuated timestamps");
        }
        Ok(punctuated)
    }

    fn raw_words(
        &self,
        store: &ArtifactStore,
        narration: &Path,
    ) -> Result<Vec<WordTimestamp>, PipelineError> {
        let raw_path = store.raw_transcription();
        if is_present(&raw_path) {
            match load_words(&raw_path) {
                Ok(words) => return Ok(words),
                Err(e) => warn!(error = %e, "cached raw transcription unusable; transcribing"),
            }
        }
        let words = self
            .transcriber
            .transcribe(narration)
            .map_err(|e| e.at_stage(Stage::Transcription))?;
        if words.is_empty() {
            return Err(
                PipelineError::transcription("no word-level timestamps returned")
                    .at_stage(Stage::Transcription),
            );
        }
        if let Err(e) = save_words(&raw_path, &words) {
            warn!(error = %e, "could not persist raw transcription");
        }
        Ok(words)
    }

    fn background(
        &self,
        store: &ArtifactStore,
        timeline: &TimelineSpec,
    ) -> Result<Box<dyn MediaResource>, PipelineError> {
        let path = store.background();
        if is_present(&path) {
            debug!(path = %path.display(), "reusing background artifact");
        } else {
            self.background_renderer
                .render_background(timeline.total_duration, &path)?;
            if !is_present(&path) {
                return Err(PipelineError::resource(
                    "background",
                    format!("renderer produced no file at {}", path.display()),
                ));
            }
        }

        let track = self.probe.open_video(&path)?;
        let shortfall = timeline.total_duration - track.duration_s();
        if shortfall > self.config.background_tolerance_s {
            warn!(
                background_s = format!("{:.3}", track.duration_s()),
                total_s = format!("{:.3}", timeline.total_duration),
                "background shorter than timeline; tail will be uncovered"
            );
        }
        Ok(track)
    }

    fn captions(
        &self,
        words: &[WordTimestamp],
        timeline: &TimelineSpec,
    ) -> Result<Vec<CaptionItem>, PipelineError> {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let in_content = clamp_to_duration(words, timeline.content_duration);
        if in_content.is_empty() {
            return Err(PipelineError::data_quality(
                "no words start inside the content window",
            ));
        }
        let captions = self.segmenter.captions(&in_content);
        debug!(words = in_content.len(), captions = captions.len(), "captions built");
        Ok(captions)
    }

    /// Background music is optional: a missing or unreadable file leaves the
    /// mix with narration only.
    fn music(&self) -> Option<MusicInput> {
        let music = self.config.audio.music.as_ref()?;
        if !is_present(&music.path) {
            warn!(path = %music.path.display(), "background music not found; mixing without it");
            return None;
        }
        match self.probe.audio_duration(&music.path) {
            Ok(natural_duration_s) => Some(MusicInput {
                path: music.path.clone(),
                natural_duration_s,
                volume: music.volume,
            }),
            Err(e) => {
                warn!(
                    path = %music.path.display(),
                    error = %e,
                    "background music unreadable; mixing without it"
                );
                None
            }
        }
    }
}

/// Moves a fully encoded video into its final place. An encoder that reports
/// success without output is a missing artifact.
fn publish(staging: &Path, final_path: &Path) -> Result<(), PipelineError> {
    if !is_present(staging) {
        return Err(PipelineError::resource(
            "final video",
            format!("encoder produced no file at {}", staging.display()),
        ));
    }
    std::fs::rename(staging, final_path).map_err(|e| PipelineError::io("publish final video", e))
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial final video"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial final video"),
    }
}

/// The one place that decides which failures a run survives: data-quality
/// problems in the caption chain leave the video without captions, anything
/// else aborts with its stage attached.
fn fallback_to_no_captions<T: Default>(
    stage: Stage,
    result: Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == ErrorKind::DataQuality => {
            warn!(stage = %stage, error = %e, "continuing without captions");
            Ok(T::default())
        }
        Err(e) => Err(e.at_stage(stage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_quality_errors_degrade_to_empty() {
        let out: Vec<CaptionItem> = fallback_to_no_captions(
            Stage::Captions,
            Err(PipelineError::data_quality("no usable words")),
        )
        .expect("degrades");
        assert!(out.is_empty());
    }

    #[test]
    fn other_errors_carry_their_stage() {
        let err = fallback_to_no_captions::<Vec<WordTimestamp>>(
            Stage::Alignment,
            Err(PipelineError::transcription("service unavailable")),
        )
        .expect_err("upstream failures are fatal");
        assert_eq!(err.stage(), Some(Stage::Alignment));
        assert_eq!(err.kind(), ErrorKind::UpstreamService);
    }

    #[test]
    fn earlier_stage_attribution_is_kept() {
        let err = fallback_to_no_captions::<Vec<WordTimestamp>>(
            Stage::Alignment,
            Err(PipelineError::transcription("timeout").at_stage(Stage::Transcription)),
        )
        .expect_err("fatal");
        assert_eq!(err.stage(), Some(Stage::Transcription));
    }
}
