use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use narration_timeline::config::{AudioConfig, CaptionConfig, IntroTimingConfig, MusicConfig};
use narration_timeline::pipeline::entry::EntryInfo;
use narration_timeline::timeline::ClipSource;
use narration_timeline::{
    BackgroundRenderer, Composition, EncodeRequest, Encoder, ErrorKind, IntroRenderer, LayerId,
    MediaProbe, MediaResource, NarrationSynthesizer, PipelineConfig, PipelineError,
    RenderOutcome, RenderPipeline, RenderPipelineBuilder, RenderedIntro, Stage, Transcriber,
    WordTimestamp,
};

const SCRIPT_STEM: &str = "SCP-173-The-Sculpture-Class-Euclid";
const SCRIPT_TEXT: &str = "The object is alive. Do not blink!";

type Log = Arc<Mutex<Vec<String>>>;

struct Track {
    label: String,
    duration_s: f64,
    released: Log,
}

impl MediaResource for Track {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn duration_s(&self) -> f64 {
        self.duration_s
    }

    fn release(&mut self) -> Result<(), PipelineError> {
        self.released.lock().unwrap().push(self.label.clone());
        Ok(())
    }
}

struct Synthesizer {
    duration_s: f64,
    calls: Arc<AtomicUsize>,
}

impl NarrationSynthesizer for Synthesizer {
    fn synthesize(&self, text: &str, output: &Path) -> Result<f64, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(PipelineError::synthesis("empty text"));
        }
        fs::write(output, b"ID3-narration").map_err(PipelineError::synthesis)?;
        Ok(self.duration_s)
    }
}

#[derive(Clone)]
enum Transcript {
    Words(Vec<WordTimestamp>),
    Fail,
}

struct ScriptedTranscriber {
    transcript: Transcript,
    calls: Arc<AtomicUsize>,
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&self, _audio: &Path) -> Result<Vec<WordTimestamp>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.transcript {
            Transcript::Words(words) => Ok(words.clone()),
            Transcript::Fail => Err(PipelineError::transcription("quota exceeded")),
        }
    }
}

struct Intro {
    /// Fixed length; `None` sizes the intro from the configured typing model.
    duration_s: Option<f64>,
    released: Log,
}

impl IntroRenderer for Intro {
    fn render_intro(
        &self,
        entry: &EntryInfo,
        timing: &IntroTimingConfig,
    ) -> Result<RenderedIntro, PipelineError> {
        let duration_s = self
            .duration_s
            .unwrap_or_else(|| timing.duration_for(entry));
        Ok(RenderedIntro {
            track: Box::new(Track {
                label: format!("intro {}", entry.number),
                duration_s,
                released: Arc::clone(&self.released),
            }),
            duration_s,
        })
    }
}

struct Background {
    requested: Arc<Mutex<Vec<f64>>>,
}

impl BackgroundRenderer for Background {
    fn render_background(&self, duration_s: f64, output: &Path) -> Result<(), PipelineError> {
        self.requested.lock().unwrap().push(duration_s);
        fs::write(output, b"mp4-background").map_err(|e| PipelineError::resource("background", e))
    }
}

struct Probe {
    audio_s: f64,
    /// `None` makes the music file unreadable.
    music_s: Option<f64>,
    background_s: f64,
    released: Log,
}

impl MediaProbe for Probe {
    fn audio_duration(&self, path: &Path) -> Result<f64, PipelineError> {
        if path.file_stem().is_some_and(|stem| stem == "music") {
            return self
                .music_s
                .ok_or_else(|| PipelineError::resource("decode music", "unsupported codec"));
        }
        Ok(self.audio_s)
    }

    fn open_video(&self, path: &Path) -> Result<Box<dyn MediaResource>, PipelineError> {
        Ok(Box::new(Track {
            label: format!("video {}", path.display()),
            duration_s: self.background_s,
            released: Arc::clone(&self.released),
        }))
    }
}

struct CapturingEncoder {
    encoded: Arc<Mutex<Option<Composition>>>,
    /// Crash after writing part of the output.
    crash: bool,
}

impl Encoder for CapturingEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<(), PipelineError> {
        assert!(request.intro.label().starts_with("intro"));
        assert!(request.background.label().starts_with("video"));
        if self.crash {
            fs::write(request.output, b"mp4-trunc").map_err(PipelineError::encode)?;
            return Err(PipelineError::encode("muxer crashed"));
        }
        *self.encoded.lock().unwrap() = Some(request.composition.clone());
        fs::write(request.output, b"mp4-final").map_err(PipelineError::encode)
    }
}

struct Harness {
    root: PathBuf,
    script: PathBuf,
    intro_s: Option<f64>,
    narration_s: f64,
    music_s: Option<f64>,
    background_s: f64,
    transcript: Transcript,
    encoder_crashes: bool,
    synth_calls: Arc<AtomicUsize>,
    transcribe_calls: Arc<AtomicUsize>,
    background_requests: Arc<Mutex<Vec<f64>>>,
    released: Log,
    encoded: Arc<Mutex<Option<Composition>>>,
}

impl Harness {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("narration_timeline_e2e_{name}"));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("create scratch dir");
        let script = root.join(format!("{SCRIPT_STEM}.txt"));
        fs::write(&script, SCRIPT_TEXT).expect("write script");
        Self {
            root,
            script,
            intro_s: Some(5.0),
            narration_s: 6.0,
            music_s: None,
            background_s: 11.0,
            transcript: Transcript::Words(spoken_words()),
            encoder_crashes: false,
            synth_calls: Arc::new(AtomicUsize::new(0)),
            transcribe_calls: Arc::new(AtomicUsize::new(0)),
            background_requests: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(Mutex::new(Vec::new())),
            encoded: Arc::new(Mutex::new(None)),
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.root.join("output"),
            captions: CaptionConfig {
                max_line_chars: 20,
                ..CaptionConfig::default()
            },
            ..PipelineConfig::default()
        }
    }

    /// Config with background music at `root/music.wav`, written to disk.
    fn config_with_music(&self) -> PipelineConfig {
        let path = self.root.join("music.wav");
        fs::write(&path, b"RIFF-music").expect("write music");
        PipelineConfig {
            audio: AudioConfig {
                music: Some(MusicConfig { path, volume: 0.5 }),
                ..AudioConfig::default()
            },
            ..self.config()
        }
    }

    fn entry_dir(&self) -> PathBuf {
        self.root.join("output").join("SCP-173")
    }

    fn pipeline(&self, config: PipelineConfig) -> RenderPipeline {
        RenderPipelineBuilder::new(config)
            .with_synthesizer(Box::new(Synthesizer {
                duration_s: self.narration_s,
                calls: Arc::clone(&self.synth_calls),
            }))
            .with_transcriber(Box::new(ScriptedTranscriber {
                transcript: self.transcript.clone(),
                calls: Arc::clone(&self.transcribe_calls),
            }))
            .with_intro_renderer(Box::new(Intro {
                duration_s: self.intro_s,
                released: Arc::clone(&self.released),
            }))
            .with_background_renderer(Box::new(Background {
                requested: Arc::clone(&self.background_requests),
            }))
            .with_probe(Box::new(Probe {
                audio_s: self.narration_s,
                music_s: self.music_s,
                background_s: self.background_s,
                released: Arc::clone(&self.released),
            }))
            .with_encoder(Box::new(CapturingEncoder {
                encoded: Arc::clone(&self.encoded),
                crash: self.encoder_crashes,
            }))
            .build()
            .expect("pipeline builds")
    }

    fn render(&self) -> Result<RenderOutcome, PipelineError> {
        self.pipeline(self.config()).render(&self.script)
    }

    fn composition(&self) -> Composition {
        self.encoded.lock().unwrap().clone().expect("encoder was called")
    }

    fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn spoken_words() -> Vec<WordTimestamp> {
    vec![
        WordTimestamp::new("the", 0.0, 0.3),
        WordTimestamp::new("object", 0.3, 0.8),
        WordTimestamp::new("is", 0.8, 1.0),
        WordTimestamp::new("alive", 1.0, 1.6),
        WordTimestamp::new("do", 2.0, 2.2),
        WordTimestamp::new("not", 2.2, 2.5),
        WordTimestamp::new("blink", 2.5, 3.1),
    ]
}

fn caption_tracks(composition: &Composition) -> Vec<(String, f64, f64)> {
    composition
        .tracks
        .iter()
        .filter_map(|track| match track.layer_id {
            LayerId::Caption(idx) => Some((
                composition.caption_texts[idx].clone(),
                track.start,
                track.duration,
            )),
            _ => None,
        })
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn renders_punctuated_captions_on_the_resolved_timeline() {
    let harness = Harness::new("happy_path");
    let outcome = harness.render().expect("render succeeds");
    let RenderOutcome::Rendered(summary) = outcome else {
        panic!("expected a fresh render");
    };
    assert_eq!(summary.entry.number, "SCP-173");
    assert_close(summary.timeline.intro_duration, 5.0);
    assert_close(summary.timeline.content_duration, 6.0);
    assert_close(summary.timeline.total_duration, 11.0);
    assert_eq!(summary.caption_count, 2);
    assert!(summary.has_audio);
    assert_eq!(summary.output, harness.entry_dir().join("final.mp4"));

    let composition = harness.composition();
    let captions = caption_tracks(&composition);
    assert_eq!(captions.len(), 2);
    assert_eq!(captions[0].0, "The object is alive.");
    assert_close(captions[0].1, 5.0);
    assert_close(captions[0].2, 1.6);
    assert_eq!(captions[1].0, "Do not blink!");
    assert_close(captions[1].1, 7.0);
    assert_close(captions[1].2, 1.1);

    let background = composition
        .tracks
        .iter()
        .find(|t| t.layer_id == LayerId::Background)
        .expect("background track");
    assert_close(background.duration, 11.0);
    let watermark = composition
        .tracks
        .iter()
        .find(|t| t.layer_id == LayerId::Watermark)
        .expect("watermark track");
    assert_close(watermark.start, 5.0);

    let audio = composition.audio.expect("narration mixed");
    assert_close(audio.duration_s, 11.0);
    assert_eq!(audio.clips.len(), 1);
    assert_close(audio.clips[0].start_s, 5.0);

    assert_eq!(*harness.background_requests.lock().unwrap(), vec![11.0]);
    assert!(harness.entry_dir().join("transcription_raw.json").exists());
    let saved = fs::read_to_string(harness.entry_dir().join("subtitles.json")).expect("subtitles");
    assert!(saved.contains("\"alive.\""));
    assert!(saved.contains("\"blink!\""));

    let released = harness.released();
    assert_eq!(released.len(), 2);
    assert!(released[0].starts_with("video"));
    assert_eq!(released[1], "intro SCP-173");
}

#[test]
fn existing_final_video_short_circuits_the_rerun() {
    let harness = Harness::new("already_rendered");
    harness.render().expect("first render");
    let outcome = harness.render().expect("second render");
    assert_eq!(
        outcome,
        RenderOutcome::AlreadyRendered(harness.entry_dir().join("final.mp4"))
    );
    assert_eq!(harness.synth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn rerun_resumes_from_saved_artifacts() {
    let mut harness = Harness::new("resume");
    harness.render().expect("first render");
    fs::remove_file(harness.entry_dir().join("final.mp4")).expect("remove final");

    harness.transcript = Transcript::Fail;
    let outcome = harness.render().expect("resumed render");
    assert!(matches!(outcome, RenderOutcome::Rendered(_)));
    assert_eq!(harness.synth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.transcribe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.background_requests.lock().unwrap().len(), 1);
    assert_eq!(caption_tracks(&harness.composition()).len(), 2);
}

#[test]
fn transcription_failure_aborts_and_keeps_narration() {
    let mut harness = Harness::new("transcription_failure");
    harness.transcript = Transcript::Fail;
    let err = harness.render().expect_err("transcription failure is fatal");
    assert_eq!(err.kind(), ErrorKind::UpstreamService);
    assert_eq!(err.stage(), Some(Stage::Transcription));
    assert!(harness.entry_dir().join("narration.mp3").exists());
    assert!(!harness.entry_dir().join("final.mp4").exists());
    assert!(harness.encoded.lock().unwrap().is_none());
}

#[test]
fn unusable_timestamps_render_without_captions() {
    let mut harness = Harness::new("no_captions");
    harness.transcript = Transcript::Words(vec![
        WordTimestamp::new("  ", 0.0, 0.5),
        WordTimestamp::new("", 0.5, 1.0),
    ]);
    let outcome = harness.render().expect("degrades instead of failing");
    let RenderOutcome::Rendered(summary) = outcome else {
        panic!("expected a fresh render");
    };
    assert_eq!(summary.caption_count, 0);
    assert!(caption_tracks(&harness.composition()).is_empty());
}

#[test]
fn intro_longer_than_maximum_is_a_configuration_error() {
    let mut harness = Harness::new("intro_too_long");
    harness.intro_s = Some(200.0);
    let err = harness.render().expect_err("timeline must reject");
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.stage(), Some(Stage::Timeline));
    assert_eq!(harness.released(), vec!["intro SCP-173".to_string()]);
    assert!(harness.background_requests.lock().unwrap().is_empty());
}

#[test]
fn dev_cap_shortens_content_and_drops_late_captions() {
    let harness = Harness::new("dev_cap");
    let config = PipelineConfig {
        dev_duration_cap_s: Some(2.1),
        ..harness.config()
    };
    let outcome = harness
        .pipeline(config)
        .render(&harness.script)
        .expect("render succeeds");
    let RenderOutcome::Rendered(summary) = outcome else {
        panic!("expected a fresh render");
    };
    assert_close(summary.timeline.total_duration, 7.1);

    let captions = caption_tracks(&harness.composition());
    assert_eq!(captions.len(), 2);
    assert_close(captions[1].1, 7.0);
    assert!(captions[1].2 <= 0.1 + 1e-9);

    let audio = harness.composition().audio.expect("narration mixed");
    assert_close(audio.duration_s, 7.1);
    assert!(audio.clips.iter().all(|c| c.end_s() <= 7.1 + 1e-9));
}

#[test]
fn short_background_is_accepted() {
    let mut harness = Harness::new("short_background");
    harness.background_s = 4.0;
    assert!(matches!(
        harness.render().expect("short background only warns"),
        RenderOutcome::Rendered(_)
    ));
}

#[test]
fn empty_script_is_a_resource_error() {
    let harness = Harness::new("empty_script");
    fs::write(&harness.script, "   \n").expect("truncate script");
    let err = harness.render().expect_err("empty script");
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(err.stage(), Some(Stage::Narration));
    assert_eq!(harness.synth_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_encode_leaves_no_final_video_and_rerun_renders() {
    let mut harness = Harness::new("encode_crash");
    harness.encoder_crashes = true;
    let err = harness.render().expect_err("encode failure is fatal");
    assert_eq!(err.kind(), ErrorKind::UpstreamService);
    assert_eq!(err.stage(), Some(Stage::Encode));
    assert!(!harness.entry_dir().join("final.mp4").exists());
    assert!(!harness.entry_dir().join("final.partial.mp4").exists());
    assert_eq!(harness.released().len(), 2);

    harness.encoder_crashes = false;
    let outcome = harness.render().expect("rerun succeeds");
    assert!(matches!(outcome, RenderOutcome::Rendered(_)));
    assert_eq!(harness.synth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        fs::read(harness.entry_dir().join("final.mp4")).expect("final video"),
        b"mp4-final"
    );
}

#[test]
fn successful_encode_publishes_only_the_final_video() {
    let harness = Harness::new("publish");
    harness.render().expect("render succeeds");
    assert!(harness.entry_dir().join("final.mp4").exists());
    assert!(!harness.entry_dir().join("final.partial.mp4").exists());
}

#[test]
fn intro_length_follows_configured_typing_model() {
    let mut harness = Harness::new("intro_timing");
    harness.intro_s = None;
    let config = PipelineConfig {
        intro: IntroTimingConfig {
            pause_start_s: 1.0,
            per_char_s: 0.1,
            pause_end_s: 2.0,
        },
        ..harness.config()
    };
    let outcome = harness
        .pipeline(config)
        .render(&harness.script)
        .expect("render succeeds");
    let RenderOutcome::Rendered(summary) = outcome else {
        panic!("expected a fresh render");
    };
    // "SCP-173" and "- The Sculpture" are typed: 22 chars.
    assert_close(summary.timeline.intro_duration, 5.2);
    assert_close(summary.timeline.total_duration, 11.2);

    let composition = harness.composition();
    let captions = caption_tracks(&composition);
    assert_close(captions[0].1, 5.2);
    let audio = composition.audio.expect("narration mixed");
    assert_close(audio.clips[0].start_s, 5.2);
}

#[test]
fn unreadable_music_is_skipped() {
    let harness = Harness::new("music_unreadable");
    let outcome = harness
        .pipeline(harness.config_with_music())
        .render(&harness.script)
        .expect("music is optional");
    assert!(matches!(outcome, RenderOutcome::Rendered(_)));

    let audio = harness.composition().audio.expect("narration mixed");
    let music = harness.root.join("music.wav");
    assert!(audio
        .clips
        .iter()
        .all(|clip| clip.source != ClipSource::File(music.clone())));
    assert_eq!(audio.clips.len(), 1);
}

#[test]
fn short_music_loops_under_the_whole_video() {
    let mut harness = Harness::new("music_loop");
    harness.music_s = Some(6.0);
    harness
        .pipeline(harness.config_with_music())
        .render(&harness.script)
        .expect("render succeeds");

    let audio = harness.composition().audio.expect("audio mixed");
    let music = harness.root.join("music.wav");
    let loops: Vec<_> = audio
        .clips
        .iter()
        .filter(|clip| clip.source == ClipSource::File(music.clone()))
        .collect();
    assert_eq!(loops.len(), 2);
    assert_close(loops[0].start_s, 0.0);
    assert_close(loops[1].start_s, 6.0);
    assert_close(loops[1].duration_s, 5.0);
}
