use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;
use crate::pipeline::entry::EntryInfo;

/// Settings for one pipeline instance. Constructed once at process start and
/// passed to the builder; nothing reads configuration from globals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub max_total_duration_s: f64,
    /// Development cap on content duration, applied before the global maximum.
    pub dev_duration_cap_s: Option<f64>,
    pub background_tolerance_s: f64,
    /// When false an existing final video short-circuits the run.
    pub overwrite_final: bool,
    pub captions: CaptionConfig,
    pub placement: PlacementConfig,
    pub audio: AudioConfig,
    pub intro: IntroTimingConfig,
    pub artifacts: ArtifactNames,
}

impl PipelineConfig {
    pub const DEFAULT_MAX_TOTAL_DURATION_S: f64 = 180.0;

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io("read pipeline config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| PipelineError::json("parse pipeline config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.max_total_duration_s.is_finite() || self.max_total_duration_s <= 0.0 {
            return Err(PipelineError::configuration(format!(
                "max_total_duration_s must be positive, got {}",
                self.max_total_duration_s
            )));
        }
        if let Some(cap) = self.dev_duration_cap_s {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(PipelineError::configuration(format!(
                    "dev_duration_cap_s must be positive, got {cap}"
                )));
            }
        }
        if self.captions.max_line_chars == 0 {
            return Err(PipelineError::configuration(
                "captions.max_line_chars must be at least 1",
            ));
        }
        for (name, value) in [
            ("background_tolerance_s", self.background_tolerance_s),
            (
                "captions.min_display_duration_s",
                self.captions.min_display_duration_s,
            ),
            (
                "placement.min_visible_duration_s",
                self.placement.min_visible_duration_s,
            ),
            ("audio.narration_tolerance_s", self.audio.narration_tolerance_s),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::configuration(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(music) = &self.audio.music {
            if !music.volume.is_finite() || music.volume < 0.0 {
                return Err(PipelineError::configuration(format!(
                    "audio.music.volume must be non-negative, got {}",
                    music.volume
                )));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            max_total_duration_s: Self::DEFAULT_MAX_TOTAL_DURATION_S,
            dev_duration_cap_s: None,
            background_tolerance_s: 0.1,
            overwrite_final: false,
            captions: CaptionConfig::default(),
            placement: PlacementConfig::default(),
            audio: AudioConfig::default(),
            intro: IntroTimingConfig::default(),
            artifacts: ArtifactNames::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    /// Char-budget phrases, one caption per phrase.
    Phrase,
    /// Sentence blocks revealed word by word.
    Typing,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub mode: CaptionMode,
    pub max_line_chars: usize,
    pub min_display_duration_s: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            mode: CaptionMode::Phrase,
            max_line_chars: 60,
            min_display_duration_s: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Tracks whose clamped duration is at or below this are dropped.
    pub min_visible_duration_s: f64,
    pub use_intro_logo: bool,
    pub use_watermark: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_visible_duration_s: 0.01,
            use_intro_logo: true,
            use_watermark: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub narration_tolerance_s: f64,
    pub music: Option<MusicConfig>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            narration_tolerance_s: 0.1,
            music: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MusicConfig {
    pub path: PathBuf,
    #[serde(default = "default_music_volume")]
    pub volume: f32,
}

fn default_music_volume() -> f32 {
    0.8
}

/// Typed-intro duration model offered to intro renderers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntroTimingConfig {
    pub pause_start_s: f64,
    pub per_char_s: f64,
    pub pause_end_s: f64,
}

impl IntroTimingConfig {
    const FALLBACK_PER_CHAR_S: f64 = 0.15;

    /// Intro runs: pause, number and "- name" typed one char at a time, pause.
    pub fn duration_for(&self, entry: &EntryInfo) -> f64 {
        let per_char = if self.per_char_s > 0.0 {
            self.per_char_s
        } else {
            Self::FALLBACK_PER_CHAR_S
        };
        let typed_chars = entry.number.chars().count() + entry.name_line().chars().count();
        self.pause_start_s + typed_chars as f64 * per_char + self.pause_end_s
    }
}

impl Default for IntroTimingConfig {
    fn default() -> Self {
        Self {
            pause_start_s: 0.8,
            per_char_s: Self::FALLBACK_PER_CHAR_S,
            pause_end_s: 2.0,
        }
    }
}

/// File names of the per-entry artifacts kept for resumable reruns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    pub narration: String,
    pub background: String,
    pub raw_transcription: String,
    pub subtitles: String,
    pub final_video: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            narration: "narration.mp3".to_string(),
            background: "background.mp4".to_string(),
            raw_transcription: "transcription_raw.json".to_string(),
            subtitles: "subtitles.json".to_string(),
            final_video: "final.mp4".to_string(),
        }
    }
}
