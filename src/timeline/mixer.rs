use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::TimelineSpec;

const DURATION_EPS_S: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum ClipSource {
    File(PathBuf),
    Silence,
}

/// One audio clip on the master timeline. Times are global seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MixClip {
    pub source: ClipSource,
    pub start_s: f64,
    /// Position inside the source where playback begins.
    pub source_offset_s: f64,
    pub duration_s: f64,
    pub gain: f32,
}

impl MixClip {
    fn file(path: &Path, start_s: f64, duration_s: f64, gain: f32) -> Self {
        Self {
            source: ClipSource::File(path.to_path_buf()),
            start_s,
            source_offset_s: 0.0,
            duration_s,
            gain,
        }
    }

    fn silence(start_s: f64, duration_s: f64) -> Self {
        Self {
            source: ClipSource::Silence,
            start_s,
            source_offset_s: 0.0,
            duration_s,
            gain: 0.0,
        }
    }

    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }
}

/// Master audio: clips summed over exactly `duration_s` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MixPlan {
    pub duration_s: f64,
    pub clips: Vec<MixClip>,
}

/// Decoded audio supplier used when rendering a plan to samples.
pub trait SampleSource {
    /// Mono samples of `path` at `sample_rate_hz`.
    fn samples(&self, path: &Path, sample_rate_hz: u32) -> Result<Vec<f32>, PipelineError>;
}

impl MixPlan {
    /// Sums all clips into `round(duration × rate)` mono samples. Reads past a
    /// source's end contribute silence.
    pub fn render(
        &self,
        sample_rate_hz: u32,
        source: &dyn SampleSource,
    ) -> Result<Vec<f32>, PipelineError> {
        let rate = sample_rate_hz as f64;
        let total = (self.duration_s * rate).round() as usize;
        let mut out = vec![0.0f32; total];
        let mut decoded: HashMap<&Path, Vec<f32>> = HashMap::new();

        for clip in &self.clips {
            let ClipSource::File(path) = &clip.source else {
                continue;
            };
            if !decoded.contains_key(path.as_path()) {
                decoded.insert(path.as_path(), source.samples(path, sample_rate_hz)?);
            }
            let Some(samples) = decoded.get(path.as_path()) else {
                continue;
            };
            let dst_start = (clip.start_s * rate).round() as usize;
            let src_start = (clip.source_offset_s * rate).round() as usize;
            let len = (clip.duration_s * rate).round() as usize;
            for n in 0..len {
                let Some(dst) = out.get_mut(dst_start + n) else {
                    break;
                };
                let Some(&sample) = samples.get(src_start + n) else {
                    break;
                };
                *dst += sample * clip.gain;
            }
        }
        Ok(out)
    }
}

/// Narration artifact as seen by the mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    pub path: PathBuf,
    pub natural_duration_s: f64,
}

/// Background music with the volume applied to every loop copy.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicInput {
    pub path: PathBuf,
    pub natural_duration_s: f64,
    pub volume: f32,
}

#[derive(Debug, Clone)]
pub struct AudioMixer {
    narration_tolerance_s: f64,
}

impl AudioMixer {
    pub fn new(narration_tolerance_s: f64) -> Self {
        Self {
            narration_tolerance_s,
        }
    }

    /// Narration clips placed at the intro offset, fitted to content duration
    /// by trimming or silence padding. Never time-stretched.
    pub fn narration_clips(&self, narration: &AudioInput, timeline: &TimelineSpec) -> Vec<MixClip> {
        let natural = narration.natural_duration_s;
        let content = timeline.content_duration;
        let start = timeline.intro_duration;
        if natural <= 0.0 {
            tracing::warn!(
                path = %narration.path.display(),
                "mixer: narration has no duration; skipping"
            );
            return Vec::new();
        }

        if (natural - content).abs() <= self.narration_tolerance_s {
            return vec![MixClip::file(&narration.path, start, natural, 1.0)];
        }
        if natural > content {
            tracing::info!(
                natural_s = format!("{natural:.3}"),
                content_s = format!("{content:.3}"),
                "mixer: trimming narration to content duration"
            );
            return vec![MixClip::file(&narration.path, start, content, 1.0)];
        }
        tracing::info!(
            natural_s = format!("{natural:.3}"),
            content_s = format!("{content:.3}"),
            "mixer: padding narration with silence"
        );
        vec![
            MixClip::file(&narration.path, start, natural, 1.0),
            MixClip::silence(start + natural, content - natural),
        ]
    }

    /// Music looped or trimmed to exactly the total duration.
    pub fn music_clips(&self, music: &MusicInput, timeline: &TimelineSpec) -> Vec<MixClip> {
        let natural = music.natural_duration_s;
        let total = timeline.total_duration;
        if natural <= 0.0 {
            tracing::warn!(
                path = %music.path.display(),
                "mixer: background music has no duration; skipping"
            );
            return Vec::new();
        }

        if natural + DURATION_EPS_S < total {
            let loop_count = (total / natural).ceil() as usize;
            tracing::info!(
                loop_count,
                natural_s = format!("{natural:.3}"),
                total_s = format!("{total:.3}"),
                "mixer: looping background music"
            );
            return (0..loop_count)
                .map(|k| {
                    let start = k as f64 * natural;
                    MixClip::file(&music.path, start, natural.min(total - start), music.volume)
                })
                .filter(|clip| clip.duration_s > DURATION_EPS_S)
                .collect();
        }
        if natural > total + DURATION_EPS_S {
            tracing::info!(
                natural_s = format!("{natural:.3}"),
                total_s = format!("{total:.3}"),
                "mixer: trimming background music"
            );
            return vec![MixClip::file(&music.path, 0.0, total, music.volume)];
        }
        vec![MixClip::file(&music.path, 0.0, natural, music.volume)]
    }

    /// Builds the master audio plan, or `None` when no audible track exists.
    pub fn mix(
        &self,
        narration: Option<&AudioInput>,
        music: Option<&MusicInput>,
        timeline: &TimelineSpec,
    ) -> Option<MixPlan> {
        let mut clips = Vec::new();
        if let Some(music) = music {
            clips.extend(self.music_clips(music, timeline));
        }
        if let Some(narration) = narration {
            clips.extend(self.narration_clips(narration, timeline));
        }
        if !clips
            .iter()
            .any(|clip| matches!(clip.source, ClipSource::File(_)))
        {
            tracing::warn!("mixer: no usable audio track; output will be silent");
            return None;
        }
        Some(force_duration(clips, timeline.total_duration))
    }
}

/// Cuts every clip at `total` and pads any shortfall with trailing silence.
fn force_duration(clips: Vec<MixClip>, total: f64) -> MixPlan {
    let mut fitted: Vec<MixClip> = clips
        .into_iter()
        .filter(|clip| clip.start_s < total)
        .map(|mut clip| {
            clip.duration_s = clip.duration_s.min(total - clip.start_s);
            clip
        })
        .collect();
    let covered = fitted.iter().map(MixClip::end_s).fold(0.0f64, f64::max);
    if covered + DURATION_EPS_S < total {
        fitted.push(MixClip::silence(covered, total - covered));
    }
    MixPlan {
        duration_s: total,
        clips: fitted,
    }
}
