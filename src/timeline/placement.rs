use crate::config::PlacementConfig;
use crate::types::{CaptionItem, LayerId, PlacedTrack, TimelineSpec};

/// Time window a fixed overlay occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayWindow {
    /// `[0, total)`.
    Whole,
    /// `[0, intro)`.
    Intro,
    /// `[intro, total)`.
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySpec {
    pub layer_id: LayerId,
    pub window: OverlayWindow,
}

impl OverlaySpec {
    pub const fn new(layer_id: LayerId, window: OverlayWindow) -> Self {
        Self { layer_id, window }
    }
}

/// Placed visual layers. `LayerId::Caption(i)` indexes `caption_texts`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacedLayers {
    pub tracks: Vec<PlacedTrack>,
    pub caption_texts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TrackPlacer {
    min_visible_duration: f64,
    use_intro_logo: bool,
    use_watermark: bool,
}

impl TrackPlacer {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            min_visible_duration: config.min_visible_duration_s,
            use_intro_logo: config.use_intro_logo,
            use_watermark: config.use_watermark,
        }
    }

    /// Overlays enabled for this run: background, intro, then optional logos.
    pub fn default_overlays(&self) -> Vec<OverlaySpec> {
        let mut overlays = vec![
            OverlaySpec::new(LayerId::Background, OverlayWindow::Whole),
            OverlaySpec::new(LayerId::Intro, OverlayWindow::Intro),
        ];
        if self.use_intro_logo {
            overlays.push(OverlaySpec::new(LayerId::IntroLogo, OverlayWindow::Intro));
        }
        if self.use_watermark {
            overlays.push(OverlaySpec::new(LayerId::Watermark, OverlayWindow::Content));
        }
        overlays
    }

    /// Shifts a content-relative interval into global time and clips it to the
    /// timeline. `None` when nothing visible remains.
    pub fn place_interval(
        &self,
        start: f64,
        duration: f64,
        timeline: &TimelineSpec,
    ) -> Option<(f64, f64)> {
        let shifted_start = (start + timeline.intro_duration).max(0.0);
        if shifted_start >= timeline.total_duration {
            return None;
        }
        let effective = duration.min(timeline.total_duration - shifted_start);
        if effective <= self.min_visible_duration {
            return None;
        }
        Some((shifted_start, effective))
    }

    pub fn place_overlay(&self, overlay: OverlaySpec, timeline: &TimelineSpec) -> PlacedTrack {
        let (start, duration) = match overlay.window {
            OverlayWindow::Whole => (0.0, timeline.total_duration),
            OverlayWindow::Intro => (0.0, timeline.intro_duration),
            OverlayWindow::Content => (timeline.intro_duration, timeline.content_duration),
        };
        PlacedTrack {
            layer_id: overlay.layer_id,
            start,
            duration,
        }
    }

    pub fn place(
        &self,
        captions: &[CaptionItem],
        timeline: &TimelineSpec,
        overlays: &[OverlaySpec],
    ) -> PlacedLayers {
        let mut layers = PlacedLayers::default();
        for overlay in overlays {
            let track = self.place_overlay(*overlay, timeline);
            if track.duration > 0.0 {
                layers.tracks.push(track);
            }
        }

        let mut dropped = 0usize;
        for item in captions {
            let Some((start, duration)) = self.place_interval(item.start, item.duration, timeline)
            else {
                dropped += 1;
                continue;
            };
            let index = layers.caption_texts.len();
            layers.caption_texts.push(item.text.clone());
            layers.tracks.push(PlacedTrack {
                layer_id: LayerId::Caption(index),
                start,
                duration,
            });
        }

        tracing::debug!(
            captions_in = captions.len(),
            captions_placed = layers.caption_texts.len(),
            captions_dropped = dropped,
            tracks = layers.tracks.len(),
            "placement: layers resolved"
        );
        layers
    }
}
