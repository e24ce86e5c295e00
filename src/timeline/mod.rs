pub mod arbiter;
pub mod mixer;
pub mod placement;

pub use arbiter::resolve_timeline;
pub use mixer::{AudioInput, AudioMixer, ClipSource, MixClip, MixPlan, MusicInput, SampleSource};
pub use placement::{OverlaySpec, OverlayWindow, PlacedLayers, TrackPlacer};
