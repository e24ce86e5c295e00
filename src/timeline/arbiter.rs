use crate::error::PipelineError;
use crate::types::TimelineSpec;

/// Resolves competing duration constraints into the run's single timeline.
///
/// The development cap shortens content first; the global maximum is then
/// absorbed by content alone so the intro is never cut.
pub fn resolve_timeline(
    intro_duration: f64,
    narration_duration: f64,
    dev_cap: Option<f64>,
    global_max: f64,
) -> Result<TimelineSpec, PipelineError> {
    for (name, value) in [
        ("intro duration", intro_duration),
        ("narration duration", narration_duration),
        ("global maximum", global_max),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::configuration(format!(
                "{name} must be a finite non-negative number, got {value}"
            )));
        }
    }

    let mut content_duration = match dev_cap {
        Some(cap) if cap < narration_duration => cap,
        _ => narration_duration,
    };
    let intended_total = intro_duration + content_duration;
    let total_duration = intended_total.min(global_max);
    content_duration = total_duration - intro_duration;

    if content_duration <= 0.0 {
        return Err(PipelineError::configuration(format!(
            "no room for content: intro {intro_duration:.2}s against maximum {global_max:.2}s \
             leaves {content_duration:.2}s"
        )));
    }

    tracing::info!(
        intro_s = format!("{intro_duration:.3}"),
        narration_s = format!("{narration_duration:.3}"),
        dev_cap_s = ?dev_cap,
        max_s = format!("{global_max:.3}"),
        content_s = format!("{content_duration:.3}"),
        total_s = format!("{total_duration:.3}"),
        "timeline: resolved"
    );

    Ok(TimelineSpec {
        intro_duration,
        content_duration,
        total_duration,
    })
}
