use crate::error::PipelineError;
use crate::types::WordTimestamp;

/// Cleans raw transcription output into a usable word list.
///
/// Drops empty or non-finite words, clamps negative times to zero, repairs
/// `start > end`, and pushes each start forward to the previous end so word
/// spans never overlap.
pub fn sanitize_words(raw: &[WordTimestamp]) -> Result<Vec<WordTimestamp>, PipelineError> {
    let mut out: Vec<WordTimestamp> = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for w in raw {
        let word = w.word.trim();
        if word.is_empty() || !w.start.is_finite() || !w.end.is_finite() {
            dropped += 1;
            continue;
        }
        let floor = out.last().map(|prev| prev.end).unwrap_or(0.0);
        let start = w.start.max(floor);
        let end = w.end.max(start);
        out.push(WordTimestamp {
            word: word.to_string(),
            start,
            end,
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = out.len(), "timestamps: dropped invalid words");
    }
    if out.is_empty() {
        return Err(PipelineError::data_quality(
            "transcription contained no valid word timestamps",
        ));
    }
    Ok(out)
}

/// Caps word times at `limit` seconds of content. Words starting at or after
/// the limit are removed.
pub fn clamp_to_duration(words: &[WordTimestamp], limit: f64) -> Vec<WordTimestamp> {
    let kept: Vec<WordTimestamp> = words
        .iter()
        .filter(|w| w.start < limit)
        .map(|w| WordTimestamp {
            word: w.word.clone(),
            start: w.start,
            end: w.end.min(limit),
        })
        .collect();
    if kept.len() < words.len() {
        tracing::debug!(
            limit_s = limit,
            removed = words.len() - kept.len(),
            "timestamps: words beyond content duration removed"
        );
    }
    kept
}
