use std::collections::HashMap;

use crate::alignment::sequence_matcher::SequenceMatcher;
use crate::alignment::tokenization::{
    is_terminal_punctuation, normalize_reference_word, normalize_transcribed_word,
    tokenize_reference,
};
use crate::types::WordTimestamp;

/// Restores script punctuation onto transcribed words.
///
/// Returns a new list; ordering and timings are untouched and only word text
/// may gain a trailing mark. Reference tokens inside insert/delete or
/// unequal-length replace blocks are not mapped, so words near transcription
/// errors can stay unpunctuated.
pub fn align_punctuation(reference_text: &str, words: &[WordTimestamp]) -> Vec<WordTimestamp> {
    let mut out = words.to_vec();
    if reference_text.trim().is_empty() || words.is_empty() {
        return out;
    }

    let reference = tokenize_reference(reference_text);
    if reference.is_empty() {
        return out;
    }

    let ref_norm: Vec<String> = reference
        .iter()
        .map(|t| normalize_reference_word(&t.word))
        .collect();
    let hyp_norm: Vec<String> = words
        .iter()
        .map(|w| normalize_transcribed_word(&w.word))
        .collect();

    let mut position_map: HashMap<usize, usize> = HashMap::new();
    let mut unmapped = 0usize;
    for op in SequenceMatcher::new(&ref_norm, &hyp_norm).opcodes() {
        if op.is_positional() {
            for offset in 0..op.a_range.len() {
                position_map.insert(op.a_range.start + offset, op.b_range.start + offset);
            }
        } else {
            unmapped += op.a_range.len();
        }
    }

    let mut applied = 0usize;
    for (ref_idx, token) in reference.iter().enumerate() {
        let Some(mark) = token.punctuation else {
            continue;
        };
        let Some(&word_idx) = position_map.get(&ref_idx) else {
            continue;
        };
        let word = &mut out[word_idx].word;
        if word.ends_with(mark) || word.ends_with(is_terminal_punctuation) {
            continue;
        }
        word.push(mark);
        applied += 1;
    }

    tracing::debug!(
        reference_tokens = reference.len(),
        transcribed_words = words.len(),
        mapped = position_map.len(),
        unmapped_reference_tokens = unmapped,
        applied,
        "alignment: punctuation transferred"
    );
    out
}
