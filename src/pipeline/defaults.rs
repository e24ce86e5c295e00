use crate::alignment::punctuation::align_punctuation;
use crate::config::{CaptionConfig, CaptionMode};
use crate::pipeline::traits::{PhraseSegmenter, PunctuationAligner};
use crate::segmentation::{
    group_by_char_budget, group_by_sentence, phrase_captions, typing_captions,
};
use crate::types::{CaptionItem, Phrase, WordTimestamp};

pub struct SequencePunctuationAligner;

impl PunctuationAligner for SequencePunctuationAligner {
    fn align(&self, reference_text: &str, words: &[WordTimestamp]) -> Vec<WordTimestamp> {
        align_punctuation(reference_text, words)
    }
}

pub struct CharBudgetSegmenter {
    pub max_chars: usize,
    pub min_display_s: f64,
}

impl PhraseSegmenter for CharBudgetSegmenter {
    fn phrases(&self, words: &[WordTimestamp]) -> Vec<Phrase> {
        group_by_char_budget(words, self.max_chars)
    }

    fn captions(&self, words: &[WordTimestamp]) -> Vec<CaptionItem> {
        phrase_captions(&self.phrases(words), self.min_display_s)
    }
}

pub struct SentenceBlockSegmenter {
    pub min_display_s: f64,
}

impl PhraseSegmenter for SentenceBlockSegmenter {
    fn phrases(&self, words: &[WordTimestamp]) -> Vec<Phrase> {
        group_by_sentence(words)
    }

    fn captions(&self, words: &[WordTimestamp]) -> Vec<CaptionItem> {
        typing_captions(words, self.min_display_s)
    }
}

pub fn segmenter_for(config: &CaptionConfig) -> Box<dyn PhraseSegmenter> {
    match config.mode {
        CaptionMode::Phrase => Box::new(CharBudgetSegmenter {
            max_chars: config.max_line_chars,
            min_display_s: config.min_display_duration_s,
        }),
        CaptionMode::Typing => Box::new(SentenceBlockSegmenter {
            min_display_s: config.min_display_duration_s,
        }),
    }
}
