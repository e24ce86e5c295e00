//! Grouping of punctuated word timestamps into display phrases.

use crate::types::{CaptionItem, Phrase, WordTimestamp};


/// Marks that attach to the preceding text without a space.
const NO_SPACE_BEFORE: [char; 9] = ['.', ',', '!', '?', ':', ';', ')', ']', '}'];
/// Opening marks that attach to the following text without a space.
const NO_SPACE_AFTER: [char; 3] = ['(', '[', '{'];
const SENTENCE_END: [char; 3] = ['.', '!', '?'];
const DISPLAY_TERMINATORS: [char; 5] = ['.', '!', '?', ':', ';'];

fn needs_space(current: &str, token: &str) -> bool {
    if current.is_empty() {
        return false;
    }
    if token.starts_with(NO_SPACE_BEFORE) {
        return false;
    }
    !current.ends_with(NO_SPACE_AFTER)
}

/// Appends `token` to `current` using punctuation-aware spacing.
fn push_token(current: &mut String, token: &str) {
    if needs_space(current, token) {
        current.push(' ');
    }
    current.push_str(token);
}

fn join_words(words: &[WordTimestamp]) -> String {
    let mut text = String::new();
    for w in words {
        push_token(&mut text, &w.word);
    }
    text
}

/// Accumulates words of the phrase currently being built.
struct OpenPhrase {
    text: String,
    char_count: usize,
    start: f64,
    last_end: f64,
}

impl OpenPhrase {
    fn begin(word: &WordTimestamp) -> Self {
        Self {
            text: word.word.clone(),
            char_count: word.word.chars().count(),
            start: word.start,
            last_end: word.end,
        }
    }

    fn len_with(&self, word: &str) -> usize {
        let space = usize::from(needs_space(&self.text, word));
        self.char_count + space + word.chars().count()
    }

    fn extend(&mut self, word: &WordTimestamp) {
        self.char_count = self.len_with(&word.word);
        push_token(&mut self.text, &word.word);
        self.last_end = word.end;
    }

    fn close(self) -> Phrase {
        Phrase {
            text: self.text,
            start: self.start,
            end: self.last_end.max(self.start),
        }
    }
}

/// Groups words into phrases whose joined text fits in `max_chars` characters.
///
/// A word that alone exceeds the budget becomes its own phrase; words are
/// never split.
pub fn group_by_char_budget(words: &[WordTimestamp], max_chars: usize) -> Vec<Phrase> {
    let mut phrases = Vec::new();
    let mut open: Option<OpenPhrase> = None;
    for word in words {
        open = Some(match open.take() {
            None => OpenPhrase::begin(word),
            Some(mut cur) if cur.len_with(&word.word) <= max_chars => {
                cur.extend(word);
                cur
            }
            Some(cur) => {
                phrases.push(cur.close());
                OpenPhrase::begin(word)
            }
        });
    }
    if let Some(cur) = open {
        phrases.push(cur.close());
    }
    phrases
}

/// Splits words into sentence blocks closed by a word containing `.`, `!` or `?`.
/// A trailing block without a terminator is still emitted.
pub fn sentence_blocks(words: &[WordTimestamp]) -> Vec<Vec<WordTimestamp>> {
    let mut blocks = Vec::new();
    let mut block: Vec<WordTimestamp> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        block.push(word.clone());
        if word.word.contains(SENTENCE_END) || i + 1 == words.len() {
            blocks.push(std::mem::take(&mut block));
        }
    }
    blocks
}

fn block_phrase(block: &[WordTimestamp]) -> Option<Phrase> {
    let first = block.first()?;
    let last = block.last()?;
    Some(Phrase {
        text: join_words(block),
        start: first.start,
        end: last.end.max(first.start),
    })
}

/// One phrase per sentence block.
pub fn group_by_sentence(words: &[WordTimestamp]) -> Vec<Phrase> {
    sentence_blocks(words)
        .iter()
        .filter_map(|block| block_phrase(block))
        .collect()
}

/// Capitalizes the phrase when it opens with a lower-case letter and makes
/// sure it ends with a terminator. Timing is not touched.
pub fn polish_for_display(text: &str) -> String {
    let mut chars = text.chars();
    let mut out = String::with_capacity(text.len() + 1);
    match chars.next() {
        Some(first) if first.is_alphabetic() => out.extend(first.to_uppercase()),
        Some(first) => out.push(first),
        None => return out,
    }
    out.extend(chars);
    if !out.ends_with(DISPLAY_TERMINATORS) {
        out.push('.');
    }
    out
}

/// Phrase-mode captions: polished text shown for at least `min_display_s`.
pub fn phrase_captions(phrases: &[Phrase], min_display_s: f64) -> Vec<CaptionItem> {
    phrases
        .iter()
        .map(|p| CaptionItem {
            text: polish_for_display(&p.text),
            start: p.start,
            duration: p.duration().max(min_display_s),
        })
        .collect()
}

/// Typing-mode captions: each word of a sentence block reveals the text so far
/// and holds until the next word starts. The last word of a block holds until
/// the block ends.
pub fn typing_captions(words: &[WordTimestamp], min_display_s: f64) -> Vec<CaptionItem> {
    let mut items = Vec::new();
    for block in sentence_blocks(words) {
        let Some(phrase) = block_phrase(&block) else {
            continue;
        };
        let mut text = String::new();
        for (k, word) in block.iter().enumerate() {
            push_token(&mut text, &word.word);
            let duration = match block.get(k + 1) {
                Some(next) => (next.start - word.start).max(0.0),
                None => (phrase.end - word.start).max(min_display_s),
            };
            items.push(CaptionItem {
                text: text.clone(),
                start: word.start,
                duration,
            });
        }
    }
    items
}
