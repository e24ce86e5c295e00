use crate::types::ReferenceToken;

/// Marks that may trail a word and are carried over onto transcribed words.
pub const TERMINAL_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

pub fn is_terminal_punctuation(c: char) -> bool {
    TERMINAL_PUNCTUATION.contains(&c)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawToken {
    Word(String),
    Mark(char),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Splits the script into word runs and terminal marks. An apostrophe between
/// two word characters stays inside the word (`doesn't`). Whitespace and any
/// other symbol separate tokens and are otherwise discarded.
fn scan(text: &str) -> Vec<RawToken> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if is_word_char(c) {
            cur.push(c);
            continue;
        }
        let joins_word = !cur.is_empty() && chars.peek().is_some_and(|&n| is_word_char(n));
        if is_apostrophe(c) && joins_word {
            cur.push('\'');
            continue;
        }
        if !cur.is_empty() {
            out.push(RawToken::Word(std::mem::take(&mut cur)));
        }
        if is_terminal_punctuation(c) {
            out.push(RawToken::Mark(c));
        }
    }
    if !cur.is_empty() {
        out.push(RawToken::Word(cur));
    }
    out
}

/// Tokenizes authoritative script text into words with their trailing mark.
///
/// A mark is attached when it is the token directly after a word; marks that
/// do not follow a word (leading marks, the second dot of an ellipsis) are
/// dropped.
pub fn tokenize_reference(text: &str) -> Vec<ReferenceToken> {
    let raw = scan(text);
    let mut tokens = Vec::with_capacity(raw.len());
    let mut it = raw.into_iter().peekable();
    while let Some(tok) = it.next() {
        let RawToken::Word(word) = tok else {
            continue;
        };
        let punctuation = match it.peek() {
            Some(RawToken::Mark(mark)) => {
                let mark = *mark;
                it.next();
                Some(mark)
            }
            _ => None,
        };
        tokens.push(ReferenceToken { word, punctuation });
    }
    tokens
}

/// Lower-cased form of a reference word used for sequence matching.
pub fn normalize_reference_word(word: &str) -> String {
    word.to_lowercase()
}

/// Lower-cased transcribed word with trailing terminal marks stripped and
/// typographic apostrophes folded to `'`.
pub fn normalize_transcribed_word(word: &str) -> String {
    word.trim_end_matches(is_terminal_punctuation)
        .replace('\u{2019}', "'")
        .to_lowercase()
}
