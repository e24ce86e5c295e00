pub mod punctuation;
pub mod sequence_matcher;
pub mod timestamps;
pub mod tokenization;

pub use punctuation::align_punctuation;
pub use timestamps::{clamp_to_duration, sanitize_words};
pub use tokenization::tokenize_reference;
