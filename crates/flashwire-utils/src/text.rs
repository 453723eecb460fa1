use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// Split text into sentences on terminal punctuation, dropping fragments
/// shorter than `min_length` characters.
pub fn split_sentences(text: &str, min_length: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| s.len() >= min_length)
        .map(str::to_string)
        .collect()
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences(
            "Brazil hosts the summit. Delegates arrived! Will talks resume? ok",
            10,
        );
        assert_eq!(
            sentences,
            vec![
                "Brazil hosts the summit",
                "Delegates arrived",
                "Will talks resume"
            ]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_sentences("", 10).is_empty());
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }
}
