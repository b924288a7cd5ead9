use unicode_segmentation::UnicodeSegmentation;

/// Maximum token length to store in the index.
/// Tokens longer than this are likely base64, hex dumps, or other non-searchable content.
pub const MAX_TOKEN_LENGTH: usize = 128;

/// A single word occurrence in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lower-cased word
    pub term: String,
    /// Index of this word in the document's word sequence
    pub position: u32,
    /// Character (not byte) offset of the word start
    pub offset: u32,
}

/// Split text into lower-cased Unicode words with character offsets.
///
/// Word boundaries follow UAX #29; segments without any alphanumeric
/// character (whitespace, punctuation) are not words. Over-long words are
/// dropped but still consume a position so phrase adjacency stays exact.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(text.len() / 6);

    // Byte offsets from the segmenter are converted to char offsets by
    // counting forward from the previous word.
    let mut byte_cursor = 0usize;
    let mut char_cursor = 0usize;
    let mut position = 0u32;

    for (byte_start, word) in text.unicode_word_indices() {
        char_cursor += text[byte_cursor..byte_start].chars().count();
        byte_cursor = byte_start;

        if is_indexable(word) {
            tokens.push(Token {
                term: word.to_lowercase(),
                position,
                offset: char_cursor as u32,
            });
        }
        position += 1;
    }

    tokens
}

/// Lower-cased words of a query fragment, without offsets.
///
/// Over-long words are kept so a phrase keeps its word positions; they are
/// never in the index, so they match nothing.
pub fn tokenize_query(fragment: &str) -> Vec<String> {
    fragment.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Whether a word is short enough to be indexed
pub fn is_indexable(word: &str) -> bool {
    word.chars().count() <= MAX_TOKEN_LENGTH
}

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
