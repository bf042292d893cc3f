//! Tokenization for TF-IDF.
//!
//! ASCII punctuation is deleted (not replaced), so `don't` becomes `dont`
//! and `e-commerce` becomes `ecommerce`. The remainder is split on
//! whitespace, lowercased, and English stop words are dropped. A
//! [`Tokenizer`] built with stemming then reduces each remaining token to its
//! English (Porter2) stem, so `prices` and `price` share one term.

use rust_stemmers::{Algorithm, Stemmer};

/// English stop words, already stripped of punctuation.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "arent", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "couldn", "couldnt", "d", "did", "didn", "didnt", "do",
    "does", "doesn", "doesnt", "doing", "don", "dont", "down", "during", "each", "few", "for",
    "from", "further", "had", "hadn", "hadnt", "has", "hasn", "hasnt", "have", "haven", "havent",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "i", "if",
    "in", "into", "is", "isn", "isnt", "it", "its", "itself", "just", "ll", "m", "ma", "me",
    "mightn", "mightnt", "more", "most", "mustn", "mustnt", "my", "myself", "needn", "neednt",
    "no", "nor", "not", "now", "o", "of", "off", "on", "once", "only", "or", "other", "our",
    "ours", "ourselves", "out", "over", "own", "re", "s", "same", "shan", "shant", "she", "shes",
    "should", "shouldn", "shouldnt", "shouldve", "so", "some", "such", "t", "than", "that",
    "thatll", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was", "wasn",
    "wasnt", "we", "were", "weren", "werent", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "won", "wont", "wouldn", "wouldnt", "y", "you", "youd",
    "youll", "your", "youre", "yours", "yourself", "yourselves", "youve",
];

#[must_use]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Splits text into content tokens, optionally stemmed.
pub struct Tokenizer {
    stemmer: Option<Stemmer>,
}

impl Tokenizer {
    #[must_use]
    pub fn new(stem: bool) -> Self {
        Self {
            stemmer: stem.then(|| Stemmer::create(Algorithm::English)),
        }
    }

    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        match &self.stemmer {
            Some(stemmer) => tokens
                .iter()
                .map(|t| stemmer.stem(t).into_owned())
                .collect(),
            None => tokens,
        }
    }
}

/// Split `text` into lowercase content tokens, unstemmed.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .flat_map(char::to_lowercase)
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}
