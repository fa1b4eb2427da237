//! Analyzers for the three indexed representations of a business name.

use crate::normalize::fold;

/// Gram length of the partial-match field
pub const NGRAM_SIZE: usize = 5;

/// Standard tokenization: split on anything that is not alphanumeric, then fold.
#[inline]
pub fn tokenize(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fixed-size character n-grams of every token. Tokens shorter than `size`
/// contribute nothing.
pub fn ngrams(tokens: &[String], size: usize) -> Vec<String> {
    let mut grams = Vec::new();
    for token in tokens {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < size {
            continue;
        }
        grams.extend(chars.windows(size).map(|w| w.iter().collect::<String>()));
    }
    grams
}

/// Keyword normalizer: the whole name as one folded term without
/// punctuation or whitespace.
#[inline]
pub fn keyword(text: &str) -> String {
    fold(text).chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Maximum edit distance tolerated for a query of this length.
///
/// Lengths below 5 get no correction at all, short tokens would
/// otherwise match half the catalog.
#[inline]
pub fn fuzziness_for(text: &str) -> usize {
    match text.chars().count() {
        n if n >= 6 => 2,
        5 => 1,
        _ => 0,
    }
}
