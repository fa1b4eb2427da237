//! Text normalization for business mentions.
//!
//! Turns free-form extracted text into query terms: punctuation cleanup,
//! Ukrainian-to-Latin transliteration and the lowercase/accent fold shared
//! by every index analyzer.

use unicode_normalization::UnicodeNormalization;

/// Remove everything that is neither a word character nor whitespace.
///
/// ```
/// use bizmatch_core::normalize::clean_special_characters;
/// assert_eq!(clean_special_characters("  «Сільпо»! "), "Сільпо");
/// ```
pub fn clean_special_characters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn translit_char(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'є' => "je",
        'ж' => "zh",
        'з' => "z",
        'и' => "y",
        'і' => "i",
        'ї' => "ji",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ю' => "ju",
        'я' => "ja",
        'ь' => "'",
        _ => return None,
    };
    Some(latin)
}

/// Transliterate Ukrainian Cyrillic to Latin, dropping apostrophes.
///
/// Characters outside the Ukrainian alphabet pass through unchanged.
pub fn transliterate_uk(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match translit_char(lower) {
            Some(latin) if lower != c => {
                let mut chars = latin.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out.retain(|c| !matches!(c, '\'' | '\u{2019}' | '\u{02BC}'));
    out
}

/// Lowercase and strip diacritics from Latin letters.
///
/// Only characters whose canonical decomposition starts with an ASCII letter
/// are folded; Cyrillic letters such as `й` or `ї` are kept intact.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c.to_ascii_lowercase());
            continue;
        }
        let base = std::iter::once(c).nfd().next().unwrap_or(c);
        if base.is_ascii_alphabetic() {
            out.push(base.to_ascii_lowercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
