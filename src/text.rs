//! Bilingual (Hebrew/English) text normalization and tokenization shared by
//! the suggestion engine and the relationship graph.

use unicode_normalization::UnicodeNormalization;

/// Function words dropped before any comparison.
const STOPWORDS: &[&str] = &[
    "the", "and", "of", "a", "to", "in", "on", "for", "from", "with", "is", "are", "as", "by",
    "at", "or", "an", "be", "this", "that", "על", "של", "את", "עם", "אל", "מן", "כי", "אם",
    "או", "ה", "מה", "לא", "כן", "בו", "בה", "אתה", "אתם", "גם", "כל", "אין",
];

/// Domain vocabulary that marks a query as topical.
const KEYWORDS: &[&str] = &[
    "shabbat", "eruv", "muktzeh", "muktzah", "brachot", "berachot", "tahara", "kashrut",
    "sukkah", "mincha", "tefillin", "niddah", "shmitta", "shemitah", "tzedakah", "pesach",
    "shavuot", "rosh", "hashanah", "yom", "kippur", "chametz", "eruvin", "שבת", "עירוב",
    "עירובין", "מוקצה", "ברכות", "טהרה", "כשרות", "סוכה", "מנחה", "תפילין", "נדה", "שמיטה",
    "צדקה", "פסח", "שבועות", "ראש", "השנה", "יום", "כיפור", "חמץ",
];

/// Words that flip a link between two sources from "support" to "argue".
const NEGATION_MARKERS: &[&str] = &["not", "however", "but", "אין", "לא", "אלא"];

fn is_hebrew_mark(c: char) -> bool {
    ('\u{0591}'..='\u{05C7}').contains(&c)
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric()
}

/// NFKC, strip Hebrew cantillation and vowel points, lowercase, trim.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfkc().filter(|c| !is_hebrew_mark(*c)).collect();
    stripped.to_lowercase().trim().to_string()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

/// Content tokens: normalized words longer than two characters that are not
/// stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    words(&normalized)
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Contiguous `n`-token phrases joined by a single space.
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

pub fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

/// Whole-word, case-insensitive check for a negation marker.
pub fn has_negation(text: &str) -> bool {
    let normalized = normalize(text);
    let found = words(&normalized).any(|w| NEGATION_MARKERS.contains(&w));
    found
}

/// Truncate to `max` characters, replacing the tail with an ellipsis so the
/// result stays within `max` characters.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

/// First `max` characters with every whitespace run collapsed to one space.
pub fn snippet(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    let mut out = String::with_capacity(head.len());
    let mut in_space = false;
    for c in head.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_nikkud_and_case() {
        assert_eq!(normalize("  שַׁבָּת Candle "), "שבת candle");
    }

    #[test]
    fn test_normalize_nfkc() {
        // Fullwidth letters fold to ASCII under NFKC
        assert_eq!(normalize("ＥＲＵＶ"), "eruv");
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        let toks = tokenize("The laws of Shabbat, on a Friday!");
        assert_eq!(toks, vec!["laws", "shabbat", "friday"]);
    }

    #[test]
    fn test_tokenize_hebrew() {
        let toks = tokenize("הלכות שבת של חנוכה");
        assert_eq!(toks, vec!["הלכות", "שבת", "חנוכה"]);
    }

    #[test]
    fn test_tokenize_keeps_digits() {
        let toks = tokenize("siman 308 muktzeh");
        assert_eq!(toks, vec!["siman", "308", "muktzeh"]);
    }

    #[test]
    fn test_ngrams() {
        let toks: Vec<String> = ["a1", "b2", "c3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ngrams(&toks, 2), vec!["a1 b2", "b2 c3"]);
        assert_eq!(ngrams(&toks, 3), vec!["a1 b2 c3"]);
        assert!(ngrams(&toks, 4).is_empty());
    }

    #[test]
    fn test_keywords_are_bilingual() {
        assert!(is_keyword("shabbat"));
        assert!(is_keyword("עירוב"));
        assert!(!is_keyword("candle"));
    }

    #[test]
    fn test_negation_whole_word_only() {
        assert!(has_negation("This is NOT permitted"));
        assert!(has_negation("אלא שאני"));
        assert!(!has_negation("nothing butter"));
    }

    #[test]
    fn test_ellipsize_counts_chars() {
        assert_eq!(ellipsize("Berachot 2a", 28), "Berachot 2a");
        let long = "א".repeat(30);
        let out = ellipsize(&long, 28);
        assert_eq!(out.chars().count(), 26);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_snippet_collapses_whitespace() {
        assert_eq!(snippet("a  b\n\n c", 400), "a b c");
        assert_eq!(snippet("abcdef", 3), "abc");
    }
}
