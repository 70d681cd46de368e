//! Language-agnostic tokenizer used by [`crate::lexical::LexicalIndex`] and
//! [`crate::prefix::PrefixCompletionEngine`] (spec §4.8 step 1).
//!
//! For Latin (and generally non-CJK) text, tokens are Unicode word
//! boundaries via `unicode-segmentation`. For CJK text, the documented
//! segmenter here is a per-codepoint split over the CJK Unified Ideographs,
//! Hiragana, Katakana and Hangul Syllables blocks — simpler than a
//! dictionary-backed morphological analyzer, but deterministic and sufficient
//! for prefix-preserving phrase matching, which is the only thing CJK
//! tokenization feeds in this engine (spec explicitly scopes out
//! cross-language NLP beyond tokenization).

use unicode_segmentation::UnicodeSegmentation;

/// A token and the byte offsets (into the original string) it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF    // CJK Unified Ideographs
        | 0x3400..=0x4DBF  // CJK Unified Ideographs Extension A
        | 0x3040..=0x309F  // Hiragana
        | 0x30A0..=0x30FF  // Katakana
        | 0xAC00..=0xD7A3  // Hangul Syllables
    )
}

/// Tokenize `text`, splitting CJK runs into one token per codepoint and
/// everything else into Unicode word-boundary tokens, skipping tokens that
/// are pure whitespace/punctuation.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (start, word) in text.split_word_bound_indices() {
        if word.trim().is_empty() {
            continue;
        }
        if word.chars().any(is_cjk) {
            // Split the run into individual CJK codepoints (and keep any
            // interleaved non-CJK characters, e.g. digits, as-is).
            let mut offset = start;
            for ch in word.chars() {
                let len = ch.len_utf8();
                tokens.push(Token {
                    text: ch.to_string(),
                    start: offset,
                    end: offset + len,
                });
                offset += len;
            }
        } else {
            tokens.push(Token {
                text: word.to_string(),
                start,
                end: start + word.len(),
            });
        }
    }
    tokens
}

/// Normalize a token/keyword for matching: lowercase + NFKC.
pub fn normalize_token(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    s.nfkc().collect::<String>().to_lowercase()
}

/// Coarser extraction used for keyword/term matching: contiguous CJK runs
/// are kept whole (rather than split per-codepoint, as [`tokenize`] does for
/// phrase-prefix matching), since `keywords` (spec §3: "unordered set of
/// normalized tokens") are supplied as whole semantic units like "销售", not
/// single characters.
pub fn extract_term_candidates(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut run = String::new();
    for (_, word) in text.split_word_bound_indices() {
        if word.trim().is_empty() {
            continue;
        }
        if word.chars().all(is_cjk) {
            run.push_str(word);
        } else {
            if !run.is_empty() {
                out.push(std::mem::take(&mut run));
            }
            out.push(word.to_string());
        }
    }
    if !run.is_empty() {
        out.push(run);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_cjk_per_character() {
        let toks = tokenize("销售额");
        assert_eq!(toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(), vec!["销", "售", "额"]);
    }

    #[test]
    fn splits_latin_by_word() {
        let toks = tokenize("hello world");
        assert_eq!(toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(), vec!["hello", "world"]);
    }

    #[test]
    fn mixed_cjk_and_latin() {
        let toks = tokenize("帮我查询revenue");
        let texts: Vec<&str> = toks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["帮", "我", "查", "询", "revenue"]);
    }

    #[test]
    fn offsets_cover_original_bytes() {
        let text = "今年北京的销售额";
        let toks = tokenize(text);
        let last = toks.last().unwrap();
        assert_eq!(&text[last.start..last.end], "额");
    }
}
