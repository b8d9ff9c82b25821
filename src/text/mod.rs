//! Lexical helpers shared by alignment and segmentation.

pub mod fuzzy;
pub mod numbers;

/// Fraction of word characters that must be Hangul for a text to be
/// treated as Hangul-script.
const HANGUL_RATIO: f64 = 0.3;

/// Writing-system family of a piece of text, used to pick the matching
/// normalization and break-scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    Latin,
    Hangul,
}

impl ScriptFamily {
    pub fn detect(text: &str) -> Self {
        let mut hangul = 0usize;
        let mut word_chars = 0usize;
        for ch in text.chars() {
            if ch.is_alphanumeric() {
                word_chars += 1;
                if is_hangul(ch) {
                    hangul += 1;
                }
            }
        }
        if word_chars == 0 {
            return ScriptFamily::Latin;
        }
        if hangul as f64 / word_chars as f64 > HANGUL_RATIO {
            ScriptFamily::Hangul
        } else {
            ScriptFamily::Latin
        }
    }
}

fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'
    )
}

/// Normalizes text for comparison: strips punctuation, collapses
/// whitespace, and lowercases.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if ch.is_alphanumeric() || ch == '_' {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        }
    }
    out
}

/// A whitespace-delimited token with its char span in the source text
/// (`end` exclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Splits `text` into tokens, recording each token's char offsets.
pub fn token_spans(text: &str) -> Vec<TokenSpan> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(TokenSpan {
                    text: std::mem::take(&mut current),
                    start,
                    end: idx,
                });
            }
        } else {
            if current.is_empty() {
                start = idx;
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        let end = text.chars().count();
        tokens.push(TokenSpan {
            text: current,
            start,
            end,
        });
    }
    tokens
}
