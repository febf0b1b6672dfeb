//! # Expression Classifier
//!
//! Assigns a character expression to each narration sentence with a fixed
//! priority-ordered keyword scan. Used when chunks arrive without explicit
//! expressions, and exposed for hosts that chunk raw story text
//! themselves.

use bridge_traits::story::{Expression, StoryChunk};

// Keyword tables, checked in priority order. A sentence matching an
// earlier table never falls through to a later one.
const CONCERNED_KEYWORDS: &[&str] = &[
    "watch out",
    "careful",
    "danger",
    "risky",
    "warning",
    "unsafe",
    "be careful",
    "stay away",
];

const TEACHING_KEYWORDS: &[&str] = &[
    "explain",
    "remember",
    "lesson",
    "tip",
    "here's how",
    "let's learn",
    "note that",
    "teach",
    "teaching",
    "guide",
];

const PROUD_KEYWORDS: &[&str] = &[
    "great job",
    "well done",
    "nice work",
    "proud of you",
    "awesome",
    "you did it",
    "fantastic",
];

const PROTECTIVE_KEYWORDS: &[&str] = &[
    "i'll protect",
    "stay close",
    "i've got you",
    "keep you safe",
    "protect",
    "safe together",
];

const SURPRISED_KEYWORDS: &[&str] = &[
    "suddenly",
    "unexpectedly",
    "out of nowhere",
    "surprisingly",
    "whoa",
    "wow",
];

const THINKING_KEYWORDS: &[&str] = &[
    "think", "consider", "plan", "decide", "solve", "puzzle", "problem", "strategy", "wonder",
];

const HAPPY_KEYWORDS: &[&str] = &[
    "happy",
    "smile",
    "fun",
    "excited",
    "cheer",
    "celebrate",
    "yay",
    "joy",
];

/// Classify one sentence, falling back to the installment's declared
/// default when nothing matches.
pub fn classify_sentence(sentence: &str, fallback: Expression) -> Expression {
    let s = sentence.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|keyword| s.contains(keyword));

    if matches(CONCERNED_KEYWORDS) {
        Expression::Concerned
    } else if matches(TEACHING_KEYWORDS) {
        Expression::Teaching
    } else if matches(PROUD_KEYWORDS) {
        Expression::Proud
    } else if matches(PROTECTIVE_KEYWORDS) {
        Expression::Protective
    } else if matches(SURPRISED_KEYWORDS) {
        Expression::Surprised
    } else if matches(THINKING_KEYWORDS) {
        Expression::Thinking
    } else if matches(HAPPY_KEYWORDS) {
        Expression::Happy
    } else {
        fallback
    }
}

/// Split raw story text into sentences at `.`, `!`, `?` boundaries,
/// keeping the punctuation and dropping empty fragments. Terminal
/// punctuation not followed by whitespace (decimals, ellipses mid-word)
/// does not split.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut terminal_seen = false;

    for (index, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            terminal_seen = true;
        } else if ch.is_whitespace() {
            if terminal_seen {
                push_trimmed(&mut sentences, &text[start..index]);
                start = index + ch.len_utf8();
                terminal_seen = false;
            }
        } else {
            terminal_seen = false;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

/// Turn raw story text into chunks, one sentence each, classified with
/// the keyword tables above.
pub fn chunk_story_text(text: &str, fallback: Expression) -> Vec<StoryChunk> {
    split_sentences(text)
        .into_iter()
        .map(|sentence| {
            let expression = classify_sentence(&sentence, fallback);
            StoryChunk::new(sentence, expression)
        })
        .collect()
}

fn push_trimmed(sentences: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
