//! Excerpt extraction: HTML intro → plain text → first N sentences
//!
//! Sentence boundaries are `.`, `?` or `!` followed by whitespace (closing
//! quotes and brackets may sit in between). A boundary is rejected when the
//! word before it is an abbreviation:
//! - single capital initials (`J. Smith`)
//! - capital + lowercase titles (`Dr.`, `Mr.`, `St.`)
//! - dotted forms (`e.g.`, `i.e.`, `U.S.`)
//! - a short list of common abbreviations (`Mrs.`, `Prof.`, `vs.`, `approx.`)
//!
//! Decimal numbers never split because the period is not followed by
//! whitespace.

use std::sync::OnceLock;

use regex::{Captures, Regex};

static TAG_RE: OnceLock<Regex> = OnceLock::new();
static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static ENTITY_RE: OnceLock<Regex> = OnceLock::new();
static SPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Tags whose boundaries separate words
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "dd", "dt", "dl", "tr", "td", "th", "table",
    "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
];

const ABBREVIATIONS: &[&str] = &[
    "mrs", "prof", "vs", "approx", "fig", "al", "jr", "sr", "vol", "ca", "resp",
];

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<\s*/?\s*([a-zA-Z][a-zA-Z0-9]*)[^>]*>").expect("valid tag regex"))
}

fn comment_re() -> &'static Regex {
    COMMENT_RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"))
}

fn entity_re() -> &'static Regex {
    ENTITY_RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex"))
}

fn space_re() -> &'static Regex {
    SPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        _ => None,
    }
}

/// Convert an HTML fragment to whitespace-normalized plain text
pub fn strip_html(html: &str) -> String {
    let without_comments = comment_re().replace_all(html, "");
    let without_tags = tag_re().replace_all(&without_comments, |caps: &Captures| {
        let name = caps[1].to_ascii_lowercase();
        if BLOCK_TAGS.contains(&name.as_str()) { " " } else { "" }
    });
    let decoded = entity_re().replace_all(&without_tags, |caps: &Captures| match decode_entity(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    });
    space_re().replace_all(&decoded, " ").trim().to_string()
}

/// Word immediately before byte offset `end` (exclusive)
fn word_before(text: &str, end: usize) -> &str {
    let head = &text[..end];
    let start = head
        .rfind(|c: char| c.is_whitespace() || c == '(' || c == '[' || c == '"')
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    &head[start..]
}

fn is_abbreviation(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();

    // Single capital initial: "J"
    if chars.len() == 1 && chars[0].is_uppercase() {
        return true;
    }
    // Title-case pair: "Dr", "Mr", "St"
    if chars.len() == 2 && chars[0].is_uppercase() && chars[1].is_lowercase() {
        return true;
    }
    // Dotted forms: "e.g", "i.e", "U.S"
    if word.contains('.') && word.split('.').all(|part| part.chars().count() <= 2 && !part.is_empty()) {
        return true;
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Split plain text into sentences
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }

        // Allow closing punctuation between the terminator and the space
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '"' | '\'' | ')' | ']' | '”' | '’') {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let at_boundary = match chars.peek() {
            Some(&(_, next)) => next.is_whitespace(),
            None => true,
        };
        if !at_boundary {
            continue;
        }
        if c == '.' && is_abbreviation(word_before(text, i)) {
            continue;
        }

        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Plain-text excerpt of at most `max_sentences` sentences, joined by a
/// single space
pub fn summarize(extract_html: &str, max_sentences: usize) -> String {
    let text = strip_html(extract_html);
    split_sentences(&text)
        .into_iter()
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Tests
// =============================================================================
