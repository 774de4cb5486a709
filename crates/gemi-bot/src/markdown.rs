//! Markdown handling for outgoing replies: conversion to Telegram's
//! MarkdownV2 dialect and splitting into message-sized chunks.

use std::sync::LazyLock;

use regex::Regex;

/// Longest text Telegram accepts in one message, with some headroom.
pub const MAX_MESSAGE_CHARS: usize = 4000;

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)```[\s\S]*?```(\s|$)").unwrap());

static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"`(?P<code>[^`\n]+)`",
        r"|\[(?P<label>[^\]\n]+)\]\((?P<url>[^)\s]+)\)",
        r"|\*\*(?P<bold>[^*\n]+)\*\*",
        r"|~~(?P<strike>[^~\n]+)~~",
        r"|\*(?P<italic>[^*\s][^*\n]*)\*",
    ))
    .unwrap()
});

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.+)$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)[*-]\s+(.*)$").unwrap());

/// Characters MarkdownV2 reserves in ordinary text.
const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];
/// Inside code spans and blocks.
const CODE_SPECIAL: &[char] = &['`', '\\'];
/// Inside the target of an inline link.
const URL_SPECIAL: &[char] = &[')', '\\'];

fn escape_with(text: &str, special: &[char], out: &mut String) {
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Escape `text` so MarkdownV2 shows it verbatim.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    escape_with(text, SPECIAL, &mut out);
    out
}

/// `text` set in italics.
pub fn italic(text: &str) -> String {
    format!("_{}_", escape_text(text))
}

/// Convert model-written Markdown into MarkdownV2.
///
/// Code, links, bold, italic and strikethrough carry over, headings turn
/// bold and list markers become bullets. Everything else is escaped. A
/// fence left open by a reply that is still streaming gets closed.
pub fn to_markdown_v2(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + markdown.len() / 4);
    let mut rest = markdown;
    while let Some(open) = rest.find("```") {
        convert_prose(&rest[..open], &mut out);
        let body = &rest[open + 3..];
        let (code, tail) = match body.find("```") {
            Some(close) => (&body[..close], &body[close + 3..]),
            None => (body, ""),
        };
        out.push_str("```");
        escape_with(code, CODE_SPECIAL, &mut out);
        out.push_str("```");
        rest = tail;
    }
    convert_prose(rest, &mut out);
    out
}

fn convert_prose(text: &str, out: &mut String) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(caps) = HEADING.captures(line) {
            out.push('*');
            escape_with(&caps[1].replace("**", ""), SPECIAL, out);
            out.push('*');
        } else if let Some(caps) = BULLET.captures(line) {
            out.push_str(&caps[1]);
            out.push_str("• ");
            convert_inline(&caps[2], out);
        } else if let Some(quote) = line.strip_prefix('>') {
            out.push('>');
            convert_inline(quote, out);
        } else {
            convert_inline(line, out);
        }
    }
}

fn convert_inline(line: &str, out: &mut String) {
    let mut last = 0;
    for caps in INLINE.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        escape_with(&line[last..whole.start()], SPECIAL, out);
        if let Some(code) = caps.name("code") {
            out.push('`');
            escape_with(code.as_str(), CODE_SPECIAL, out);
            out.push('`');
        } else if let (Some(label), Some(url)) = (caps.name("label"), caps.name("url")) {
            out.push('[');
            escape_with(label.as_str(), SPECIAL, out);
            out.push_str("](");
            escape_with(url.as_str(), URL_SPECIAL, out);
            out.push(')');
        } else {
            let (marker, inner) = match (caps.name("bold"), caps.name("strike"), caps.name("italic")) {
                (Some(m), _, _) => ('*', m),
                (_, Some(m), _) => ('~', m),
                (_, _, Some(m)) => ('_', m),
                _ => continue,
            };
            out.push(marker);
            escape_with(inner.as_str(), SPECIAL, out);
            out.push(marker);
        }
        last = whole.end();
    }
    escape_with(&line[last..], SPECIAL, out);
}

fn inside_code_block(text: &str, index: usize) -> bool {
    for block in CODE_BLOCK.find_iter(text) {
        if index < block.start() {
            break;
        }
        if index < block.end() && block.start() < index {
            return true;
        }
    }
    false
}

/// Byte offset of the `max_chars`-th character.
fn byte_limit(text: &str, max_chars: usize) -> usize {
    text.char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(index, _)| index)
}

/// Last paragraph break at or before `limit` that is outside a code block.
fn split_index(text: &str, limit: usize) -> Option<usize> {
    BLANK_LINES
        .find_iter(text)
        .map(|m| m.start())
        .take_while(|&start| start <= limit)
        .filter(|&start| start > 0 && !inside_code_block(text, start))
        .last()
}

/// Split `markdown` into chunks of at most `max_chars` characters.
///
/// Chunks break on blank lines outside fenced code blocks. Text without
/// such a break falls back to the last newline, then to a hard cut.
pub fn split_md(markdown: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if markdown.chars().count() <= max_chars {
        return vec![markdown.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = markdown;
    while rest.chars().count() > max_chars {
        let limit = byte_limit(rest, max_chars);
        let cut = split_index(rest, limit)
            .or_else(|| rest[..limit].rfind('\n').filter(|&i| i > 0))
            .unwrap_or(limit);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim();
    }
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
