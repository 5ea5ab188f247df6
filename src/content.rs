//! Text helpers shared by the pages: tag stripping, SEO field derivation,
//! card excerpts and date formatting.

use chrono::{DateTime, Datelike, Utc};

/// Upper bound of a derived meta description, in characters.
pub const META_DESCRIPTION_CHARS: usize = 160;
/// Length of the content preview on a card, in characters.
pub const EXCERPT_CHARS: usize = 150;

// Elements that sit inside a run of text; removing them must not split words.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "code", "em", "i", "mark", "s", "small", "span", "strike", "strong", "sub",
    "sup", "u",
];

/// Removes markup and returns the visible text with whitespace collapsed.
///
/// Block-level tags become word breaks, inline tags vanish and comments are
/// dropped whole. A `<` that does not open a tag is kept as text.
pub fn strip_tags(html: &str) -> String {
    visible_text(html, false)
}

/// Meta description sent with a new post: the visible text, cut to 160 characters.
///
/// Escaped angle brackets stay escaped, so text that merely shows markup never
/// turns back into tags.
pub fn meta_description(html: &str) -> String {
    truncate_chars(&visible_text(html, true), META_DESCRIPTION_CHARS)
        .trim_end()
        .to_string()
}

fn visible_text(html: &str, keep_angle_entities: bool) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|(_, next)| next.is_ascii_alphabetic() || matches!(next, '/' | '!'));
        if !opens_tag {
            text.push(c);
            continue;
        }
        // byte index just past the markup
        let end = if html[start..].starts_with("<!--") {
            match html[start + 4..].find("-->") {
                Some(len) => start + 4 + len + 3,
                // an unterminated comment runs to the end of the document
                None => break,
            }
        } else {
            let Some(len) = html[start..].find('>') else {
                // unterminated tag: the rest is not markup
                text.push_str(&html[start..]);
                break;
            };
            let tag = &html[start + 1..start + len];
            let name = tag
                .trim_start_matches('/')
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            if !INLINE_TAGS.contains(&name.as_str()) {
                text.push(' ');
            }
            start + len + 1
        };
        while chars.next_if(|(idx, _)| *idx < end).is_some() {}
    }

    collapse_whitespace(&decode_entities(&text, keep_angle_entities))
}

/// Keywords sent with a new post: the title's words joined by commas.
pub fn keywords(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(",")
}

/// Card preview of an HTML body, ellipsized when it was cut.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_tags(html);
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut = truncate_chars(&text, max_chars).trim_end().to_string();
    cut.push('…');
    cut
}

/// Long date in the style "May 1st, 2024".
pub fn format_date(dt: &DateTime<Utc>) -> String {
    let day = dt.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", dt.format("%B"), day, suffix, dt.year())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str, keep_angle_entities: bool) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let text = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let text = if keep_angle_entities {
        text
    } else {
        text.replace("&lt;", "<").replace("&gt;", ">")
    };
    text.replace("&amp;", "&")
}
