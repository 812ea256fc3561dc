//! Terminal rendering of server-provided markup fields.
//!
//! Titles and photo elements arrive as small HTML fragments. The terminal
//! shows their text content: tags are dropped and the common entities are
//! decoded. Nothing is ever interpreted beyond that.

use std::sync::OnceLock;

use regex::Regex;
use tgads_core::Markup;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

fn tag_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").ok()).as_ref()
}

/// Visible text of a markup fragment on a single line.
pub fn plain_text(markup: &Markup) -> String {
    let raw = markup.as_str();
    let stripped = match tag_re() {
        Some(re) => re.replace_all(raw, " ").into_owned(),
        None => raw.to_string(),
    };
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the fragment carries an image tag.
pub fn has_image(markup: &Markup) -> bool {
    markup.as_str().to_ascii_lowercase().contains("<img")
}

fn decode_entities(s: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;".
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Cut `s` to at most `width` terminal columns, ending in `…` when cut.
pub fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Left-align `s` in exactly `width` columns.
pub fn pad(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    let fill = width.saturating_sub(cut.width());
    format!("{}{}", cut, " ".repeat(fill))
}

/// Right-align `s` in exactly `width` columns.
pub fn pad_left(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    let fill = width.saturating_sub(cut.width());
    format!("{}{}", " ".repeat(fill), cut)
}

/// Thousands separators for subscriber counts.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        let m = Markup::new("<b>Tom &amp; Jerry</b><br/>  &lt;daily&gt;");
        assert_eq!(plain_text(&m), "Tom & Jerry <daily>");
        assert_eq!(plain_text(&Markup::new("&amp;lt;")), "&lt;");
    }

    #[test]
    fn script_like_content_is_only_text() {
        let m = Markup::new("<img src=x onerror=\"alert(1)\">Hi");
        assert_eq!(plain_text(&m), "Hi");
        assert!(has_image(&m));
        assert!(!has_image(&Markup::new("plain")));
    }

    #[test]
    fn truncate_respects_wide_chars() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate("新闻频道", 5), "新闻…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn padding_and_digit_groups() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad_left("7", 3), "  7");
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(1234567), "1 234 567");
        assert_eq!(group_digits(999), "999");
    }
}
