//! Length-bounded HTML snippets that stay well-formed.
//!
//! A snippet is cut to a character budget, backed off to the last complete
//! tag if the cut lands inside one, and then closed: every element still
//! open at the cut point gets its closing tag appended in reverse order.

use super::string_utils::safe_truncate_chars;

/// Elements that never take a closing tag
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, not markup
const RAW_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "textarea"];

/// Truncate `html` to at most `max_chars` characters plus closing tags.
///
/// # Examples
/// ```
/// # use kodegen_tools_authdetect::utils::html_truncate::truncate_html;
/// assert_eq!(truncate_html("<div><p>hello world</p></div>", 14), "<div><p>hello </p></div>");
/// assert_eq!(truncate_html("<div><input type=\"email\"></div>", 12), "<div></div>");
/// ```
#[must_use]
pub fn truncate_html(html: &str, max_chars: usize) -> String {
    let mut cut = safe_truncate_chars(html, max_chars);

    let scan = scan_tags(cut);
    if let Some(dangling) = scan.dangling_at {
        cut = &cut[..dangling];
    }

    let closers: usize = scan.open.iter().map(|t| t.len() + 3).sum();
    let mut out = String::with_capacity(cut.len() + closers);
    out.push_str(cut);
    for tag in scan.open.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    out
}

struct TagScan {
    /// Elements still open at the end of the input, outermost first
    open: Vec<String>,
    /// Byte offset of a tag or comment the input ends inside of
    dangling_at: Option<usize>,
}

fn scan_tags(html: &str) -> TagScan {
    let mut open: Vec<String> = Vec::new();
    let mut pos = 0;

    while let Some(rel) = html[pos..].find('<') {
        let start = pos + rel;
        let after = &html[start + 1..];

        if after.starts_with("!--") {
            match after.find("-->") {
                Some(end) => {
                    pos = start + 1 + end + 3;
                    continue;
                }
                None => return TagScan { open, dangling_at: Some(start) },
            }
        }

        let Some(first) = after.chars().next() else {
            return TagScan { open, dangling_at: Some(start) };
        };
        if !(first.is_ascii_alphabetic() || matches!(first, '/' | '!' | '?')) {
            // A bare '<' in text content
            pos = start + 1;
            continue;
        }

        let Some(end) = find_tag_end(after) else {
            return TagScan { open, dangling_at: Some(start) };
        };
        let inner = &after[..end];
        pos = start + 1 + end + 1;

        if first == '!' || first == '?' {
            continue;
        }

        if let Some(closing) = inner.strip_prefix('/') {
            let name = tag_name(closing);
            if let Some(idx) = open.iter().rposition(|t| *t == name) {
                open.truncate(idx);
            }
            continue;
        }

        let name = tag_name(inner);
        if name.is_empty() || inner.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&name.as_str()) {
            continue;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let needle = format!("</{name}");
            match find_ascii_ci(&html[pos..], &needle) {
                Some(rel_close) => pos += rel_close,
                None => {
                    open.push(name);
                    return TagScan { open, dangling_at: None };
                }
            }
        }

        open.push(name);
    }

    TagScan { open, dangling_at: None }
}

/// Index of the `>` ending a tag, skipping quoted attribute values
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn tag_name(s: &str) -> String {
    s.chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}
