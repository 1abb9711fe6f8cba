//! Scanner module: locate protected sections in raw markup
//!
//! Matching is pattern-based, not a document-object model. Two marking
//! conventions are supported: a reserved class token on any element, and
//! paired sentinel comments. Class-marked matching assumes non-nested
//! markers and pairs each opening tag with the nearest closing tag of the
//! same name (first match wins).

use regex::Regex;
use std::sync::OnceLock;

/// Class token authors add to an element to mark it for encoding.
pub const ENCODE_CLASS: &str = "encode-content";

/// Sentinel comments delimiting a comment-marked section.
pub const ENCODE_START: &str = "<!-- ENCODE-START -->";
pub const ENCODE_END: &str = "<!-- ENCODE-END -->";

/// One protected region found in a document. Offsets are byte positions
/// in the original text, spanning the markers themselves, so replacement
/// can splice purely by offset.
#[derive(Debug, Clone)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    /// Originating tag name for class-marked sections, `None` for
    /// comment-marked ones.
    pub tag: Option<String>,
    /// Captured inner text (trimmed for comment-marked sections).
    pub text: String,
}

fn class_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"(?is)<(\w+)[^>]*class="[^"]*\b{}\b[^"]*"[^>]*>"#,
            ENCODE_CLASS
        ))
        .expect("class marker regex")
    })
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?s){}(.*?){}",
            regex::escape(ENCODE_START),
            regex::escape(ENCODE_END)
        ))
        .expect("comment marker regex")
    })
}

/// Find every element whose opening tag carries the reserved class token.
/// The section runs to the nearest matching closing tag; elements with no
/// closing tag are ignored. Matches are non-overlapping: an opening tag
/// inside an already-accepted section's span is subsumed by it, so a
/// marked element nested in another marked element yields one section.
pub fn find_class_marked(html: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut last_end = 0;

    for open in class_open_re().captures_iter(html) {
        let whole = open.get(0).expect("whole match");
        if whole.start() < last_end {
            continue;
        }
        let tag = &open[1];

        let close_re = Regex::new(&format!(r"(?i)</{}>", regex::escape(tag)))
            .expect("closing tag regex");
        let rest = &html[whole.end()..];
        if let Some(close) = close_re.find(rest) {
            let end = whole.end() + close.end();
            sections.push(Section {
                start: whole.start(),
                end,
                tag: Some(tag.to_string()),
                text: rest[..close.start()].to_string(),
            });
            last_end = end;
        }
    }

    sections
}

/// Find every span between a start sentinel and the nearest following
/// end sentinel.
pub fn find_comment_marked(html: &str) -> Vec<Section> {
    comment_re()
        .captures_iter(html)
        .map(|m| {
            let whole = m.get(0).expect("whole match");
            Section {
                start: whole.start(),
                end: whole.end(),
                tag: None,
                text: m[1].trim().to_string(),
            }
        })
        .collect()
}

/// Pool both passes, ordered by descending start offset so the rewriter
/// never invalidates the offsets of sections it has not reached yet.
pub fn scan(html: &str) -> Vec<Section> {
    let mut sections = find_class_marked(html);
    sections.extend(find_comment_marked(html));
    sections.sort_by(|a, b| b.start.cmp(&a.start));
    sections
}
