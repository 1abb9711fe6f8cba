//! Rewriter module: splice protected blocks into a document
//!
//! Sections are processed in descending-offset order so each splice
//! leaves every not-yet-processed section's recorded span valid. After
//! all sections are replaced, a reference to the runtime decoder is
//! injected exactly once, placed after the access-check invocation when
//! one is present so activation happens after the gating logic runs.

use crate::codec;
use crate::scanner::{self, Section};
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

/// Class carried by every replacement block; the runtime decoder selects
/// on it.
pub const PROTECTED_CLASS: &str = "protected-content";

/// Substring whose presence marks a document as already processed. The
/// guard is per-file: a document containing it is skipped wholesale,
/// even if it also contains fresh markers.
pub const DECODER_MARKER: &str = "ContentDecoder";

/// Length of the random per-block salt.
pub const SALT_LEN: usize = 8;

/// Result of one rewrite pass over a document.
#[derive(Debug)]
pub enum RewriteOutcome {
    /// Document already references the decoder; left untouched.
    AlreadyEncoded,
    /// No encode markers found; left untouched.
    NoMarkers,
    /// Document rewritten with `sections` protected blocks.
    Rewritten { html: String, sections: usize },
}

/// Generate a random alphanumeric salt for one content block.
pub fn generate_salt() -> String {
    generate_salt_with_rng(&mut rand::thread_rng())
}

/// Generate a salt with a specific RNG (for testing).
pub fn generate_salt_with_rng<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// Build the replacement markup for one section: the payload and salt as
/// data attributes, plus the static placeholder shown to unauthenticated
/// viewers. Comment-marked sections get a `div` container.
pub fn protected_block(text: &str, salt: &str, tag: Option<&str>) -> String {
    let tag = tag.unwrap_or("div");
    let payload = codec::encode(text, salt);

    format!(
        r#"<{tag} class="{class}" data-payload="{payload}" data-salt="{salt}">
        <div class="content-locked">
            <span class="lock-icon">🔒</span>
            <span class="lock-text">Protected Content</span>
        </div>
    </{tag}>"#,
        tag = tag,
        class = PROTECTED_CLASS,
        payload = payload,
        salt = salt,
    )
}

/// The script block referencing the runtime decoder. `path_prefix` is a
/// chain of `../` segments from the document back to the site root.
fn decoder_script(path_prefix: &str) -> String {
    format!(
        r#"
    <script src="{path_prefix}components/ContentDecoder.js"></script>
    <script>
        // Auto-reveal after AccessGuard passes
        if (typeof AccessGuard !== 'undefined') {{
            ContentDecoder.autoReveal();
        }}
    </script>
"#,
        path_prefix = path_prefix
    )
}

fn guard_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(AccessGuard\.require\([^)]+\);?\s*</script>)").expect("guard regex")
    })
}

/// Inject the decoder reference: immediately after the first access-check
/// invocation when the document carries one, otherwise before the closing
/// head marker.
fn inject_decoder(html: &str, path_prefix: &str) -> String {
    let script = decoder_script(path_prefix);

    if html.contains("AccessGuard") {
        guard_close_re()
            .replace(html, |caps: &regex::Captures| {
                format!("{}{}", &caps[1], script)
            })
            .into_owned()
    } else {
        html.replace("</head>", &format!("{}\n</head>", script))
    }
}

/// Run one full rewrite pass over a document.
pub fn rewrite(html: &str, path_prefix: &str) -> RewriteOutcome {
    rewrite_with_rng(html, path_prefix, &mut rand::thread_rng())
}

/// Rewrite with a specific RNG (for testing).
pub fn rewrite_with_rng<R: Rng>(html: &str, path_prefix: &str, rng: &mut R) -> RewriteOutcome {
    if html.contains(DECODER_MARKER) {
        return RewriteOutcome::AlreadyEncoded;
    }

    let sections = scanner::scan(html);
    if sections.is_empty() {
        return RewriteOutcome::NoMarkers;
    }

    let mut out = html.to_string();
    let count = sections.len();
    for section in &sections {
        let salt = generate_salt_with_rng(rng);
        out = splice(&out, section, &salt);
    }

    RewriteOutcome::Rewritten {
        html: inject_decoder(&out, path_prefix),
        sections: count,
    }
}

/// Replace one section's span with its protected block. Valid only while
/// every section at a lower start offset is still unprocessed.
fn splice(html: &str, section: &Section, salt: &str) -> String {
    let block = protected_block(&section.text, salt, section.tag.as_deref());
    format!("{}{}{}", &html[..section.start], block, &html[section.end..])
}
