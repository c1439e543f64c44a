//! HTML fragment hygiene.
//!
//! Fragments are inserted as-is except for `<script>` elements, which are
//! removed before insertion; loaded content is never allowed to execute.
//! The same module derives element ids (for section readiness checks) and a
//! plain-text rendering for the terminal reader.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<script\b[^>]*/\s*>").unwrap()
});

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"id\s*=\s*["']([^"']+)["']"#).unwrap());

static BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</p\s*>|</h[1-6]\s*>|</li\s*>|</div\s*>|</tr\s*>").unwrap()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Remove all `<script>` elements from a fragment.
pub fn strip_scripts(html: &str) -> String {
    SCRIPT_RE.replace_all(html, "").into_owned()
}

/// Element ids declared anywhere in the fragment.
pub fn element_ids(html: &str) -> Vec<String> {
    ID_RE
        .captures_iter(html)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Reduce a fragment to readable plain text: tags stripped, block-level
/// closers turned into line breaks, common entities decoded.
pub fn visible_text(html: &str) -> String {
    let no_scripts = strip_scripts(html);
    let with_breaks = BREAK_RE.replace_all(&no_scripts, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    let mut lines: Vec<&str> = decoded.lines().map(str::trim).collect();
    // Collapse runs of blank lines left behind by stripped markup.
    lines.dedup_by(|a, b| a.is_empty() && b.is_empty());
    while lines.first().is_some_and(|line| line.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_elements() {
        let html = r#"<div id="profile-page">hello</div>
<script type="text/javascript">alert("gotcha");</script>
<p>world</p>"#;

        let clean = strip_scripts(html);
        assert!(!clean.contains("script"));
        assert!(!clean.contains("alert"));
        assert!(clean.contains("hello"));
        assert!(clean.contains("world"));
    }

    #[test]
    fn strips_multiline_and_self_closing_scripts() {
        let html = "before<script>\nlet x = 1;\nconsole.log(x);\n</script>middle<script src=\"x.js\"/>after";
        assert_eq!(strip_scripts(html), "beforemiddleafter");
    }

    #[test]
    fn finds_element_ids() {
        let html = r#"<section id="section-skills"><div id='skill-grid'></div></section>"#;
        assert_eq!(element_ids(html), vec!["section-skills", "skill-grid"]);
    }

    #[test]
    fn visible_text_keeps_structure() {
        let html = "<h2>Skills</h2><p>Rust &amp; Go</p><ul><li>one</li><li>two</li></ul>";
        assert_eq!(visible_text(html), "Skills\nRust & Go\none\ntwo");
    }

    #[test]
    fn visible_text_of_scripted_fragment_is_clean() {
        let html = "<script>evil()</script><p>safe</p>";
        assert_eq!(visible_text(html), "safe");
    }
}
