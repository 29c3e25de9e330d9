//! Post-conversion cleanup passes for Markdown output.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run every cleanup pass on freshly converted Markdown.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = absolutize_links(md, base_url);
    result = trim_line_ends(&result);
    result = collapse_blank_lines(&result);
    finish_with_newline(&result)
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// Rewrite relative `[text](href)` targets to absolute URLs so the saved file
/// still points somewhere once it leaves the site.
///
/// Images, escaped brackets, fenced blocks and inline code are left as-is.
fn absolutize_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let mut out = Vec::new();
    let mut in_fence = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        if in_fence {
            out.push(line.to_string());
            continue;
        }

        let code = code_spans(line);
        let rewritten = LINK_RE.replace_all(line, |caps: &regex::Captures| {
            let whole = &caps[0];
            let text = &caps[1];
            let href = &caps[2];

            let start = caps.get(0).map_or(0, |m| m.start());
            let preceded_by = |b: u8| start > 0 && line.as_bytes()[start - 1] == b;
            let in_code = code.iter().any(|span| span.contains(&start));
            let is_absolute = href.starts_with("http://")
                || href.starts_with("https://")
                || href.starts_with('#')
                || href.starts_with("mailto:");

            if preceded_by(b'!') || preceded_by(b'\\') || in_code || is_absolute {
                return whole.to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => whole.to_string(),
            }
        });
        out.push(rewritten.into_owned());
    }

    out.join("\n")
}

/// Byte ranges of inline code spans in `line`, delimiters included.
/// A backtick run opens a span only when a run of the same length closes it.
fn code_spans(line: &str) -> Vec<Range<usize>> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' || (i > 0 && bytes[i - 1] == b'\\') {
            i += 1;
            continue;
        }
        let open = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        let width = i - open;

        let mut j = i;
        let mut close = None;
        while j < bytes.len() {
            if bytes[j] == b'`' {
                let run = j;
                while j < bytes.len() && bytes[j] == b'`' {
                    j += 1;
                }
                if j - run == width {
                    close = Some(j);
                    break;
                }
            } else {
                j += 1;
            }
        }

        if let Some(end) = close {
            spans.push(open..end);
            i = end;
        }
    }

    spans
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Collapse runs of blank lines into a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n").into_owned()
}

fn finish_with_newline(md: &str) -> String {
    let body = md.trim_matches('\n');
    format!("{body}\n")
}
