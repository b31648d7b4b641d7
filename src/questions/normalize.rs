use std::sync::LazyLock;

use regex::Regex;

static HYPHEN_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\n").expect("valid regex"));
static BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
/// Stray token left behind by the extraction of one exam template.
static ULAR_ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s)ular(\s|$)").expect("valid regex"));

fn rewrite_once(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HYPHEN_BREAK.replace_all(&text, "");
    let text = BLANKS.replace_all(&text, " ");
    let text = NEWLINE_RUNS.replace_all(&text, "\n\n");
    let text = ULAR_ARTIFACT.replace_all(&text, "${1}${2}");
    text.trim().to_string()
}

/// Joins hyphenated line breaks, collapses blank runs, drops the `ular`
/// artifact and trims. Rewrites repeat until nothing changes, so the result
/// is stable under a second normalization.
pub fn normalize_text(text: &str) -> String {
    let mut current = rewrite_once(text);
    loop {
        let next = rewrite_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
