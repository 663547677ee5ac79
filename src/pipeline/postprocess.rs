//! Post-processing: deterministic cleanup of raw model output.
//!
//! Seq2seq checkpoints and chat models leave different artefacts behind:
//!
//! - BART-family checkpoints detokenize with a space before sentence
//!   punctuation (`"rose 5% . Shares fell"`)
//! - chat models wrap output in fences or prefix it with a `Summary:` label
//!   despite the prompt
//! - either may emit CRLF line endings or zero-width characters
//!
//! Each rule is a pure `&str → String` function, applied in a fixed order:
//! fences and line endings first so the later rules see clean lines.
//!
//! The cleaned text is what the user sees and what the summary statistics
//! count: a dropped `Summary:` label or a detached `.` is not a word.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Drop a leading `Summary:` label
/// 4. Remove the space BART puts before `.` and `,`
/// 5. Trim trailing whitespace per line
/// 6. Collapse runs of blank lines to one
/// 7. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 8. Trim the result
pub fn clean_summary(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = strip_summary_label(&s);
    let s = fix_punctuation_spacing(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|text)?\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Drop a leading label ─────────────────────────────────────────────

static RE_SUMMARY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*)?(?:\*\*)?(?:summary|tl;dr)(?:\*\*)?(?:\s*:(?:\*\*)?[ \t]*\n?|[ \t]*\n)",
    )
    .unwrap()
});

fn strip_summary_label(input: &str) -> String {
    RE_SUMMARY_LABEL.replace(input, "").to_string()
}

// ── Rule 4: Punctuation spacing ──────────────────────────────────────────────

static RE_SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S)[ \t]+([.,])(\s|$)").unwrap());

fn fix_punctuation_spacing(input: &str) -> String {
    RE_SPACE_BEFORE_PUNCT
        .replace_all(input, "$1$2$3")
        .to_string()
}

// ── Rule 5: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 6: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 7: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
