//! Turning raw model output into distinct commit message candidates.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::config::CommitType;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]|[-*•])\s+").expect("valid list marker regex"));

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z]+(?:\([^)]*\))?!?:\s*").expect("valid conventional prefix regex")
});

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:here|sure|okay|ok|certainly|below|the following|these|suggested|possible|commit messages?)\b.*:$",
    )
    .expect("valid preamble regex")
});

static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[a-z0-9_+-]+:").expect("valid shortcode regex"));

/// Split a raw completion into at most `max_count` distinct candidates.
///
/// Order follows the model's output; the first occurrence of a duplicate
/// wins. Fewer than `max_count` candidates are returned when the model
/// produced fewer usable lines; nothing is synthesized.
pub fn sanitize_response(raw: &str, commit_type: CommitType, max_count: usize) -> Vec<String> {
    let messages = raw
        .split(['\n', '\r'])
        .filter_map(|line| sanitize_message(line, commit_type));

    let mut candidates = deduplicate(messages);
    candidates.truncate(max_count);
    candidates
}

/// Normalize a single line. Returns `None` for lines that are not messages.
pub fn sanitize_message(line: &str, commit_type: CommitType) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("```") || PREAMBLE.is_match(line) {
        return None;
    }

    let line = LIST_MARKER.replace(line, "");
    let line = strip_wrapping_quotes(line.trim());
    let line = line.strip_suffix('.').unwrap_or(line);

    let line = match commit_type {
        CommitType::Gitmoji => line.to_string(),
        CommitType::Conventional => strip_leading_emoji(line).to_string(),
        CommitType::Plain => {
            let without_emoji = strip_leading_emoji(line);
            CONVENTIONAL_PREFIX.replace(without_emoji, "").into_owned()
        }
    };

    let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Drop exact duplicates, keeping the first occurrence.
pub fn deduplicate<I>(messages: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if s.len() >= 2
            && let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    s
}

/// Remove leading emoji characters and `:shortcode:` tokens.
fn strip_leading_emoji(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        if let Some(m) = SHORTCODE.find(s) {
            s = &s[m.end()..];
            continue;
        }
        match s.chars().next() {
            Some(c) if is_emoji_part(c) => s = &s[c.len_utf8()..],
            _ => return s,
        }
    }
}

/// Pictographic characters plus the joiners and modifiers that build emoji
/// sequences. Letters and punctuation such as `¡` or `¿` are not included.
fn is_emoji_part(c: char) -> bool {
    matches!(
        c as u32,
        0x00A9 | 0x00AE
            | 0x203C | 0x2049 | 0x2122 | 0x2139
            | 0x2194..=0x2199
            | 0x21A9..=0x21AA
            | 0x231A..=0x23FF
            | 0x24C2
            | 0x25AA..=0x25FE
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B55
            | 0x3030 | 0x303D | 0x3297 | 0x3299
            | 0x1F000..=0x1FAFF
            // zero-width joiner, keycap, variation selectors, tags
            | 0x200D | 0x20E3 | 0xFE0E | 0xFE0F
            | 0xE0020..=0xE007F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_lines_collapse_in_order() {
        let raw = "feat: add foo\nfeat: add foo\nfix: typo";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(result, vec!["feat: add foo", "fix: typo"]);
    }

    #[test]
    fn test_never_exceeds_requested_count() {
        let raw = "feat: a\nfeat: b\nfeat: c\nfeat: d";
        let result = sanitize_response(raw, CommitType::Conventional, 2);
        assert_eq!(result, vec!["feat: a", "feat: b"]);
    }

    #[test]
    fn test_fewer_candidates_are_not_padded() {
        let result = sanitize_response("fix: typo\n\n", CommitType::Conventional, 5);
        assert_eq!(result, vec!["fix: typo"]);
    }

    #[test]
    fn test_strips_numbering_quotes_and_period() {
        let raw = "1. \"feat(api): add endpoint.\"\n2) `fix: handle null`\n- docs: update readme";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(
            result,
            vec!["feat(api): add endpoint", "fix: handle null", "docs: update readme"]
        );
    }

    #[test]
    fn test_drops_preamble_and_fences() {
        let raw = "Here are some commit messages:\n```\nfeat: add foo\n```";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(result, vec!["feat: add foo"]);
    }

    #[test]
    fn test_handles_crlf_and_cr() {
        let raw = "feat: one\r\nfeat: two\rfeat: three";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(result, vec!["feat: one", "feat: two", "feat: three"]);
    }

    #[test]
    fn test_dedup_after_normalization() {
        let raw = "feat: add  foo\n\"feat: add foo.\"\n  feat: add foo  ";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(result, vec!["feat: add foo"]);
    }

    #[test]
    fn test_conventional_strips_emoji() {
        let raw = "✨ feat: add login\n:bug: fix: crash on start";
        let result = sanitize_response(raw, CommitType::Conventional, 2);
        assert_eq!(result, vec!["feat: add login", "fix: crash on start"]);
    }

    #[test]
    fn test_conventional_strips_emoji_sequences() {
        let raw = "♻️ refactor: split parser\n👩\u{200D}💻 chore: tidy up";
        let result = sanitize_response(raw, CommitType::Conventional, 2);
        assert_eq!(result, vec!["refactor: split parser", "chore: tidy up"]);
    }

    #[test]
    fn test_leading_punctuation_is_not_emoji() {
        let result = sanitize_response("¡Arregla el error de inicio!", CommitType::Conventional, 1);
        assert_eq!(result, vec!["¡Arregla el error de inicio!"]);

        let result = sanitize_response("¿Por qué falla?", CommitType::Plain, 1);
        assert_eq!(result, vec!["¿Por qué falla?"]);
    }

    #[test]
    fn test_candidate_ending_in_colon_is_kept() {
        let result = sanitize_response("feat: add foo:", CommitType::Conventional, 1);
        assert_eq!(result, vec!["feat: add foo:"]);
    }

    #[test]
    fn test_preamble_shapes_are_dropped() {
        let raw = "Sure, here you go:\nCommit messages:\nThe following options:\nfix: typo";
        let result = sanitize_response(raw, CommitType::Conventional, 3);
        assert_eq!(result, vec!["fix: typo"]);
    }

    #[test]
    fn test_gitmoji_keeps_emoji() {
        let result = sanitize_response("✨ add login", CommitType::Gitmoji, 1);
        assert_eq!(result, vec!["✨ add login"]);
    }

    #[test]
    fn test_plain_strips_type_prefix() {
        let raw = "feat(auth)!: add login\n🐛 Fix crash on start";
        let result = sanitize_response(raw, CommitType::Plain, 2);
        assert_eq!(result, vec!["add login", "Fix crash on start"]);
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let once = deduplicate(vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        let twice = deduplicate(once.clone());
        assert_eq!(once, vec!["a", "b"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        assert!(sanitize_response("\n \n", CommitType::Conventional, 3).is_empty());
    }
}
