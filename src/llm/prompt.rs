//! Prompt construction for commit message generation.
//!
//! The prompt is a pure function of the diff and the generation parameters;
//! every backend sends the same text.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::config::CommitType;

/// Maximum length for sanitized diff text.
pub const MAX_DIFF_SANITIZED_LENGTH: usize = 30_000;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ANSI regex"));

/// Inputs to [`build_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub locale: &'a str,
    pub diff: &'a str,
    pub generate: usize,
    pub max_length: usize,
    pub commit_type: CommitType,
    pub user_prompt: Option<&'a str>,
}

/// Build the instruction sent to the model.
///
/// A user-supplied prompt replaces the built-in instructions, but the output
/// rules (one message per line, requested count) are always appended since
/// the response sanitizer depends on them.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let instructions = match input.user_prompt.map(str::trim) {
        Some(custom) if !custom.is_empty() => custom.to_string(),
        _ => default_instructions(input),
    };

    let count = input.generate.max(1);
    let output_rules = if count == 1 {
        "Respond with exactly one commit message on a single line. \
         Do not number it, quote it, or add any explanation."
            .to_string()
    } else {
        format!(
            "Respond with {count} different commit messages, one per line. \
             Do not number them, quote them, or add any explanation."
        )
    };

    let diff = sanitize_diff(input.diff, MAX_DIFF_SANITIZED_LENGTH);

    format!(
        "{instructions}\n\n{output_rules}\n\nHere is the diff:\n```diff\n{diff}\n```"
    )
}

fn default_instructions(input: &PromptInput<'_>) -> String {
    let format_rules = commit_type_rules(input.commit_type);
    format!(
        "Generate a concise git commit message written in present tense for the \
         code diff below, following these rules:\n\
         - Message language: {locale}\n\
         - The message must be at most {max_length} characters long\n\
         - Exclude anything unnecessary such as translations or explanations; \
         your entire response is passed directly into git commit\n\
         {format_rules}",
        locale = input.locale,
        max_length = input.max_length,
    )
}

fn commit_type_rules(commit_type: CommitType) -> &'static str {
    match commit_type {
        CommitType::Conventional => {
            "- Follow the Conventional Commits format: `<type>(<optional scope>): <description>`\n\
             - Type is one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert\n\
             - Use lowercase after the colon and no trailing period"
        }
        CommitType::Gitmoji => {
            "- Follow the Gitmoji format: `<emoji> <description>`\n\
             - Pick the emoji that matches the change, e.g. ✨ feature, 🐛 fix, 📝 docs, \
             ♻️ refactor, ⚡️ performance, ✅ tests, 🔧 configuration\n\
             - No trailing period"
        }
        CommitType::Plain => {
            "- Write a plain imperative summary line without any type prefix or emoji\n\
             - No trailing period"
        }
    }
}

/// Sanitize diff text for inclusion in a prompt.
///
/// - Removes control characters (except newlines and tabs)
/// - Removes ANSI escape sequences
/// - Truncates to `max_len` bytes on a char boundary
pub fn sanitize_diff(text: &str, max_len: usize) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(text, "");
    let mut result: String = without_ansi
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    if result.len() > max_len {
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    result
}
