//! Prefix command parsing.
//!
//! `"!roll 20 --secret yes"` with prefix `"!"` parses to key `roll`, args
//! `["20", "--secret", "yes"]` and flags `{secret: "yes"}`. Flags are found
//! anywhere in the full message content; a repeated flag keeps its last value.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static FLAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--(\S+) (\S+)").expect("flag pattern is valid"));

/// A prefixed text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased first token.
    pub key: String,
    /// Remaining tokens.
    pub args: Vec<String>,
    pub flags: HashMap<String, String>,
}

/// Recognizes text commands by prefix.
#[derive(Debug, Clone, Default)]
pub struct PrefixParser {
    /// Longest first, so `"!!"` wins over `"!"`.
    prefixes: Vec<String>,
}

impl PrefixParser {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        prefixes.dedup();
        Self { prefixes }
    }

    /// Returns `false` when no prefix is configured, i.e. text commands are
    /// disabled.
    pub fn is_enabled(&self) -> bool {
        !self.prefixes.is_empty()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Parses `content`, or returns `None` if it is not a command.
    pub fn parse(&self, content: &str) -> Option<ParsedCommand> {
        let prefix = self.prefixes.iter().find(|p| content.starts_with(p.as_str()))?;

        let mut tokens = content[prefix.len()..].split_whitespace();
        let key = tokens.next()?.to_lowercase();
        let args = tokens.map(str::to_string).collect();

        Some(ParsedCommand {
            key,
            args,
            flags: extract_flags(content),
        })
    }
}

/// Scans for `--name value` pairs, left to right.
pub fn extract_flags(content: &str) -> HashMap<String, String> {
    FLAG_PATTERN
        .captures_iter(content)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}
