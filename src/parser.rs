use heapless::Vec;

use crate::config::MAX_ARGS;
use crate::error::TokenizeError;

/// Parameters of a command line, borrowed from the line itself.
pub type Argv<'a> = Vec<&'a str, MAX_ARGS>;

/// A command line split into its command token and the rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLine<'a> {
    /// First space-delimited token
    pub command: &'a str,
    /// Everything after the command token, leading spaces included
    pub rest: &'a str,
}

/// Command parser for splitting input into command and arguments
pub struct CommandParser;

impl CommandParser {
    /// Separate the first token from the remainder of the line.
    ///
    /// Leading spaces are skipped. Returns `None` for a blank line.
    pub fn split(line: &str) -> Option<SplitLine<'_>> {
        let trimmed = line.trim_start_matches(' ');
        if trimmed.is_empty() {
            return None;
        }
        let end = trimmed.find(' ').unwrap_or(trimmed.len());
        let (command, rest) = trimmed.split_at(end);
        Some(SplitLine { command, rest })
    }

    /// Count the tokens in `input` without collecting them.
    ///
    /// Returns 0 when the quotes are unbalanced.
    pub fn count(input: &str) -> usize {
        if Self::unbalanced(input) {
            return 0;
        }
        Tokens { rest: input }.count()
    }

    /// Split `input` into tokens.
    ///
    /// Tokens are runs of non-space bytes. A `"`-delimited group is one
    /// token with the quotes removed, spaces included; a quote in the middle
    /// of a run ends that token and opens a group.
    pub fn tokenize(input: &str) -> Result<Argv<'_>, TokenizeError> {
        if Self::unbalanced(input) {
            return Err(TokenizeError::UnbalancedQuotes);
        }
        let mut argv = Argv::new();
        for token in (Tokens { rest: input }) {
            argv.push(token)
                .map_err(|_| TokenizeError::TooManyTokens { max: MAX_ARGS })?;
        }
        Ok(argv)
    }

    fn unbalanced(input: &str) -> bool {
        input.bytes().filter(|&b| b == b'"').count() % 2 != 0
    }
}

/// Token iterator; assumes quotes are balanced.
struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start_matches(' ');
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted.find('"').unwrap_or(quoted.len());
            self.rest = quoted.get(end + 1..).unwrap_or("");
            return Some(&quoted[..end]);
        }

        let end = rest.find(|c: char| c == ' ' || c == '"').unwrap_or(rest.len());
        self.rest = &rest[end..];
        Some(&rest[..end])
    }
}
