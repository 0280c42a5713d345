//! Spoken commands understood on the results screen.

use std::sync::LazyLock;

use regex::Regex;

const BACK_WORDS: &[&str] = &["retour", "accueil", "home"];

static CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(appelle|appeler|call)\s+([0-9]+)\b").expect("call pattern is valid")
});

/// A navigation command spoken while results are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsCommand {
    /// Return to the home screen.
    Back,
    /// Call the n-th listed provider, as spoken (1-based).
    Call(usize),
}

impl ResultsCommand {
    /// The 0-based list index targeted by a call command.
    ///
    /// `None` for `Back` and for "call 0".
    pub fn call_index(self) -> Option<usize> {
        match self {
            Self::Call(n) => n.checked_sub(1),
            Self::Back => None,
        }
    }
}

/// Recognises a results-screen command in `text`.
///
/// `Back` takes precedence over `Call`. A number too large to represent still
/// yields a `Call` so the utterance is consumed as a command.
pub fn parse_command(text: &str) -> Option<ResultsCommand> {
    let t = text.to_lowercase();

    if BACK_WORDS.iter().any(|w| t.contains(w)) {
        return Some(ResultsCommand::Back);
    }

    CALL_PATTERN.captures(&t).map(|caps| {
        let n = caps[2].parse::<usize>().unwrap_or(usize::MAX);
        ResultsCommand::Call(n)
    })
}
