//! Heuristics that turn an unframed daemon reply into one adjusted value.
//!
//! Every command goes through the echo-aware extractor first; commands listed
//! in [`STRATEGIES`] then get a command-specific override. New daemon commands
//! only need a new table row, the session transport never looks at them.

pub mod echo;
pub mod height;
pub mod miner;
pub mod normalize;

pub use echo::extract_after_echo;
pub use normalize::strip_empty_lines;

/// The three views of one reply that strategies search through.
#[derive(Debug, Clone, Copy)]
pub struct ReplyTexts<'a> {
    pub command: &'a str,
    pub original: &'a str,
    pub cleaned: &'a str,
    pub echo: &'a str,
}

/// How the adjusted value is derived for a family of commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `height:<n>` from the first integer in the reply.
    HeightQuery,
    /// Miner address or status word, `no miner` otherwise.
    MinerStatus,
    /// Echo-aware text as-is.
    Passthrough,
}

/// Command prefix (lowercase) to strategy.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("getheight", Strategy::HeightQuery),
    ("mineractive", Strategy::MinerStatus),
];

impl Strategy {
    /// Pick the strategy for a command, matching prefixes case-insensitively.
    pub fn for_command(command: &str) -> Self {
        let command = command.trim().to_ascii_lowercase();
        STRATEGIES
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix))
            .map(|(_, strategy)| *strategy)
            .unwrap_or(Strategy::Passthrough)
    }

    pub fn apply(self, texts: &ReplyTexts<'_>) -> String {
        match self {
            Strategy::HeightQuery => height::adjust(texts),
            Strategy::MinerStatus => miner::adjust(texts),
            Strategy::Passthrough => texts.echo.to_string(),
        }
    }
}

/// Cleaned text and adjusted value for a raw reply to `command`.
pub fn derive(command: &str, original: &str) -> (String, String) {
    let cleaned = strip_empty_lines(original);
    let echo = extract_after_echo(command, original);
    let texts = ReplyTexts {
        command,
        original,
        cleaned: &cleaned,
        echo: &echo,
    };
    let adjusted = Strategy::for_command(command).apply(&texts);
    (cleaned, adjusted)
}

/// Adjusted value only.
pub fn adjust(command: &str, original: &str) -> String {
    derive(command, original).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_lookup() {
        assert_eq!(Strategy::for_command("getheight"), Strategy::HeightQuery);
        assert_eq!(Strategy::for_command("GETHEIGHT 5"), Strategy::HeightQuery);
        assert_eq!(Strategy::for_command(" mineractive"), Strategy::MinerStatus);
        assert_eq!(Strategy::for_command("getpeers"), Strategy::Passthrough);
        assert_eq!(Strategy::for_command("height"), Strategy::Passthrough);
    }

    #[test]
    fn test_passthrough_uses_echo_tail() {
        let raw = "submitblock\r\nok\r\n";
        assert_eq!(adjust("submitblock", raw), "ok");
    }

    #[test]
    fn test_derive_returns_cleaned() {
        let (cleaned, adjusted) = derive("getheight", "getheight\r\n\r\n1500\r\n");
        assert_eq!(cleaned, "getheight\n1500");
        assert_eq!(adjusted, "height:1500");
    }
}
