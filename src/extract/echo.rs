use regex::Regex;
use std::sync::OnceLock;

use super::normalize::{strip_empty_lines, trimmed_lines};

/// Banner line the daemon prints ahead of some replies.
pub const DAEMON_BANNER: &str = "owonero-daemon";

fn height_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bheight=\d+").expect("static regex"))
}

/// Index of the line after which the daemon's own reply starts.
///
/// Anchors, in priority order: the echoed command, the daemon banner, a `height=N` token.
fn anchor_index(command: &str, lines: &[String]) -> Option<usize> {
    let command = command.trim();
    lines
        .iter()
        .position(|l| l == command)
        .or_else(|| lines.iter().position(|l| l.starts_with(DAEMON_BANNER)))
        .or_else(|| lines.iter().position(|l| height_token_re().is_match(l)))
}

/// Return what the daemon said after echoing the command (or its banner).
///
/// Degrades to the cleaned text, then to the raw text, when no anchor or no
/// tail is found.
pub fn extract_after_echo(command: &str, text: &str) -> String {
    let lines = trimmed_lines(text);

    if let Some(idx) = anchor_index(command, &lines) {
        let tail: Vec<&str> = lines[idx + 1..]
            .iter()
            .map(String::as_str)
            .filter(|l| !l.is_empty())
            .collect();
        if !tail.is_empty() {
            return tail.join("\n");
        }
    }

    let cleaned = strip_empty_lines(text);
    if !cleaned.is_empty() {
        return cleaned;
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echoed_command_anchor() {
        let raw = "getheight\r\nheight=482931\r\n\r\n  ok  \r\n";
        assert_eq!(extract_after_echo("getheight", raw), "height=482931\nok");
    }

    #[test]
    fn test_echo_returns_lines_after_first_non_empty_line() {
        let raw = "\r\n\0peers\r\n 10.0.0.1:6969 \r\n\r\n10.0.0.2:6969\r\n";
        assert_eq!(
            extract_after_echo("peers", raw),
            "10.0.0.1:6969\n10.0.0.2:6969"
        );
    }

    #[test]
    fn test_banner_anchor() {
        let raw = "owonero-daemon v0.4\r\nsynced\r\n";
        assert_eq!(extract_after_echo("status", raw), "synced");
    }

    #[test]
    fn test_height_anchor() {
        let raw = "node ready height=77\r\nmempool 3\r\n";
        assert_eq!(extract_after_echo("mempool", raw), "mempool 3");
    }

    #[test]
    fn test_echo_beats_banner() {
        let raw = "owonero-daemon\r\nfirst\r\nsync\r\nsecond\r\n";
        assert_eq!(extract_after_echo("sync", raw), "second");
    }

    #[test]
    fn test_height_pattern_needs_digits() {
        let raw = "height=\r\nvalue\r\n";
        assert_eq!(extract_after_echo("cmd", raw), "height=\nvalue");
    }

    #[test]
    fn test_no_anchor_falls_back_to_cleaned() {
        let raw = "\r\nsomething\r\n\r\nelse\r\n";
        assert_eq!(extract_after_echo("cmd", raw), "something\nelse");
    }

    #[test]
    fn test_empty_tail_falls_back_to_cleaned() {
        let raw = "hello\r\ngetheight\r\n\r\n";
        assert_eq!(extract_after_echo("getheight", raw), "hello\ngetheight");
    }

    #[test]
    fn test_blank_text_falls_back_to_raw() {
        assert_eq!(extract_after_echo("cmd", "\r\n"), "\r\n");
        assert_eq!(extract_after_echo("cmd", ""), "");
    }
}
