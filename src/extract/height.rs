use regex::Regex;
use std::sync::OnceLock;

use super::normalize::strip_empty_lines;
use super::ReplyTexts;

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+").expect("static regex"))
}

/// `height:<n>` from the first integer in the echo tail, cleaned or raw text.
pub fn adjust(texts: &ReplyTexts<'_>) -> String {
    let candidates = [texts.echo, texts.cleaned, texts.original];

    for text in candidates {
        if let Some(m) = integer_re().find(text) {
            return format!("height:{}", m.as_str());
        }
    }

    // No number anywhere: hand back the best text we have rather than a made-up height.
    let best = candidates
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or_default();
    strip_empty_lines(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::adjust as adjust_reply;

    #[test]
    fn test_height_from_echoed_reply() {
        let raw = "getheight\r\nheight=482931\r\nok\r\n";
        assert_eq!(adjust_reply("getheight", raw), "height:482931");
    }

    #[test]
    fn test_no_integer_keeps_text() {
        let raw = "getheight\r\nerror\r\n";
        assert_eq!(adjust_reply("getheight", raw), "error");
    }

    #[test]
    fn test_negative_integer() {
        assert_eq!(adjust_reply("getheight", "getheight\r\n-1\r\n"), "height:-1");
    }

    #[test]
    fn test_prefix_and_case_insensitive() {
        let raw = "GetHeight now\r\n 1200 \r\n";
        assert_eq!(adjust_reply("  GetHeight now", raw), "height:1200");
    }

    #[test]
    fn test_banner_only_reply() {
        let raw = "owonero-daemon height=9001\r\n";
        assert_eq!(adjust_reply("getheight", raw), "height:9001");
    }

    #[test]
    fn test_searches_later_texts() {
        let texts = ReplyTexts {
            command: "getheight",
            original: "junk 42",
            cleaned: "junk 42",
            echo: "no digits here",
        };
        assert_eq!(adjust(&texts), "height:42");
    }

    #[test]
    fn test_blank_reply_is_empty() {
        assert_eq!(adjust_reply("getheight", "\r\n\r\n"), "");
    }
}
