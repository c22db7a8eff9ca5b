/// Splits raw daemon text into lines with NULs removed and line-ending CRs dropped.
///
/// Surrounding whitespace is preserved; callers that compare lines trim them.
pub fn raw_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('\n').map(|line| {
        let mut line = line.replace('\0', "");
        while line.ends_with('\r') {
            line.pop();
        }
        line
    })
}

/// Splits into trimmed, NUL-free lines, keeping blank entries so indices stay aligned.
pub fn trimmed_lines(text: &str) -> Vec<String> {
    raw_lines(text).map(|l| l.trim().to_string()).collect()
}

/// Produce the `cleaned` view of a reply: no NULs, no blank lines, `\n` separated.
pub fn strip_empty_lines(text: &str) -> String {
    raw_lines(text)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_blank_lines_and_nuls() {
        let raw = "getheight\r\n\r\n  \r\nheight=10\0\r\n\0\0\r\nok\r\n";
        assert_eq!(strip_empty_lines(raw), "getheight\nheight=10\nok");
    }

    #[test]
    fn test_keeps_inner_whitespace() {
        assert_eq!(strip_empty_lines("  a b  \n\nc"), "  a b  \nc");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_empty_lines(""), "");
        assert_eq!(strip_empty_lines("\r\n\r\n\0"), "");
    }

    #[test]
    fn test_output_has_no_empty_lines_or_nuls() {
        let samples = [
            "a\r\r\nb",
            "x\r\0\ny\n\n",
            "\0\r\n \t \r\nlast",
            "owonero-daemon height=5\r\nOWOabc\r\nok\r\n",
            "\r",
        ];
        for raw in samples {
            let cleaned = strip_empty_lines(raw);
            assert!(!cleaned.contains('\0'), "NUL left in {:?}", cleaned);
            if !cleaned.is_empty() {
                assert!(
                    cleaned.split('\n').all(|l| !l.trim().is_empty()),
                    "blank line left in {:?}",
                    cleaned
                );
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "a\r\r\nb",
            "x\r\0\ny\n\n",
            "getheight\r\nheight=482931\r\nok\r\n",
            "  spaced  \r\n\r\n\ttab\r\n",
            "",
        ];
        for raw in samples {
            let once = strip_empty_lines(raw);
            assert_eq!(strip_empty_lines(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_trimmed_lines_keeps_positions() {
        let lines = trimmed_lines("a\r\n\r\n b \r\n");
        assert_eq!(lines, vec!["a", "", "b", ""]);
    }
}
