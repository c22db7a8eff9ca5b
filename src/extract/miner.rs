use regex::Regex;
use std::sync::OnceLock;

use super::echo::DAEMON_BANNER;
use super::normalize::trimmed_lines;
use super::ReplyTexts;

/// Value reported when no miner address or status could be found.
pub const NO_MINER: &str = "no miner";

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bOWO[0-9A-Z]+\b").expect("static regex"))
}

fn shows_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)shows").expect("static regex"))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9]{4,}").expect("static regex"))
}

/// First `OWO...` address in `text`.
///
/// The daemon's own name starts with the same letters, so words containing
/// `owonero` are never addresses.
fn find_address(text: &str) -> Option<&str> {
    address_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|m| !m.to_ascii_lowercase().contains("owonero"))
}

/// Token right after a word matching `shows`, e.g. `miner shows OWOabc`.
fn find_after_shows(text: &str) -> Option<String> {
    for line in trimmed_lines(text) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if let Some(idx) = parts.iter().position(|p| shows_re().is_match(p)) {
            if let Some(next) = parts.get(idx + 1) {
                return Some((*next).to_string());
            }
        }
    }
    None
}

fn is_status_anchor(line: &str) -> bool {
    let line = line.to_ascii_lowercase();
    line.contains(DAEMON_BANNER) || line.contains("miner-active") || line.contains("mineractive")
}

/// Scan the lines following a banner or status line for an address-like token.
fn find_after_anchor(command: &str, text: &str) -> Option<String> {
    let lines = trimmed_lines(text);
    let anchor = lines.iter().position(|l| is_status_anchor(l))?;
    let command = command.trim().to_ascii_lowercase();

    for line in &lines[anchor + 1..] {
        if line.is_empty() || line.eq_ignore_ascii_case("ok") {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if let Some(addr) = tokens.iter().find_map(|t| find_address(t)) {
            return Some(addr.to_string());
        }

        let candidate = tokens.iter().find(|t| {
            let lower = t.to_ascii_lowercase();
            !lower.contains("owonero")
                && !lower.starts_with("height=")
                && lower != "ok"
                && lower != command
                && identifier_re().is_match(t)
        });
        if let Some(token) = candidate {
            return Some((*token).to_string());
        }
    }
    None
}

/// Surface the miner address (or status word) the daemon reported.
pub fn adjust(texts: &ReplyTexts<'_>) -> String {
    let areas = [texts.original, texts.cleaned, texts.echo];

    if let Some(addr) = areas.iter().find_map(|a| find_address(a)) {
        return addr.to_string();
    }
    if let Some(token) = areas.iter().find_map(|a| find_after_shows(a)) {
        return token;
    }
    find_after_anchor(texts.command, texts.original).unwrap_or_else(|| NO_MINER.to_string())
}
