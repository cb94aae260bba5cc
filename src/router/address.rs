//! Address token recognition for the collection channel.

use regex::Regex;

/// EVM-style account address: `0x` followed by 40 hex digits.
pub const DEFAULT_ADDRESS_PATTERN: &str = "0x[0-9a-fA-F]{40}";

#[derive(Debug, Clone)]
pub struct AddressPattern {
    regex: Regex,
}

impl AddressPattern {
    /// `pattern` must match the whole token; it is anchored here.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { regex })
    }

    /// The address when `text` is exactly one token of the configured shape.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut tokens = text.split_whitespace();
        let token = tokens.next()?;
        if tokens.next().is_some() {
            return None;
        }
        self.regex.is_match(token).then_some(token)
    }
}

/// Shortened form for log records when message content logging is off.
pub(crate) fn redact(address: &str) -> String {
    let prefix: String = address.chars().take(6).collect();
    format!("{prefix}…")
}
