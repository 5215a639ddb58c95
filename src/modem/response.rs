//! Classification of unsolicited modem lines.
//!
//! While idle, the daemon reads whatever the modem volunteers: `RING`
//! indications, caller ID tags, stray result codes, blank spacing lines.
//! Matching is substring-based for `RING`: firmwares differ on framing,
//! the token does not.

use super::caller_id::{self, CidTag};

/// One line of unsolicited modem output, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ModemLine {
    /// Incoming ring indication.
    Ring,
    /// A caller ID tag line.
    CallerId(CidTag),
    /// `OK` result code.
    Ok,
    /// `CONNECT` result code.
    Connect,
    /// `ERROR` result code.
    Error,
    /// Blank spacing line.
    Empty,
    /// Anything else the modem said.
    Other(String),
}

/// Classify a trimmed line of modem output.
pub fn classify(line: &str) -> ModemLine {
    if line.is_empty() {
        return ModemLine::Empty;
    }
    if let Some(tag) = caller_id::parse_tag(line) {
        return ModemLine::CallerId(tag);
    }
    if line.contains("RING") {
        return ModemLine::Ring;
    }
    match line {
        "OK" => ModemLine::Ok,
        "CONNECT" => ModemLine::Connect,
        "ERROR" => ModemLine::Error,
        _ => ModemLine::Other(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::caller_id::CidField;

    #[test]
    fn test_ring_substring() {
        assert_eq!(classify("RING"), ModemLine::Ring);
        // Some firmwares decorate the token; the substring still counts.
        assert_eq!(classify("RING 2"), ModemLine::Ring);
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(classify("OK"), ModemLine::Ok);
        assert_eq!(classify("CONNECT"), ModemLine::Connect);
        assert_eq!(classify("ERROR"), ModemLine::Error);
    }

    #[test]
    fn test_caller_id_takes_precedence() {
        match classify("NMBR = 5550100") {
            ModemLine::CallerId(tag) => {
                assert_eq!(tag.field, CidField::Number);
                assert_eq!(tag.value, "5550100");
            }
            other => panic!("expected caller ID, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_other() {
        assert_eq!(classify(""), ModemLine::Empty);
        assert_eq!(
            classify("NO CARRIER"),
            ModemLine::Other("NO CARRIER".to_string())
        );
    }
}
