//! Caller ID parsing.
//!
//! With `AT+VCID=1` the modem emits formatted caller ID between the first
//! and second ring as tagged lines:
//!
//! ```text
//! DATE = 0806
//! TIME = 1432
//! NMBR = 5550100
//! NAME = ACME CORP
//! ```
//!
//! Tags are collected into a [`CallerId`] while rings are being counted and
//! attached to the call record when the call is answered.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(DATE|TIME|NMBR|NAME)\s*=\s*(.+)$").expect("valid caller ID regex"));

/// A caller ID field the modem can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidField {
    Date,
    Time,
    Number,
    Name,
}

/// One parsed caller ID line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidTag {
    pub field: CidField,
    pub value: String,
}

/// Parse a modem line as a caller ID tag, if it is one.
pub fn parse_tag(line: &str) -> Option<CidTag> {
    let captures = CID_TAG.captures(line.trim())?;
    let field = match &captures[1] {
        "DATE" => CidField::Date,
        "TIME" => CidField::Time,
        "NMBR" => CidField::Number,
        "NAME" => CidField::Name,
        _ => return None,
    };
    Some(CidTag {
        field,
        value: captures[2].trim().to_string(),
    })
}

/// Caller ID accumulated across the tag lines of one incoming call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerId {
    pub date: Option<String>,
    pub time: Option<String>,
    pub number: Option<String>,
    pub name: Option<String>,
}

impl CallerId {
    /// Fold one tag into the record. Repeated tags overwrite; the modem
    /// re-reports caller ID if the burst restarts.
    pub fn apply(&mut self, tag: CidTag) {
        let slot = match tag.field {
            CidField::Date => &mut self.date,
            CidField::Time => &mut self.time,
            CidField::Number => &mut self.number,
            CidField::Name => &mut self.name,
        };
        *slot = Some(tag.value);
    }

    /// Whether any field has been reported.
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.time.is_none() && self.number.is_none() && self.name.is_none()
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.number, &self.name) {
            (Some(number), Some(name)) => write!(f, "{} ({})", number, name),
            (Some(number), None) => write!(f, "{}", number),
            (None, Some(name)) => write!(f, "{}", name),
            (None, None) => write!(f, "unknown"),
        }
    }
}
