use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};

/// An ISO-8601 instant, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse an ISO-8601 string. A trailing `Z` is rewritten to `+00:00` first.
pub fn decode(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };
    match DateTime::parse_from_rfc3339(&normalized) {
        Ok(dt) => Ok(Timestamp::Zoned(dt)),
        Err(zoned_err) => NaiveDateTime::parse_from_str(&normalized, NAIVE_FORMAT)
            .map(Timestamp::Naive)
            .map_err(|_| zoned_err),
    }
}

/// ISO-8601 with an explicit offset; `Z` is never written back.
pub fn encode(ts: &Timestamp) -> String {
    match ts {
        Timestamp::Zoned(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        Timestamp::Naive(naive) => naive.format(NAIVE_FORMAT).to_string(),
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}
