//! Wait and timeout policies attached to every test unit

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Error, Result};
use crate::node::Node;

/// Delays applied around a single test unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wait {
    /// Delay before the unit runs, as written (empty = none)
    pub before: String,
    /// Delay after the unit runs, as written (empty = none)
    pub after: String,
    before_dur: Option<Duration>,
    after_dur: Option<Duration>,
}

impl Wait {
    /// Build a wait policy, validating both duration strings
    pub fn new(before: &str, after: &str) -> std::result::Result<Self, String> {
        Ok(Self {
            before: before.to_string(),
            after: after.to_string(),
            before_dur: optional_duration(before)?,
            after_dur: optional_duration(after)?,
        })
    }

    pub(crate) fn from_node(node: &Node) -> Result<Self> {
        let mut before = String::new();
        let mut after = String::new();
        for (key, value) in node.expect_mapping()? {
            match key.as_str() {
                "before" => {
                    before = value.expect_scalar()?.to_string();
                    optional_duration(&before)
                        .map_err(|reason| Error::invalid_duration(&before, value.pos(), &reason))?;
                }
                "after" => {
                    after = value.expect_scalar()?.to_string();
                    optional_duration(&after)
                        .map_err(|reason| Error::invalid_duration(&after, value.pos(), &reason))?;
                }
                _ => return Err(Error::unknown_field(key, value.pos())),
            }
        }
        Self::new(&before, &after).map_err(|reason| Error::invalid_duration(&before, node.pos(), &reason))
    }

    pub fn before_duration(&self) -> Option<Duration> {
        self.before_dur
    }

    pub fn after_duration(&self) -> Option<Duration> {
        self.after_dur
    }
}

/// Deadline policy for a single test unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeout {
    /// Time the unit should complete within, as written
    pub after: String,
    /// Whether exceeding the deadline is the expected outcome
    pub expected: bool,
    duration: Duration,
}

impl Timeout {
    pub fn new(after: &str, expected: bool) -> std::result::Result<Self, String> {
        Ok(Self {
            after: after.to_string(),
            expected,
            duration: parse_duration(after)?,
        })
    }

    pub(crate) fn from_node(node: &Node) -> Result<Self> {
        let mut after: Option<(String, &Node)> = None;
        let mut expected = false;
        for (key, value) in node.expect_mapping()? {
            match key.as_str() {
                "after" => after = Some((value.expect_scalar()?.to_string(), value)),
                "expected" => expected = value.expect_bool()?,
                _ => return Err(Error::unknown_field(key, value.pos())),
            }
        }
        let (after, at) = match after {
            Some(found) => found,
            None => return Err(Error::invalid_duration("", node.pos(), "missing 'after'")),
        };
        Self::new(&after, expected).map_err(|reason| Error::invalid_duration(&after, at.pos(), &reason))
    }

    /// The parsed deadline; validated when the timeout was built
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

fn optional_duration(s: &str) -> std::result::Result<Option<Duration>, String> {
    if s.is_empty() {
        Ok(None)
    } else {
        parse_duration(s).map(Some)
    }
}

/// Parse a duration string such as `300ms`, `1.5s` or `1h30m`.
///
/// A bare `0` is accepted. Whole-number components go straight to
/// `humantime`; fractional ones (`1.5s`) are rewritten to nanoseconds first.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err("negative durations are not allowed".to_string());
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    humantime::parse_duration(&whole_components(s)?).map_err(|e| format!("'{input}': {e}"))
}

static FRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d*)\.(\d*)([^\d.\s]+)").expect("fraction pattern is valid"));

/// Rewrite `1.5s` style components as whole nanoseconds, and `µs` as `us`
fn whole_components(s: &str) -> std::result::Result<String, String> {
    let s = s.replace(['µ', 'μ'], "u");
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in FRACTION.captures_iter(&s) {
        let all = caps.get(0).map_or(0..0, |m| m.range());
        let (whole, frac, unit) = (&caps[1], &caps[2], &caps[3]);
        let nanos = fraction_nanos(whole, frac, unit).ok_or_else(|| format!("invalid number in '{s}'"))?;
        out.push_str(&s[last..all.start]);
        out.push_str(&format!("{nanos}ns"));
        last = all.end;
    }
    out.push_str(&s[last..]);
    Ok(out)
}

/// `whole.frac` of `unit` in nanoseconds, with checked arithmetic
fn fraction_nanos(whole: &str, frac: &str, unit: &str) -> Option<u128> {
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let scale: u128 = match unit {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    };
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;
    let mut divisor: u128 = 1;
    for digit in frac.chars() {
        divisor = divisor.checked_mul(10)?;
        if divisor > scale {
            break;
        }
        nanos = nanos.checked_add(u128::from(digit.to_digit(10)?) * scale / divisor)?;
    }
    Some(nanos)
}
