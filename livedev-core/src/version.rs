//! Version strings taken from Live's preference directory names.
//!
//! Directory names carry partial versions (`Live 12`, `Live 12.1`,
//! `Live 12.0.5`). They are completed to three components before being
//! parsed into an ordered [`LiveVersion`].

use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` triple, ordered numerically component by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiveVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for LiveVersion {
    type Err = String;

    /// Exactly three dot-separated decimal components; anything else (beta
    /// suffixes, a fourth component) is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format!("'{s}' is not a major.minor.patch version"));
        };
        let component = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid version component '{part}' in '{s}'"));
            }
            part.parse::<u64>()
                .map_err(|err| format!("invalid version component '{part}' in '{s}': {err}"))
        };
        Ok(Self {
            major: component(*major)?,
            minor: component(*minor)?,
            patch: component(*patch)?,
        })
    }
}

impl fmt::Display for LiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Complete a partial dotted version: `"12"` → `"12.0.0"`, `"12.3"` →
/// `"12.3.0"`. Anything with two or more dots is returned unchanged, including
/// shapes that are not versions at all.
pub fn complete_version(version: &str) -> String {
    match version.matches('.').count() {
        0 => format!("{version}.0.0"),
        1 => format!("{version}.0"),
        _ => version.to_string(),
    }
}

/// Suffix of `name` starting at its first ASCII digit.
///
/// `"Live 12.0.5"` → `Some("12.0.5")`; `"Live"` → `None`.
pub fn trailing_version(name: &str) -> Option<&str> {
    name.find(|c: char| c.is_ascii_digit()).map(|idx| &name[idx..])
}

/// Trailing version of `name`, completed and parsed.
///
/// Returns `None` when the name has no digits or the completed string is not
/// a plain version (e.g. beta suffixes such as `12.1b3`).
pub fn parse_version(name: &str) -> Option<LiveVersion> {
    let raw = trailing_version(name)?;
    complete_version(raw).parse().ok()
}
