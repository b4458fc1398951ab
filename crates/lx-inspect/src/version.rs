//! OSGi-style versions and version ranges
//!
//! Versions are `major.minor.micro.qualifier` where every part after the first
//! is optional. Ranges use interval notation (`[1.0,2.0)`) or a bare version,
//! which means "at least this version".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version '{text}': {reason}")]
    InvalidVersion { text: String, reason: String },

    #[error("Invalid version range '{text}': {reason}")]
    InvalidRange { text: String, reason: String },
}

pub type VersionResult<T> = Result<T, VersionError>;

/// A structured `major.minor.micro.qualifier` version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

impl Version {
    /// The empty version `0.0.0`, used when a record declares none
    pub const EMPTY: Version = Version {
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: String::new(),
    };

    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn parse(text: &str) -> VersionResult<Self> {
        let trimmed = text.trim();
        let invalid = |reason: &str| VersionError::InvalidVersion {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty version"));
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u64; 3];
        for (slot, number) in numbers.iter_mut().enumerate() {
            match parts.next() {
                Some(part) => {
                    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid(&format!("part {} is not a number", slot + 1)));
                    }
                    *number = part.parse().map_err(|_| invalid("number out of range"))?;
                }
                None => break,
            }
        }

        let qualifier = parts.next().unwrap_or_default();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("qualifier may only contain [A-Za-z0-9_-]"));
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier: qualifier.to_string(),
        })
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// A version interval; `right == None` means unbounded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    left: Version,
    left_closed: bool,
    right: Option<Version>,
    right_closed: bool,
}

impl VersionRange {
    /// Every version at or above `left`
    pub fn at_least(left: Version) -> Self {
        Self {
            left,
            left_closed: true,
            right: None,
            right_closed: false,
        }
    }

    pub fn parse(text: &str) -> VersionResult<Self> {
        let trimmed = text.trim();
        let invalid = |reason: String| VersionError::InvalidRange {
            text: text.to_string(),
            reason,
        };

        let left_closed = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => {
                let left = Version::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
                return Ok(Self::at_least(left));
            }
        };
        let right_closed = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid("missing closing ']' or ')'".to_string())),
        };

        let body = &trimmed[1..trimmed.len() - 1];
        let (left, right) = body
            .split_once(',')
            .ok_or_else(|| invalid("expected two versions separated by ','".to_string()))?;
        let left = Version::parse(left).map_err(|e| invalid(e.to_string()))?;
        let right = Version::parse(right).map_err(|e| invalid(e.to_string()))?;
        if right < left {
            return Err(invalid(format!("{} is below {}", right, left)));
        }

        Ok(Self {
            left,
            left_closed,
            right: Some(right),
            right_closed,
        })
    }

    /// Check if version falls inside the range
    pub fn includes(&self, version: &Version) -> bool {
        let above_left = if self.left_closed {
            version >= &self.left
        } else {
            version > &self.left
        };
        let below_right = match &self.right {
            None => true,
            Some(right) if self.right_closed => version <= right,
            Some(right) => version < right,
        };
        above_left && below_right
    }
}

impl Default for VersionRange {
    /// Any version at or above `0.0.0`
    fn default() -> Self {
        Self::at_least(Version::EMPTY)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.right {
            None => write!(f, "{}", self.left),
            Some(right) => write!(
                f,
                "{}{},{}{}",
                if self.left_closed { '[' } else { '(' },
                self.left,
                right,
                if self.right_closed { ']' } else { ')' }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(text: &str) -> Version {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_fills_missing_parts() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(
            v("1.2.3.20240101-1200"),
            Version::new(1, 2, 3).with_qualifier("20240101-1200")
        );
    }

    #[test]
    fn test_empty_version_is_zero() {
        assert_eq!(Version::EMPTY, Version::default());
        assert_eq!(Version::EMPTY.to_string(), "0.0.0");
    }

    #[rstest]
    #[case("")]
    #[case("a.b")]
    #[case("1..2")]
    #[case("1.2.3.bad qualifier")]
    #[case("-1")]
    fn test_invalid_versions(#[case] text: &str) {
        assert!(Version::parse(text).is_err());
    }

    #[test]
    fn test_ordering_numeric_then_qualifier() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.0.0") < v("1.0.0.a"));
        assert!(v("1.0.0.a") < v("1.0.0.b"));
        assert!(v("2") > v("1.99.99.zzz"));
    }

    #[rstest]
    #[case("[1.0,2.0)", "1.5", true)]
    #[case("[1.0,2.0)", "2.0", false)]
    #[case("[1.0,2.0)", "1.0", true)]
    #[case("(1.0,2.0]", "1.0", false)]
    #[case("(1.0,2.0]", "2.0", true)]
    #[case("1.5", "1.4.9", false)]
    #[case("1.5", "99", true)]
    fn test_range_includes(#[case] range: &str, #[case] version: &str, #[case] expected: bool) {
        let range: VersionRange = range.parse().unwrap();
        assert_eq!(range.includes(&v(version)), expected);
    }

    #[test]
    fn test_default_range_is_any_version() {
        let range = VersionRange::default();
        assert!(range.includes(&Version::EMPTY));
        assert!(range.includes(&v("123.4.5")));
        assert_eq!(range.to_string(), "0.0.0");
    }

    #[rstest]
    #[case("[1.0,2.0")]
    #[case("[1.0]")]
    #[case("[2.0,1.0)")]
    #[case("[x,2)")]
    fn test_invalid_ranges(#[case] text: &str) {
        assert!(matches!(
            VersionRange::parse(text),
            Err(VersionError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_display() {
        let range: VersionRange = " [1,2) ".parse().unwrap();
        assert_eq!(range.to_string(), "[1.0.0,2.0.0)");
    }
}
