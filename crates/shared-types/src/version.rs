//! # Versions and Version Ranges
//!
//! Unit versions are `major.minor.patch` triples; missing trailing components
//! read as zero, so `1.5` and `1.5.0` are the same version.
//!
//! Ranges use interval notation:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `[1.0,2.0)` | `1.0 <= v < 2.0` |
//! | `(1.0,2.0]` | `1.0 < v <= 2.0` |
//! | `1.2` | `v >= 1.2` |
//! | `*` | any version |

use crate::errors::VersionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A unit version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || VersionError::InvalidVersion(s.to_string());
        if text.is_empty() {
            return Err(invalid());
        }

        let mut parts = [0u32; 3];
        let mut count = 0;
        for segment in text.split('.') {
            if count == parts.len() {
                return Err(invalid());
            }
            parts[count] = segment.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Bound {
    version: Version,
    inclusive: bool,
}

/// Set of versions an import accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    floor: Bound,
    ceiling: Option<Bound>,
}

impl VersionRange {
    /// Range accepting every version.
    #[must_use]
    pub fn any() -> Self {
        Self::at_least(Version::default())
    }

    /// `[version, infinity)`.
    #[must_use]
    pub fn at_least(version: Version) -> Self {
        Self {
            floor: Bound {
                version,
                inclusive: true,
            },
            ceiling: None,
        }
    }

    /// `[floor, ceiling)`.
    #[must_use]
    pub fn half_open(floor: Version, ceiling: Version) -> Self {
        Self {
            floor: Bound {
                version: floor,
                inclusive: true,
            },
            ceiling: Some(Bound {
                version: ceiling,
                inclusive: false,
            }),
        }
    }

    /// Whether `version` falls inside the range.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        let above_floor = if self.floor.inclusive {
            *version >= self.floor.version
        } else {
            *version > self.floor.version
        };
        let below_ceiling = match self.ceiling {
            None => true,
            Some(Bound {
                version: ceiling,
                inclusive: true,
            }) => *version <= ceiling,
            Some(Bound {
                version: ceiling,
                inclusive: false,
            }) => *version < ceiling,
        };
        above_floor && below_ceiling
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() || text == "*" {
            return Ok(Self::any());
        }

        let opening = text.chars().next();
        if !matches!(opening, Some('[') | Some('(')) {
            return Ok(Self::at_least(text.parse()?));
        }

        let invalid = || VersionError::InvalidRange(s.to_string());
        let closing = text.chars().last().ok_or_else(invalid)?;
        if !matches!(closing, ']' | ')') || text.len() < 2 {
            return Err(invalid());
        }

        let body = &text[1..text.len() - 1];
        let (low, high) = body.split_once(',').ok_or_else(invalid)?;
        let floor = Bound {
            version: low.parse().map_err(|_| invalid())?,
            inclusive: opening == Some('['),
        };
        let ceiling = Bound {
            version: high.parse().map_err(|_| invalid())?,
            inclusive: closing == ']',
        };

        let admits_any = floor.version < ceiling.version
            || (floor.version == ceiling.version && floor.inclusive && ceiling.inclusive);
        if !admits_any {
            return Err(VersionError::EmptyRange(s.to_string()));
        }

        Ok(Self {
            floor,
            ceiling: Some(ceiling),
        })
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ceiling {
            None => write!(f, "{}", self.floor.version),
            Some(ceiling) => write!(
                f,
                "{}{},{}{}",
                if self.floor.inclusive { '[' } else { '(' },
                self.floor.version,
                ceiling.version,
                if ceiling.inclusive { ']' } else { ')' },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Version {
        text.parse().unwrap()
    }

    #[test]
    fn test_short_versions_pad_with_zero() {
        assert_eq!(v("1.5"), Version::new(1, 5, 0));
        assert_eq!(v("2"), Version::new(2, 0, 0));
        assert!(v("1.10") > v("1.9"));
    }

    #[test]
    fn test_invalid_versions() {
        assert!("".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
    }

    #[test]
    fn test_half_open_range() {
        let range: VersionRange = "[1.0,2.0)".parse().unwrap();
        assert!(range.contains(&v("1.0")));
        assert!(range.contains(&v("1.5")));
        assert!(!range.contains(&v("2.0")));
        assert!(!range.contains(&v("0.9")));
    }

    #[test]
    fn test_exclusive_floor_inclusive_ceiling() {
        let range: VersionRange = "(1.0,2.0]".parse().unwrap();
        assert!(!range.contains(&v("1.0")));
        assert!(range.contains(&v("2.0")));
    }

    #[test]
    fn test_bare_version_is_minimum() {
        let range: VersionRange = "1.2".parse().unwrap();
        assert!(range.contains(&v("7.0")));
        assert!(!range.contains(&v("1.1.9")));
    }

    #[test]
    fn test_empty_and_malformed_ranges() {
        assert!(matches!(
            "[2.0,1.0]".parse::<VersionRange>(),
            Err(VersionError::EmptyRange(_))
        ));
        assert!(matches!(
            "[1.0,1.0)".parse::<VersionRange>(),
            Err(VersionError::EmptyRange(_))
        ));
        assert!(matches!(
            "[1.0;2.0)".parse::<VersionRange>(),
            Err(VersionError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_range_display_reparses() {
        let range: VersionRange = "(1.0,2.5]".parse().unwrap();
        assert_eq!(range.to_string(), "(1.0.0,2.5.0]");
        assert_eq!(range.to_string().parse::<VersionRange>().unwrap(), range);
    }

    #[test]
    fn test_serde_as_strings() {
        let range: VersionRange = serde_json::from_str("\"[1.0,2.0)\"").unwrap();
        assert!(range.contains(&v("1.9.9")));
        let version: Version = serde_json::from_str("\"1.5\"").unwrap();
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"1.5.0\"");
    }
}
