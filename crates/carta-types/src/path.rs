use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Absolute, slash-delimited location of an object (e.g. `/CartaObjects/c3`).
///
/// Paths reflect creation hierarchy: a top-level object lives directly under
/// the registry root and a child object lives under its parent's path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// A single-segment path, used for the registry root.
    pub fn root(name: &str) -> Result<Self, TypeError> {
        validate_segment(name, name)?;
        Ok(Self(format!("{SEPARATOR}{name}")))
    }

    /// Append a segment.
    pub fn join(&self, segment: &str) -> Result<Self, TypeError> {
        let joined = format!("{}{SEPARATOR}{segment}", self.0);
        validate_segment(segment, &joined)?;
        Ok(Self(joined))
    }

    /// The path with its last segment removed, or `None` for a root path.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.0.rfind(SEPARATOR)?;
        if idx == 0 {
            return None;
        }
        Some(Self(self.0[..idx].to_string()))
    }

    /// Iterate segments from the root down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[1..].split(SEPARATOR)
    }

    /// The final segment.
    pub fn last(&self) -> &str {
        self.segments().last().unwrap_or_default()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns `true` if `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &ObjectPath) -> bool {
        match self.0.strip_prefix(&other.0) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_segment(segment: &str, path: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if segment.is_empty() {
        return Err(invalid("segments must not be empty"));
    }
    if segment.contains(SEPARATOR) {
        return Err(invalid("segment must not contain '/'"));
    }
    if segment.chars().any(char::is_whitespace) {
        return Err(invalid("segment must not contain whitespace"));
    }
    Ok(())
}

impl fmt::Debug for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPath({})", self.0)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(SEPARATOR).ok_or_else(|| TypeError::InvalidPath {
            path: s.to_string(),
            reason: "path must start with '/'".into(),
        })?;
        for segment in rest.split(SEPARATOR) {
            validate_segment(segment, s)?;
        }
        Ok(Self(s.to_string()))
    }
}

impl Serialize for ObjectPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
