use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Category of a state snapshot.
///
/// Objects decide per kind whether (and what) they contribute: user
/// preferences such as colormap settings belong to `Preferences`, window
/// arrangement to `Layout`, loaded data to `Data`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    #[default]
    Preferences,
    Layout,
    Data,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 3] = [Self::Preferences, Self::Layout, Self::Data];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preferences => "preferences",
            Self::Layout => "layout",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownSnapshotKind(s.to_string()))
    }
}
