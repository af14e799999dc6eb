//! Command addressing and parameter parsing.
//!
//! Object commands are written `<ClassName>:<id>.<command>`, e.g.
//! `ColorState:c3.setGamma`. Their parameters use the `key:value,key:value`
//! convention, e.g. `red:0.5,green:1,blue:1`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use carta_types::ObjectId;

use crate::error::{RegistryError, RegistryResult};

/// Registry-level command creating an object; parameters name the class.
pub const CREATE_OBJECT: &str = "CreateObject";

/// Registry-level command destroying an object; parameters name the ID.
pub const DESTROY_OBJECT: &str = "DestroyObject";

/// A parsed `<ClassName>:<id>.<command>` address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandAddress {
    pub class_name: String,
    pub id: String,
    pub command: String,
}

impl CommandAddress {
    pub fn new(class_name: &str, id: ObjectId, command: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            id: id.to_string(),
            command: command.to_string(),
        }
    }

    /// Split a fully-qualified command into its parts.
    pub fn parse(text: &str) -> RegistryResult<Self> {
        let malformed = || RegistryError::MalformedCommand(text.to_string());
        let (class_name, rest) = text.split_once(':').ok_or_else(malformed)?;
        let (id, command) = rest.split_once('.').ok_or_else(malformed)?;
        if class_name.is_empty() || id.is_empty() || command.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            class_name: class_name.to_string(),
            id: id.to_string(),
            command: command.to_string(),
        })
    }
}

impl fmt::Display for CommandAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.class_name, self.id, self.command)
    }
}

impl FromStr for CommandAddress {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `key:value` pairs and require every key in `required`.
///
/// Keys and values are trimmed. Keys not listed in `required` are kept.
pub fn parse_params(parameters: &str, required: &[&str]) -> RegistryResult<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in parameters.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once(':').ok_or_else(|| RegistryError::InvalidParameter {
            name: pair.to_string(),
            reason: "expected key:value".into(),
        })?;
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    if let Some(missing) = required.iter().find(|key| !map.contains_key(**key)) {
        return Err(RegistryError::MissingParameter {
            name: missing.to_string(),
        });
    }
    Ok(map)
}

/// Look up and convert one parsed parameter.
pub fn param<T>(params: &BTreeMap<String, String>, name: &str) -> RegistryResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = params.get(name).ok_or_else(|| RegistryError::MissingParameter {
        name: name.to_string(),
    })?;
    raw.parse().map_err(|e: T::Err| RegistryError::InvalidParameter {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
