//! Node identity and naming.

use convert_case::{Case, Casing};
use slotmap::new_key_type;

use crate::{Result, error};

new_key_type! {
    /// Arena key for a widget node.
    pub struct NodeId;

    /// Arena key for a surface.
    pub struct SurfaceId;
}

/// Is this a character valid in a node name?
pub fn valid_nodename_char(c: char) -> bool {
    (c.is_ascii_lowercase() || c.is_ascii_digit()) || c == '_'
}

/// Is this a valid node name?
pub fn valid_nodename(name: &str) -> bool {
    !name.is_empty() && name.chars().all(valid_nodename_char)
}

/// A node name, which consists of lowercase ASCII alphanumeric characters,
/// plus underscores. Used for debug dumps and widget factory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName {
    name: String,
}

impl NodeName {
    /// Create a new NodeName, returning an error if the string contains
    /// invalid characters.
    fn new(name: &str) -> Result<Self> {
        if !valid_nodename(name) {
            return Err(error::Error::Invalid(name.into()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Takes a string and munges it into a valid node name. It does this by
    /// first converting the string to snake case, then removing all invalid
    /// characters.
    pub fn convert(name: &str) -> Self {
        let name = name.to_case(Case::Snake);
        Self {
            name: name.chars().filter(|x| valid_nodename_char(*x)).collect(),
        }
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq<&str> for NodeName {
    fn eq(&self, other: &&str) -> bool {
        self.name == *other
    }
}

impl PartialEq<String> for NodeName {
    fn eq(&self, other: &String) -> bool {
        self.name == *other
    }
}

/// Converts a string into the standard node name format, and errors if it
/// doesn't comply to the node name standard.
impl TryFrom<&str> for NodeName {
    type Error = error::Error;
    fn try_from(name: &str) -> Result<Self> {
        Self::new(name)
    }
}
