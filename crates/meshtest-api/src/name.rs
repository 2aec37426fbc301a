use core::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use crate::Error;

/// A valid RFC 1123 DNS label.
///
/// Names are used anywhere a test run has to mint a Kubernetes or cloud
/// resource identifier: namespaces, deployment names, and the prefix shared
/// by a run's traffic-management resources. A `Name` must be non-empty, at
/// most 63 characters, consist of lowercase alphanumeric characters or `-`,
/// and start and end with an alphanumeric character.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(SmolStr);

const MAX_LEN: usize = 63;

impl Name {
    /// Create a `Name` from a static string, panicking if it's invalid.
    ///
    /// Meant for use with string literals. Use the [FromStr] impl to handle
    /// untrusted input.
    pub fn from_static(name: &'static str) -> Self {
        match validate(name) {
            Ok(()) => Self(SmolStr::new_static(name)),
            Err(e) => panic!("invalid name: {e}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::new_static("names must not be empty"));
    }
    if name.len() > MAX_LEN {
        return Err(Error::new_static("names must be 63 characters or fewer")
            .with_input(name));
    }

    let first = name.chars().next().unwrap();
    let last = name.chars().last().unwrap();
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(Error::new_static(
            "names must start and end with an alphanumeric character",
        )
        .with_input(name));
    }

    for c in name.chars() {
        let valid = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
        if !valid {
            return Err(Error::new_static(
                "names may only contain lowercase alphanumeric characters or '-'",
            )
            .with_input(name));
        }
    }

    Ok(())
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)?;
        Ok(Self(SmolStr::new(s)))
    }
}

impl std::ops::Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

struct NameVisitor;

impl<'de> Visitor<'de> for NameVisitor {
    type Value = Name;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a DNS label")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Name::from_str(value).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Name, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(NameVisitor)
    }
}
