use core::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// A container image reference: `[registry/]repository[:tag][@digest]`.
///
/// References are treated as opaque by the driver - they're handed straight
/// to a workload runner - but they're validated enough at the configuration
/// boundary to catch the easy mistakes: empty strings, whitespace, a
/// malformed digest, or a doubled tag.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    reference: String,

    // byte offsets into `reference`, found once at parse time.
    tag_at: Option<usize>,
    digest_at: Option<usize>,
}

impl ImageRef {
    /// The repository part of the reference, without any tag or digest.
    pub fn repository(&self) -> &str {
        let end = self
            .tag_at
            .or(self.digest_at)
            .unwrap_or(self.reference.len());
        &self.reference[..end]
    }

    /// The tag, without the leading `:`.
    pub fn tag(&self) -> Option<&str> {
        let start = self.tag_at?;
        let end = self.digest_at.unwrap_or(self.reference.len());
        Some(&self.reference[start + 1..end])
    }

    /// The digest, without the leading `@`.
    pub fn digest(&self) -> Option<&str> {
        let start = self.digest_at?;
        Some(&self.reference[start + 1..])
    }

    pub fn as_str(&self) -> &str {
        &self.reference
    }
}

impl FromStr for ImageRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::new_static("image references must not be empty"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(
                Error::new_static("image references must not contain whitespace")
                    .with_input(s),
            );
        }

        let digest_at = s.find('@');
        let name = &s[..digest_at.unwrap_or(s.len())];

        if let Some(at) = digest_at {
            let digest = &s[at + 1..];
            // digests are always algorithm-prefixed, e.g. "sha256:abc..."
            match digest.split_once(':') {
                Some((algo, hex)) if !algo.is_empty() && !hex.is_empty() => {}
                _ => {
                    return Err(Error::new_static(
                        "image digests must have the form `algorithm:encoded`",
                    )
                    .with_input(s))
                }
            }
        }

        // a `:` after the last path separator is a tag. a `:` before it is a
        // registry port and doesn't count.
        let tag_at = match (name.rfind(':'), name.rfind('/')) {
            (Some(i), Some(slash)) if i > slash => Some(i),
            (Some(i), None) => Some(i),
            _ => None,
        };

        if let Some(at) = tag_at {
            let tag = &name[at + 1..];
            if tag.is_empty() || tag.contains(':') {
                return Err(Error::new_static("invalid image tag").with_input(s));
            }
        }

        if name[..tag_at.unwrap_or(name.len())].is_empty() {
            return Err(Error::new_static("image references must name a repository")
                .with_input(s));
        }

        Ok(Self {
            reference: s.to_string(),
            tag_at,
            digest_at,
        })
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reference)
    }
}

impl std::fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reference)
    }
}

impl Serialize for ImageRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.reference)
    }
}

struct ImageRefVisitor;

impl<'de> Visitor<'de> for ImageRefVisitor {
    type Value = ImageRef;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a container image reference")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        ImageRef::from_str(value).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D>(deserializer: D) -> Result<ImageRef, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ImageRefVisitor)
    }
}

/// One bootstrap-generator version under test: a human-readable label and
/// the image reference that a client runner should inject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub label: String,
    pub image: ImageRef,
}

impl MatrixEntry {
    pub fn new(label: impl Into<String>, image: ImageRef) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

impl std::fmt::Display for MatrixEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.image)
    }
}

/// The ordered list of bootstrap-generator versions a run tests.
///
/// Order determines reporting order, nothing else. A matrix must contain at
/// least one entry: an empty version list is a configuration mistake, and
/// it's caught here rather than silently producing a run that tests nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MatrixEntry>", into = "Vec<MatrixEntry>")]
pub struct VersionMatrix(Vec<MatrixEntry>);

impl VersionMatrix {
    pub fn new(entries: Vec<MatrixEntry>) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::new_static(
                "a version matrix must contain at least one entry",
            ));
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[MatrixEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<MatrixEntry>> for VersionMatrix {
    type Error = Error;

    fn try_from(entries: Vec<MatrixEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<VersionMatrix> for Vec<MatrixEntry> {
    fn from(matrix: VersionMatrix) -> Self {
        matrix.0
    }
}

impl<'a> IntoIterator for &'a VersionMatrix {
    type Item = &'a MatrixEntry;
    type IntoIter = std::slice::Iter<'a, MatrixEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
