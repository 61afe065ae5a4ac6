//! Common types used across afetch

use crate::error::{AfError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Characters the session refuses in object names.
#[allow(clippy::expect_used)]
static ILLEGAL_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.+\-]").expect("static regex"));

/// Structure file format requested from the AlphaFold database
///
/// `Assembly(n)` is the `pdb<N>` biological-assembly variant. It is served
/// with the `bio` extension but carries PDB-formatted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StructureFormat {
    Pdb,
    Cif,
    Assembly(u32),
}

impl StructureFormat {
    /// Parse a user-supplied format string.
    ///
    /// Accepts exactly `pdb`, `cif`, or `pdb` followed by digits.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pdb" => Ok(Self::Pdb),
            "cif" => Ok(Self::Cif),
            other => {
                let digits = other
                    .strip_prefix("pdb")
                    .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
                    .ok_or_else(|| AfError::InvalidFormat(other.to_string()))?;
                digits
                    .parse()
                    .map(Self::Assembly)
                    .map_err(|_| AfError::InvalidFormat(other.to_string()))
            },
        }
    }

    /// Extension used both in the download URL and in the local file name
    pub fn remote_extension(&self) -> &'static str {
        match self {
            Self::Pdb => "pdb",
            Self::Cif => "cif",
            Self::Assembly(_) => "bio",
        }
    }

    /// Whether the content is PDB text (as opposed to mmCIF)
    pub fn is_pdb_like(&self) -> bool {
        matches!(self, Self::Pdb | Self::Assembly(_))
    }
}

impl std::str::FromStr for StructureFormat {
    type Err = AfError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StructureFormat {
    type Error = AfError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StructureFormat> for String {
    fn from(value: StructureFormat) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureFormat::Pdb => write!(f, "pdb"),
            StructureFormat::Cif => write!(f, "cif"),
            StructureFormat::Assembly(n) => write!(f, "pdb{}", n),
        }
    }
}

/// Check that an identifier can be placed in a URL and a file name.
///
/// Identifiers are otherwise opaque (usually UniProt accessions).
pub fn validate_identifier(code: &str) -> Result<&str> {
    if code.is_empty() {
        return Err(AfError::InvalidIdentifier("identifier is empty".to_string()));
    }
    if code.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(AfError::InvalidIdentifier(format!(
            "'{}' contains whitespace or path separators",
            code
        )));
    }
    Ok(code)
}

/// Turn an arbitrary string into a legal object name.
///
/// Illegal characters become `_`; an empty name becomes `obj`.
pub fn legal_name(name: &str) -> String {
    let cleaned = ILLEGAL_NAME_CHARS.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        "obj".to_string()
    } else {
        cleaned.into_owned()
    }
}
