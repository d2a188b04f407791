//! Configuration document version marker
//!
//! A document may carry `version = "2"` (or `"2.1"`). The topology layer
//! refuses documents whose marker is incompatible with the host, so that a
//! document written for a different generation of the format fails loudly
//! instead of assembling something subtly wrong.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Parsed `version` marker from a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentVersion {
    major: u32,
    minor: Option<u32>,
}

impl DocumentVersion {
    /// The format version this host writes and reads natively
    pub const CURRENT: DocumentVersion = DocumentVersion {
        major: 2,
        minor: Some(0),
    };

    /// Create a version with major component only
    pub const fn new(major: u32) -> Self {
        Self { major, minor: None }
    }

    /// Create a version with major and minor components
    pub const fn with_minor(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
        }
    }

    /// Major component
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor component, when the document specified one
    pub fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// Whether a document at this version can be handled by `current`
    ///
    /// Majors must match exactly; a declared minor must not exceed the
    /// current minor. A document declaring only a major is compatible with
    /// any minor of that major.
    pub fn compatible_with(&self, current: &DocumentVersion) -> bool {
        if self.major != current.major {
            return false;
        }
        match self.minor {
            None => true,
            Some(minor) => minor <= current.minor.unwrap_or(0),
        }
    }
}

impl FromStr for DocumentVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidVersion {
            value: s.to_string(),
        };

        match s.split_once('.') {
            None => {
                let major = s.trim().parse().map_err(|_| invalid())?;
                Ok(Self::new(major))
            }
            Some((major, minor)) => {
                let major = major.trim().parse().map_err(|_| invalid())?;
                let minor = minor.trim().parse().map_err(|_| invalid())?;
                Ok(Self::with_minor(major, minor))
            }
        }
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}
