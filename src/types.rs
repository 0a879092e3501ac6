//! Core types for bxt-stage

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root segment of a section path in the virtual file tree
pub const PATH_ROOT: &str = "root";

/// A repository coordinate: branch, repository and architecture
///
/// An empty field means "not set". Only complete sections have a
/// [`SectionKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionAddress {
    /// Branch name (e.g. "stable")
    #[serde(default)]
    pub branch: String,
    /// Repository name (e.g. "core")
    #[serde(default)]
    pub repository: String,
    /// Architecture (e.g. "x86_64")
    #[serde(default)]
    pub architecture: String,
}

impl SectionAddress {
    /// Create a section from its three parts
    pub fn new(
        branch: impl Into<String>,
        repository: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            branch: branch.into(),
            repository: repository.into(),
            architecture: architecture.into(),
        }
    }

    /// Whether all three fields are set
    pub fn is_complete(&self) -> bool {
        !self.branch.is_empty() && !self.repository.is_empty() && !self.architecture.is_empty()
    }

    /// Map key for this section, `None` unless the section is complete
    pub fn key(&self) -> Option<SectionKey> {
        self.is_complete().then(|| SectionKey(self.to_string()))
    }

    /// Path of this section in the virtual file tree
    pub fn to_path(&self) -> [String; 4] {
        [
            PATH_ROOT.to_string(),
            self.branch.clone(),
            self.repository.clone(),
            self.architecture.clone(),
        ]
    }

    /// Inverse of [`SectionAddress::to_path`]
    ///
    /// Returns `None` when the path is shorter than four segments or does
    /// not start at the root.
    pub fn from_path<S: AsRef<str>>(path: &[S]) -> Option<Self> {
        if path.len() < 4 || path[0].as_ref() != PATH_ROOT {
            return None;
        }

        Some(Self::new(
            path[1].as_ref(),
            path[2].as_ref(),
            path[3].as_ref(),
        ))
    }
}

impl fmt::Display for SectionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.branch, self.repository, self.architecture)
    }
}

impl FromStr for SectionAddress {
    type Err = Infallible;

    /// Splits on `/` into three positional fields; extra parts are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let mut next = || parts.next().unwrap_or_default().to_string();
        let branch = next();
        let repository = next();
        let architecture = next();

        Ok(Self {
            branch,
            repository,
            architecture,
        })
    }
}

/// Serialized key of a complete section (`branch/repository/architecture`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(String);

impl SectionKey {
    /// The section this key was built from
    pub fn section(&self) -> SectionAddress {
        match self.0.parse() {
            Ok(section) => section,
            Err(never) => match never {},
        }
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A local file that will be uploaded with a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Local path to the file
    pub path: PathBuf,
}

impl Artifact {
    /// Create an artifact for a local file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name sent in the multipart body
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Local path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A package file staged for upload, plus its detached signature
///
/// File and signature are optional while staging; the encoder refuses to
/// submit an entry that lacks either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUpload {
    /// Package file name
    pub name: String,
    /// Target section
    pub section: SectionAddress,
    /// Package archive
    pub file: Option<Artifact>,
    /// Detached signature
    pub signature: Option<Artifact>,
}

/// Sync status pushed by the server over `/api/ws`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Message type ("sync")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Server-formatted timestamp of the event
    #[serde(default)]
    pub when: String,
    /// Whether a sync is running
    pub started: bool,
}

impl SyncMessage {
    /// Parse a websocket text frame
    pub fn parse(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
