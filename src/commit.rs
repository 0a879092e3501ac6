//! Staged commits
//!
//! A [`Commit`] holds the pending operations for one section in four
//! buckets. A package name may appear in at most one bucket; [`Commit::merge`]
//! enforces this after every union.

use crate::error::{Error, Result};
use crate::types::{PackageUpload, SectionAddress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::error;

/// Packages to upload, by name
pub type AddAction = BTreeMap<String, PackageUpload>;
/// Packages to delete
pub type DeleteAction = BTreeSet<String>;
/// Packages to copy or move, by name, with their target section
pub type TransferAction = BTreeMap<String, SectionAddress>;

/// The bucket a package name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Upload a new package
    Add,
    /// Delete an existing package
    Delete,
    /// Copy a package to another section
    Copy,
    /// Move a package to another section
    Move,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Copy => "copy",
            Self::Move => "move",
        };
        f.write_str(name)
    }
}

/// Pending operations for one section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Packages to upload
    #[serde(default)]
    pub to_add: AddAction,
    /// Packages to delete
    #[serde(default)]
    pub to_delete: DeleteAction,
    /// Packages to copy, with target section
    #[serde(default)]
    pub to_copy: TransferAction,
    /// Packages to move, with target section
    #[serde(default)]
    pub to_move: TransferAction,
}

/// A partial commit: only the buckets that are `Some` take part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPatch {
    /// Packages to upload
    pub to_add: Option<AddAction>,
    /// Packages to delete
    pub to_delete: Option<DeleteAction>,
    /// Packages to copy
    pub to_copy: Option<TransferAction>,
    /// Packages to move
    pub to_move: Option<TransferAction>,
}

impl CommitPatch {
    /// Patch with only the add bucket
    pub fn add(uploads: AddAction) -> Self {
        Self {
            to_add: Some(uploads),
            ..Self::default()
        }
    }

    /// Patch with only the delete bucket
    pub fn delete<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to_delete: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Patch copying every name to `target`
    pub fn copy<I, S>(names: I, target: &SectionAddress) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to_copy: Some(transfer(names, target)),
            ..Self::default()
        }
    }

    /// Patch moving every name to `target`
    pub fn moves<I, S>(names: I, target: &SectionAddress) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            to_move: Some(transfer(names, target)),
            ..Self::default()
        }
    }
}

fn transfer<I, S>(names: I, target: &SectionAddress) -> TransferAction
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| (name.into(), target.clone()))
        .collect()
}

impl From<Commit> for CommitPatch {
    fn from(commit: Commit) -> Self {
        Self {
            to_add: Some(commit.to_add),
            to_delete: Some(commit.to_delete),
            to_copy: Some(commit.to_copy),
            to_move: Some(commit.to_move),
        }
    }
}

/// Per-bucket counts, for status output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Number of uploads
    pub add: usize,
    /// Number of deletions
    pub delete: usize,
    /// Number of copies
    pub copy: usize,
    /// Number of moves
    pub moves: usize,
}

impl Commit {
    /// Create a commit with empty buckets, overridden by the buckets in `patch`
    pub fn new(patch: CommitPatch) -> Self {
        Self {
            to_add: patch.to_add.unwrap_or_default(),
            to_delete: patch.to_delete.unwrap_or_default(),
            to_copy: patch.to_copy.unwrap_or_default(),
            to_move: patch.to_move.unwrap_or_default(),
        }
    }

    /// Union this commit with `patch`
    ///
    /// Map entries from `patch` replace entries with the same name. Fails
    /// with [`Error::ConflictingActions`] if the result holds a name in more
    /// than one bucket.
    pub fn merge(&self, patch: CommitPatch) -> Result<Self> {
        let mut merged = self.clone();

        if let Some(to_add) = patch.to_add {
            merged.to_add.extend(to_add);
        }
        if let Some(to_delete) = patch.to_delete {
            merged.to_delete.extend(to_delete);
        }
        if let Some(to_copy) = patch.to_copy {
            merged.to_copy.extend(to_copy);
        }
        if let Some(to_move) = patch.to_move {
            merged.to_move.extend(to_move);
        }

        ensure_unique_names(&merged)?;
        Ok(merged)
    }

    /// Whether all buckets are empty
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty()
            && self.to_delete.is_empty()
            && self.to_copy.is_empty()
            && self.to_move.is_empty()
    }

    /// Total number of staged operations
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_delete.len() + self.to_copy.len() + self.to_move.len()
    }

    /// Per-bucket counts
    pub fn summary(&self) -> CommitSummary {
        CommitSummary {
            add: self.to_add.len(),
            delete: self.to_delete.len(),
            copy: self.to_copy.len(),
            moves: self.to_move.len(),
        }
    }

    /// Bucket holding `name`, if any
    pub fn action_of(&self, name: &str) -> Option<ActionType> {
        if self.to_add.contains_key(name) {
            Some(ActionType::Add)
        } else if self.to_delete.contains(name) {
            Some(ActionType::Delete)
        } else if self.to_copy.contains_key(name) {
            Some(ActionType::Copy)
        } else if self.to_move.contains_key(name) {
            Some(ActionType::Move)
        } else {
            None
        }
    }

    /// Remove `name` from whichever bucket holds it
    pub fn remove(&mut self, name: &str) -> Option<ActionType> {
        let action = self.action_of(name)?;
        match action {
            ActionType::Add => {
                self.to_add.remove(name);
            }
            ActionType::Delete => {
                self.to_delete.remove(name);
            }
            ActionType::Copy => {
                self.to_copy.remove(name);
            }
            ActionType::Move => {
                self.to_move.remove(name);
            }
        }
        Some(action)
    }

    /// All staged package names, in bucket order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.to_add
            .keys()
            .chain(self.to_delete.iter())
            .chain(self.to_copy.keys())
            .chain(self.to_move.keys())
            .map(String::as_str)
    }
}

/// Create a commit from a partial one
pub fn create_commit(patch: CommitPatch) -> Commit {
    Commit::new(patch)
}

/// Merge `incoming` into `base`, see [`Commit::merge`]
pub fn merge_commits(base: &Commit, incoming: CommitPatch) -> Result<Commit> {
    base.merge(incoming)
}

pub(crate) fn ensure_unique_names(commit: &Commit) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(commit.len());
    for name in commit.names() {
        let count = seen.entry(name).or_default();
        *count += 1;
        if *count > 1 {
            error!("Package {name} is staged in more than one action");
            return Err(Error::ConflictingActions {
                package: name.to_string(),
            });
        }
    }
    Ok(())
}
