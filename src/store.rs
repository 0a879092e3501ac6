//! Staging area: one commit per target section

use crate::commit::{Commit, CommitPatch, ensure_unique_names};
use crate::error::{Error, Result};
use crate::types::{SectionAddress, SectionKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A commit together with the section it targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedCommit {
    /// Section key
    pub key: SectionKey,
    /// Pending operations
    pub commit: Commit,
}

impl StagedCommit {
    /// Section this commit targets
    pub fn section(&self) -> SectionAddress {
        self.key.section()
    }
}

/// Pending commits by section, in the order sections were first staged
///
/// Commits are never stored empty. Loading rejects entries that [`CommitStore::stage`] could never produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StagedCommit>", into = "Vec<StagedCommit>")]
pub struct CommitStore {
    entries: Vec<StagedCommit>,
}

impl TryFrom<Vec<StagedCommit>> for CommitStore {
    type Error = Error;

    fn try_from(entries: Vec<StagedCommit>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.section().key().as_ref() != Some(&entry.key) {
                return Err(Error::IncompleteSection(entry.key.to_string()));
            }
            if !seen.insert(&entry.key) {
                return Err(Error::Parse(format!("{} is staged twice", entry.key)));
            }
            if entry.commit.is_empty() {
                return Err(Error::Parse(format!("empty commit for {}", entry.key)));
            }
            ensure_unique_names(&entry.commit)?;
        }
        Ok(Self { entries })
    }
}

impl From<CommitStore> for Vec<StagedCommit> {
    fn from(store: CommitStore) -> Self {
        store.entries
    }
}

impl CommitStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the commit for `section`, replacing any previous one
    ///
    /// An empty commit removes the section instead.
    pub fn add_commit(&mut self, section: &SectionAddress, commit: Commit) -> Result<()> {
        let key = require_key(section)?;

        if commit.is_empty() {
            self.remove_key(&key);
            return Ok(());
        }

        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.commit = commit;
        } else {
            debug!("Staging new commit for {key}");
            self.entries.push(StagedCommit { key, commit });
        }
        Ok(())
    }

    /// Remove the commit for `section`; no-op if absent
    pub fn delete_commit(&mut self, section: &SectionAddress) {
        if let Some(key) = section.key() {
            self.remove_key(&key);
        }
    }

    /// Remove every commit
    pub fn clear_commits(&mut self) {
        self.entries.clear();
    }

    /// Merge `patch` into the commit for `section` and store the result
    ///
    /// On a merge failure the store is left unchanged.
    pub fn stage(&mut self, section: &SectionAddress, patch: CommitPatch) -> Result<()> {
        let merged = match self.get(section) {
            Some(existing) => existing.merge(patch)?,
            None => Commit::default().merge(patch)?,
        };
        self.add_commit(section, merged)
    }

    /// Drop one package from the commit for `section`
    pub fn unstage_package(&mut self, section: &SectionAddress, name: &str) -> Result<()> {
        let mut commit = self
            .get(section)
            .cloned()
            .ok_or_else(|| Error::PackageNotStaged(format!("{name} in {section}")))?;

        if commit.remove(name).is_none() {
            return Err(Error::PackageNotStaged(format!("{name} in {section}")));
        }
        self.add_commit(section, commit)
    }

    /// Commit for `section`
    pub fn get(&self, section: &SectionAddress) -> Option<&Commit> {
        let key = section.key()?;
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.commit)
    }

    /// Number of sections with pending commits
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Staged commits in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StagedCommit> {
        self.entries.iter()
    }

    fn remove_key(&mut self, key: &SectionKey) {
        self.entries.retain(|e| &e.key != key);
    }
}

impl<'a> IntoIterator for &'a CommitStore {
    type Item = &'a StagedCommit;
    type IntoIter = std::slice::Iter<'a, StagedCommit>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn require_key(section: &SectionAddress) -> Result<SectionKey> {
    section
        .key()
        .ok_or_else(|| Error::IncompleteSection(section.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SectionAddress {
        SectionAddress::new("stable", "core", "x86_64")
    }

    fn extra() -> SectionAddress {
        SectionAddress::new("stable", "extra", "x86_64")
    }

    #[test]
    fn test_add_replaces_existing() {
        let mut store = CommitStore::new();
        store
            .add_commit(&core(), Commit::new(CommitPatch::delete(["foo"])))
            .unwrap();
        store
            .add_commit(&core(), Commit::new(CommitPatch::delete(["bar"])))
            .unwrap();

        assert_eq!(store.len(), 1);
        let commit = store.get(&core()).unwrap();
        assert!(commit.to_delete.contains("bar"));
        assert!(!commit.to_delete.contains("foo"));
    }

    #[test]
    fn test_empty_commit_is_not_stored() {
        let mut store = CommitStore::new();
        store.add_commit(&core(), Commit::default()).unwrap();
        assert!(store.is_empty());

        store
            .add_commit(&core(), Commit::new(CommitPatch::delete(["foo"])))
            .unwrap();
        store.add_commit(&core(), Commit::default()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_incomplete_section_rejected() {
        let mut store = CommitStore::new();
        let err = store
            .add_commit(
                &SectionAddress::new("stable", "", "x86_64"),
                Commit::new(CommitPatch::delete(["foo"])),
            )
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteSection(_)));
    }

    #[test]
    fn test_delete_and_clear() {
        let mut store = CommitStore::new();
        store.stage(&core(), CommitPatch::delete(["foo"])).unwrap();
        store.stage(&extra(), CommitPatch::delete(["bar"])).unwrap();

        store.delete_commit(&SectionAddress::new("nope", "nope", "nope"));
        assert_eq!(store.len(), 2);

        store.delete_commit(&core());
        assert_eq!(store.len(), 1);
        assert!(store.get(&core()).is_none());

        store.clear_commits();
        assert!(store.is_empty());
    }

    #[test]
    fn test_stage_accumulates_and_keeps_order() {
        let mut store = CommitStore::new();
        store.stage(&extra(), CommitPatch::delete(["a"])).unwrap();
        store.stage(&core(), CommitPatch::delete(["b"])).unwrap();
        store
            .stage(&extra(), CommitPatch::copy(["c"], &core()))
            .unwrap();

        let keys: Vec<_> = store.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, ["stable/extra/x86_64", "stable/core/x86_64"]);
        assert_eq!(store.get(&extra()).unwrap().len(), 2);
    }

    #[test]
    fn test_stage_conflict_leaves_store_untouched() {
        let mut store = CommitStore::new();
        store.stage(&core(), CommitPatch::delete(["foo"])).unwrap();
        let before = store.clone();

        assert!(store.stage(&core(), CommitPatch::moves(["foo"], &extra())).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_unstage_last_package_drops_section() {
        let mut store = CommitStore::new();
        store.stage(&core(), CommitPatch::delete(["foo"])).unwrap();

        assert!(store.unstage_package(&core(), "bar").is_err());
        store.unstage_package(&core(), "foo").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut store = CommitStore::new();
        store.stage(&extra(), CommitPatch::delete(["a"])).unwrap();
        store.stage(&core(), CommitPatch::delete(["b"])).unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let back: CommitStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn test_load_rejects_duplicate_sections() {
        let json = r#"[
            {"key": "stable/core/x86_64", "commit": {"to_delete": ["a"]}},
            {"key": "stable/core/x86_64", "commit": {"to_delete": ["b"]}}
        ]"#;
        let err = serde_json::from_str::<CommitStore>(json).unwrap_err();
        assert!(err.to_string().contains("staged twice"), "{err}");
    }

    #[test]
    fn test_load_rejects_empty_commit() {
        let json = r#"[{"key": "stable/core/x86_64", "commit": {}}]"#;
        let err = serde_json::from_str::<CommitStore>(json).unwrap_err();
        assert!(err.to_string().contains("empty commit"), "{err}");
    }

    #[test]
    fn test_load_rejects_incomplete_key() {
        let json = r#"[{"key": "stable//x86_64", "commit": {"to_delete": ["a"]}}]"#;
        let err = serde_json::from_str::<CommitStore>(json).unwrap_err();
        assert!(err.to_string().contains("incomplete section"), "{err}");
    }

    #[test]
    fn test_load_rejects_name_in_two_buckets() {
        let json = r#"[{
            "key": "stable/core/x86_64",
            "commit": {
                "to_delete": ["foo"],
                "to_move": {"foo": {"branch": "testing", "repository": "core", "architecture": "x86_64"}}
            }
        }]"#;
        let err = serde_json::from_str::<CommitStore>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate package name: foo"), "{err}");
    }
}
