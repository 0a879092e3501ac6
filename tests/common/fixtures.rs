//! Test data factories for bxt-stage types
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use bxt_stage::commit::{AddAction, CommitPatch};
use bxt_stage::store::CommitStore;
use bxt_stage::types::{Artifact, PackageUpload, SectionAddress};
use std::path::Path;
use tempfile::TempDir;

/// Create a section from `branch/repository/architecture`
pub fn make_section(path: &str) -> SectionAddress {
    match path.parse() {
        Ok(section) => section,
        Err(never) => match never {},
    }
}

/// Create a complete upload with placeholder paths
pub fn make_upload(name: &str, section: &SectionAddress) -> PackageUpload {
    PackageUpload {
        name: name.to_string(),
        section: section.clone(),
        file: Some(Artifact::new(format!("/packages/{name}"))),
        signature: Some(Artifact::new(format!("/packages/{name}.sig"))),
    }
}

/// Create an upload without a signature
pub fn make_unsigned_upload(name: &str, section: &SectionAddress) -> PackageUpload {
    PackageUpload {
        signature: None,
        ..make_upload(name, section)
    }
}

/// Write a package and its signature into `dir`, returning the upload
pub fn make_upload_on_disk(
    dir: &Path,
    name: &str,
    size: usize,
    section: &SectionAddress,
) -> PackageUpload {
    let file = dir.join(name);
    let signature = dir.join(format!("{name}.sig"));
    std::fs::write(&file, vec![b'x'; size]).unwrap();
    std::fs::write(&signature, b"signature").unwrap();

    PackageUpload {
        name: name.to_string(),
        section: section.clone(),
        file: Some(Artifact::new(file)),
        signature: Some(Artifact::new(signature)),
    }
}

/// Add action holding `uploads`
pub fn make_add(uploads: impl IntoIterator<Item = PackageUpload>) -> AddAction {
    uploads.into_iter().map(|u| (u.name.clone(), u)).collect()
}

/// Store with one upload staged in `stable/core/x86_64`
pub fn make_store_with_upload(name: &str) -> CommitStore {
    let section = make_section("stable/core/x86_64");
    let mut store = CommitStore::new();
    store
        .stage(&section, CommitPatch::add(make_add([make_upload(name, &section)])))
        .unwrap();
    store
}

/// Temporary directory for on-disk fixtures
pub fn make_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}
