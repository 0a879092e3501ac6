//! Grouping local files into add entries
//!
//! A set of files handed to `bxt-stage add` is turned into one upload per
//! package. `foo.pkg.tar.zst.sig` becomes the signature of
//! `foo.pkg.tar.zst`; a signature without its package still yields an
//! entry, which the encoder later rejects for its missing file.

use crate::commit::AddAction;
use crate::types::{Artifact, PackageUpload, SectionAddress};
use std::path::PathBuf;
use tracing::debug;

/// Suffix of detached signature files
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// Group `paths` into uploads targeting `section`
pub fn group_artifacts<I, P>(section: &SectionAddress, paths: I) -> AddAction
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut uploads = AddAction::new();

    for path in paths {
        let artifact = Artifact::new(path);
        let file_name = artifact.file_name();
        if file_name.is_empty() {
            continue;
        }

        let (name, is_signature) = match file_name.strip_suffix(SIGNATURE_SUFFIX) {
            Some(stem) if !stem.is_empty() => (stem.to_string(), true),
            _ => (file_name, false),
        };

        let upload = uploads
            .entry(name.clone())
            .or_insert_with(|| PackageUpload {
                name,
                section: section.clone(),
                file: None,
                signature: None,
            });

        if is_signature {
            upload.signature = Some(artifact);
        } else {
            upload.file = Some(artifact);
        }
    }

    debug!("Grouped {} uploads for {section}", uploads.len());
    uploads
}
