//! Commit encoding
//!
//! Turns a [`CommitStore`] into the multipart body of
//! `POST /api/packages/commit`. Uploads become indexed file fields
//! (`package{i}.filepath`, `package{i}.signature`, `package{i}.section`);
//! deletions, copies and moves are batched into the JSON arrays
//! `to_delete`, `to_copy` and `to_move`.

use crate::error::{Error, Result};
use crate::store::CommitStore;
use crate::types::{Artifact, PackageUpload, SectionAddress};
use serde::Serialize;
use tracing::debug;

/// Field holding the JSON array of deletions
pub const TO_DELETE_FIELD: &str = "to_delete";
/// Field holding the JSON array of copies
pub const TO_COPY_FIELD: &str = "to_copy";
/// Field holding the JSON array of moves
pub const TO_MOVE_FIELD: &str = "to_move";

/// One field of the multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPart {
    /// Binary file field
    File {
        /// Form field name
        field: String,
        /// File to stream
        artifact: Artifact,
    },
    /// Text field
    Text {
        /// Form field name
        field: String,
        /// Field value
        value: String,
    },
}

impl PayloadPart {
    /// Form field name
    pub fn field(&self) -> &str {
        match self {
            Self::File { field, .. } | Self::Text { field, .. } => field,
        }
    }
}

/// Encoded commit request, parts in send order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    /// Form parts
    pub parts: Vec<PayloadPart>,
    /// Number of uploaded packages
    pub package_count: usize,
}

impl SubmissionPayload {
    /// Value of a text field
    pub fn text(&self, field: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            PayloadPart::Text { field: f, value } if f == field => Some(value.as_str()),
            _ => None,
        })
    }

    /// Artifact of a file field
    pub fn file(&self, field: &str) -> Option<&Artifact> {
        self.parts.iter().find_map(|part| match part {
            PayloadPart::File { field: f, artifact } if f == field => Some(artifact),
            _ => None,
        })
    }

    /// All field names in send order
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(PayloadPart::field).collect()
    }

    /// File artifacts in send order
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.parts.iter().filter_map(|part| match part {
            PayloadPart::File { artifact, .. } => Some(artifact),
            PayloadPart::Text { .. } => None,
        })
    }
}

#[derive(Serialize)]
struct DeleteEntry<'a> {
    name: &'a str,
    section: SectionAddress,
}

#[derive(Serialize)]
struct TransferEntry<'a> {
    name: &'a str,
    from_section: SectionAddress,
    to_section: &'a SectionAddress,
}

/// Encode every staged commit into a single request payload
///
/// Fails with [`Error::MissingFields`] on the first upload lacking a file,
/// a signature or a section field. No partial payload is returned.
pub fn encode(store: &CommitStore) -> Result<SubmissionPayload> {
    let mut parts = Vec::new();
    let mut index = 0;

    let mut to_delete = Vec::new();
    let mut to_copy = Vec::new();
    let mut to_move = Vec::new();

    for staged in store {
        let origin = staged.section();
        let commit = &staged.commit;

        for (name, upload) in &commit.to_add {
            let (file, signature) = validate_upload(name, upload)?;
            index += 1;
            parts.push(PayloadPart::File {
                field: format!("package{index}.filepath"),
                artifact: file.clone(),
            });
            parts.push(PayloadPart::File {
                field: format!("package{index}.signature"),
                artifact: signature.clone(),
            });
            parts.push(PayloadPart::Text {
                field: format!("package{index}.section"),
                value: serde_json::to_string(&upload.section)?,
            });
        }

        to_delete.extend(commit.to_delete.iter().map(|name| DeleteEntry {
            name,
            section: origin.clone(),
        }));
        to_copy.extend(commit.to_copy.iter().map(|(name, target)| TransferEntry {
            name,
            from_section: origin.clone(),
            to_section: target,
        }));
        to_move.extend(commit.to_move.iter().map(|(name, target)| TransferEntry {
            name,
            from_section: origin.clone(),
            to_section: target,
        }));
    }

    debug!(
        "Encoded {index} uploads, {} deletions, {} copies, {} moves",
        to_delete.len(),
        to_copy.len(),
        to_move.len()
    );

    parts.push(PayloadPart::Text {
        field: TO_DELETE_FIELD.to_string(),
        value: serde_json::to_string(&to_delete)?,
    });
    parts.push(PayloadPart::Text {
        field: TO_COPY_FIELD.to_string(),
        value: serde_json::to_string(&to_copy)?,
    });
    parts.push(PayloadPart::Text {
        field: TO_MOVE_FIELD.to_string(),
        value: serde_json::to_string(&to_move)?,
    });

    Ok(SubmissionPayload {
        parts,
        package_count: index,
    })
}

fn validate_upload<'a>(
    name: &str,
    upload: &'a PackageUpload,
) -> Result<(&'a Artifact, &'a Artifact)> {
    let mut missing = Vec::new();
    if upload.file.is_none() {
        missing.push("package file");
    }
    if upload.signature.is_none() {
        missing.push("signature file");
    }
    if upload.section.branch.is_empty() {
        missing.push("branch");
    }
    if upload.section.repository.is_empty() {
        missing.push("repository");
    }
    if upload.section.architecture.is_empty() {
        missing.push("architecture");
    }

    match (&upload.file, &upload.signature) {
        (Some(file), Some(signature)) if missing.is_empty() => Ok((file, signature)),
        _ => Err(Error::MissingFields {
            package: name.to_string(),
            fields: missing,
        }),
    }
}
