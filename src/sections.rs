//! Queries over the server's section listing
//!
//! `GET /api/sections` returns a flat list of sections. These helpers give
//! the distinct values at each level of the branch/repository/architecture
//! tree and check user input against it.

use crate::error::{Error, Result};
use crate::types::SectionAddress;
use std::collections::BTreeSet;

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct branches, sorted
pub fn branches(sections: &[SectionAddress]) -> Vec<String> {
    distinct(sections.iter().map(|s| s.branch.as_str()))
}

/// Distinct repositories on `branch`, sorted
pub fn repositories(sections: &[SectionAddress], branch: &str) -> Vec<String> {
    distinct(
        sections
            .iter()
            .filter(|s| s.branch == branch)
            .map(|s| s.repository.as_str()),
    )
}

/// Distinct architectures of `branch/repository`, sorted
pub fn architectures(sections: &[SectionAddress], branch: &str, repository: &str) -> Vec<String> {
    distinct(
        sections
            .iter()
            .filter(|s| s.branch == branch && s.repository == repository)
            .map(|s| s.architecture.as_str()),
    )
}

/// Fail unless `section` is complete and present in `sections`
pub fn ensure_section_exists(sections: &[SectionAddress], section: &SectionAddress) -> Result<()> {
    if !section.is_complete() {
        return Err(Error::IncompleteSection(section.to_string()));
    }
    if sections.contains(section) {
        Ok(())
    } else {
        Err(Error::SectionNotFound(section.to_string()))
    }
}
