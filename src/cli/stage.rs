//! Staging commands: add, delete, copy, move, unstage, clear

use crate::cli::style::{Stylize, arrow, check};
use crate::cli::{connect, open_state, persist_session};
use anstream::{eprintln, println};
use bxt_stage::backend::BackendService;
use bxt_stage::commit::{ActionType, CommitPatch};
use bxt_stage::config::Config;
use bxt_stage::error::{Error, Result};
use bxt_stage::sections::ensure_section_exists;
use bxt_stage::stage::group_artifacts;
use bxt_stage::state::StateDir;
use bxt_stage::store::CommitStore;
use bxt_stage::types::SectionAddress;
use std::path::PathBuf;
use tracing::debug;

/// Parse a `branch/repository/architecture` argument
fn parse_section(raw: &str) -> Result<SectionAddress> {
    let section: SectionAddress = match raw.parse() {
        Ok(section) => section,
        Err(never) => match never {},
    };
    if section.is_complete() {
        Ok(section)
    } else {
        Err(Error::IncompleteSection(raw.to_string()))
    }
}

/// Check `sections` against the server listing when logged in
async fn validate_sections(
    config: &Config,
    state: &StateDir,
    sections: &[&SectionAddress],
) -> Result<()> {
    let (backend, source) = match connect(config, state) {
        Ok(connected) => connected,
        Err(Error::NotLoggedIn) => {
            eprintln!("{}", "Not logged in, sections not checked".warn());
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let listing = backend.list_sections().await?;
    persist_session(state, &backend, source)?;
    for section in sections {
        ensure_section_exists(&listing, section)?;
    }
    debug!("Validated {} sections", sections.len());
    Ok(())
}

/// Move `names` out of any bucket other than `action` so the patch merges
fn route_names(
    store: &mut CommitStore,
    section: &SectionAddress,
    names: &[String],
    action: ActionType,
) -> Result<()> {
    for name in names {
        let current = store.get(section).and_then(|c| c.action_of(name));
        if let Some(current) = current.filter(|a| *a != action) {
            store.unstage_package(section, name)?;
            println!(
                "  {} {} was staged for {current}, now {action}",
                "~".warn().for_stdout(),
                name.accent()
            );
        }
    }
    Ok(())
}

/// Load the store, apply `patch` to `section` and save it
fn stage_patch(
    state: &StateDir,
    section: &SectionAddress,
    names: &[String],
    action: ActionType,
    patch: CommitPatch,
) -> Result<()> {
    let mut store = state.load_store()?;
    route_names(&mut store, section, names, action)?;
    store.stage(section, patch)?;
    state.save_store(&store)
}

/// Stage package files for upload into `section`
pub async fn run_add(config: &Config, section: &str, files: &[PathBuf]) -> Result<()> {
    let section = parse_section(section)?;
    // Absolute but not canonical: a symlink keeps its own file name
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        if !file.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", file.display()),
            )));
        }
        paths.push(std::path::absolute(file)?);
    }

    let state = open_state(config)?;
    validate_sections(config, &state, &[&section]).await?;

    let uploads = group_artifacts(&section, paths);
    let names: Vec<String> = uploads.keys().cloned().collect();
    for upload in uploads.values() {
        let note = match (&upload.file, &upload.signature) {
            (Some(_), Some(_)) => String::new(),
            (Some(_), None) => format!(" {}", "(no signature)".warn().for_stdout()),
            (None, _) => format!(" {}", "(signature only)".warn().for_stdout()),
        };
        println!("  {} {}{note}", "+".success(), upload.name.accent());
    }

    stage_patch(
        &state,
        &section,
        &names,
        ActionType::Add,
        CommitPatch::add(uploads),
    )?;
    println!("{} Staged {} uploads for {}", check(), names.len(), section.accent());
    Ok(())
}

/// Stage deletion of `names` from `section`
pub async fn run_delete(config: &Config, section: &str, names: &[String]) -> Result<()> {
    let section = parse_section(section)?;
    let state = open_state(config)?;
    validate_sections(config, &state, &[&section]).await?;

    stage_patch(
        &state,
        &section,
        names,
        ActionType::Delete,
        CommitPatch::delete(names.iter().cloned()),
    )?;
    println!(
        "{} Staged {} deletions in {}",
        check(),
        names.len(),
        section.accent()
    );
    Ok(())
}

/// Stage a copy of `names` from `from` to `to`
pub async fn run_copy(config: &Config, from: &str, to: &str, names: &[String]) -> Result<()> {
    run_transfer(config, from, to, names, ActionType::Copy).await
}

/// Stage a move of `names` from `from` to `to`
pub async fn run_move(config: &Config, from: &str, to: &str, names: &[String]) -> Result<()> {
    run_transfer(config, from, to, names, ActionType::Move).await
}

async fn run_transfer(
    config: &Config,
    from: &str,
    to: &str,
    names: &[String],
    action: ActionType,
) -> Result<()> {
    let from = parse_section(from)?;
    let to = parse_section(to)?;
    let state = open_state(config)?;
    validate_sections(config, &state, &[&from, &to]).await?;

    let patch = if action == ActionType::Move {
        CommitPatch::moves(names.iter().cloned(), &to)
    } else {
        CommitPatch::copy(names.iter().cloned(), &to)
    };
    stage_patch(&state, &from, names, action, patch)?;

    println!(
        "{} Staged {action} of {} packages: {} {} {}",
        check(),
        names.len(),
        from.accent(),
        arrow(),
        to.accent()
    );
    Ok(())
}

/// Remove packages (or the whole section when `names` is empty) from the staging area
pub fn run_unstage(config: &Config, section: &str, names: &[String]) -> Result<()> {
    let section = parse_section(section)?;
    let state = open_state(config)?;
    let mut store = state.load_store()?;

    if names.is_empty() {
        if store.get(&section).is_none() {
            return Err(Error::PackageNotStaged(format!("nothing in {section}")));
        }
        store.delete_commit(&section);
        println!("{} Unstaged everything in {}", check(), section.accent());
    } else {
        for name in names {
            store.unstage_package(&section, name)?;
        }
        println!(
            "{} Unstaged {} packages from {}",
            check(),
            names.len(),
            section.accent()
        );
    }

    state.save_store(&store)
}

/// Drop every staged commit
pub fn run_clear(config: &Config) -> Result<()> {
    let state = open_state(config)?;
    let mut store = state.load_store()?;
    let count = store.len();
    store.clear_commits();
    state.save_store(&store)?;

    println!("{} Cleared {count} staged commits", check());
    Ok(())
}
