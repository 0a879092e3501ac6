//! Status command - show the staging area

use crate::cli::open_state;
use crate::cli::style::{Stylize, arrow};
use anstream::println;
use bxt_stage::commit::Commit;
use bxt_stage::config::Config;
use bxt_stage::error::Result;

/// Print every staged commit
pub fn run_status(config: &Config) -> Result<()> {
    let state = open_state(config)?;
    let store = state.load_store()?;

    if store.is_empty() {
        println!("{}", "Nothing staged".muted());
        return Ok(());
    }

    for staged in &store {
        let summary = staged.commit.summary();
        println!(
            "{} {}",
            staged.key.emphasis(),
            format!(
                "(+{} -{} copy {} move {})",
                summary.add, summary.delete, summary.copy, summary.moves
            )
            .muted()
        );
        print_commit(&staged.commit);
        println!();
    }

    println!(
        "{} sections staged, run {} to submit",
        store.len().accent(),
        "bxt-stage push".accent()
    );
    Ok(())
}

fn print_commit(commit: &Commit) {
    for (name, upload) in &commit.to_add {
        let missing = match (&upload.file, &upload.signature) {
            (Some(_), Some(_)) => String::new(),
            (None, Some(_)) => format!(" {}", "missing package file".warn().for_stdout()),
            (Some(_), None) => format!(" {}", "missing signature".warn().for_stdout()),
            (None, None) => format!(" {}", "missing files".warn().for_stdout()),
        };
        println!("  {} {}{missing}", "+".success(), name);
    }
    for name in &commit.to_delete {
        println!("  {} {}", "-".error().for_stdout(), name);
    }
    for (name, target) in &commit.to_copy {
        println!("  {} {} {} {}", "c".accent(), name, arrow(), target.muted());
    }
    for (name, target) in &commit.to_move {
        println!("  {} {} {} {}", "m".accent(), name, arrow(), target.muted());
    }
}
