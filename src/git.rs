use std::fs;
use std::path::Path;

use thiserror;

use crate::github;
use crate::summary::BatchSummary;


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("clone error")]
    Git(#[from] git2::Error),
}


/// Per-repository result of `clone_or_skip`.
#[derive(Debug)]
pub enum Outcome {
    Cloned,
    Skipped,
    Failed(anyhow::Error),
}


/// Clone the repository at `url` into `path`, including a working tree.
pub fn clone<P: AsRef<Path>>(url: &str, path: P) -> Result<(), Error> {
    git2::Repository::clone(url, path)?;

    Ok(())
}

/// Clone `repo` into `clone_dir/<name>` unless that directory already
/// exists.
///
/// A clone failure is reported and contained in the returned outcome so
/// the rest of a batch can proceed.
pub fn clone_or_skip(repo: &github::Repo, clone_dir: &Path) -> Outcome {
    let target = clone_dir.join(&repo.name);

    if target.exists() {
        println!("{} already exists, skipping...", repo.name);

        return Outcome::Skipped;
    }

    println!("Cloning {}...", repo.name);

    match clone(&repo.clone_url, &target) {
        Ok(()) => {
            println!("Finished cloning {}", repo.name);

            Outcome::Cloned
        },
        Err(e) => {
            // A half-fetched target must not be mistaken for a finished
            // clone on the next run.
            let _ = fs::remove_dir_all(&target);

            let error = anyhow::Error::new(e)
                .context(format!("failed to clone {}", repo.clone_url));
            eprintln!("error: {:#}", error);

            Outcome::Failed(error)
        },
    }
}

/// Clone every descriptor in sequence, one at a time, in the order
/// given.
pub fn clone_all(repos: &[github::Repo], clone_dir: &Path) -> BatchSummary {
    let mut summary = BatchSummary::new();

    for repo in repos {
        summary.record(&repo.name, clone_or_skip(repo, clone_dir));
    }

    summary
}
