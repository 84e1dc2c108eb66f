//! Post-run git commit of the config directory.
//!
//! Records the entity files the interview changed and any Markdown reports
//! written under the config directory.

use std::path::Path;
use std::process::{Command, Output};

use chrono::NaiveDate;

use crate::error::ReportError;

/// Result of a commit attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
}

pub fn commit_message(date: NaiveDate) -> String {
    format!("Weekly report generated: {}", date.format("%Y-%m-%d"))
}

/// Stage everything in `repo_dir` and commit it, initializing the repository
/// first if needed.
pub fn commit_changes(repo_dir: &Path, message: &str) -> Result<CommitOutcome, ReportError> {
    if !repo_dir.join(".git").exists() {
        log::info!("Initializing git repository in {}", repo_dir.display());
        git(repo_dir, &["init"])?;
    }

    git(repo_dir, &["add", "-A"])?;

    let status = git(repo_dir, &["status", "--porcelain"])?;
    if String::from_utf8_lossy(&status.stdout).trim().is_empty() {
        log::info!("No changes to commit.");
        return Ok(CommitOutcome::NothingToCommit);
    }

    git(repo_dir, &["commit", "-m", message])?;
    log::info!("Changes committed.");
    Ok(CommitOutcome::Committed)
}

fn git(repo_dir: &Path, args: &[&str]) -> Result<Output, ReportError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| ReportError::GitError(format!("could not run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReportError::GitError(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }
    Ok(output)
}
