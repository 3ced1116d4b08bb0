use std::process::Command;

use serde::Serialize;

use crate::error::{C3poError, C3poResult};
use crate::model::settings::Settings;

#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn run_git(args: &[String]) -> C3poResult<GitOutput> {
    tracing::debug!(?args, "git");
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| C3poError::Vcs(format!("failed to run git: {e}")))?;

    Ok(GitOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Remote and branch preparation; these may fail harmlessly when already done.
fn setup_steps(settings: &Settings) -> Vec<Vec<String>> {
    let git = &settings.git;
    vec![
        args(&["remote", "add", &git.remote_name, &git.repository]),
        args(&["branch", &git.branch]),
        args(&["checkout", &git.branch]),
    ]
}

fn publish_steps(settings: &Settings, message: &str) -> Vec<Vec<String>> {
    let git = &settings.git;
    let refspec = format!("{0}:{0}", git.branch);
    vec![
        args(&["add", &settings.locale_root]),
        args(&["commit", "-m", message]),
        args(&["push", &git.remote_name, &refspec]),
    ]
}

/// Commits the locale tree and pushes it to the configured repository.
///
/// Stops at the first failing step and returns its output.
pub fn git_push(settings: &Settings, message: Option<&str>) -> C3poResult<GitOutput> {
    if settings.git.repository.trim().is_empty() {
        return Err(C3poError::Config("git.repository is not set".into()));
    }

    for step in setup_steps(settings) {
        let out = run_git(&step)?;
        if !out.success {
            tracing::debug!(step = ?step, stderr = %out.stderr.trim(), "git setup step skipped");
        }
    }

    let message = message.unwrap_or(&settings.git.message);
    let mut combined = GitOutput {
        success: true,
        ..GitOutput::default()
    };

    for step in publish_steps(settings, message) {
        let out = run_git(&step)?;
        combined.stdout.push_str(&out.stdout);
        combined.stderr.push_str(&out.stderr);
        if !out.success {
            combined.success = false;
            tracing::warn!(step = ?step, "git step failed");
            break;
        }
    }

    if combined.success {
        tracing::info!(branch = %settings.git.branch, "pushed locale tree");
    }
    Ok(combined)
}

/// Restores the locale tree from the configured branch.
pub fn git_checkout(settings: &Settings) -> C3poResult<GitOutput> {
    let out = run_git(&args(&[
        "checkout",
        &settings.git.branch,
        "--",
        &settings.locale_root,
    ]))?;
    if !out.success {
        tracing::warn!(stderr = %out.stderr.trim(), "git checkout failed");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_steps_use_configured_remote_and_branch() {
        let mut settings = Settings::default();
        settings.git.repository = "git@example.com:team/app.git".into();
        settings.git.branch = "translations".into();
        settings.locale_root = "conf/locale".into();

        let setup = setup_steps(&settings);
        assert_eq!(
            setup[0],
            vec!["remote", "add", "po_translator", "git@example.com:team/app.git"]
        );

        let publish = publish_steps(&settings, "Sync \"fr\"");
        assert_eq!(publish[0], vec!["add", "conf/locale"]);
        assert_eq!(publish[1], vec!["commit", "-m", "Sync \"fr\""]);
        assert_eq!(publish[2], vec!["push", "po_translator", "translations:translations"]);
    }

    #[test]
    fn push_without_repository_is_a_config_error() {
        let err = git_push(&Settings::default(), None).unwrap_err();
        assert!(matches!(err, C3poError::Config(_)));
    }
}
