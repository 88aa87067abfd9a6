//! Git + DVC versioning of inputs and generated documents.
//!
//! Every command must succeed: the first non-zero exit is returned as a
//! [`VcsError`] and later commands are not run.

use crate::error::VcsError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs `git` and `dvc` in a working directory.
#[derive(Debug, Clone)]
pub struct VersionControl {
    git_program: String,
    dvc_program: String,
    workdir: Option<PathBuf>,
}

impl Default for VersionControl {
    fn default() -> Self {
        Self {
            git_program: "git".to_string(),
            dvc_program: "dvc".to_string(),
            workdir: None,
        }
    }
}

impl VersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands from `dir` instead of the process working directory.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Override the `git` executable.
    pub fn git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Override the `dvc` executable.
    pub fn dvc_program(mut self, program: impl Into<String>) -> Self {
        self.dvc_program = program.into();
        self
    }

    /// Track `pdf` with DVC and commit the `.dvc` sidecar.
    pub async fn track_pdf(&self, pdf: &Path) -> Result<(), VcsError> {
        let pdf_arg = pdf.to_string_lossy().into_owned();
        let sidecar = format!("{pdf_arg}.dvc");
        let message = format!("chore: track {} with DVC", file_name(pdf));

        self.run(&self.dvc_program, &["add", &pdf_arg]).await?;
        self.run(&self.git_program, &["add", &sidecar, ".dvcignore"])
            .await?;
        self.run(&self.git_program, &["commit", "-m", &message])
            .await?;
        info!("Tracked {} with DVC", pdf.display());
        Ok(())
    }

    /// Stage and commit a generated Markdown file.
    ///
    /// `message` defaults to `feat: add generated variants for <file name>`.
    pub async fn commit_markdown(&self, md: &Path, message: Option<&str>) -> Result<(), VcsError> {
        let md_arg = md.to_string_lossy().into_owned();
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| default_commit_message(md));

        self.run(&self.git_program, &["add", &md_arg]).await?;
        self.run(&self.git_program, &["commit", "-m", &message])
            .await?;
        info!("Committed {}: {}", md.display(), message);
        Ok(())
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<(), VcsError> {
        let command_line = format!("{} {}", program, args.join(" "));
        debug!("Running `{}`", command_line);

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(ref dir) = self.workdir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|source| VcsError::Spawn {
            program: program.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(VcsError::CommandFailed {
                command: command_line,
                code: status.code(),
            })
        }
    }
}

/// `feat: add generated variants for <file name>`
pub fn default_commit_message(md: &Path) -> String {
    format!("feat: add generated variants for {}", file_name(md))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_uses_file_name() {
        assert_eq!(
            default_commit_message(Path::new("outputs/catan.md")),
            "feat: add generated variants for catan.md"
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let vcs = VersionControl::new().git_program("definitely-not-git-xyz");
        let err = vcs
            .commit_markdown(Path::new("outputs/catan.md"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::Spawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_stops_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = VersionControl::new()
            .workdir(dir.path())
            .dvc_program("false")
            .git_program("definitely-not-git-xyz");
        // dvc fails first, so git is never spawned.
        let err = vcs.track_pdf(Path::new("bg_rules/catan.pdf")).await.unwrap_err();
        match err {
            VcsError::CommandFailed { command, code } => {
                assert!(command.starts_with("false add"), "got: {command}");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn succeeding_commands_return_ok() {
        let vcs = VersionControl::new().git_program("true");
        vcs.commit_markdown(Path::new("outputs/catan.md"), Some("docs: custom"))
            .await
            .unwrap();
    }
}
