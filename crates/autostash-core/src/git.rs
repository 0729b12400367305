//! Thin subprocess layer over the `git` binary.
//!
//! Every argument is passed as its own argv element; nothing goes through a
//! shell. The [`CommandExecutor`] seam lets tests script git's responses.

use crate::error::{Result, StashError};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> std::io::Result<CommandResult>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCommandExecutor;

impl CommandExecutor for ProcessCommandExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, String)],
        cwd: &Path,
    ) -> std::io::Result<CommandResult> {
        let output = Command::new(program)
            .args(args)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd)
            .output()?;
        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Locate the git executable.
pub fn git_bin() -> Result<PathBuf> {
    which::which("git").map_err(|_| StashError::GitNotInstalled)
}

/// A git invocation context bound to one working directory.
#[derive(Debug, Clone)]
pub struct Git<'a, E> {
    cwd: &'a Path,
    executor: &'a E,
}

impl<'a, E: CommandExecutor> Git<'a, E> {
    pub fn new(cwd: &'a Path, executor: &'a E) -> Self {
        Self { cwd, executor }
    }

    pub fn cwd(&self) -> &Path {
        self.cwd
    }

    /// Run git and return the raw result, whatever the exit status.
    pub fn output(&self, args: &[&str]) -> Result<CommandResult> {
        self.output_with_env(args, &[])
    }

    pub fn output_with_env(
        &self,
        args: &[&str],
        envs: &[(String, String)],
    ) -> Result<CommandResult> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = describe(&args);
        tracing::debug!(cwd = %self.cwd.display(), "{command}");
        self.executor
            .execute("git", &args, envs, self.cwd)
            .map_err(|e| StashError::GitSpawn {
                command,
                message: e.to_string(),
            })
    }

    /// Run git, failing on a non-zero exit. Returns trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        self.run_with_env(args, &[])
    }

    pub fn run_with_env(&self, args: &[&str], envs: &[(String, String)]) -> Result<String> {
        Ok(self.run_raw(args, envs)?.trim().to_string())
    }

    /// Like [`Git::run_with_env`] but stdout is returned verbatim, for
    /// NUL-separated listings where surrounding whitespace is significant.
    pub fn run_raw(&self, args: &[&str], envs: &[(String, String)]) -> Result<String> {
        let result = self.output_with_env(args, envs)?;
        if result.success {
            return Ok(result.stdout);
        }
        let stderr = if result.stderr.trim().is_empty() {
            result.stdout
        } else {
            result.stderr
        };
        Err(StashError::GitCommand {
            command: describe(&args.iter().map(|a| a.to_string()).collect::<Vec<_>>()),
            code: result.code,
            stderr: stderr.trim().to_string(),
        })
    }
}

fn describe(args: &[String]) -> String {
    format!("git {}", args.join(" "))
}
