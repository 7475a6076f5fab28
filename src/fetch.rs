//! Materializing missing dependencies with the Go toolchain.

use std::io;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {}:\n{output}", exit_label(.exit_code))]
    Exit {
        command: String,
        exit_code: Option<i32>,
        /// stdout followed by stderr
        output: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_owned(),
    }
}

/// Something that can add a package to the local build graph.
pub trait DependencyFetcher {
    /// Creates a minimal module manifest in `dir`.
    fn init_manifest(&mut self, dir: &Path) -> Result<(), FetchError>;

    /// Downloads `path` so that the next resolution attempt finds it.
    fn fetch(&mut self, dir: &Path, path: &str) -> Result<(), FetchError>;
}

/// Runs `go mod init` and `go get`.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: String,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoToolchain {
    pub const MANIFEST_MODULE: &'static str = "tempmod";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, FetchError> {
        let command = std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(%command, dir = %dir.display(), "running");

        let out = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|source| FetchError::Spawn {
                command: command.clone(),
                source,
            })?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        if !out.status.success() {
            return Err(FetchError::Exit {
                command,
                exit_code: out.status.code(),
                output,
            });
        }
        tracing::debug!(%command, %output, "finished");
        Ok(output)
    }
}

impl DependencyFetcher for GoToolchain {
    fn init_manifest(&mut self, dir: &Path) -> Result<(), FetchError> {
        self.run(dir, &["mod", "init", Self::MANIFEST_MODULE]).map(drop)
    }

    fn fetch(&mut self, dir: &Path, path: &str) -> Result<(), FetchError> {
        self.run(dir, &["get", "-v", path]).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut go = GoToolchain::new("go-surface-definitely-not-installed");
        match go.fetch(dir.path(), "example.com/x") {
            Err(FetchError::Spawn { command, .. }) => {
                assert_eq!(command, "go-surface-definitely-not-installed get -v example.com/x");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exit_error_message() {
        let err = FetchError::Exit {
            command: "go get -v x".into(),
            exit_code: Some(1),
            output: "no such module".into(),
        };
        assert_eq!(err.to_string(), "`go get -v x` exited with status 1:\nno such module");
    }
}
