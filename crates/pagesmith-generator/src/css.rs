//! Stylesheet compilation through the external `tailwindcss` binary.

use std::{path::PathBuf, process::Command};

use thiserror::Error;
use tracing::{debug, info};

/// Environment variable overriding the compiler program.
pub const PROGRAM_ENV: &str = "PAGESMITH_TAILWIND";

/// Default compiler program.
pub const DEFAULT_PROGRAM: &str = "tailwindcss";

/// CSS compilation errors.
#[derive(Debug, Error)]
pub enum CssError {
    /// The compiler could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited unsuccessfully.
    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
}

/// Result type for CSS compilation.
pub type Result<T> = std::result::Result<T, CssError>;

/// Invocation of the CSS compiler.
#[derive(Debug, Clone)]
pub struct CssCompiler {
    program: String,
    input: PathBuf,
    output: PathBuf,
    config: PathBuf,
}

impl CssCompiler {
    /// Create a compiler invocation; the program comes from
    /// [`PROGRAM_ENV`] when set.
    #[must_use]
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
    ) -> Self {
        let program = std::env::var(PROGRAM_ENV).unwrap_or_else(|_| DEFAULT_PROGRAM.to_string());
        Self {
            program,
            input: input.into(),
            output: output.into(),
            config: config.into(),
        }
    }

    /// Use a different compiler program.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.input.to_string_lossy().into_owned(),
            "-o".to_string(),
            self.output.to_string_lossy().into_owned(),
            "-c".to_string(),
            self.config.to_string_lossy().into_owned(),
            "--minify".to_string(),
        ]
    }

    /// Run the compiler to completion.
    pub fn compile(&self) -> Result<()> {
        debug!(program = %self.program, args = ?self.args(), "compiling CSS");

        let status = Command::new(&self.program)
            .args(self.args())
            .status()
            .map_err(|source| CssError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CssError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        info!(output = %self.output.display(), "CSS built");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> CssCompiler {
        CssCompiler::new(
            "assets/css/styles.css",
            "public/styles.css",
            "tailwind.config.js",
        )
    }

    #[test]
    fn test_args() {
        assert_eq!(
            compiler().args(),
            vec![
                "-i",
                "assets/css/styles.css",
                "-o",
                "public/styles.css",
                "-c",
                "tailwind.config.js",
                "--minify"
            ]
        );
    }

    #[test]
    fn test_missing_program() {
        let err = compiler()
            .with_program("pagesmith-no-such-css-tool")
            .compile()
            .unwrap_err();
        assert!(matches!(err, CssError::Spawn { .. }));
        assert!(err.to_string().contains("pagesmith-no-such-css-tool"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program() {
        let err = compiler().with_program("false").compile().unwrap_err();
        assert!(matches!(err, CssError::Failed { .. }));
    }
}
