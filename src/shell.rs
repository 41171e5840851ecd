//! External command execution for `\!`

use std::process::Command;

use tracing::debug;

use crate::error::{SqlToolError, SqlToolResult};

/// Command interpreter family used to run `\!` commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `sh -c`
    Unix,
    /// `cmd /c`
    Windows,
}

impl Platform {
    /// The platform this binary was built for
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Runs external commands through the platform shell
#[derive(Debug, Clone, Copy)]
pub struct ShellEscape {
    platform: Platform,
}

impl ShellEscape {
    pub fn new(platform: Platform) -> Self {
        ShellEscape { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Run `command_line`, returning its captured stdout followed by stderr
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    pub fn run(&self, command_line: &str) -> SqlToolResult<String> {
        let mut command = match self.platform {
            Platform::Unix => {
                let mut c = Command::new("sh");
                c.arg("-c");
                c
            }
            Platform::Windows => {
                let mut c = Command::new("cmd");
                c.arg("/c");
                c
            }
        };
        debug!("Running external command: {}", command_line);
        let output = command
            .arg(command_line)
            .output()
            .map_err(|e| SqlToolError::ExternalCommand {
                command: command_line.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(SqlToolError::ExternalCommand {
                command: command_line.to_string(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(format!("{}{}", stdout, stderr))
    }
}

impl Default for ShellEscape {
    fn default() -> Self {
        ShellEscape::new(Platform::current())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_output() {
        let shell = ShellEscape::new(Platform::Unix);
        assert_eq!(shell.run("echo hello").unwrap(), "hello\n");
        assert_eq!(shell.run("echo oops 1>&2").unwrap(), "oops\n");
    }

    #[test]
    fn test_failure_is_an_error() {
        let shell = ShellEscape::new(Platform::Unix);
        assert!(matches!(
            shell.run("exit 3"),
            Err(SqlToolError::ExternalCommand { .. })
        ));
    }
}
