//! Liveness check for the player process.

use std::process::{Command, Stdio};

/// Answers whether the player process is currently running.
pub trait ProcessProbe {
    /// Name used in error messages.
    fn name(&self) -> &str;
    fn is_running(&self) -> bool;
}

/// Looks the process up with `pidof`.
#[derive(Debug, Clone)]
pub struct Pidof {
    program: String,
}

impl Pidof {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pidof {
    fn default() -> Self {
        Self::new("vlc")
    }
}

impl ProcessProbe for Pidof {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_running(&self) -> bool {
        let output = Command::new("pidof")
            .arg(&self.program)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(output) => !String::from_utf8_lossy(&output.stdout).trim().is_empty(),
            Err(e) => {
                log::debug!("failed to run pidof: {}", e);
                false
            }
        }
    }
}

/// A probe with a fixed answer, for remote hosts or tests.
#[derive(Debug, Clone, Copy)]
pub struct Assume(pub bool);

impl ProcessProbe for Assume {
    fn name(&self) -> &str {
        "vlc"
    }

    fn is_running(&self) -> bool {
        self.0
    }
}

impl<F: Fn() -> bool> ProcessProbe for F {
    fn name(&self) -> &str {
        "vlc"
    }

    fn is_running(&self) -> bool {
        self()
    }
}
