//! External tool checks.

use duct::cmd;

/// Tests for determining whether an external tool is usable.
#[derive(Debug, Clone, Copy)]
pub enum InstallTest {
    /// Succeeds when `which <program>` resolves.
    WhichSucceeds(&'static str),
    /// Succeeds when the command exits with status 0.
    CommandSucceeds {
        program: &'static str,
        args: &'static [&'static str],
    },
}

impl InstallTest {
    pub fn run(self) -> bool {
        match self {
            InstallTest::WhichSucceeds(program) => which::which(program).is_ok(),
            InstallTest::CommandSucceeds { program, args } => cmd(program, args)
                .stdout_null()
                .stderr_null()
                .unchecked()
                .run()
                .map(|output| output.status.success())
                .unwrap_or(false),
        }
    }
}
