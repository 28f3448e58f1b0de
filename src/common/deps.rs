//! External tools the commands shell out to.

use anyhow::{Result, bail};

use crate::common::requirements::InstallTest;

#[derive(Debug)]
pub struct Dependency {
    pub name: &'static str,
    pub description: &'static str,
    pub install_hint: &'static str,
    pub tests: &'static [InstallTest],
}

impl Dependency {
    pub fn is_installed(&self) -> bool {
        self.tests.iter().all(|test| test.run())
    }

    /// Fail with an install hint when the tool is not available.
    pub fn require(&self) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        bail!(
            "{} ({}) not found. Install: {}",
            self.name,
            self.description,
            self.install_hint
        )
    }
}

pub static FFPROBE: Dependency = Dependency {
    name: "ffprobe",
    description: "media duration probing",
    install_hint: "brew install ffmpeg (macOS) or apt install ffmpeg (Linux)",
    tests: &[
        InstallTest::WhichSucceeds("ffprobe"),
        InstallTest::CommandSucceeds {
            program: "ffprobe",
            args: &["-version"],
        },
    ],
};

pub static EDGE_TTS: Dependency = Dependency {
    name: "edge-tts",
    description: "neural text-to-speech",
    install_hint: "pip install edge-tts",
    tests: &[
        InstallTest::WhichSucceeds("edge-tts"),
        InstallTest::CommandSucceeds {
            program: "edge-tts",
            args: &["--help"],
        },
    ],
};

pub static NPX: Dependency = Dependency {
    name: "npx",
    description: "runs the project's remotion CLI",
    install_hint: "install Node.js (https://nodejs.org) and run npm install in the project",
    tests: &[InstallTest::WhichSucceeds("npx")],
};
