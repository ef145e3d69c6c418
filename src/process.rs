//! Helpers for the external programs the tools shell out to.

use anyhow::{Result, bail};
use std::process::{Command, Stdio};

/// Runs `<name> --version` (or `-version` for the ffmpeg family) to fail
/// loudly when a dependency such as yt-dlp or ffprobe is missing.
pub fn ensure_program_available(name: &str) -> Result<()> {
    let version_flag = if name.starts_with("ff") {
        "-version"
    } else {
        "--version"
    };
    let status = Command::new(name)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => bail!("{} is installed but returned a failure status", name),
        Err(err) => bail!("{} is not installed or not in PATH: {}", name, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_programs_are_reported() {
        let err = ensure_program_available("vidarchive-no-such-program").unwrap_err();
        assert!(err.to_string().contains("not installed"));
    }
}
