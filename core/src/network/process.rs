//! Blocking child-process helpers for the external lookup utilities.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub success: bool,
}

/// Runs `cmd` to completion or kills it once `timeout` elapses.
///
/// Stdout is drained on a helper thread so a chatty child can't block on a
/// full pipe while we poll for its exit.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> anyhow::Result<CommandOutput> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn child process")?;

    let mut stdout = child.stdout.take().context("child stdout not captured")?;
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("child process timed out after {timeout:?}");
        }
        thread::sleep(POLL_INTERVAL);
    };

    let buf = reader.join().unwrap_or_default();
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&buf).into_owned(),
        success: status.success(),
    })
}

/// Finds `program` in one of the `PATH` directories.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| candidate.is_file())
}

fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![dir.join(program), dir.join(format!("{program}.exe"))]
    } else {
        vec![dir.join(program)]
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
