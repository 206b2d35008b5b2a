use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::platform::Platform;

/// Prebuilt helper binaries shipped under `<tools>/packager_tools/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Tool {
    #[value(name = "aes")]
    FlashAes,
    #[value(name = "crc")]
    Crc,
    #[value(name = "nvs")]
    Nvs,
    #[value(name = "lzma")]
    Lzma,
}

impl Tool {
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::FlashAes => "beken_aes",
            Tool::Crc => "cmake_encrypt_crc",
            Tool::Nvs => "mbedtls_aes_xts",
            Tool::Lzma => "lzma",
        }
    }
}

#[derive(Debug)]
pub enum ToolError {
    NotFound(PathBuf),
    Spawn {
        program: OsString,
        source: std::io::Error,
    },
    ExitStatus {
        program: OsString,
        status: ExitStatus,
    },
    Io(std::io::Error),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::NotFound(p) => write!(f, "tool not found at {}", p.display()),
            ToolError::Spawn { program, .. } => write!(f, "failed to start {:?}", program),
            ToolError::ExitStatus { program, status } => {
                write!(f, "{:?} failed with {}", program, status)
            }
            ToolError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Spawn { source, .. } => Some(source),
            ToolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e)
    }
}

/// `<dir of the running executable>/../tools`.
pub fn default_tools_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join("..").join("tools"))
}

#[derive(Debug, Clone)]
pub struct ToolPaths {
    tools_dir: PathBuf,
    platform: Platform,
}

impl ToolPaths {
    pub fn new(tools_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            tools_dir: tools_dir.into(),
            platform,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn path(&self, tool: Tool) -> PathBuf {
        let name = format!("{}{}", tool.binary_name(), self.platform.exe_suffix());
        self.tools_dir
            .join("packager_tools")
            .join(self.platform.tools_subdir())
            .join(name)
    }

    /// Like [`ToolPaths::path`], but fails if nothing is there.
    pub fn existing(&self, tool: Tool) -> Result<PathBuf, ToolError> {
        let path = self.path(tool);
        tracing::debug!("{:?} resolved to {}", tool, path.display());
        if path.is_file() {
            Ok(path)
        } else {
            Err(ToolError::NotFound(path))
        }
    }
}

fn spawn_and_wait(cmd: &mut Command) -> Result<ExitStatus, ToolError> {
    tracing::debug!("running {:?}", cmd);
    cmd.status().map_err(|source| ToolError::Spawn {
        program: cmd.get_program().to_owned(),
        source,
    })
}

/// Runs `cmd` to completion; a non-zero exit is an error.
pub fn run_cmd(cmd: &mut Command) -> Result<(), ToolError> {
    let status = spawn_and_wait(cmd)?;
    if !status.success() {
        return Err(ToolError::ExitStatus {
            program: cmd.get_program().to_owned(),
            status,
        });
    }
    Ok(())
}

/// Runs `cmd` to completion and only logs a failing exit status.
pub fn run_cmd_not_check_ret(cmd: &mut Command) -> Result<ExitStatus, ToolError> {
    let status = spawn_and_wait(cmd)?;
    if !status.success() {
        tracing::warn!("{:?} exited with {}, ignoring", cmd.get_program(), status);
    }
    Ok(status)
}

/// Runs one of the packager tools with `args` passed through verbatim.
pub fn run_tool<I, S>(paths: &ToolPaths, tool: Tool, args: I) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = paths.existing(tool)?;
    run_cmd(Command::new(program).args(args))
}

/// Where the CRC tool writes its output for `raw`: `foo.bin` -> `foo_crc.bin`.
pub fn crc_output_path(raw: &Path) -> PathBuf {
    let name = raw
        .file_name()
        .map(|n| n.to_string_lossy().replace(".bin", "_crc.bin"))
        .unwrap_or_default();
    raw.with_file_name(name)
}

/// Adds CRC16 to every 32 byte block of `raw` with the external tool and
/// moves the result to `dst`.
///
/// The tool's exit status is not trusted; a missing output file is what
/// reports failure.
pub fn calc_crc16(paths: &ToolPaths, raw: &Path, dst: &Path) -> Result<(), ToolError> {
    let program = paths.existing(Tool::Crc)?;
    run_cmd_not_check_ret(
        Command::new(program)
            .arg("-enc")
            .arg(raw)
            .args(["0", "0", "0", "0", "-crc"]),
    )?;
    finish_crc_output(raw, dst)
}

fn finish_crc_output(raw: &Path, dst: &Path) -> Result<(), ToolError> {
    let produced = crc_output_path(raw);
    std::fs::rename(&produced, dst)?;
    tracing::info!("{} -> {}", produced.display(), dst.display());
    Ok(())
}
