use anyhow::{Context, Result, anyhow, bail};
use bkflash::fmt::{Hex16, Hex32};
use bkflash::parse::{ParseError, decimal2int, hex2int, size2int};
use bkflash::{
    PhysAddr, SZ_16M, VirtAddr, ceil_align, checked_crc_size, floor_align, is_out_of_range,
    try_crc16,
};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::logging::LevelFilter;
use crate::platform::Platform;
use crate::tools::{Tool, ToolPaths};

mod fsutil;
mod logging;
mod platform;
mod tools;

const ABOUT: &str = "
Helpers for packaging Beken flash images: CRC16 and CRC-interleaved \
address arithmetic, plus wrappers around the prebuilt packager tools \
(AES, CRC, NVS, LZMA).
";

#[derive(Parser, Debug)]
#[command(name = "bkpack", version, about = ABOUT, long_about = ABOUT)]
struct Args {
    /// Directory holding packager_tools/ [default: <exe dir>/../tools]
    #[arg(long, global = true, env = "BKPACK_TOOLS_DIR")]
    tools_dir: Option<PathBuf>,

    /// Host platform used to pick tool binaries [default: detected]
    #[arg(long, global = true, value_enum)]
    platform: Option<Platform>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, value_enum, env = "BKPACK_LOG", default_value = "WARN")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// CRC16 (Beken polynomial 0x8005) of a file range or hex string
    Crc16 {
        #[arg(required_unless_present = "hex", conflicts_with = "hex")]
        file: Option<PathBuf>,
        /// Bytes as a hex string instead of a file
        #[arg(long)]
        hex: Option<String>,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: isize,
        /// Defaults to the rest of the input after OFFSET
        #[arg(long)]
        length: Option<usize>,
    },
    /// Virtual (payload) address to physical (CRC-interleaved) address
    V2p {
        #[arg(value_parser = parse_u32)]
        addr: u32,
    },
    /// Physical (CRC-interleaved) address to virtual (payload) address
    P2v {
        #[arg(value_parser = parse_u32)]
        addr: u32,
    },
    /// Physical size of a payload, e.g. 4K or 1M
    CrcSize { size: String },
    /// Align VALUE up (or down with --floor) to ALIGN
    Align {
        #[arg(value_parser = parse_u32)]
        value: u32,
        #[arg(value_parser = parse_u32)]
        align: u32,
        #[arg(long)]
        floor: bool,
    },
    /// Check that [ADDR, ADDR+SIZE) fits in the 16 MiB flash window
    Range {
        #[arg(value_parser = parse_u32)]
        addr: u32,
        #[arg(value_parser = parse_u32)]
        size: u32,
    },
    /// Print the resolved path of a packager tool
    ToolPath {
        #[arg(value_enum)]
        tool: Tool,
    },
    /// Add CRC to RAW with the packager CRC tool and store it as DST
    CalcCrc { raw: PathBuf, dst: PathBuf },
    /// Run a packager tool with the given arguments
    Run {
        #[arg(value_enum)]
        tool: Tool,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Copy the files at the top level of SRC into DST
    Copy { src: PathBuf, dst: PathBuf },
    /// Delete all files below DIR, keeping subdirectories
    Clear { dir: PathBuf },
}

/// `0x`-prefixed values are hex, everything else decimal.
fn parse_u32(s: &str) -> Result<u32, ParseError> {
    let t = s.trim();
    if t.starts_with("0x") || t.starts_with("0X") {
        hex2int(t)
    } else {
        decimal2int(t)
    }
}

fn tool_paths(args: &Args) -> Result<ToolPaths> {
    let tools_dir = match &args.tools_dir {
        Some(dir) => dir.clone(),
        None => tools::default_tools_dir().context("Could not locate the tools directory")?,
    };
    let paths = ToolPaths::new(tools_dir, args.platform.unwrap_or_else(Platform::detect));
    tracing::debug!("using {:?} tools", paths.platform());
    Ok(paths)
}

fn crc16_cmd(
    file: Option<&Path>,
    hex_str: Option<&str>,
    offset: isize,
    length: Option<usize>,
) -> Result<u16> {
    let data = match (file, hex_str) {
        (_, Some(h)) => hex::decode(h.trim()).context("Invalid hex string")?,
        (Some(path), None) => {
            std::fs::read(path).with_context(|| format!("Could not read {}", path.display()))?
        }
        (None, None) => bail!("Either FILE or --hex is required"),
    };
    let length = match length {
        Some(l) => l,
        None => usize::try_from(offset)
            .ok()
            .and_then(|o| data.len().checked_sub(o))
            .unwrap_or(0),
    };
    try_crc16(&data, offset, length).map_err(|e| anyhow!("{}", e))
}

fn crc_size_cmd(size: &str) -> Result<u32> {
    let bytes = size2int(size).map_err(|e| anyhow!("{}: {}", size, e))?;
    let bytes =
        u32::try_from(bytes).map_err(|_| anyhow!("{} does not fit a 32-bit flash size", size))?;
    if is_out_of_range(0, bytes) {
        tracing::warn!("{} bytes do not fit below 0x{}", bytes, Hex32(SZ_16M));
    }
    checked_crc_size(bytes)
        .ok_or_else(|| anyhow!("{} with CRC does not fit a 32-bit flash size", size))
}

fn align_cmd(value: u32, align: u32, floor: bool) -> Result<u64> {
    if align == 0 {
        bail!("Alignment must be positive");
    }
    Ok(if floor {
        floor_align(value, align) as u64
    } else {
        ceil_align(value, align)
    })
}

fn run(args: &Args) -> Result<ExitCode> {
    match &args.command {
        Commands::Crc16 {
            file,
            hex,
            offset,
            length,
        } => {
            let crc = crc16_cmd(file.as_deref(), hex.as_deref(), *offset, *length)?;
            println!("{}", Hex16(crc));
        }
        &Commands::V2p { addr } => {
            if is_out_of_range(addr, 0) {
                tracing::warn!("0x{} is outside the flash window", Hex32(addr));
            }
            println!("{}", VirtAddr::new(addr).to_physical());
        }
        &Commands::P2v { addr } => {
            println!("{}", PhysAddr::new(addr).to_virtual());
        }
        Commands::CrcSize { size } => {
            let phys = crc_size_cmd(size)?;
            println!("{} (0x{})", phys, Hex32(phys));
        }
        &Commands::Align { value, align, floor } => {
            println!("0x{:08x}", align_cmd(value, align, floor)?);
        }
        &Commands::Range { addr, size } => {
            if is_out_of_range(addr, size) {
                println!("out-of-range");
                return Ok(ExitCode::from(2));
            }
            println!("ok");
        }
        &Commands::ToolPath { tool } => {
            println!("{}", tool_paths(args)?.path(tool).display());
        }
        Commands::CalcCrc { raw, dst } => {
            let paths = tool_paths(args)?;
            tools::calc_crc16(&paths, raw, dst)
                .with_context(|| format!("CRC generation for {} failed", raw.display()))?;
            tracing::info!("wrote {}", dst.display());
        }
        Commands::Run {
            tool,
            args: tool_args,
        } => {
            let paths = tool_paths(args)?;
            tools::run_tool(&paths, *tool, tool_args)?;
        }
        Commands::Copy { src, dst } => {
            fsutil::copy_files(src, dst).with_context(|| {
                format!("Copying {} to {} failed", src.display(), dst.display())
            })?;
        }
        Commands::Clear { dir } => {
            fsutil::clear_dir(dir).with_context(|| format!("Clearing {} failed", dir.display()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.log_level);
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkflash::BekenCrc16;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn numbers_accept_hex_and_decimal() {
        assert_eq!(parse_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_u32("4096"), Ok(4096));
        assert!(parse_u32("1000h").is_err());
    }

    #[test]
    fn crc_size_reports_overflow() {
        assert_eq!(crc_size_cmd("32b").unwrap(), 34);
        assert_eq!(crc_size_cmd("16M").unwrap(), (16 << 20) / 32 * 34);
        assert!(crc_size_cmd("3900M").is_err());
        assert!(crc_size_cmd("8G").is_err());
        assert!(crc_size_cmd("4KB").is_err());
    }

    #[test]
    fn align_near_top_of_range() {
        assert_eq!(align_cmd(0xFFFF_FFFF, 0x1000, false).unwrap(), 0x1_0000_0000);
        assert_eq!(align_cmd(0xFFFF_F001, 0x1000, false).unwrap(), 0x1_0000_0000);
        assert_eq!(align_cmd(0xFFFF_FFFF, 0x1000, true).unwrap(), 0xFFFF_F000);
        assert_eq!(align_cmd(0x1001, 0x1000, false).unwrap(), 0x2000);
        assert!(align_cmd(0x1001, 0, false).is_err());
    }

    #[test]
    fn crc16_from_hex_and_file() {
        assert_eq!(crc16_cmd(None, Some("00"), 0, None).unwrap(), 0xFD02);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.bin");
        std::fs::write(&path, b"123456789").unwrap();
        assert_eq!(crc16_cmd(Some(path.as_path()), None, 0, None).unwrap(), 0xAEE7);
        assert_eq!(crc16_cmd(Some(path.as_path()), None, 2, Some(4)).unwrap(), 0xC109);
        assert_eq!(
            crc16_cmd(Some(path.as_path()), None, 2, None).unwrap(),
            BekenCrc16::crc16(b"3456789")
        );
    }

    #[test]
    fn crc16_rejects_bad_ranges() {
        assert!(crc16_cmd(None, Some("0102"), -1, Some(1)).is_err());
        assert!(crc16_cmd(None, Some("0102"), 1, Some(2)).is_err());
        assert!(crc16_cmd(None, Some("zz"), 0, None).is_err());
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["bkpack", "v2p", "0x20"]).unwrap();
        assert!(matches!(args.command, Commands::V2p { addr: 0x20 }));

        let args = Args::try_parse_from([
            "bkpack", "--platform", "raspberry-pi", "run", "lzma", "--", "-z", "in.bin",
        ])
        .unwrap();
        assert_eq!(args.platform, Some(Platform::RaspberryPi));
        match args.command {
            Commands::Run { tool, args } => {
                assert_eq!(tool, Tool::Lzma);
                assert_eq!(args, vec![OsString::from("-z"), OsString::from("in.bin")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn tool_path_uses_override() {
        let args = Args::try_parse_from([
            "bkpack",
            "--tools-dir",
            "/opt/bk/tools",
            "--platform",
            "linux",
            "tool-path",
            "crc",
        ])
        .unwrap();
        let paths = tool_paths(&args).unwrap();
        assert_eq!(paths.platform(), Platform::Linux);
        assert_eq!(
            paths.path(Tool::Crc),
            PathBuf::from("/opt/bk/tools/packager_tools/centos7/cmake_encrypt_crc")
        );
    }
}
