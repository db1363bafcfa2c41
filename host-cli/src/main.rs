use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use handheld::settings::CreditsEncoding;

mod commands;
mod discovery;
mod progress;

#[derive(Parser, Debug)]
#[command(author, version, about = "USB utilities for Sitronix-based handheld devices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump the device's flash memory to a file.
    DumpFlash(DumpFlashArgs),
    /// Write a flash image file to the device.
    LoadFlash(LoadFlashArgs),
    /// Dump the device's one-time-programmable memory to a file.
    DumpOtp(DumpOtpArgs),
    /// Show firmware version and character for every connected handheld.
    Status,
    /// Print the stored credits counter.
    ReadCredits(ReadCreditsArgs),
    /// Overwrite the stored credits counter.
    SetCredits(SetCreditsArgs),
    /// Detach connected handhelds from the bus.
    Eject(DeviceArgs),
}

#[derive(Args, Debug, Clone)]
struct DeviceArgs {
    /// Device path to use when several handhelds are connected.
    #[arg(short, long)]
    device: Option<String>,
}

#[derive(Args, Debug)]
struct DumpFlashArgs {
    #[command(flatten)]
    target: DeviceArgs,

    /// File receiving the 2 MiB flash image.
    outfile: PathBuf,
}

#[derive(Args, Debug)]
struct LoadFlashArgs {
    #[command(flatten)]
    target: DeviceArgs,

    /// Read pages back first and skip those whose content already matches.
    #[arg(short, long)]
    check_changes: bool,

    /// Local copy of the device's flash, kept in sync after successful loads.
    #[arg(short, long, value_name = "FILE")]
    mirror: Option<PathBuf>,

    /// Flash image to write; must be exactly 2 MiB.
    infile: PathBuf,
}

#[derive(Args, Debug)]
struct DumpOtpArgs {
    #[command(flatten)]
    target: DeviceArgs,

    /// Print a byte-sum checksum of the dumped image.
    #[arg(short, long)]
    checksum: bool,

    outfile: PathBuf,
}

/// Credits field layout. The on-hardware encoding is unverified; both
/// observed layouts are selectable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    /// Hex-coded decimal wrapped little-endian (what recent tooling writes).
    #[default]
    HcdLe,
    /// Hex-coded decimal stored big-endian.
    HcdBe,
}

impl From<EncodingArg> for CreditsEncoding {
    fn from(value: EncodingArg) -> Self {
        match value {
            EncodingArg::HcdLe => CreditsEncoding::HcdLittleEndian,
            EncodingArg::HcdBe => CreditsEncoding::HcdBigEndian,
        }
    }
}

#[derive(Args, Debug)]
struct ReadCreditsArgs {
    #[command(flatten)]
    target: DeviceArgs,

    /// Credits field layout to assume.
    #[arg(long, value_enum, default_value_t)]
    encoding: EncodingArg,
}

#[derive(Args, Debug)]
struct SetCreditsArgs {
    #[command(flatten)]
    target: DeviceArgs,

    /// Credits field layout to write.
    #[arg(long, value_enum, default_value_t)]
    encoding: EncodingArg,

    /// New credits value. Only the low eight decimal digits are stored.
    value: u32,
}

fn main() -> Result<()> {
    commands::run(Cli::parse())
}
