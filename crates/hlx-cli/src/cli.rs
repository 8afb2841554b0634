use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hlx",
    about = "HLX snapshot repair tool — round-trip signed snapshots through editable JSON",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a snapshot and write its payload as pretty JSON alongside it
    Export(ExportArgs),
    /// Rebuild a snapshot from its edited JSON sibling
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Snapshot file to export
    pub path: PathBuf,

    /// Verify with the machine-bound key instead of the portable key
    #[arg(long)]
    pub machine: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Snapshot file to rebuild (reads `<path>.json`)
    pub path: PathBuf,

    /// Sign with the machine-bound key instead of the portable key
    #[arg(long)]
    pub machine: bool,

    /// Do not keep the previous snapshot as a `.bak` sibling
    #[arg(long)]
    pub no_backup: bool,

    /// Store the payload uncompressed
    #[arg(long)]
    pub no_compress: bool,
}
