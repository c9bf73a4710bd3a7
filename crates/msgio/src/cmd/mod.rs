use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one message and write it to stdout.
    Encode(EncodeArgs),
    /// Decode messages from stdin and print them.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub message: EncodeMessage,
    /// Write the message this many times in one batch.
    #[arg(long, default_value = "1", global = true)]
    pub repeat: usize,
    /// Vectors per writev(2) call. Default: the system IOV_MAX.
    #[arg(long, env = "MSGIO_MAX_VECTORS", global = true)]
    pub max_vectors: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum EncodeMessage {
    /// Array of strings: 16-bit length, NUL-terminated items.
    Array(ArrayArgs),
    /// Binary blob: 32-bit length, raw bytes.
    Scalar(ScalarArgs),
    /// 16-bit big-endian integer.
    U16 { value: u16 },
    /// 32-bit big-endian integer.
    U32 { value: u32 },
}

#[derive(Args, Debug)]
pub struct ArrayArgs {
    /// Items, in order.
    pub items: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ScalarArgs {
    /// String payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file. Without --data or --file, stdin is used.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    Array,
    Scalar,
    U16,
    U32,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Message kind to expect on stdin.
    pub kind: MessageKind,
    /// Feed the input to the reader in chunks of this many bytes.
    #[arg(long, env = "MSGIO_CHUNK_SIZE", default_value = "8192")]
    pub chunk_size: usize,
    /// Reject messages with a larger body (0 = unbounded).
    #[arg(long, env = "MSGIO_MAX_SIZE", default_value = "0")]
    pub max_size: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
