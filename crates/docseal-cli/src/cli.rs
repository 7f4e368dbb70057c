use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docseal",
    about = "DocSeal — tamper-evident document notarization",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding proofs, documents, and keys (overrides the config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fingerprint a document and record its proof
    Upload(UploadArgs),
    /// Anchor an existing proof on the ledger
    Anchor(AnchorArgs),
    /// List all proofs
    List,
    /// Show one proof
    Show(ShowArgs),
    /// Check a file against an anchored proof
    Verify(VerifyArgs),
    /// Decrypt a locally stored document
    Open(OpenArgs),
    /// Create the signing key
    Keygen(KeygenArgs),
}

#[derive(Args)]
pub struct UploadArgs {
    pub file: PathBuf,
    /// Mime type (guessed from the extension when omitted)
    #[arg(long)]
    pub mime: Option<String>,
    /// Anchor the fingerprint right after upload
    #[arg(long)]
    pub anchor: bool,
    /// Sign without asking
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct AnchorArgs {
    /// Proof id or unique prefix
    pub id: String,
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub id: String,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct OpenArgs {
    pub id: String,
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Replace an existing key
    #[arg(long)]
    pub force: bool,
}
