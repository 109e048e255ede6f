use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use kit_types::ObjectHash;

#[derive(Parser)]
#[command(
    name = "kit",
    about = "kit, a minimal content-addressed object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Show the content, kind or size of an object
    CatFile(CatFileArgs),
    /// Compute a file's blob hash, optionally storing it
    HashObject(HashObjectArgs),
    /// List the entries of a tree object
    LsTree(LsTreeArgs),
    /// Snapshot the working directory as a tree
    WriteTree(WriteTreeArgs),
    /// Create a commit object for a tree
    CommitTree(CommitTreeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("mode").required(true).args(["pretty", "kind", "size"])))]
pub struct CatFileArgs {
    /// Pretty-print the object's content
    #[arg(short = 'p')]
    pub pretty: bool,
    /// Show the object's kind
    #[arg(short = 't')]
    pub kind: bool,
    /// Show the object's body size
    #[arg(short = 's')]
    pub size: bool,
    pub object: ObjectHash,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Also store the blob
    #[arg(short = 'w')]
    pub write: bool,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct LsTreeArgs {
    #[arg(long)]
    pub name_only: bool,
    pub tree: ObjectHash,
}

#[derive(Args)]
pub struct WriteTreeArgs {}

#[derive(Args)]
pub struct CommitTreeArgs {
    pub tree: ObjectHash,
    #[arg(short = 'p', long)]
    pub parent: Option<ObjectHash>,
    #[arg(short, long)]
    pub message: String,
}
