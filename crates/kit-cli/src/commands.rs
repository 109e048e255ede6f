use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use kit_sdk::{Commit, EntryLine, Object, ObjectHash, ObjectKind, Repository, TreeEntry};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Init(args) => {
            let path = args.path.map(|p| resolve(&cli.repo, p)).unwrap_or(cli.repo);
            cmd_init(path, out)
        }
        Command::CatFile(args) => cmd_cat_file(&open(&cli.repo)?, args, json, out),
        Command::HashObject(mut args) => {
            args.file = resolve(&cli.repo, args.file);
            cmd_hash_object(&open(&cli.repo)?, args, json, out)
        }
        Command::LsTree(args) => cmd_ls_tree(&open(&cli.repo)?, args, json, out),
        Command::WriteTree(_) => cmd_write_tree(&open(&cli.repo)?, json, out),
        Command::CommitTree(args) => cmd_commit_tree(&open(&cli.repo)?, args, json, out),
    }
}

/// Relative paths on the command line are taken relative to `-C`.
fn resolve(repo: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        repo.join(path)
    } else {
        path
    }
}

fn open(path: &Path) -> anyhow::Result<Repository> {
    let repo = Repository::open(path)
        .with_context(|| format!("cannot open repository at {}", path.display()))?;
    debug!(metadata = %repo.metadata_dir().display(), "opened repository");
    Ok(repo)
}

#[derive(Serialize)]
struct HashOutput {
    hash: ObjectHash,
}

#[derive(Serialize)]
struct ObjectOutput {
    kind: ObjectKind,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<TreeEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<CommitOutput>,
}

#[derive(Serialize)]
struct CommitOutput {
    tree: ObjectHash,
    parent: Option<ObjectHash>,
    author: String,
    committer: String,
    message: String,
}

impl From<Commit> for CommitOutput {
    fn from(commit: Commit) -> Self {
        Self {
            tree: commit.tree,
            parent: commit.parent,
            author: commit.author.to_string(),
            committer: commit.committer.to_string(),
            message: commit.message,
        }
    }
}

fn print_hash(hash: ObjectHash, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(&HashOutput { hash })?)?;
    } else {
        writeln!(out, "{hash}")?;
    }
    Ok(())
}

fn cmd_init(path: PathBuf, out: &mut impl Write) -> anyhow::Result<()> {
    let repo = Repository::init(&path)
        .with_context(|| format!("cannot initialize repository at {}", path.display()))?;
    writeln!(
        out,
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        repo.metadata_dir().display().to_string().bold()
    )?;
    Ok(())
}

fn cmd_cat_file(
    repo: &Repository,
    args: CatFileArgs,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let (header, body) = repo.read_body(&args.object)?;

    if json {
        let mut info = ObjectOutput {
            kind: header.kind,
            size: header.size,
            content: None,
            entries: None,
            commit: None,
        };
        if args.pretty {
            match repo.cat_file(&args.object)? {
                Object::Blob(blob) => {
                    let text = String::from_utf8(blob.content).map_err(|_| {
                        anyhow::anyhow!(
                            "blob {} is not UTF-8 text; print it without --format json",
                            args.object
                        )
                    })?;
                    info.content = Some(text);
                }
                Object::Tree(tree) => info.entries = Some(tree.into_entries()),
                Object::Commit(commit) => info.commit = Some(commit.into()),
            }
        }
        writeln!(out, "{}", serde_json::to_string(&info)?)?;
        return Ok(());
    }

    if args.kind {
        writeln!(out, "{}", header.kind)?;
    } else if args.size {
        writeln!(out, "{}", header.size)?;
    } else if header.kind == ObjectKind::Tree {
        for entry in repo.ls_tree(&args.object)? {
            writeln!(out, "{}", EntryLine(&entry))?;
        }
    } else {
        out.write_all(&body)?;
    }
    Ok(())
}

fn cmd_hash_object(
    repo: &Repository,
    args: HashObjectArgs,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let hash = repo
        .hash_object(&args.file, args.write)
        .with_context(|| format!("cannot hash {}", args.file.display()))?;
    print_hash(hash, json, out)
}

fn cmd_ls_tree(
    repo: &Repository,
    args: LsTreeArgs,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let entries: Vec<TreeEntry> = repo.ls_tree(&args.tree)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else if args.name_only {
        for entry in &entries {
            writeln!(out, "{}", entry.name)?;
        }
    } else {
        for entry in &entries {
            writeln!(out, "{}", EntryLine(entry))?;
        }
    }
    Ok(())
}

fn cmd_write_tree(repo: &Repository, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let hash = repo.write_tree()?;
    print_hash(hash, json, out)
}

fn cmd_commit_tree(
    repo: &Repository,
    args: CommitTreeArgs,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut message = args.message;
    if !message.ends_with('\n') {
        message.push('\n');
    }
    let hash = repo.commit_tree(&args.tree, args.parent.as_ref(), &message)?;
    print_hash(hash, json, out)
}
