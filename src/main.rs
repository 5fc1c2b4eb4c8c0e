//! Main entry point for the zipvfs CLI application.
//!
//! This binary mounts a ZIP archive and serves listing, stat and read
//! requests from it without extracting anything to disk.

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncWriteExt;

use zipvfs::cli::{Cli, Command};
use zipvfs::{Metadata, ZipFs, resolve_archive_file};

/// Application entry point.
///
/// Parses command-line arguments, mounts the archive and dispatches to the
/// requested command.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let archive = resolve_archive_file(&cli.archive)?;
    let mut fs = ZipFs::open(&archive, cli.config())?;

    match &cli.command {
        Command::Ls { path } => {
            for name in fs.read_dir_async(path).await? {
                println!("{name}");
            }
        }
        Command::Cat { path, encoding } => {
            let mut stdout = tokio::io::stdout();
            match encoding {
                Some(encoding) => {
                    let text = fs.read_to_string_async(path, encoding).await?;
                    stdout.write_all(text.as_bytes()).await?;
                }
                None => {
                    let data = fs.read_file_async(path).await?;
                    stdout.write_all(&data).await?;
                }
            }
            stdout.flush().await?;
        }
        Command::Stat { path } => {
            let meta = fs.stat_async(path).await?;
            println!("{}", describe(path, &meta));
        }
        Command::Exists { path } => {
            let found = fs.exists(path);
            println!("{found}");
            if !found {
                std::process::exit(1);
            }
        }
        Command::Tree { path } => {
            print_tree(&mut fs, path.trim_matches('/'))?;
        }
    }

    Ok(())
}

/// One-line summary of an entry: kind, size, modification time and name.
fn describe(path: &str, meta: &Metadata) -> String {
    let kind = if meta.is_dir() { "dir " } else { "file" };
    let modified = meta
        .modified()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".repeat(19));
    format!("{kind}  {:>10}  {modified}  {path}", meta.len())
}

/// Print every entry below `dir`, depth first, in sorted order.
fn print_tree(fs: &mut ZipFs, dir: &str) -> Result<()> {
    for name in fs.read_dir(dir)? {
        let path = if dir.is_empty() {
            name
        } else {
            format!("{dir}/{name}")
        };
        let meta = fs.stat(&path)?;
        println!("{}", describe(&path, &meta));
        if meta.is_dir() {
            print_tree(fs, &path)?;
        }
    }
    Ok(())
}
