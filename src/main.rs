//! arbor CLI - snapshot and restore a directory tree

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arbor::ops::{commit, fsck, restore};
use arbor::{read_head, read_object, Hash, Object, ObjectKind, Repo};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "minimal content-addressed snapshot store")]
#[command(version)]
struct Cli {
    /// directory to start repository discovery from
    #[arg(short = 'C', long = "dir", default_value = ".", env = "ARBOR_DIR")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// worktree to create the repository in
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// snapshot the worktree and advance HEAD
    Commit,

    /// recreate the HEAD snapshot under a directory
    Restore {
        /// destination directory
        path: PathBuf,
    },

    /// show the current ref and commit
    Head,

    /// show contents of an object
    CatFile {
        /// object type (blob, tree, commit)
        object_type: String,

        /// object hash
        object: String,
    },

    /// verify repository integrity
    Fsck,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arbor=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> arbor::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let repo = Repo::init(&path)?;
            println!("initialized arbor repository at {}", repo.path().display());
        }

        Commands::Commit => {
            let repo = Repo::discover(&cli.dir)?;
            let hash = commit(&repo)?;
            println!("{}", hash);
        }

        Commands::Restore { path } => {
            let repo = Repo::discover(&cli.dir)?;
            restore(&repo, &path)?;
            println!("restored HEAD to {}", path.display());
        }

        Commands::Head => {
            let repo = Repo::discover(&cli.dir)?;
            let head = read_head(&repo)?;
            println!("{}", head);
        }

        Commands::CatFile {
            object_type,
            object,
        } => {
            let repo = Repo::discover(&cli.dir)?;
            let kind: ObjectKind = object_type.parse()?;
            let hash = Hash::from_hex(&object)?;

            match read_object(&repo, kind, &hash)? {
                Object::Blob(blob) => {
                    io::stdout().write_all(&blob.content).map_err(|e| arbor::Error::Io {
                        path: "stdout".into(),
                        source: e,
                    })?;
                }
                Object::Tree(tree) => {
                    println!("path {:?}", tree.path());
                    for entry in tree.entries() {
                        println!("{} {} {}", entry.kind, entry.hash, entry.name);
                    }
                }
                Object::Commit(commit) => {
                    println!("tree {}", commit.tree);
                    println!("timestamp {}", commit.timestamp);
                }
                Object::Ref(r) => {
                    println!("{} {}", r.target, r.name);
                }
            }
        }

        Commands::Fsck => {
            let repo = Repo::discover(&cli.dir)?;
            let report = fsck(&repo)?;

            println!("objects checked: {}", report.objects_checked);

            if !report.corrupt_objects.is_empty() {
                println!("\ncorrupt objects:");
                for obj in &report.corrupt_objects {
                    println!("  {} {}: {}", obj.kind, obj.hash, obj.message);
                }
            }

            if !report.missing_objects.is_empty() {
                println!("\nmissing objects:");
                for obj in &report.missing_objects {
                    println!(
                        "  {} {} (referenced by {})",
                        obj.kind, obj.hash, obj.referenced_by
                    );
                }
            }

            if !report.dangling_objects.is_empty() {
                println!("\ndangling objects: {}", report.dangling_objects.len());
            }

            if report.is_ok() {
                println!("\nrepository is healthy");
            } else {
                println!("\nrepository has issues");
                return Err(arbor::Error::IntegrityCheckFailed {
                    corrupt: report.corrupt_objects.len(),
                    missing: report.missing_objects.len(),
                });
            }
        }
    }

    Ok(())
}
