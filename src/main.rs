use anyhow::Result;
use clap::{Parser, Subcommand};
use lore::areas::repository::Repository;
use lore::commands::cat_file::{self, CatFileMode};
use lore::commands::log::{self, LogOptions};
use lore::commands::rev_count;

#[derive(Parser)]
#[command(
    name = "lore",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Read-only inspection of git repositories",
    long_about = "lore reads the object database of an existing git repository \
    (loose objects and pack files alike) and walks its commit history. \
    It never writes: no staging, no commits, no checkouts.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "cat-file",
        about = "Print the content, size or type of an object",
        long_about = "This command prints information about an object in the repository. \
        It requires the SHA (or a reference name) of the object to be specified."
    )]
    CatFile {
        #[arg(short = 'p', long, help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(short = 's', long, conflicts_with = "pretty", help = "Print the object size")]
        size: bool,
        #[arg(
            short = 't',
            long = "type",
            conflicts_with_all = ["pretty", "size"],
            help = "Print the object type"
        )]
        kind: bool,
        #[arg(index = 1, help = "The object SHA or reference to inspect")]
        revision: String,
    },
    #[command(
        name = "log",
        about = "Show commit history",
        long_about = "This command walks the commit history from a starting revision, \
        newest first, with optional paging, message search and path filtering."
    )]
    Log {
        #[arg(long, default_value_t = 0, help = "Skip this many commits before printing")]
        skip: usize,
        #[arg(short = 'n', long, help = "Limit the number of commits printed")]
        max_count: Option<usize>,
        #[arg(long, help = "Only show commits whose message matches the pattern")]
        grep: Option<String>,
        #[arg(long, help = "Only show commits whose tree carries the path")]
        path: Option<String>,
        #[arg(
            long,
            help = "Do not simplify away commits whose tree matches a parent's"
        )]
        full_history: bool,
        #[arg(index = 1, help = "Revision to start from (defaults to HEAD)")]
        revision: Option<String>,
    },
    #[command(
        name = "rev-count",
        about = "Count reachable commits",
        long_about = "This command counts the commits reachable from a starting revision, \
        optionally restricted to commits whose tree carries a path."
    )]
    RevCount {
        #[arg(long, help = "Only count commits whose tree carries the path")]
        path: Option<String>,
        #[arg(index = 1, help = "Revision to start from (defaults to HEAD)")]
        revision: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let repository = Repository::open(std::env::current_dir()?)?;

    match &cli.command {
        Commands::CatFile {
            pretty: _,
            size,
            kind,
            revision,
        } => {
            let mode = if *kind {
                CatFileMode::Type
            } else if *size {
                CatFileMode::Size
            } else {
                CatFileMode::Pretty
            };

            cat_file::run(&repository, revision, mode)?
        }
        Commands::Log {
            skip,
            max_count,
            grep,
            path,
            full_history,
            revision,
        } => {
            let opts = LogOptions {
                revision: revision.clone(),
                skip: *skip,
                max_count: *max_count,
                grep: grep.clone(),
                path: path.clone(),
                full_history: *full_history,
            };

            log::run(&repository, &opts)?
        }
        Commands::RevCount { path, revision } => {
            rev_count::run(&repository, revision.as_deref(), path.as_deref())?
        }
    }

    Ok(())
}
