use anyhow::{Context, Result};
use blogdex::build::{build_site, selected_posts};
use blogdex::config::{Config, Overrides};
use blogdex::select::TieOrder;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Renders a blog's index page from markdown posts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Renders the index page
    Build {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output directory (default: `public` under the project root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Serve from the domain root, ignoring `path_prefix`
        #[arg(long)]
        development: bool,
    },

    /// Prints the posts that would appear on the index, in order
    List {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// The project directory, or any directory beneath it
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// How posts sharing a date are ordered: `reversed` or `stable`
    #[arg(long)]
    tie_order: Option<TieOrder>,
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(project: &ProjectArgs, overrides: Overrides) -> Result<Config> {
    Config::from_directory(
        &project.directory,
        Overrides {
            tie_order: project.tie_order,
            ..overrides
        },
    )
    .with_context(|| format!("loading project from `{}`", project.directory.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Build {
            project,
            output,
            development,
        } => {
            let config = load_config(
                &project,
                Overrides {
                    output_directory: output,
                    development,
                    ..Overrides::default()
                },
            )?;
            build_site(&config).context("building index page")?;
        }
        Command::List { project } => {
            let config = load_config(&project, Overrides::default())?;
            for post in selected_posts(&config).context("loading posts")? {
                println!(
                    "{}\t{}\t{}",
                    post.date.as_deref().unwrap_or("-"),
                    post.path.as_deref().unwrap_or("-"),
                    post.title.as_deref().unwrap_or_default(),
                );
            }
        }
    }
    Ok(())
}
