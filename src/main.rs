use anyhow::Result;
use clap::Parser;
use repostats::commands;
use repostats::config::{
    Config, DEFAULT_API_URL, DEFAULT_OWNER, DEFAULT_RAW_URL, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WEB_URL, LookupPolicy, default_token_file, resolve_token,
};
use std::path::PathBuf;
use std::time::Duration;

/// repostats - GitHub repository statistics for project pages
///
/// Aggregates description, languages, stars, forks, license and contributors
/// from the GitHub API with counters scraped from the repository page.
///
/// The API token is taken from --token, the GITHUB_TOKEN environment
/// variable, or the token file, in that order.
///
/// Examples:
///   repostats show ShutdownTimer      # Stats for one of the owner's repositories
///   repostats list --json             # All projects as JSON
#[derive(Parser, Debug)]
#[command(author, version = env!("REPOSTATS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Account whose repositories are queried
    #[arg(
        long,
        short = 'o',
        env = "REPOSTATS_OWNER",
        default_value = DEFAULT_OWNER,
        global = true
    )]
    owner: String,

    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// File holding the API token (defaults to <config dir>/repostats/token)
    #[arg(long = "token-file", value_name = "PATH", global = true)]
    token_file: Option<PathBuf>,

    /// GitHub API URL
    #[arg(long = "api-url", value_name = "URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Base URL of public repository pages
    #[arg(long = "web-url", value_name = "URL", default_value = DEFAULT_WEB_URL, global = true)]
    web_url: String,

    /// Base URL of raw file content
    #[arg(long = "raw-url", value_name = "URL", default_value = DEFAULT_RAW_URL, global = true)]
    raw_url: String,

    /// Timeout for each outbound request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Fetch the repository directly instead of searching the owner's list
    #[arg(long = "direct-lookup", global = true)]
    direct_lookup: bool,

    /// Do not scrape the public repository page
    #[arg(long = "no-scrape", global = true)]
    no_scrape: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show statistics for a repository
    Show(ShowArgs),

    /// List the owner's projects
    List(ListArgs),

    /// Print a repository's README
    Readme(ReadmeArgs),
}

#[derive(clap::Args, Debug)]
struct ShowArgs {
    /// Repository name, or "owner/repo"
    #[arg(value_name = "REPO")]
    repo: String,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Repository id to list first
    #[arg(long, value_name = "ID")]
    pinned: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct ReadmeArgs {
    /// Repository name, or "owner/repo"
    #[arg(value_name = "REPO")]
    repo: String,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let token_file = self.token_file.clone().or_else(default_token_file);
        let token = resolve_token(self.token.clone(), token_file.as_deref())?;

        Ok(Config {
            owner: self.owner.clone(),
            token,
            api_url: self.api_url.clone(),
            web_url: self.web_url.clone(),
            raw_url: self.raw_url.clone(),
            timeout: Duration::from_secs(self.timeout),
            lookup: if self.direct_lookup {
                LookupPolicy::DirectFetch
            } else {
                LookupPolicy::ListMembership
            },
            scrape: !self.no_scrape,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command {
        Commands::Show(args) => commands::show(&config, &args.repo, args.json).await?,
        Commands::List(args) => commands::list(&config, args.pinned, args.json).await?,
        Commands::Readme(args) => commands::readme(&config, &args.repo).await?,
    }
    Ok(())
}
