use chrono::Utc;
use clap::{Parser, Subcommand};
use folio::hosting::{HostingClient, HttpTransport, MemoryCache};
use folio::pipeline::{self, Site};
use folio::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    if env!("FOLIO_RELEASE_BUILD") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("FOLIO_COMMIT") {
        "" => "dev@unknown",
        // Leaked once at startup
        commit => Box::leak(format!("dev@{commit}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Build pipeline for a static portfolio and blog")]
#[command(long_about = "\
Build pipeline for a static portfolio and blog

Project metadata is fetched from the hosting API into JSON snapshots, which
are then rendered into static pages together with the Markdown blog.

Site structure:

  site/
  ├── config.toml                  # Optional, overrides stock defaults
  ├── data/projects.json           # {\"projects\": [{\"id\", \"name\", \"repo\", ...}]}
  ├── data/cache/projects/         # Snapshots, one JSON file per project
  ├── project-template.html        # {{PROJECT_NAME}}, {{README}}, ...
  ├── blog-post-template.html      # {{POST_TITLE}}, {{POST_CONTENT}}, ...
  ├── index-template.html          # Optional: {{PROJECT_GRID}}, {{BLOG_POSTS}}
  └── blog/posts/*.md              # ---\\ntitle: ...\\ndate: YYYY-MM-DD\\n---

Set GITHUB_TOKEN (or the variable named by hosting.token_env) to raise the
API rate limit.

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log debug detail (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every stage: snapshots → blog → pages → feeds
    Build {
        /// Ask the API again for sections the new snapshots lack
        #[arg(long)]
        live: bool,
    },
    /// Fetch project metadata into snapshots
    Snapshots,
    /// Render project, post and index pages from snapshots
    Pages {
        /// Ask the API for sections the snapshots lack
        #[arg(long)]
        live: bool,
    },
    /// Write the blog index and post pages
    Blog,
    /// Write sitemap.xml, sitemap.html and the RSS feed
    Feeds,
    /// Validate inputs without fetching or writing
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "folio=debug" } else { "folio=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    init_logging(cli.verbose);
    let site = Site::load(&cli.root)?;
    let now = Utc::now();

    let transport = HttpTransport::new()?;
    let cache = MemoryCache::new(site.config.hosting.cache_ttl());
    let client = HostingClient::new(&transport, &cache, &site.config.hosting.api_base)
        .with_token(site.config.hosting.token_from_env());

    match cli.command {
        Command::Build { live } => {
            println!("==> Building {}", site.root.display());
            let report = pipeline::run_build(&site, &client, live, now)?;
            output::print_build_output(&report, &site.root);
        }
        Command::Snapshots => {
            let projects = site.projects()?;
            let outcomes = pipeline::run_snapshots(&site, &projects, &client, now);
            output::print_snapshot_outcomes(&outcomes, &site.root);
        }
        Command::Pages { live } => {
            let projects = site.projects()?;
            let blog = pipeline::run_blog(&site)?;
            let report =
                pipeline::run_pages(&site, &projects, &blog.posts, live.then_some(&client))?;
            output::print_blog(&blog, &site.root);
            output::print_pages(&report, &site.root);
        }
        Command::Blog => {
            let report = pipeline::run_blog(&site)?;
            output::print_blog(&report, &site.root);
        }
        Command::Feeds => {
            let projects = site.projects()?;
            let posts = pipeline::read_blog_index(&site)?;
            let written = pipeline::run_feeds(&site, &projects, &posts, now)?;
            output::print_feeds(&written, &site.root);
        }
        Command::Check => {
            println!("==> Checking {}", site.root.display());
            let report = pipeline::check(&site)?;
            output::print_check(&report);
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}
