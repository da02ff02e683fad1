use chrono::Utc;
use clap::{Parser, Subcommand};
use folio::config::{self, Secrets, SiteConfig};
use folio::gate::{GateState, RouteGate};
use folio::repository::ContentRepository;
use folio::session::{Identity, Role, SessionAuthority};
use folio::{generate, index, output, scan};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Content pipeline for a portfolio site: blog, work, access gate")]
#[command(long_about = "\
Content pipeline for a portfolio site: blog, work, access gate

Content lives in plain Markdown/MDX files with a YAML (---) or TOML (+++)
frontmatter header. Each collection is one directory; the file name is the
item's slug.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── blog/
  │   ├── hello-world.mdx          # /blog/hello-world/
  │   └── design-tokens.md         # /blog/design-tokens/
  └── work/
      └── case-study.mdx           # /work/case-study/

Frontmatter keys (all optional):
  title, summary, publishedAt (or date), updatedAt, image, tags (or tag),
  categories (or category), pillar, keywords, status (draft), toc, faq,
  references, team, link, canonical, language

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Shared secret that unlocks protected routes
    #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Comma-separated emails promoted to admin
    #[arg(long, env = "FOLIO_ADMIN_EMAILS", global = true)]
    admin_emails: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the items of a collection, newest first
    Scan { collection: String },
    /// List tags and categories of a collection with item counts
    Tags { collection: String },
    /// Show the items most related to one item
    Related { collection: String, slug: String },
    /// Render the static site
    Build,
    /// Validate config and content without building
    Check,
    /// Evaluate the access gate for a path
    Route {
        path: String,
        /// Secret to submit if the route is locked
        #[arg(long)]
        secret: Option<String>,
    },
    /// Resolve the role of a signed-in email
    Role { email: String },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("folio={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let secrets = Secrets::from_env_values(cli.password.clone(), cli.admin_emails.as_deref());

    match &cli.command {
        Command::Scan { collection } => {
            let config = config::load_config(&cli.source)?;
            let repo = ContentRepository::new(&cli.source, &config.cache);
            let (title, dir) = collection_of(&config, collection)?;
            output::print_scan_output(title, &repo.items(dir));
        }
        Command::Tags { collection } => {
            let config = config::load_config(&cli.source)?;
            let repo = ContentRepository::new(&cli.source, &config.cache);
            let (_, dir) = collection_of(&config, collection)?;
            let items = repo.items(dir);
            let live: Vec<_> = index::published(&items).into_iter().cloned().collect();
            output::print_tags_output(&index::tag_counts(&live), &index::category_counts(&live));
        }
        Command::Related { collection, slug } => {
            let config = config::load_config(&cli.source)?;
            let repo = ContentRepository::new(&cli.source, &config.cache);
            let (_, dir) = collection_of(&config, collection)?;
            let items = repo.items(dir);
            let current = items
                .iter()
                .find(|i| &i.slug == slug)
                .ok_or_else(|| format!("no item '{slug}' in collection '{collection}'"))?;
            let related = index::score_related(current, &items, &config.related);
            output::print_related_output(current, &related);
        }
        Command::Build => {
            let config = config::load_config(&cli.source)?;
            let repo = ContentRepository::new(&cli.source, &config.cache);
            println!("==> Generating {} → {}", cli.source.display(), cli.output.display());
            let summary = generate::generate(&config, &repo, &cli.output)?;
            let titles: BTreeMap<String, String> = config
                .collections
                .iter()
                .map(|(name, c)| (name.clone(), c.title.clone()))
                .collect();
            output::print_generate_output(&summary, &titles);
            println!("Cache: {}", repo.stats());
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            let reports: Vec<(String, scan::ScanReport)> = config
                .collections
                .values()
                .map(|c| (c.title.clone(), scan::report(&cli.source, &c.dir)))
                .collect();
            output::print_check_output(&reports);
            if secrets.access_password.is_none() && !config.routes.protected.is_empty() {
                println!("Warning: protected routes are configured but FOLIO_PASSWORD is not set");
            }
        }
        Command::Route { path, secret } => {
            let config = config::load_config(&cli.source)?;
            let authority = SessionAuthority::new(secrets.access_password.as_deref(), &config.session);
            let mut gate = RouteGate::new(config.routes.clone());
            gate.run(path, &authority, None);

            if let Some(secret) = secret {
                if matches!(gate.state(), GateState::LockPending { .. }) {
                    if let Some(session) = gate.unlock(&authority, secret) {
                        println!("Set-Cookie: {}", session.cookie(&config.session.cookie_name, Utc::now()));
                    }
                }
            }
            output::print_route_output(gate.path(), gate.state());
        }
        Command::Role { email } => {
            let identity = Identity::new(Some(email), &secrets.admin_emails);
            let role = match identity.role {
                Role::Admin => "admin",
                Role::Visitor => "visitor",
            };
            println!("{email} → {role}");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Title and directory segments of a configured collection.
fn collection_of<'c>(config: &'c SiteConfig, name: &str) -> Result<(&'c str, &'c [String]), String> {
    config
        .collection(name)
        .map(|c| (c.title.as_str(), c.dir.as_slice()))
        .ok_or_else(|| {
            let known: Vec<&str> = config.collections.keys().map(String::as_str).collect();
            format!("unknown collection '{name}' (configured: {})", known.join(", "))
        })
}

