//! game-harvester - ゲームカタログ収集CLI

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tower::Service;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use game_harvester::category::list_categories;
use game_harvester::config::{DEFAULT_BASE_URL, DEFAULT_LANG};
use game_harvester::{
    api, demo_link, transport, write_items, CategorySelection, HarvestConfig, HarvestRequest,
    HarvestService, HttpTransport, InterruptSignal, OutputFormat, PageFailurePolicy, Transport,
    TransportMode,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Http,
    Browser,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "game-harvester", version, about = "Harvest the game catalog listing")]
struct Args {
    #[arg(long, env = "HARVEST_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "HARVEST_LANG", default_value = DEFAULT_LANG)]
    lang: String,

    /// Transport: direct HTTP, in-browser fetch, or browser with HTTP fallback
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Print the game page URL for this id and exit
    #[arg(long)]
    game_id: Option<i64>,

    /// With --game-id, resolve the demo launch link instead
    #[arg(long, requires = "game_id")]
    demo: bool,

    /// Category id to walk (repeatable)
    #[arg(long = "category-id")]
    category_ids: Vec<i64>,

    /// Walk every category exposed by the options endpoint (overrides --category-id)
    #[arg(long)]
    all_categories: bool,

    /// Brand filter (repeatable)
    #[arg(long = "brand-id")]
    brand_ids: Vec<i64>,

    /// Title search text
    #[arg(long)]
    search: Option<String>,

    /// Page size
    #[arg(long, default_value_t = 50)]
    limit: u32,

    /// Maximum number of games (0 = unlimited)
    #[arg(long = "max", default_value_t = 1000)]
    max_games: usize,

    /// Delay between pages in seconds
    #[arg(long, default_value_t = 0.2)]
    sleep: f64,

    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Backoff base in seconds
    #[arg(long, default_value_t = 0.75)]
    backoff: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30.0)]
    timeout: f64,

    #[arg(long, default_value = "games.json")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,

    /// Print the subcategories from the options endpoint and exit
    #[arg(long)]
    list_categories: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Skip the rest of a category when a page cannot be fetched
    #[arg(long)]
    skip_failed_categories: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn seconds(name: &str, value: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid --{}: {}", name, value))
}

impl Args {
    fn to_config(&self) -> anyhow::Result<HarvestConfig> {
        let mode = match self.mode {
            ModeArg::Auto => TransportMode::Auto,
            ModeArg::Http => TransportMode::Http,
            ModeArg::Browser => TransportMode::Browser,
        };

        let categories = if self.all_categories {
            CategorySelection::All
        } else if !self.category_ids.is_empty() {
            CategorySelection::Explicit(self.category_ids.clone())
        } else {
            CategorySelection::Unfiltered
        };

        let failure_policy = if self.skip_failed_categories {
            PageFailurePolicy::SkipCategory
        } else {
            PageFailurePolicy::Abort
        };

        Ok(HarvestConfig::new(&self.base_url, &self.lang)
            .with_mode(mode)
            .with_categories(categories)
            .with_brand_ids(self.brand_ids.clone())
            .with_title_search(self.search.clone())
            .with_page_size(self.limit)
            .with_max_items(self.max_games)
            .with_page_delay(seconds("sleep", self.sleep)?)
            .with_retries(self.retries, seconds("backoff", self.backoff)?)
            .with_request_timeout(seconds("timeout", self.timeout)?)
            .with_headless(!self.headed)
            .with_failure_policy(failure_policy)
            .with_debug(self.verbose))
    }

    fn output_format(&self) -> OutputFormat {
        match self.format {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

async fn print_game_link(config: &HarvestConfig, game_id: i64, demo: bool) -> anyhow::Result<()> {
    let url = if demo {
        let mut http = HttpTransport::new(config)?;
        http.open().await?;
        http.warm_up(&api::game_page_url(&config.base_url, &config.lang, game_id))
            .await;
        demo_link(&http, config, game_id).await?
    } else {
        api::game_page_url(&config.base_url, &config.lang, game_id)
    };
    println!("{}", url);
    Ok(())
}

async fn print_categories(config: &HarvestConfig) -> anyhow::Result<()> {
    let mut transport = transport::connect(config).await?;
    let result = list_categories(transport.as_ref(), config).await;
    transport.close().await?;

    let categories = result?;
    println!("{}", serde_json::to_string_pretty(&categories)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "game_harvester=debug"
    } else {
        "game_harvester=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.to_config()?;

    if let Some(game_id) = args.game_id {
        return print_game_link(&config, game_id, args.demo).await;
    }

    if args.list_categories {
        return print_categories(&config).await;
    }

    let interrupt = InterruptSignal::new();
    interrupt.install_ctrl_c();

    let started = Instant::now();
    let mut service = HarvestService::new();
    let report = service
        .call(HarvestRequest::new(config).with_interrupt(interrupt))
        .await
        .context("harvest failed")?;

    write_items(&args.out, args.output_format(), &report.items)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    println!(
        "Wrote {} games to {} in {:.2}s",
        report.items.len(),
        args.out.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
