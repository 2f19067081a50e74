use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wtd_cache::CacheStore;
use wtd_core::{AgentConfig, LogFormat, LoggingConfig, UserId};
use wtd_engine::{
    ActivityTracker, DataProvider, FixtureProvider, HttpProvider, PerformanceMonitor,
    PrecomputeScheduler, RecommendationCache, RecommendationEngine, RecommendationService,
};

fn cli() -> Command {
    Command::new("wtd-agent")
        .version(wtd_engine::VERSION)
        .about("What-to-do recommendation agent")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .subcommand(Command::new("run").about("Start the precompute scheduler and wait for Ctrl-C"))
        .subcommand(
            Command::new("generate")
                .about("Print the top-3 recommendations of one user as JSON")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Platform user id"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .default_value("")
                        .help("Bearer token for user-scoped reads"),
                )
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .action(ArgAction::SetTrue)
                        .help("Ignore the cached set"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

struct App {
    service: RecommendationService,
    scheduler: Arc<PrecomputeScheduler>,
    monitor: Arc<PerformanceMonitor>,
    store: Arc<CacheStore>,
}

fn build(config: &AgentConfig) -> anyhow::Result<App> {
    let provider: Arc<dyn DataProvider> = if config.provider.fixtures {
        tracing::warn!("serving built-in fixture data");
        Arc::new(FixtureProvider::new())
    } else {
        Arc::new(HttpProvider::new(&config.provider).context("failed to build HTTP client")?)
    };

    let store = Arc::new(CacheStore::from_config(&config.cache));
    let cache = RecommendationCache::new(Arc::clone(&store), &config.cache);
    let engine = Arc::new(RecommendationEngine::new(provider, config));
    let monitor = Arc::new(PerformanceMonitor::new());
    let tracker = Arc::new(ActivityTracker::new(&config.scheduler));

    let scheduler = Arc::new(PrecomputeScheduler::new(
        Arc::clone(&engine),
        cache.clone(),
        tracker.clone(),
        config.scheduler.clone(),
    ));
    let service = RecommendationService::new(engine, cache, monitor.clone(), tracker);

    Ok(App {
        service,
        scheduler,
        monitor,
        store,
    })
}

async fn run(app: App) -> anyhow::Result<()> {
    tracing::info!(backend = app.store.backend_name().await, "cache ready");
    app.scheduler.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("shutdown requested");

    app.scheduler.stop().await;
    let engine = app.service.engine().stats();
    let requests = app.monitor.snapshot();
    tracing::info!(
        generated = engine.generated,
        failed = engine.failed,
        requests = requests.calls,
        hit_rate = requests.hit_rate,
        cache_degraded = app.store.is_degraded(),
        "agent stopped"
    );
    Ok(())
}

async fn generate(app: App, args: &ArgMatches) -> anyhow::Result<()> {
    let user = args
        .get_one::<u64>("user")
        .copied()
        .map(UserId)
        .context("--user is required")?;
    let token = args.get_one::<String>("token").map_or("", String::as_str);
    let refresh = args.get_flag("refresh");

    let top = app.service.top3(user, token, refresh).await;
    tracing::info!(user_id = %user, cache_hit = top.cache_hit, items = top.set.len(), "served");
    println!("{}", serde_json::to_string_pretty(&top)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let path = matches.get_one::<PathBuf>("config").cloned();

    let config = AgentConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load configuration".to_string(),
    })?;
    init_tracing(&config.logging);

    match matches.subcommand() {
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Some(("run", _)) => run(build(&config)?).await,
        Some(("generate", args)) => generate(build(&config)?, args).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}
