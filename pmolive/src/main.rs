mod logs;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pmoconfig::{get_config, Config};
use pmoschedule::{
    export, Catalog, ExportOutcome, ScheduleClient, ScheduleConfigExt, ScheduleGenerator,
    ScheduleStore, Seconds, SystemClock, WallClock,
};
use pmosync::{readiness, ChannelSet, MediaPlayer, RefreshCoordinator, SimulatedPlayer, SyncConfigExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pmolive", version, about = "Simulated live multi-channel broadcast")]
struct Cli {
    /// Configuration directory (default: $PMOLIVE_CONFIG, ./.pmolive, ~/.pmolive)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Overrides host.logger.min_level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play every channel on simulated players kept in sync with the schedule
    Watch {
        /// Number of displayed channels (default: sync.channels)
        #[arg(long)]
        channels: Option<usize>,
        /// Schedule URL (default: schedule.url)
        #[arg(long)]
        url: Option<String>,
        /// Delay before the players report ready, in milliseconds
        #[arg(long, default_value_t = 0)]
        ready_delay_ms: u64,
    },
    /// Publish the stored daily schedules over HTTP
    Serve {
        /// Listening port (default: host.http_port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the daily export job once
    Export,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Doit précéder le premier get_config()
    if let Some(dir) = &cli.config {
        std::env::set_var(pmoconfig::ENV_CONFIG_DIR, dir);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = get_config();
    let log_handle = logs::init_logging(&config);
    if let Some(level) = &cli.log_level {
        log_handle.set_level(level)?;
    }

    match cli.command {
        Commands::Watch {
            channels,
            url,
            ready_delay_ms,
        } => watch(&config, channels, url, Duration::from_millis(ready_delay_ms)).await,
        Commands::Serve { port } => serve(&config, port).await,
        Commands::Export => run_export_once(&config).await,
    }
}

async fn watch(
    config: &Config,
    channels: Option<usize>,
    url: Option<String>,
    ready_delay: Duration,
) -> Result<()> {
    // ========== PHASE 1 : Configuration ==========
    let schedule = config.get_schedule_settings()?;
    let mut sync = config.get_sync_settings()?;
    if let Some(channels) = channels {
        sync.channels = channels as u64;
    }
    let clock = SystemClock::new(schedule.zone()?);

    // ========== PHASE 2 : Grille initiale ==========
    let client = ScheduleClient::builder()
        .url(url.unwrap_or_else(|| schedule.url.clone()))
        .timeout(schedule.request_timeout())
        .build()?;
    info!("📅 Fetching initial schedule from {}", client.url());

    let coordinator =
        RefreshCoordinator::start(Arc::new(client), schedule.refresh_interval()).await?;
    let published = coordinator.current().channel_count();
    if published < sync.channel_count() {
        warn!(
            "⚠️ Schedule has {} channel(s), {} requested: extra players will stay idle",
            published,
            sync.channel_count()
        );
    }

    // ========== PHASE 3 : Lecteurs et boucles ==========
    info!("📺 Starting {} simulated player(s)...", sync.channel_count());
    let players: Vec<Box<dyn MediaPlayer>> = (0..sync.channel_count())
        .map(|i| Box::new(SimulatedPlayer::new(format!("player-{i}"))) as Box<dyn MediaPlayer>)
        .collect();

    let (ready, signal) = readiness();
    let set = ChannelSet::start(players, coordinator, Arc::new(clock), sync, signal);

    tokio::spawn(async move {
        tokio::time::sleep(ready_delay).await;
        info!("✅ Players ready");
        ready.signal();
    });

    info!("Press Ctrl+C to stop...");
    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C reçu, arrêt des boucles");
    set.shutdown().await;

    Ok(())
}

/// Stockage journalier et générateur, tels que configurés
async fn daily_store(config: &Config) -> Result<(ScheduleStore, ScheduleGenerator, SystemClock)> {
    let settings = config.get_schedule_settings()?;
    let zone = settings.zone()?;
    let store = ScheduleStore::new(config.get_schedule_store_dir()?, zone);

    let catalog_path = config.get_schedule_catalog_path()?;
    let catalog = match Catalog::load(&catalog_path).await {
        Ok(catalog) => {
            info!(videos = catalog.len(), "🎞️ Catalog loaded from {}", catalog_path);
            catalog
        }
        Err(e) => {
            warn!("⚠️ Failed to load catalog {}: {}", catalog_path, e);
            Catalog::from_videos(Vec::new())
        }
    };

    let channels = config.get_sync_settings()?.channel_count();
    let generator = ScheduleGenerator::new(catalog, channels, settings.max_item_secs as Seconds);

    Ok((store, generator, SystemClock::new(zone)))
}

async fn serve(config: &Config, port: Option<u16>) -> Result<()> {
    let window_secs = config.get_schedule_settings()?.window_secs();
    let (store, generator, clock) = daily_store(config).await?;
    info!("🗂️ Daily schedules in {}", store.directory().display());

    let state = server::ServerState::new(store, generator, Arc::new(clock), window_secs);

    let port = port.unwrap_or_else(|| config.get_http_port());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Schedule server running at http://{}", addr);

    axum::serve(listener, server::create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl+C reçu, arrêt gracieux");
        })
        .await?;

    Ok(())
}

async fn run_export_once(config: &Config) -> Result<()> {
    let (store, mut generator, clock) = daily_store(config).await?;

    match export(&store, &mut generator, clock.now()).await? {
        ExportOutcome::AlreadyExported => info!("Tomorrow already exported, nothing to do"),
        ExportOutcome::Exported {
            created_today,
            tomorrow,
        } => info!(created_today, "✅ Exported {}", tomorrow),
    }

    Ok(())
}
