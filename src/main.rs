use anyhow::{anyhow, Result};
use clap::Parser;
use pwnews_bot::fetch::{ArticleFetcher, HttpFetcher};
use pwnews_bot::messenger::{ChannelOnlyMessenger, TelegramMessenger};
use pwnews_bot::news::NewsService;
use pwnews_bot::scheduler::{self, NoopScheduler, Scheduler};
use pwnews_bot::store::PendingStore;
use pwnews_bot::{config, handlers};
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let bot = Bot::new(cfg.telegram.bot_token.clone());
    let store = Arc::new(Mutex::new(PendingStore::new()));
    let fetcher: Arc<dyn ArticleFetcher> = Arc::new(HttpFetcher::new());
    let ppv_scheduler: Arc<dyn Scheduler> = Arc::new(NoopScheduler);

    let service = Arc::new(NewsService::new(
        cfg.site.clone(),
        fetcher.clone(),
        Arc::new(TelegramMessenger::new(
            bot.clone(),
            cfg.telegram.channel.clone(),
        )),
        ppv_scheduler.clone(),
        store.clone(),
    )?);

    // The daily run shares the store but publishes through the
    // channel-only transport (operator notices go to the log).
    let daily_service = Arc::new(NewsService::new(
        cfg.site.clone(),
        fetcher,
        Arc::new(ChannelOnlyMessenger::new(
            bot.clone(),
            cfg.telegram.channel.clone(),
        )),
        ppv_scheduler,
        store,
    )?);
    let daily_at = cfg
        .app
        .daily_results_time()
        .ok_or_else(|| anyhow!("invalid app.daily_results_time"))?;
    tokio::spawn(async move {
        scheduler::run_daily(daily_service, daily_at).await;
    });

    info!("starting telegram bot");
    teloxide::repl(bot, move |_bot: Bot, msg: Message| {
        let service = service.clone();
        async move {
            if let Err(err) = handlers::handle_update(&service, &msg).await {
                error!(?err, "failed to handle update");
            }
            respond(())
        }
    })
    .await;

    Ok(())
}
