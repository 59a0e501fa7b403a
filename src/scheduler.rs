//! Deferred-publication capability and the daily results loop.
use crate::model::OperatorId;
use crate::news::NewsService;
use anyhow::Result;
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Capability the PPV workflow hands a chosen time slot to. The default
/// implementation records the request and nothing else; swapping in a real
/// scheduler does not touch workflow logic.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, operator: OperatorId, slot: &str, article_url: &str) -> Result<()>;
}

pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn schedule(&self, operator: OperatorId, slot: &str, article_url: &str) -> Result<()> {
        info!(
            operator = operator.0,
            slot, article_url, "deferred publication requested (no scheduler configured)"
        );
        Ok(())
    }
}

/// Sleep duration until the next daily occurrence of `at` (UTC).
pub fn until_next(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today_run = now.date_naive().and_time(at);
    let next = if now.naive_utc() < today_run {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    };
    (next - now.naive_utc())
        .to_std()
        .unwrap_or(Duration::from_secs(60))
}

/// Drive the weekly-results discovery once a day as the synthetic operator 0.
pub async fn run_daily(service: Arc<NewsService>, at: NaiveTime) {
    loop {
        let wait = until_next(Utc::now(), at);
        info!(?wait, "next scheduled weekly-results run");
        tokio::time::sleep(wait).await;

        info!("starting scheduled weekly-results run");
        if let Err(err) = service.run_daily_results().await {
            error!(?err, "scheduled weekly-results run failed");
        }
    }
}
