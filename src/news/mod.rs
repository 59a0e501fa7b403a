//! The pending-publication core: one service instance owning the per-operator
//! workflow store and the collaborator seams, plus the inbound dispatch table.
use crate::config::Site;
use crate::fetch::ArticleFetcher;
use crate::keyboard::{self, ReplyKeyboard};
use crate::messenger::Messenger;
use crate::model::OperatorId;
use crate::scheduler::Scheduler;
use crate::store::PendingStore;
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

mod other;
mod ppv;
mod review;
mod weekly;

pub struct NewsService {
    site: Site,
    fetcher: Arc<dyn ArticleFetcher>,
    messenger: Arc<dyn Messenger>,
    scheduler: Arc<dyn Scheduler>,
    store: Arc<Mutex<PendingStore>>,
    /// Matches inbound text carrying a direct link to the news site.
    site_url_re: Regex,
}

impl NewsService {
    pub fn new(
        site: Site,
        fetcher: Arc<dyn ArticleFetcher>,
        messenger: Arc<dyn Messenger>,
        scheduler: Arc<dyn Scheduler>,
        store: Arc<Mutex<PendingStore>>,
    ) -> Result<Self> {
        let host = reqwest::Url::parse(&site.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
            .context("site.base_url must have a host")?;
        let site_url_re = Regex::new(&format!(
            r"https?://(?:www\.)?{}\S+",
            regex::escape(&host)
        ))
        .context("failed to build site url pattern")?;

        Ok(Self {
            site,
            fetcher,
            messenger,
            scheduler,
            store,
            site_url_re,
        })
    }

    /// Route one inbound text message from an operator. Exact keyboard
    /// labels map to workflow operations; leftover text goes through URL
    /// capture, then the generic-link flow, then review text replacement.
    pub async fn dispatch(&self, operator: OperatorId, text: &str) -> Result<()> {
        let text = text.trim();
        match text {
            "/start" => {
                self.messenger
                    .reply_with_keyboard(operator, "Добро пожаловать! 👋", &ReplyKeyboard::main())
                    .await
            }

            keyboard::BTN_START_REVIEW => {
                if let Err(err) = self.start_review(operator).await {
                    warn!(?err, "review fetch failed");
                    self.messenger
                        .reply(operator, "Произошла ошибка при получении обзора")
                        .await?;
                }
                Ok(())
            }
            keyboard::BTN_PUBLISH_REVIEW
            | keyboard::BTN_EDIT_REVIEW
            | keyboard::BTN_CANCEL_REVIEW => self.handle_review_reply(operator, text).await,

            keyboard::BTN_START_PPV => self.start_ppv_reported(operator, None).await,
            keyboard::BTN_PPV_NOW
            | keyboard::BTN_PPV_0730
            | keyboard::BTN_PPV_0830
            | keyboard::BTN_PPV_0900 => self.choose_ppv_time(operator, text).await,

            keyboard::BTN_START_WEEKLY => {
                if let Err(err) = self.discover_weekly(operator).await {
                    warn!(?err, "weekly discovery failed");
                    self.messenger
                        .reply(
                            operator,
                            "Произошла ошибка при получении результатов еженедельников",
                        )
                        .await?;
                }
                Ok(())
            }
            keyboard::BTN_YES => self.confirm_weekly(operator, true).await,
            keyboard::BTN_NO => self.confirm_weekly(operator, false).await,

            keyboard::BTN_START_OTHER => self.start_other(operator).await,

            _ => {
                if let Some(url) = self.capture_site_url(text) {
                    self.messenger
                        .reply(operator, &format!("Обрабатываю ссылку: {url}"))
                        .await?;
                    return self.start_ppv_reported(operator, Some(url)).await;
                }
                if self.handle_other_text(operator, text).await? {
                    return Ok(());
                }
                self.handle_review_reply(operator, text).await
            }
        }
    }

    /// PPV start with the upstream-failure report the dispatcher owes the
    /// operator.
    async fn start_ppv_reported(&self, operator: OperatorId, url: Option<String>) -> Result<()> {
        if let Err(err) = self.start_ppv(operator, url).await {
            warn!(?err, "ppv fetch failed");
            self.messenger
                .reply(operator, "Произошла ошибка при получении результатов PPV")
                .await?;
        }
        Ok(())
    }

    fn capture_site_url(&self, text: &str) -> Option<String> {
        self.site_url_re
            .find(text)
            .map(|m| m.as_str().to_string())
    }

    /// Entry point for the scheduled daily run (synthetic operator 0).
    pub async fn run_daily_results(&self) -> Result<()> {
        self.discover_weekly(OperatorId(0)).await
    }
}
