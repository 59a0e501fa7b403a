//! Weekly show results: discovery, video-blog cross-reference, the staleness
//! gate and the stale-confirmation dialogue.
//!
//! Fresh results (dated yesterday or later) go straight to the channel;
//! stale ones are previewed to the operator and held until confirmed.
use super::NewsService;
use crate::keyboard::ReplyKeyboard;
use crate::model::{CaptionMode, LinkButtonSet, OperatorId, PendingWeekly, Post, WeeklyShow};
use crate::scrape;
use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

impl NewsService {
    pub(super) async fn discover_weekly(&self, operator: OperatorId) -> Result<()> {
        let listing_url = self.site.url(&self.site.weekly_listing);
        let listing = self.fetcher.fetch_html(&listing_url).await?;
        let link = match scrape::find_weekly_link(&listing) {
            Some(link) => link,
            None => {
                return self
                    .messenger
                    .reply(operator, "Не удалось найти ссылку на результаты еженедельника")
                    .await;
            }
        };

        let url = scrape::absolutize(&link, &self.site.base_url);
        let html = self.fetcher.fetch_html(&url).await?;
        let article = scrape::parse_results_article(&html, &self.site.base_url);

        let show = match WeeklyShow::from_title(&article.title) {
            Some(show) => show,
            None => {
                return self
                    .messenger
                    .reply(operator, "Не удалось определить шоу по заголовку")
                    .await;
            }
        };
        let date = match scrape::extract_date(&article.title) {
            Some(date) => date,
            None => {
                return self
                    .messenger
                    .reply(operator, "Не удалось извлечь дату из заголовка")
                    .await;
            }
        };
        let date_str = date.format("%d.%m.%Y").to_string();

        let blog_url = self.site.url(&self.site.video_blog);
        let blog = self.fetcher.fetch_html(&blog_url).await?;
        let (video_url, video_image_url) = match scrape::find_video_blog_entry(
            &blog,
            show.display_name(),
            &date_str,
            &self.site.base_url,
        ) {
            Some(entry) => entry,
            None => {
                return self
                    .messenger
                    .reply(operator, "Не удалось найти видео в видеоблоге")
                    .await;
            }
        };

        let mut buttons = LinkButtonSet::single(scrape::READ_MORE_LABEL, url.clone());
        buttons.push_row(scrape::WATCH_VIDEO_LABEL, video_url.clone());
        let post = Post {
            text: article.title.clone(),
            image_url: Some(video_image_url.clone()),
            buttons,
        };

        let today = Utc::now().date_naive();
        if scrape::is_fresh(date, today) {
            info!(operator = operator.0, show = show.display_name(), %date, "publishing fresh weekly results");
            match self.publish_weekly(&post).await {
                Ok(()) => {
                    self.messenger
                        .reply_with_keyboard(
                            operator,
                            "Результаты еженедельника опубликованы!",
                            &ReplyKeyboard::main(),
                        )
                        .await
                }
                Err(err) => {
                    warn!(?err, operator = operator.0, "weekly publish failed");
                    self.messenger
                        .reply(operator, "Ошибка при публикации результатов еженедельника")
                        .await
                }
            }
        } else {
            let pending = PendingWeekly {
                post: post.clone(),
                results_url: url,
                video_url,
                video_image_url,
            };
            self.store.lock().await.set_weekly(operator, pending);
            info!(operator = operator.0, show = show.display_name(), %date, "stale weekly results need confirmation");

            self.messenger.preview(operator, &post).await?;
            self.messenger
                .reply_with_keyboard(
                    operator,
                    &format!("Результаты устарели (дата: {date_str}). Опубликовать всё равно?"),
                    &ReplyKeyboard::weekly_confirm(),
                )
                .await
        }
    }

    pub(super) async fn confirm_weekly(&self, operator: OperatorId, confirmed: bool) -> Result<()> {
        let pending = self.store.lock().await.weekly(operator).cloned();
        let pending = match pending {
            Some(p) => p,
            None => {
                return self
                    .messenger
                    .reply(operator, "Нет ожидающих результатов еженедельника")
                    .await;
            }
        };

        if confirmed {
            match self.publish_weekly(&pending.post).await {
                Ok(()) => {
                    self.store.lock().await.remove_weekly(operator);
                    self.messenger
                        .reply_with_keyboard(
                            operator,
                            "Результаты еженедельников опубликованы!",
                            &ReplyKeyboard::main(),
                        )
                        .await
                }
                Err(err) => {
                    // Entry stays in the store so the operator can retry.
                    warn!(?err, operator = operator.0, "stale weekly publish failed");
                    self.messenger
                        .reply(operator, "Ошибка при публикации результатов еженедельника")
                        .await
                }
            }
        } else {
            self.store.lock().await.remove_weekly(operator);
            self.messenger
                .reply_with_keyboard(operator, "Публикация отменена", &ReplyKeyboard::main())
                .await
        }
    }

    /// Channel captions for weekly results are MarkdownV2-escaped.
    async fn publish_weekly(&self, post: &Post) -> Result<()> {
        let escaped = Post {
            text: scrape::escape_markdown(&post.text),
            image_url: post.image_url.clone(),
            buttons: post.buttons.clone(),
        };
        self.messenger
            .publish(&escaped, CaptionMode::MarkdownV2)
            .await
    }
}
