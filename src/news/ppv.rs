//! PPV results workflow: fetch (by discovery or an operator-supplied link),
//! preview, then publish now or hand a time slot to the scheduler.
use super::NewsService;
use crate::keyboard::{self, ReplyKeyboard};
use crate::model::{CaptionMode, LinkButtonSet, OperatorId, PendingPpv, Post};
use crate::scrape;
use anyhow::Result;
use tracing::{info, warn};

impl NewsService {
    pub(super) async fn start_ppv(
        &self,
        operator: OperatorId,
        explicit_url: Option<String>,
    ) -> Result<()> {
        let url = match explicit_url {
            Some(url) => url,
            None => {
                let listing_url = self.site.url(&self.site.results_listing);
                let listing = self.fetcher.fetch_html(&listing_url).await?;
                match scrape::find_results_link(&listing) {
                    Some(link) => scrape::absolutize(&link, &self.site.base_url),
                    None => {
                        return self
                            .messenger
                            .reply(operator, "Не удалось получить ссылку на результаты")
                            .await;
                    }
                }
            }
        };

        let html = self.fetcher.fetch_html(&url).await?;
        let article = scrape::parse_results_article(&html, &self.site.base_url);

        let mut buttons = LinkButtonSet::single(scrape::READ_MORE_LABEL, url.clone());
        if let Some(video) = &article.video_url {
            buttons.push_row(scrape::WATCH_VIDEO_LABEL, video.clone());
        }
        let post = Post {
            text: format!("{}\n\n{}", article.title, article.body),
            image_url: article.image_url,
            buttons,
        };
        let pending = PendingPpv {
            post: post.clone(),
            source_url: url.clone(),
            video_url: article.video_url,
        };
        self.store.lock().await.set_ppv(operator, pending);
        info!(operator = operator.0, url, "ppv results pending");

        self.messenger.preview(operator, &post).await?;
        self.messenger
            .reply_with_keyboard(operator, "Когда опубликовать?", &ReplyKeyboard::ppv_times())
            .await
    }

    pub(super) async fn choose_ppv_time(&self, operator: OperatorId, choice: &str) -> Result<()> {
        let pending = self.store.lock().await.ppv(operator).cloned();
        let pending = match pending {
            Some(p) => p,
            None => {
                return self
                    .messenger
                    .reply(operator, "Нет ожидающих результатов PPV для публикации")
                    .await;
            }
        };

        if choice == keyboard::BTN_PPV_NOW {
            match self
                .messenger
                .publish(&pending.post, CaptionMode::Plain)
                .await
            {
                Ok(()) => {
                    self.store.lock().await.remove_ppv(operator);
                    self.messenger
                        .reply_with_keyboard(
                            operator,
                            "Результаты PPV успешно опубликованы!",
                            &ReplyKeyboard::main(),
                        )
                        .await
                }
                Err(err) => {
                    // Entry stays in the store so the operator can retry.
                    warn!(?err, operator = operator.0, "ppv publish failed");
                    self.messenger
                        .reply(operator, "Ошибка при публикации результатов PPV")
                        .await
                }
            }
        } else {
            // The entry is kept for whatever picks the slot up; the default
            // scheduler only records the request.
            self.scheduler
                .schedule(operator, choice, &pending.source_url)?;
            self.messenger
                .reply_with_keyboard(
                    operator,
                    &format!("Результаты PPV запланированы к публикации {choice}"),
                    &ReplyKeyboard::main(),
                )
                .await
        }
    }
}
