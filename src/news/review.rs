//! Review workflow: fetch the latest review, let the operator publish it
//! as-is, replace the text, or cancel.
use super::NewsService;
use crate::keyboard::{self, ReplyKeyboard};
use crate::model::{CaptionMode, LinkButtonSet, OperatorId, PendingReview, Post, ReviewPhase};
use crate::scrape;
use anyhow::Result;
use tracing::{info, warn};

impl NewsService {
    pub(super) async fn start_review(&self, operator: OperatorId) -> Result<()> {
        let listing_url = self.site.url(&self.site.review_listing);
        let listing = self.fetcher.fetch_html(&listing_url).await?;
        let link = match scrape::find_review_link(&listing) {
            Some(link) => link,
            None => {
                return self
                    .messenger
                    .reply(operator, "Не удалось получить ссылку на обзор")
                    .await;
            }
        };

        let url = scrape::absolutize(&link, &self.site.base_url);
        let html = self.fetcher.fetch_html(&url).await?;
        let article = scrape::parse_review_article(&html, &self.site.base_url);
        let body = scrape::trim_text_at_reviewer_name(&article.body, &self.site.reviewers);

        let post = Post {
            text: format!("{}\n\n{}", article.title, body),
            image_url: article.image_url,
            buttons: LinkButtonSet::single(scrape::READ_MORE_LABEL, url.clone()),
        };
        let pending = PendingReview {
            post: post.clone(),
            source_url: url.clone(),
            phase: ReviewPhase::AwaitingDecision,
        };
        self.store.lock().await.set_review(operator, pending);
        info!(operator = operator.0, url, "review pending");

        self.messenger.preview(operator, &post).await?;
        self.messenger
            .reply_with_keyboard(
                operator,
                "Проверьте пост и выберите действие:",
                &ReplyKeyboard::review_decision(),
            )
            .await
    }

    /// Decision-keyboard presses and free-text replacements. Free text while
    /// an entry exists always becomes the new display text, whichever phase
    /// the entry is in.
    pub(super) async fn handle_review_reply(&self, operator: OperatorId, text: &str) -> Result<()> {
        let pending = self.store.lock().await.review(operator).cloned();
        let pending = match pending {
            Some(p) => p,
            None => {
                return self
                    .messenger
                    .reply(operator, "Нет ожидающего обзора для публикации")
                    .await;
            }
        };

        match text {
            keyboard::BTN_PUBLISH_REVIEW => {
                match self
                    .messenger
                    .publish(&pending.post, CaptionMode::Plain)
                    .await
                {
                    Ok(()) => {
                        self.store.lock().await.remove_review(operator);
                        self.messenger
                            .reply_with_keyboard(
                                operator,
                                "Обзор успешно опубликован!",
                                &ReplyKeyboard::main(),
                            )
                            .await
                    }
                    Err(err) => {
                        // Entry stays in the store so the operator can retry.
                        warn!(?err, operator = operator.0, "review publish failed");
                        self.messenger
                            .reply(operator, "Ошибка при публикации обзора")
                            .await
                    }
                }
            }

            keyboard::BTN_EDIT_REVIEW => {
                if let Some(entry) = self.store.lock().await.review_mut(operator) {
                    entry.phase = ReviewPhase::AwaitingNewText;
                }
                self.messenger
                    .reply_with_keyboard(
                        operator,
                        "Отправьте новый текст для обзора:",
                        &ReplyKeyboard::review_cancel(),
                    )
                    .await
            }

            keyboard::BTN_CANCEL_REVIEW => {
                self.store.lock().await.remove_review(operator);
                self.messenger
                    .reply_with_keyboard(
                        operator,
                        "Публикация обзора отменена",
                        &ReplyKeyboard::main(),
                    )
                    .await
            }

            replacement => {
                let updated = {
                    let mut store = self.store.lock().await;
                    match store.review_mut(operator) {
                        Some(entry) => {
                            entry.post.text = replacement.to_string();
                            entry.phase = ReviewPhase::AwaitingDecision;
                            entry.post.clone()
                        }
                        None => return Ok(()),
                    }
                };
                self.messenger.preview(operator, &updated).await?;
                self.messenger
                    .reply_with_keyboard(
                        operator,
                        "Обновленный пост. Выберите действие:",
                        &ReplyKeyboard::review_decision(),
                    )
                    .await
            }
        }
    }
}
