//! Generic-link workflow: operator supplies a URL, the bot loads the page
//! meta, the operator names the action button, confirms, and the post goes
//! to the channel.
use super::NewsService;
use crate::keyboard::{self, ReplyKeyboard};
use crate::model::{
    CaptionMode, LinkButtonSet, OperatorId, OtherNewsPhase, PendingOtherNews, Post,
};
use crate::scrape;
use anyhow::Result;
use tracing::{info, warn};

fn build_post(pending: &PendingOtherNews) -> Post {
    let mut text = pending.title.clone().unwrap_or_default();
    if let Some(description) = pending.description.as_deref().filter(|d| !d.is_empty()) {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(description);
    }
    let label = pending
        .button_text
        .clone()
        .unwrap_or_else(|| keyboard::DEFAULT_OTHER_BUTTON.to_string());
    Post {
        text,
        image_url: pending.image_url.clone(),
        buttons: LinkButtonSet::single(label, pending.source_url.clone().unwrap_or_default()),
    }
}

impl NewsService {
    pub(super) async fn start_other(&self, operator: OperatorId) -> Result<()> {
        self.store
            .lock()
            .await
            .set_other(operator, PendingOtherNews::new());
        self.messenger
            .reply_with_keyboard(
                operator,
                "Отправьте ссылку на страницу:",
                &ReplyKeyboard::other_cancel(),
            )
            .await
    }

    /// Phase-driven text handling. Returns `false` when no entry exists for
    /// the operator, so the dispatcher can route the text elsewhere.
    pub(super) async fn handle_other_text(&self, operator: OperatorId, text: &str) -> Result<bool> {
        let pending = self.store.lock().await.other(operator).cloned();
        let pending = match pending {
            Some(p) => p,
            None => return Ok(false),
        };

        if text == keyboard::BTN_OTHER_CANCEL {
            self.store.lock().await.remove_other(operator);
            self.messenger
                .reply_with_keyboard(operator, "Публикация отменена", &ReplyKeyboard::main())
                .await?;
            return Ok(true);
        }

        match pending.phase {
            OtherNewsPhase::WaitingUrl => self.other_load_url(operator, text).await?,
            OtherNewsPhase::WaitingButtonText => {
                self.other_set_button(operator, pending, text).await?
            }
            OtherNewsPhase::ReadyToPublish => {
                if text == keyboard::BTN_OTHER_PUBLISH {
                    self.other_publish(operator, pending).await?;
                } else {
                    self.messenger
                        .reply_with_keyboard(
                            operator,
                            "Выберите действие:",
                            &ReplyKeyboard::other_confirm(),
                        )
                        .await?;
                }
            }
        }
        Ok(true)
    }

    async fn other_load_url(&self, operator: OperatorId, text: &str) -> Result<()> {
        if !(text.starts_with("http://") || text.starts_with("https://")) {
            // Phase unchanged, just ask again.
            return self
                .messenger
                .reply_with_keyboard(
                    operator,
                    "Отправьте корректную ссылку (http:// или https://):",
                    &ReplyKeyboard::other_cancel(),
                )
                .await;
        }

        let html = match self.fetcher.fetch_html(text).await {
            Ok(html) => html,
            Err(err) => {
                warn!(?err, url = text, "failed to load page for generic post");
                return self
                    .messenger
                    .reply_with_keyboard(
                        operator,
                        "Не удалось загрузить страницу, попробуйте другую ссылку:",
                        &ReplyKeyboard::other_cancel(),
                    )
                    .await;
            }
        };

        let meta = scrape::parse_generic_page(&html, text);
        let title = meta.title.clone().unwrap_or_else(|| "Без названия".to_string());
        {
            let mut store = self.store.lock().await;
            if let Some(entry) = store.other_mut(operator) {
                entry.source_url = Some(text.to_string());
                entry.title = meta.title;
                entry.description = meta.description;
                entry.image_url = meta.image_url;
                entry.phase = OtherNewsPhase::WaitingButtonText;
            }
        }
        info!(operator = operator.0, url = text, "generic page loaded");

        self.messenger
            .reply_with_keyboard(
                operator,
                &format!("Загружено: {title}\nОтправьте текст кнопки:"),
                &ReplyKeyboard::other_cancel(),
            )
            .await
    }

    async fn other_set_button(
        &self,
        operator: OperatorId,
        mut pending: PendingOtherNews,
        text: &str,
    ) -> Result<()> {
        let label = if text.trim().is_empty() {
            keyboard::DEFAULT_OTHER_BUTTON.to_string()
        } else {
            text.trim().to_string()
        };
        pending.button_text = Some(label);
        pending.phase = OtherNewsPhase::ReadyToPublish;

        let post = build_post(&pending);
        self.store.lock().await.set_other(operator, pending);

        self.messenger.preview(operator, &post).await?;
        self.messenger
            .reply_with_keyboard(operator, "Опубликовать пост?", &ReplyKeyboard::other_confirm())
            .await
    }

    async fn other_publish(&self, operator: OperatorId, pending: PendingOtherNews) -> Result<()> {
        let post = build_post(&pending);

        let mut result = self.messenger.publish(&post, CaptionMode::Plain).await;
        if result.is_err() && post.image_url.is_some() {
            // Photo send failed; retry as a text-only post.
            warn!(operator = operator.0, "photo publish failed, retrying text-only");
            let fallback = Post {
                image_url: None,
                ..post
            };
            result = self.messenger.publish(&fallback, CaptionMode::Plain).await;
        }

        match result {
            Ok(()) => {
                self.store.lock().await.remove_other(operator);
                self.messenger
                    .reply_with_keyboard(operator, "Пост опубликован!", &ReplyKeyboard::main())
                    .await
            }
            Err(err) => {
                // Entry stays in the store so the operator can retry.
                warn!(?err, operator = operator.0, "generic post publish failed");
                self.messenger
                    .reply(operator, "Ошибка при публикации поста")
                    .await
            }
        }
    }
}
