//! Chat transport seam.
//!
//! `TelegramMessenger` serves interactive operators; `ChannelOnlyMessenger`
//! serves the operator-absent daily run, publishing through the same real
//! transport while routing operator-directed notices to the log.
use crate::keyboard::{self, ReplyKeyboard};
use crate::model::{CaptionMode, OperatorId, Post};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, Recipient};
use tracing::info;

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Plain message to the operator chat.
    async fn reply(&self, operator: OperatorId, text: &str) -> Result<()>;

    /// Message with a reply keyboard attached.
    async fn reply_with_keyboard(
        &self,
        operator: OperatorId,
        text: &str,
        keyboard: &ReplyKeyboard,
    ) -> Result<()>;

    /// Render a post preview in the operator chat.
    async fn preview(&self, operator: OperatorId, post: &Post) -> Result<()>;

    /// Publish a post to the public channel.
    async fn publish(&self, post: &Post, mode: CaptionMode) -> Result<()>;
}

/// Resolve the configured channel ("@username" or numeric id) to a recipient.
pub fn channel_recipient(channel: &str) -> Recipient {
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(channel.to_string()),
    }
}

async fn send_post(bot: &Bot, to: Recipient, post: &Post, mode: CaptionMode) -> Result<()> {
    let markup = if post.buttons.is_empty() {
        None
    } else {
        Some(keyboard::link_buttons_markup(&post.buttons)?)
    };

    if let Some(image) = &post.image_url {
        let photo = InputFile::url(
            reqwest::Url::parse(image).with_context(|| format!("invalid photo url {image}"))?,
        );
        let mut req = bot.send_photo(to, photo).caption(&post.text);
        if mode == CaptionMode::MarkdownV2 {
            req = req.parse_mode(ParseMode::MarkdownV2);
        }
        if let Some(markup) = markup {
            req = req.reply_markup(markup);
        }
        req.await.context("failed to send photo")?;
    } else {
        let mut req = bot.send_message(to, &post.text);
        if mode == CaptionMode::MarkdownV2 {
            req = req.parse_mode(ParseMode::MarkdownV2);
        }
        if let Some(markup) = markup {
            req = req.reply_markup(markup);
        }
        req.await.context("failed to send message")?;
    }
    Ok(())
}

/// Interactive transport: operator replies go to the operator's private
/// chat, publishes go to the configured channel.
pub struct TelegramMessenger {
    bot: Bot,
    channel: Option<Recipient>,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, channel: Option<String>) -> Self {
        Self {
            bot,
            channel: channel.as_deref().map(channel_recipient),
        }
    }

    fn channel(&self) -> Result<Recipient> {
        self.channel
            .clone()
            .ok_or_else(|| anyhow!("канал для публикации не настроен"))
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn reply(&self, operator: OperatorId, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(operator.0), text)
            .await
            .context("failed to reply to operator")?;
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        operator: OperatorId,
        text: &str,
        keyboard: &ReplyKeyboard,
    ) -> Result<()> {
        self.bot
            .send_message(ChatId(operator.0), text)
            .reply_markup(keyboard.to_markup())
            .await
            .context("failed to reply with keyboard")?;
        Ok(())
    }

    async fn preview(&self, operator: OperatorId, post: &Post) -> Result<()> {
        send_post(
            &self.bot,
            Recipient::Id(ChatId(operator.0)),
            post,
            CaptionMode::Plain,
        )
        .await
    }

    async fn publish(&self, post: &Post, mode: CaptionMode) -> Result<()> {
        send_post(&self.bot, self.channel()?, post, mode).await
    }
}

/// Scheduled-run transport: real channel publishes, logged operator notices.
/// The daily job has no operator chat to talk back to.
pub struct ChannelOnlyMessenger {
    bot: Bot,
    channel: Option<Recipient>,
}

impl ChannelOnlyMessenger {
    pub fn new(bot: Bot, channel: Option<String>) -> Self {
        Self {
            bot,
            channel: channel.as_deref().map(channel_recipient),
        }
    }
}

#[async_trait]
impl Messenger for ChannelOnlyMessenger {
    async fn reply(&self, operator: OperatorId, text: &str) -> Result<()> {
        info!(operator = operator.0, text, "scheduled-run notice");
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        operator: OperatorId,
        text: &str,
        _keyboard: &ReplyKeyboard,
    ) -> Result<()> {
        info!(operator = operator.0, text, "scheduled-run prompt (unanswerable)");
        Ok(())
    }

    async fn preview(&self, operator: OperatorId, post: &Post) -> Result<()> {
        info!(operator = operator.0, text = %post.text, "scheduled-run preview");
        Ok(())
    }

    async fn publish(&self, post: &Post, mode: CaptionMode) -> Result<()> {
        let channel = self
            .channel
            .clone()
            .ok_or_else(|| anyhow!("канал для публикации не настроен"))?;
        send_post(&self.bot, channel, post, mode).await
    }
}
