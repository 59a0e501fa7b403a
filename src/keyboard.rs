//! Reply-keyboard layouts and the fixed button labels the dispatcher
//! matches on. Labels are matched exactly, case- and diacritics-sensitive.
use crate::model::LinkButtonSet;
use anyhow::{Context, Result};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

pub const BTN_START_REVIEW: &str = "📝 Опубликовать обзор";
pub const BTN_PUBLISH_REVIEW: &str = "✅ Опубликовать обзор";
pub const BTN_EDIT_REVIEW: &str = "📝 Изменить текст обзора";
pub const BTN_CANCEL_REVIEW: &str = "❌ Отменить публикацию обзора";

pub const BTN_START_PPV: &str = "🎉 Опубликовать результаты PPV/спецшоу";
pub const BTN_PPV_NOW: &str = "Сейчас";
pub const BTN_PPV_0730: &str = "В 7:30";
pub const BTN_PPV_0830: &str = "В 8:30";
pub const BTN_PPV_0900: &str = "В 9:00";

pub const BTN_START_WEEKLY: &str = "Опубликовать результаты еженедельника";
pub const BTN_YES: &str = "✅ Да";
pub const BTN_NO: &str = "❌ Нет";

pub const BTN_START_OTHER: &str = "🔗 Опубликовать другое";
pub const BTN_OTHER_PUBLISH: &str = "✅ Опубликовать";
pub const BTN_OTHER_CANCEL: &str = "❌ Отмена";

/// Default label for the generic-link action button.
pub const DEFAULT_OTHER_BUTTON: &str = "ОЦЕНКИ";

/// Transport-independent reply keyboard; [`to_markup`](ReplyKeyboard::to_markup)
/// renders it for Telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub one_time: bool,
    pub placeholder: Option<String>,
}

impl ReplyKeyboard {
    fn single_column(labels: &[&str], one_time: bool) -> Self {
        Self {
            rows: labels.iter().map(|l| vec![l.to_string()]).collect(),
            one_time,
            placeholder: None,
        }
    }

    /// Entry-point keyboard offered on /start and after every terminal step.
    pub fn main() -> Self {
        let mut kb = Self::single_column(
            &[BTN_START_REVIEW, BTN_START_PPV, BTN_START_WEEKLY, BTN_START_OTHER],
            false,
        );
        kb.placeholder = Some("Нажмите, чтобы создать пост".to_string());
        kb
    }

    pub fn review_decision() -> Self {
        Self::single_column(&[BTN_PUBLISH_REVIEW, BTN_EDIT_REVIEW, BTN_CANCEL_REVIEW], true)
    }

    pub fn review_cancel() -> Self {
        Self::single_column(&[BTN_CANCEL_REVIEW], true)
    }

    pub fn ppv_times() -> Self {
        Self::single_column(&[BTN_PPV_NOW, BTN_PPV_0730, BTN_PPV_0830, BTN_PPV_0900], true)
    }

    pub fn weekly_confirm() -> Self {
        Self::single_column(&[BTN_YES, BTN_NO], true)
    }

    pub fn other_cancel() -> Self {
        Self::single_column(&[BTN_OTHER_CANCEL], true)
    }

    pub fn other_confirm() -> Self {
        Self::single_column(&[BTN_OTHER_PUBLISH, BTN_OTHER_CANCEL], true)
    }

    pub fn to_markup(&self) -> KeyboardMarkup {
        let rows: Vec<Vec<KeyboardButton>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(KeyboardButton::new).collect())
            .collect();
        let mut markup = KeyboardMarkup::new(rows).resize_keyboard(true);
        if self.one_time {
            markup = markup.one_time_keyboard(true);
        }
        if let Some(placeholder) = &self.placeholder {
            markup = markup.input_field_placeholder(placeholder.clone());
        }
        markup
    }
}

/// Render link buttons as Telegram inline-keyboard markup.
pub fn link_buttons_markup(buttons: &LinkButtonSet) -> Result<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(buttons.rows.len());
    for row in &buttons.rows {
        let mut out = Vec::with_capacity(row.len());
        for button in row {
            let url = reqwest::Url::parse(&button.url)
                .with_context(|| format!("invalid button url {}", button.url))?;
            out.push(InlineKeyboardButton::url(button.label.clone(), url));
        }
        rows.push(out);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}
