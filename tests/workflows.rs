//! Workflow tests against a canned-HTML fetcher and a recording messenger.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use pwnews_bot::config::Site;
use pwnews_bot::fetch::ArticleFetcher;
use pwnews_bot::keyboard::{self, ReplyKeyboard};
use pwnews_bot::messenger::Messenger;
use pwnews_bot::model::{CaptionMode, OperatorId, OtherNewsPhase, Post};
use pwnews_bot::news::NewsService;
use pwnews_bot::scheduler::NoopScheduler;
use pwnews_bot::store::PendingStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

const OP: OperatorId = OperatorId(42);

struct MockFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl ArticleFetcher for MockFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no canned page for {url}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Reply {
        operator: i64,
        text: String,
    },
    Keyboard {
        operator: i64,
        text: String,
        rows: Vec<Vec<String>>,
    },
    Preview {
        operator: i64,
        post: Post,
    },
    Publish {
        post: Post,
        markdown: bool,
    },
}

#[derive(Default)]
struct RecordingMessenger {
    events: StdMutex<Vec<Event>>,
    /// Number of upcoming publish calls to fail.
    fail_publishes: StdMutex<u32>,
}

impl RecordingMessenger {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn published(&self) -> Vec<(Post, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Publish { post, markdown } => Some((post, markdown)),
                _ => None,
            })
            .collect()
    }

    fn replies(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Reply { text, .. } => Some(text),
                Event::Keyboard { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn last_keyboard_rows(&self) -> Option<Vec<Vec<String>>> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                Event::Keyboard { rows, .. } => Some(rows),
                _ => None,
            })
    }

    fn last_preview(&self) -> Option<Post> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                Event::Preview { post, .. } => Some(post),
                _ => None,
            })
    }

    fn fail_next_publishes(&self, count: u32) {
        *self.fail_publishes.lock().unwrap() = count;
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn reply(&self, operator: OperatorId, text: &str) -> Result<()> {
        self.events.lock().unwrap().push(Event::Reply {
            operator: operator.0,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        operator: OperatorId,
        text: &str,
        keyboard: &ReplyKeyboard,
    ) -> Result<()> {
        self.events.lock().unwrap().push(Event::Keyboard {
            operator: operator.0,
            text: text.to_string(),
            rows: keyboard.rows.clone(),
        });
        Ok(())
    }

    async fn preview(&self, operator: OperatorId, post: &Post) -> Result<()> {
        self.events.lock().unwrap().push(Event::Preview {
            operator: operator.0,
            post: post.clone(),
        });
        Ok(())
    }

    async fn publish(&self, post: &Post, mode: CaptionMode) -> Result<()> {
        {
            let mut remaining = self.fail_publishes.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(anyhow!("simulated send failure"));
            }
        }
        self.events.lock().unwrap().push(Event::Publish {
            post: post.clone(),
            markdown: mode == CaptionMode::MarkdownV2,
        });
        Ok(())
    }
}

struct Harness {
    service: NewsService,
    messenger: Arc<RecordingMessenger>,
    store: Arc<Mutex<PendingStore>>,
}

fn site() -> Site {
    Site {
        base_url: "https://pwnews.net".into(),
        review_listing: "/news/1-0-23".into(),
        results_listing: "/news/1-0-21".into(),
        weekly_listing: "/news/1-0-21".into(),
        video_blog: "/blog".into(),
        reviewers: vec!["Smith".into()],
    }
}

fn harness(pages: &[(&str, &str)]) -> Harness {
    let pages = pages
        .iter()
        .map(|(url, html)| (url.to_string(), html.to_string()))
        .collect();
    let messenger = Arc::new(RecordingMessenger::default());
    let store = Arc::new(Mutex::new(PendingStore::new()));
    let service = NewsService::new(
        site(),
        Arc::new(MockFetcher { pages }),
        messenger.clone(),
        Arc::new(NoopScheduler),
        store.clone(),
    )
    .unwrap();
    Harness {
        service,
        messenger,
        store,
    }
}

fn review_pages() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "https://pwnews.net/news/1-0-23",
            r#"<a href="/news/misc">Новость дня</a> <a href="/a/1">Обзор WWE Raw</a>"#,
        ),
        (
            "https://pwnews.net/a/1",
            r#"<title>Обзор Raw - PWNews.net</title><img src="/images/raw.jpg"><div class="textmessage"><p>Первое предложение. Второе предложение. Обзор подготовил Smith.</p><p>Лишний абзац.</p></div>"#,
        ),
    ]
}

#[tokio::test]
async fn review_end_to_end_trims_at_reviewer_and_offers_decision() {
    let h = harness(&review_pages());
    h.service.dispatch(OP, keyboard::BTN_START_REVIEW).await.unwrap();

    let preview = h.messenger.last_preview().unwrap();
    assert_eq!(
        preview.text,
        "Обзор Raw\n\nПервое предложение. Второе предложение."
    );
    assert_eq!(
        preview.image_url.as_deref(),
        Some("https://pwnews.net/images/raw.jpg")
    );
    assert_eq!(preview.buttons.rows[0][0].url, "https://pwnews.net/a/1");

    let rows = h.messenger.last_keyboard_rows().unwrap();
    assert_eq!(
        rows,
        vec![
            vec![keyboard::BTN_PUBLISH_REVIEW.to_string()],
            vec![keyboard::BTN_EDIT_REVIEW.to_string()],
            vec![keyboard::BTN_CANCEL_REVIEW.to_string()],
        ]
    );
    assert!(h.store.lock().await.review(OP).is_some());
}

#[tokio::test]
async fn review_restart_overwrites_edited_entry() {
    let h = harness(&review_pages());
    h.service.dispatch(OP, keyboard::BTN_START_REVIEW).await.unwrap();
    h.service.dispatch(OP, "Совсем новый текст").await.unwrap();
    assert_eq!(
        h.store.lock().await.review(OP).unwrap().post.text,
        "Совсем новый текст"
    );

    h.service.dispatch(OP, keyboard::BTN_START_REVIEW).await.unwrap();
    let text = h.store.lock().await.review(OP).unwrap().post.text.clone();
    assert!(text.starts_with("Обзор Raw"));
}

#[tokio::test]
async fn review_publish_deletes_entry_and_sends_to_channel() {
    let h = harness(&review_pages());
    h.service.dispatch(OP, keyboard::BTN_START_REVIEW).await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_PUBLISH_REVIEW).await.unwrap();

    let published = h.messenger.published();
    assert_eq!(published.len(), 1);
    assert!(!published[0].1, "review captions are plain");
    assert!(h.store.lock().await.review(OP).is_none());
    assert!(h
        .messenger
        .replies()
        .contains(&"Обзор успешно опубликован!".to_string()));
}

#[tokio::test]
async fn review_publish_failure_retains_entry_for_retry() {
    let h = harness(&review_pages());
    h.service.dispatch(OP, keyboard::BTN_START_REVIEW).await.unwrap();

    h.messenger.fail_next_publishes(1);
    h.service.dispatch(OP, keyboard::BTN_PUBLISH_REVIEW).await.unwrap();
    assert!(h.messenger.published().is_empty());
    assert!(h.store.lock().await.review(OP).is_some());
    assert!(h
        .messenger
        .replies()
        .contains(&"Ошибка при публикации обзора".to_string()));

    // Retry succeeds once the transport recovers.
    h.service.dispatch(OP, keyboard::BTN_PUBLISH_REVIEW).await.unwrap();
    assert_eq!(h.messenger.published().len(), 1);
    assert!(h.store.lock().await.review(OP).is_none());
}

#[tokio::test]
async fn review_decision_without_entry_reports_nothing_pending() {
    let h = harness(&[]);
    h.service.dispatch(OP, keyboard::BTN_PUBLISH_REVIEW).await.unwrap();
    assert_eq!(
        h.messenger.replies(),
        vec!["Нет ожидающего обзора для публикации".to_string()]
    );
}

fn ppv_pages() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "https://pwnews.net/news/1-0-21",
            r#"<a href="/b/1">Результаты PPV SummerSlam</a>"#,
        ),
        (
            "https://pwnews.net/b/1",
            r#"<title>Результаты SummerSlam - PWNews.net</title><img src="/images/ss.jpg"><div class="textmessage"><p>Главный&nbsp;матч.</p></div><a href="https://www.youtube.com/watch?v=abc123">видео</a>"#,
        ),
    ]
}

#[tokio::test]
async fn ppv_discovery_builds_read_and_watch_buttons() {
    let h = harness(&ppv_pages());
    h.service.dispatch(OP, keyboard::BTN_START_PPV).await.unwrap();

    let pending = h.store.lock().await.ppv(OP).cloned().unwrap();
    assert_eq!(pending.source_url, "https://pwnews.net/b/1");
    assert_eq!(
        pending.video_url.as_deref(),
        Some("https://www.youtube.com/watch?v=abc123")
    );
    assert_eq!(pending.post.buttons.rows.len(), 2);
    assert_eq!(pending.post.text, "Результаты SummerSlam\n\nГлавный матч.");

    let rows = h.messenger.last_keyboard_rows().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][0], keyboard::BTN_PPV_NOW);
}

#[tokio::test]
async fn ppv_inbound_site_url_bypasses_discovery() {
    // No listing page registered: only the article itself.
    let h = harness(&ppv_pages()[1..]);
    h.service
        .dispatch(OP, "Глянь https://pwnews.net/b/1 срочно")
        .await
        .unwrap();

    assert!(h
        .messenger
        .replies()
        .contains(&"Обрабатываю ссылку: https://pwnews.net/b/1".to_string()));
    assert!(h.store.lock().await.ppv(OP).is_some());
}

#[tokio::test]
async fn ppv_publish_now_deletes_entry_and_failure_retains_it() {
    let h = harness(&ppv_pages());
    h.service.dispatch(OP, keyboard::BTN_START_PPV).await.unwrap();

    h.messenger.fail_next_publishes(1);
    h.service.dispatch(OP, keyboard::BTN_PPV_NOW).await.unwrap();
    assert!(h.store.lock().await.ppv(OP).is_some());

    h.service.dispatch(OP, keyboard::BTN_PPV_NOW).await.unwrap();
    assert_eq!(h.messenger.published().len(), 1);
    assert!(h.store.lock().await.ppv(OP).is_none());
}

#[tokio::test]
async fn ppv_deferred_slot_confirms_but_keeps_entry() {
    let h = harness(&ppv_pages());
    h.service.dispatch(OP, keyboard::BTN_START_PPV).await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_PPV_0730).await.unwrap();

    assert!(h.messenger.published().is_empty());
    assert!(h
        .messenger
        .replies()
        .contains(&"Результаты PPV запланированы к публикации В 7:30".to_string()));
    assert!(h.store.lock().await.ppv(OP).is_some());
}

#[tokio::test]
async fn ppv_time_choice_without_entry_reports_nothing_pending() {
    let h = harness(&[]);
    h.service.dispatch(OP, keyboard::BTN_PPV_NOW).await.unwrap();
    assert_eq!(
        h.messenger.replies(),
        vec!["Нет ожидающих результатов PPV для публикации".to_string()]
    );
}

fn weekly_pages(date: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "https://pwnews.net/news/1-0-21",
            format!(r#"<a href="/polls">Результаты опроса</a> <a href="/w/1">Результаты WWE Raw {date}</a>"#),
        ),
        (
            "https://pwnews.net/w/1",
            format!(
                r#"<title>Результаты WWE Monday Night Raw {date} - PWNews.net</title><div class="textmessage"><p>Итоги.</p></div>"#
            ),
        ),
        (
            "https://pwnews.net/blog",
            format!(
                "<li>SmackDown 01.01.2020</li>\n<li><a href=\"https://video.example/raw\"><img src=\"/thumb/raw.jpg\">Raw {date}</a></li>"
            ),
        ),
    ]
}

fn weekly_harness(days_ago: i64) -> Harness {
    let date = (Utc::now().date_naive() - chrono::Duration::days(days_ago))
        .format("%d.%m.%Y")
        .to_string();
    let pages = weekly_pages(&date);
    let borrowed: Vec<(&str, &str)> = pages.iter().map(|(u, h)| (*u, h.as_str())).collect();
    harness(&borrowed)
}

#[tokio::test]
async fn weekly_yesterday_is_fresh_and_publishes_escaped_caption() {
    let h = weekly_harness(1);
    h.service.dispatch(OP, keyboard::BTN_START_WEEKLY).await.unwrap();

    let published = h.messenger.published();
    assert_eq!(published.len(), 1);
    let (post, markdown) = &published[0];
    assert!(*markdown, "weekly captions are MarkdownV2-escaped");
    assert!(post.text.contains("\\."), "date dots must be escaped");
    assert_eq!(
        post.image_url.as_deref(),
        Some("https://pwnews.net/thumb/raw.jpg")
    );
    assert!(h.store.lock().await.weekly(OP).is_none());
    assert!(h
        .messenger
        .replies()
        .contains(&"Результаты еженедельника опубликованы!".to_string()));
}

#[tokio::test]
async fn weekly_two_days_old_is_stale_and_waits_for_confirmation() {
    let h = weekly_harness(2);
    h.service.dispatch(OP, keyboard::BTN_START_WEEKLY).await.unwrap();

    assert!(h.messenger.published().is_empty());
    assert!(h.store.lock().await.weekly(OP).is_some());
    assert!(h.messenger.last_preview().is_some());
    assert_eq!(
        h.messenger.last_keyboard_rows().unwrap(),
        vec![
            vec![keyboard::BTN_YES.to_string()],
            vec![keyboard::BTN_NO.to_string()],
        ]
    );
}

#[tokio::test]
async fn weekly_stale_confirmation_publishes_stored_post() {
    let h = weekly_harness(2);
    h.service.dispatch(OP, keyboard::BTN_START_WEEKLY).await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_YES).await.unwrap();

    let published = h.messenger.published();
    assert_eq!(published.len(), 1);
    assert!(published[0].1);
    assert!(h.store.lock().await.weekly(OP).is_none());
}

#[tokio::test]
async fn weekly_stale_rejection_discards_entry_without_publish() {
    let h = weekly_harness(2);
    h.service.dispatch(OP, keyboard::BTN_START_WEEKLY).await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_NO).await.unwrap();

    assert!(h.messenger.published().is_empty());
    assert!(h.store.lock().await.weekly(OP).is_none());
    assert!(h
        .messenger
        .replies()
        .contains(&"Публикация отменена".to_string()));
}

#[tokio::test]
async fn weekly_stale_publish_failure_retains_entry() {
    let h = weekly_harness(2);
    h.service.dispatch(OP, keyboard::BTN_START_WEEKLY).await.unwrap();

    h.messenger.fail_next_publishes(1);
    h.service.dispatch(OP, keyboard::BTN_YES).await.unwrap();
    assert!(h.store.lock().await.weekly(OP).is_some());
}

const OTHER_PAGE: &str = r#"<title>Оценки Raw - PWNews.net</title><meta property="og:image" content="/og.png"><meta property="og:description" content="Оценки зрителей"><img src="/fallback.png">"#;

#[tokio::test]
async fn other_news_invalid_url_reprompts_without_phase_change() {
    let h = harness(&[]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "ftp://not-http").await.unwrap();

    let pending = h.store.lock().await.other(OP).cloned().unwrap();
    assert_eq!(pending.phase, OtherNewsPhase::WaitingUrl);
    assert!(h
        .messenger
        .replies()
        .contains(&"Отправьте корректную ссылку (http:// или https://):".to_string()));
}

#[tokio::test]
async fn other_news_empty_button_text_defaults_label() {
    let h = harness(&[("https://example.com/page", OTHER_PAGE)]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "https://example.com/page").await.unwrap();

    {
        let store = h.store.lock().await;
        let pending = store.other(OP).unwrap();
        assert_eq!(pending.phase, OtherNewsPhase::WaitingButtonText);
        assert_eq!(pending.title.as_deref(), Some("Оценки Raw"));
        assert_eq!(pending.image_url.as_deref(), Some("https://example.com/og.png"));
    }

    h.service.dispatch(OP, "").await.unwrap();
    let pending = h.store.lock().await.other(OP).cloned().unwrap();
    assert_eq!(pending.phase, OtherNewsPhase::ReadyToPublish);
    assert_eq!(pending.button_text.as_deref(), Some("ОЦЕНКИ"));

    let preview = h.messenger.last_preview().unwrap();
    assert_eq!(preview.buttons.rows[0][0].label, "ОЦЕНКИ");
    assert_eq!(preview.buttons.rows[0][0].url, "https://example.com/page");
    assert!(preview.text.starts_with("Оценки Raw"));
}

#[tokio::test]
async fn other_news_publish_deletes_entry() {
    let h = harness(&[("https://example.com/page", OTHER_PAGE)]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "https://example.com/page").await.unwrap();
    h.service.dispatch(OP, "Читать").await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_OTHER_PUBLISH).await.unwrap();

    let published = h.messenger.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0.buttons.rows[0][0].label, "Читать");
    assert!(h.store.lock().await.other(OP).is_none());
}

#[tokio::test]
async fn other_news_photo_failure_falls_back_to_text_only() {
    let h = harness(&[("https://example.com/page", OTHER_PAGE)]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "https://example.com/page").await.unwrap();
    h.service.dispatch(OP, "Читать").await.unwrap();

    h.messenger.fail_next_publishes(1);
    h.service.dispatch(OP, keyboard::BTN_OTHER_PUBLISH).await.unwrap();

    let published = h.messenger.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0.image_url, None);
    assert!(h.store.lock().await.other(OP).is_none());
}

#[tokio::test]
async fn other_news_total_publish_failure_retains_entry() {
    let h = harness(&[("https://example.com/page", OTHER_PAGE)]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "https://example.com/page").await.unwrap();
    h.service.dispatch(OP, "Читать").await.unwrap();

    h.messenger.fail_next_publishes(2);
    h.service.dispatch(OP, keyboard::BTN_OTHER_PUBLISH).await.unwrap();

    assert!(h.messenger.published().is_empty());
    assert!(h.store.lock().await.other(OP).is_some());
    assert!(h
        .messenger
        .replies()
        .contains(&"Ошибка при публикации поста".to_string()));
}

#[tokio::test]
async fn other_news_cancel_discards_entry_at_any_phase() {
    let h = harness(&[("https://example.com/page", OTHER_PAGE)]);
    h.service.dispatch(OP, keyboard::BTN_START_OTHER).await.unwrap();
    h.service.dispatch(OP, "https://example.com/page").await.unwrap();
    h.service.dispatch(OP, keyboard::BTN_OTHER_CANCEL).await.unwrap();

    assert!(h.store.lock().await.other(OP).is_none());
    assert!(h
        .messenger
        .replies()
        .contains(&"Публикация отменена".to_string()));
}

#[tokio::test]
async fn free_text_without_any_entry_falls_through_to_review_guard() {
    let h = harness(&[]);
    h.service.dispatch(OP, "просто сообщение").await.unwrap();
    assert_eq!(
        h.messenger.replies(),
        vec!["Нет ожидающего обзора для публикации".to_string()]
    );
}

#[tokio::test]
async fn start_command_offers_main_keyboard() {
    let h = harness(&[]);
    h.service.dispatch(OP, "/start").await.unwrap();
    let rows = h.messenger.last_keyboard_rows().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][0], keyboard::BTN_START_REVIEW);
}
