//! Regex-based extraction over fetched pwnews.net pages.
//!
//! Everything in this module is a pure function over already-fetched HTML,
//! so the workflows can be exercised against canned pages in tests.
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix pwnews.net appends to every article `<title>`.
const TITLE_SUFFIX: &str = " - PWNews.net";

/// Default "read more" / "watch" button labels.
pub const READ_MORE_LABEL: &str = "📖 Читать на сайте";
pub const WATCH_VIDEO_LABEL: &str = "📺 Смотреть видео";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").expect("title regex"));
static TEXTMESSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class="textmessage">(.*?)</div>"#).expect("textmessage regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));
static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src="([^">]+)""#).expect("img regex"));
static YOUTUBE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://www\.youtube\.com/watch\?v=[a-zA-Z0-9_-]+").expect("youtube regex")
});
static REVIEW_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]+)">Обзор "#).expect("review link regex"));
static RESULTS_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]+)">Результаты "#).expect("results link regex"));
static WEEKLY_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="([^"]+)">Результаты (?:WWE|AEW)[^<]*"#).expect("weekly link regex")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}\.\d{2}\.\d{4}").expect("date regex"));
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]+)""#).expect("href regex"));
static OG_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta[^>]+property="og:image"[^>]+content="([^">]+)""#).expect("og:image regex")
});
static OG_IMAGE_REV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta[^>]+content="([^">]+)"[^>]+property="og:image""#)
        .expect("og:image regex (reversed attrs)")
});
static OG_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta[^>]+property="og:description"[^>]+content="([^">]+)""#)
        .expect("og:description regex")
});

/// Structured fields of a fetched article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// `<title>`, description and preferred image of an arbitrary page
/// (generic-link flow).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// First review link (`>Обзор …`) on a listing page, site-relative or absolute.
pub fn find_review_link(html: &str) -> Option<String> {
    REVIEW_LINK_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

/// First results link (`>Результаты …`) on a listing page.
pub fn find_results_link(html: &str) -> Option<String> {
    RESULTS_LINK_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

/// First weekly-results link whose anchor text is `Результаты WWE|AEW …`.
pub fn find_weekly_link(html: &str) -> Option<String> {
    WEEKLY_LINK_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

/// Make a scraped URL absolute against the site base.
pub fn absolutize(url: &str, base: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), url)
    }
}

pub fn clean_title(raw: &str) -> String {
    raw.replace(TITLE_SUFFIX, "").trim().to_string()
}

pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").replace("&nbsp;", " ")
}

fn page_title(html: &str) -> Option<String> {
    TITLE_RE.captures(html).map(|c| c[1].trim().to_string())
}

fn first_image(html: &str, base: &str) -> Option<String> {
    IMG_RE
        .captures(html)
        .map(|c| absolutize(&c[1], base))
}

/// Parse a review article: title, first paragraph of the body, first image.
pub fn parse_review_article(html: &str, base: &str) -> Article {
    let body = TEXTMESSAGE_RE
        .captures(html)
        .and_then(|c| c[1].split("</p>").next().map(str::to_string))
        .map(|p| strip_tags(&p).trim().to_string())
        .unwrap_or_default();

    Article {
        title: page_title(html).map(|t| clean_title(&t)).unwrap_or_default(),
        body,
        image_url: first_image(html, base),
        video_url: None,
    }
}

/// Parse a results article: title, whole body (tags stripped, `&nbsp;`
/// normalised), first image, optional embedded YouTube link.
pub fn parse_results_article(html: &str, base: &str) -> Article {
    let body = TEXTMESSAGE_RE
        .captures(html)
        .map(|c| strip_tags(&c[1]).trim().to_string())
        .unwrap_or_default();

    Article {
        title: page_title(html).map(|t| clean_title(&t)).unwrap_or_default(),
        body,
        image_url: first_image(html, base),
        video_url: YOUTUBE_RE.find(html).map(|m| m.as_str().to_string()),
    }
}

/// Title (truncated at the first " - ") and image of an arbitrary page.
/// Prefers the Open-Graph image meta tag over the first `<img>`; relative
/// image URLs are resolved against the page URL.
pub fn parse_generic_page(html: &str, page_url: &str) -> PageMeta {
    let title = page_title(html)
        .map(|t| t.split(" - ").next().unwrap_or_default().trim().to_string())
        .filter(|t| !t.is_empty());

    let raw_image = OG_IMAGE_RE
        .captures(html)
        .or_else(|| OG_IMAGE_REV_RE.captures(html))
        .or_else(|| IMG_RE.captures(html))
        .map(|c| c[1].to_string());

    let image_url = raw_image.and_then(|img| {
        if img.starts_with("http") {
            Some(img)
        } else {
            reqwest::Url::parse(page_url)
                .and_then(|page| page.join(&img))
                .map(|u| u.to_string())
                .ok()
        }
    });

    let description = OG_DESCRIPTION_RE
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .filter(|d| !d.is_empty());

    PageMeta {
        title,
        description,
        image_url,
    }
}

/// First `DD.MM.YYYY` date in an article title.
pub fn extract_date(title: &str) -> Option<NaiveDate> {
    DATE_RE
        .find(title)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%d.%m.%Y").ok())
}

/// Results from yesterday or later count as fresh; anything older needs
/// operator confirmation before fan-out.
pub fn is_fresh(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today - chrono::Duration::days(1)
}

/// Locate the video-blog line mentioning both the show and the date, and
/// pull its link and thumbnail out. Both must be present.
pub fn find_video_blog_entry(
    html: &str,
    show_name: &str,
    date: &str,
    base: &str,
) -> Option<(String, String)> {
    let line = html
        .lines()
        .find(|line| line.contains(show_name) && line.contains(date))?;
    let video = HREF_RE.captures(line).map(|c| absolutize(&c[1], base))?;
    let image = IMG_RE.captures(line).map(|c| absolutize(&c[1], base))?;
    Some((video, image))
}

/// Cut the review body before the first sentence that mentions a reviewer
/// name (case-insensitive substring). No mention keeps the full text.
/// Re-applying to already-trimmed text is a no-op.
pub fn trim_text_at_reviewer_name(text: &str, reviewers: &[String]) -> String {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for (i, sentence) in sentences.iter().enumerate() {
        let lower = sentence.to_lowercase();
        let mentions_reviewer = reviewers
            .iter()
            .filter(|name| !name.trim().is_empty())
            .any(|name| lower.contains(&name.to_lowercase()));
        if mentions_reviewer {
            if i == 0 {
                return String::new();
            }
            return format!("{}.", sentences[..i].join(". "));
        }
    }

    text.to_string()
}

/// Escape the MarkdownV2 character set used for channel captions. Each call
/// escalates escaping; apply exactly once per publish.
pub fn escape_markdown(text: &str) -> String {
    const ESCAPED: &[char] = &[
        '[', ']', '(', ')', '{', '}', '*', '_', '#', '+', '-', '=', '|', '>', '.',
    ];
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ESCAPED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
