use serde::{Deserialize, Serialize};

/// Numeric identity of the chat operator issuing commands. Key of every
/// pending-workflow map. The scheduled daily run uses `OperatorId(0)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OperatorId(pub i64);

/// A single inline action button under a published post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// Ordered rows of link buttons. Immutable once attached to a pending entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkButtonSet {
    pub rows: Vec<Vec<LinkButton>>,
}

impl LinkButtonSet {
    pub fn single(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            rows: vec![vec![LinkButton {
                label: label.into(),
                url: url.into(),
            }]],
        }
    }

    pub fn push_row(&mut self, label: impl Into<String>, url: impl Into<String>) {
        self.rows.push(vec![LinkButton {
            label: label.into(),
            url: url.into(),
        }]);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How a channel caption is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionMode {
    Plain,
    MarkdownV2,
}

/// The renderable unit shared by operator previews and channel publishes:
/// text (or photo caption), an optional photo and the link buttons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub text: String,
    pub image_url: Option<String>,
    pub buttons: LinkButtonSet,
}

impl Post {
    pub fn text_only(text: impl Into<String>, buttons: LinkButtonSet) -> Self {
        Self {
            text: text.into(),
            image_url: None,
            buttons,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReviewPhase {
    AwaitingDecision,
    AwaitingNewText,
}

/// A fetched review awaiting the operator's publish/edit/cancel decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingReview {
    pub post: Post,
    pub source_url: String,
    pub phase: ReviewPhase,
}

/// Fetched PPV results awaiting a publication-time choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingPpv {
    pub post: Post,
    pub source_url: String,
    pub video_url: Option<String>,
}

/// A stale weekly result awaiting explicit operator confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingWeekly {
    pub post: Post,
    pub results_url: String,
    pub video_url: String,
    pub video_image_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OtherNewsPhase {
    WaitingUrl,
    WaitingButtonText,
    ReadyToPublish,
}

/// The generic-link workflow record; the only entity whose lifecycle is
/// itself multi-step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOtherNews {
    pub phase: OtherNewsPhase,
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub button_text: Option<String>,
}

impl PendingOtherNews {
    pub fn new() -> Self {
        Self {
            phase: OtherNewsPhase::WaitingUrl,
            source_url: None,
            title: None,
            description: None,
            image_url: None,
            button_text: None,
        }
    }
}

impl Default for PendingOtherNews {
    fn default() -> Self {
        Self::new()
    }
}

/// The five weekly shows whose results get republished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WeeklyShow {
    Raw,
    SmackDown,
    Dynamite,
    Collision,
    Nxt,
}

impl WeeklyShow {
    pub const ALL: [WeeklyShow; 5] = [
        WeeklyShow::Raw,
        WeeklyShow::SmackDown,
        WeeklyShow::Dynamite,
        WeeklyShow::Collision,
        WeeklyShow::Nxt,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            WeeklyShow::Raw => "Raw",
            WeeklyShow::SmackDown => "SmackDown",
            WeeklyShow::Dynamite => "Dynamite",
            WeeklyShow::Collision => "Collision",
            WeeklyShow::Nxt => "NXT",
        }
    }

    /// Identify a show by substring match against an article title.
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|show| title.contains(show.display_name()))
    }
}
