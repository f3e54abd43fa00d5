//! Stakeholder feedback entries and their one-way resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::focus_area::GridIndex;
use crate::domain::foundation::{FeedbackId, FocusAreaId, Timestamp, ValidationError};

/// Maximum length of a feedback text.
pub const MAX_FEEDBACK_LEN: usize = 10_000;

/// Which kind of feedback an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// About the focus area as a whole.
    General,
    /// About one record slot.
    Itemized,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::General => "general",
            FeedbackKind::Itemized => "itemized",
        }
    }
}

impl FromStr for FeedbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(FeedbackKind::General),
            "itemized" => Ok(FeedbackKind::Itemized),
            other => Err(format!("unknown feedback kind '{}'", other)),
        }
    }
}

/// What the feedback is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FeedbackTarget {
    General,
    Itemized { grid_index: GridIndex },
}

impl FeedbackTarget {
    pub fn kind(&self) -> FeedbackKind {
        match self {
            FeedbackTarget::General => FeedbackKind::General,
            FeedbackTarget::Itemized { .. } => FeedbackKind::Itemized,
        }
    }

    pub fn grid_index(&self) -> Option<GridIndex> {
        match self {
            FeedbackTarget::General => None,
            FeedbackTarget::Itemized { grid_index } => Some(*grid_index),
        }
    }
}

/// How a reviewer dealt with a piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedAction {
    /// The suggestion was incorporated into the content.
    Applied,
    /// The suggestion was turned into instructions for AI augmentation.
    Instructed,
    /// The suggestion was reviewed and deliberately not acted on.
    Ignored,
}

impl ResolvedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedAction::Applied => "applied",
            ResolvedAction::Instructed => "instructed",
            ResolvedAction::Ignored => "ignored",
        }
    }
}

impl FromStr for ResolvedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ResolvedAction::Applied),
            "instructed" => Ok(ResolvedAction::Instructed),
            "ignored" => Ok(ResolvedAction::Ignored),
            other => Err(format!("unknown resolved action '{}'", other)),
        }
    }
}

impl fmt::Display for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set once, never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub action: ResolvedAction,
    pub resolved_at: Timestamp,
}

/// Submitter's email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Result<Self, ValidationError> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::empty_field("submitter_email"));
        }
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid {
            return Err(ValidationError::invalid_format(
                "submitter_email",
                "expected an address like name@example.com",
            ));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Feedback left by an external stakeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderFeedback {
    id: FeedbackId,
    focus_area_id: FocusAreaId,
    target: FeedbackTarget,
    text: String,
    submitter_email: EmailAddress,
    submitted_at: Timestamp,
    resolution: Option<Resolution>,
}

impl StakeholderFeedback {
    /// Creates unresolved feedback.
    pub fn submit(
        focus_area_id: FocusAreaId,
        target: FeedbackTarget,
        text: impl Into<String>,
        submitter_email: EmailAddress,
    ) -> Result<Self, ValidationError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::empty_field("feedback_text"));
        }
        let len = text.chars().count();
        if len > MAX_FEEDBACK_LEN {
            return Err(ValidationError::too_long("feedback_text", MAX_FEEDBACK_LEN, len));
        }
        if let FeedbackTarget::Itemized { grid_index } = target {
            if grid_index < GridIndex::FIRST {
                return Err(ValidationError::invalid_format(
                    "grid_index",
                    "grid indexes start at 1",
                ));
            }
        }

        Ok(Self {
            id: FeedbackId::new(),
            focus_area_id,
            target,
            text,
            submitter_email,
            submitted_at: Timestamp::now(),
            resolution: None,
        })
    }

    /// Rebuilds feedback from storage.
    pub fn reconstitute(
        id: FeedbackId,
        focus_area_id: FocusAreaId,
        target: FeedbackTarget,
        text: String,
        submitter_email: EmailAddress,
        submitted_at: Timestamp,
        resolution: Option<Resolution>,
    ) -> Self {
        Self {
            id,
            focus_area_id,
            target,
            text,
            submitter_email,
            submitted_at,
            resolution,
        }
    }

    /// Resolves the entry.
    ///
    /// Returns `false` and keeps the original resolution when the entry was
    /// already resolved.
    pub fn resolve(&mut self, action: ResolvedAction, at: Timestamp) -> bool {
        if self.resolution.is_some() {
            return false;
        }
        self.resolution = Some(Resolution {
            action,
            resolved_at: at,
        });
        true
    }

    pub fn id(&self) -> FeedbackId {
        self.id
    }

    pub fn focus_area_id(&self) -> FocusAreaId {
        self.focus_area_id
    }

    pub fn target(&self) -> FeedbackTarget {
        self.target
    }

    pub fn kind(&self) -> FeedbackKind {
        self.target.kind()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn submitter_email(&self) -> &EmailAddress {
        &self.submitter_email
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}
