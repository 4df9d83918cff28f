//! # Domain Models
//!
//! These structs represent the core entities of the catalog engine.
//! Managed records and moderation actions use UUID v7 for time-ordered,
//! globally unique identification. Legacy entries keep the opaque string
//! identifiers of the catalog they were imported from.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DomainError;

// ─── Identifiers ─────────────────────────────────────────────────────────────

const HYPHENATED_UUID_LEN: usize = 36;

/// A public content identifier, classified by shape alone.
///
/// A UUID always denotes a Managed Record; anything else is treated as an
/// opaque Legacy Catalog identifier. No lookup is needed to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentId {
    Managed(Uuid),
    Legacy(String),
}

impl ContentId {
    /// Only the 36-character hyphenated form counts as a UUID. Braced, URN
    /// and bare 32-hex strings are legacy identifiers.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() == HYPHENATED_UUID_LEN {
            if let Ok(id) = Uuid::try_parse(trimmed) {
                return ContentId::Managed(id);
            }
        }
        ContentId::Legacy(raw.to_string())
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            ContentId::Managed(_) => TargetKind::Managed,
            ContentId::Legacy(_) => TargetKind::Legacy,
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Managed(id) => write!(f, "{id}"),
            ContentId::Legacy(id) => f.write_str(id),
        }
    }
}

/// Returns true when `raw` has the shape of a Managed Record identifier.
pub fn is_managed_identifier(raw: &str) -> bool {
    matches!(ContentId::classify(raw), ContentId::Managed(_))
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// What a listing is. Both sources share this vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Game,
    App,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Game => "game",
            ContentKind::App => "app",
        }
    }
}

impl FromStr for ContentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "game" => Ok(ContentKind::Game),
            "app" => Ok(ContentKind::App),
            other => Err(DomainError::Validation(format!("unknown content kind '{other}'"))),
        }
    }
}

/// Where a content item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Legacy,
    Managed,
}

/// Lifecycle status of a Managed Record.
///
/// `draft → published → archived`, plus `banned` which is only reachable
/// through moderation and only left through moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Draft,
    Published,
    Archived,
    Banned,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Published => "published",
            RecordStatus::Archived => "archived",
            RecordStatus::Banned => "banned",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(RecordStatus::Draft),
            "published" => Ok(RecordStatus::Published),
            "archived" => Ok(RecordStatus::Archived),
            "banned" => Ok(RecordStatus::Banned),
            other => Err(DomainError::Validation(format!("unknown record status '{other}'"))),
        }
    }
}

/// A user-created listing with a mutable lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Globally unique URL slug
    pub slug: String,
    pub status: RecordStatus,
    /// Legacy entry this record supersedes. Unique when present.
    pub claimed_legacy_id: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub developer: String,
    /// Feature bullet points shown on the listing page
    pub features: Vec<String>,
    pub screenshots: Vec<String>,
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ManagedRecord {
    /// The timestamp the unified feed sorts on.
    pub fn recency(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// A read-only entry from the legacy catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub developer: String,
    pub features: Vec<String>,
    pub screenshots: Vec<String>,
    pub links: Vec<String>,
    pub published_at: DateTime<Utc>,
}

/// The shape every discovery surface consumes, whichever source produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub identifier: String,
    pub source: ContentSource,
    pub slug: Option<String>,
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub developer: String,
    pub features: Vec<String>,
    pub screenshots: Vec<String>,
    pub links: Vec<String>,
    pub status: Option<RecordStatus>,
    pub claimed_legacy_id: Option<String>,
    pub owner_id: Option<Uuid>,
    pub published_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn from_managed(record: ManagedRecord) -> Self {
        let published_at = record.recency();
        Self {
            identifier: record.id.to_string(),
            source: ContentSource::Managed,
            slug: Some(record.slug),
            title: record.title,
            description: record.description,
            kind: record.kind,
            tags: record.tags,
            developer: record.developer,
            features: record.features,
            screenshots: record.screenshots,
            links: record.links,
            status: Some(record.status),
            claimed_legacy_id: record.claimed_legacy_id,
            owner_id: Some(record.owner_id),
            published_at,
        }
    }

    pub fn from_legacy(entry: LegacyEntry) -> Self {
        Self {
            identifier: entry.id,
            source: ContentSource::Legacy,
            slug: None,
            title: entry.title,
            description: entry.description,
            kind: entry.kind,
            tags: entry.tags,
            developer: entry.developer,
            features: entry.features,
            screenshots: entry.screenshots,
            links: entry.links,
            status: None,
            claimed_legacy_id: None,
            owner_id: None,
            published_at: entry.published_at,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.source == ContentSource::Managed
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.published_at
    }
}

// ─── Suppression ─────────────────────────────────────────────────────────────

/// Hides an identifier from the feed and from recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionEntry {
    pub identifier: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// ─── Moderation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Legacy,
    Managed,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Legacy => "legacy",
            TargetKind::Managed => "managed",
        }
    }
}

impl FromStr for TargetKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(TargetKind::Legacy),
            "managed" => Ok(TargetKind::Managed),
            other => Err(DomainError::Validation(format!("unknown target kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Hide,
    Restore,
    Ban,
    Unban,
    Delete,
    ReviewRequest,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Hide => "hide",
            ActionType::Restore => "restore",
            ActionType::Ban => "ban",
            ActionType::Unban => "unban",
            ActionType::Delete => "delete",
            ActionType::ReviewRequest => "review_request",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide" => Ok(ActionType::Hide),
            "restore" => Ok(ActionType::Restore),
            "ban" => Ok(ActionType::Ban),
            "unban" => Ok(ActionType::Unban),
            "delete" => Ok(ActionType::Delete),
            "review_request" => Ok(ActionType::ReviewRequest),
            other => Err(DomainError::Validation(format!("unknown action type '{other}'"))),
        }
    }
}

/// Status snapshot stored alongside each logged action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub previous_status: Option<RecordStatus>,
    pub new_status: Option<RecordStatus>,
    #[serde(default)]
    pub hard_delete: bool,
}

/// Immutable audit entry. Only `acknowledged` ever changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: Uuid,
    pub target_identifier: String,
    pub target_kind: TargetKind,
    pub action_type: ActionType,
    pub reason: String,
    pub actor_id: Uuid,
    pub actor_name: String,
    /// Owner of the affected record at the time of the action, if any
    pub target_owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub acknowledged: bool,
    pub metadata: ActionMetadata,
}

// ─── Actors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    /// Granted once an owner publishes or claims their first record
    Developer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Developer => "developer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "developer" => Ok(Role::Developer),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A caller whose identity has already been verified at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Owner-facing profile data the engine reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub welcome_sent: bool,
}

// ─── Recommendation tuning ───────────────────────────────────────────────────

/// Additive weights for "related content" ranking. Hand-tuned, so they are
/// loaded from configuration rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub same_kind: i32,
    /// Added once per tag shared with the reference
    pub shared_tag: i32,
    pub same_developer: i32,
    pub managed_source: i32,
    pub recent: i32,
    pub recent_window_days: i64,
    pub rich_features: i32,
    /// Strictly more bullets than this earns `rich_features`
    pub feature_threshold: usize,
    pub rich_screenshots: i32,
    /// Strictly more screenshots than this earns `rich_screenshots`
    pub screenshot_threshold: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            same_kind: 10,
            shared_tag: 5,
            same_developer: 8,
            managed_source: 3,
            recent: 2,
            recent_window_days: 30,
            rich_features: 1,
            feature_threshold: 3,
            rich_screenshots: 1,
            screenshot_threshold: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_identifiers_by_shape() {
        let id = Uuid::now_v7();
        assert_eq!(ContentId::classify(&id.to_string()), ContentId::Managed(id));
        assert_eq!(ContentId::classify("42"), ContentId::Legacy("42".into()));
        assert_eq!(
            ContentId::classify("cool-game-42"),
            ContentId::Legacy("cool-game-42".into())
        );
        assert!(!is_managed_identifier("not-a-uuid"));
    }

    #[test]
    fn only_hyphenated_uuids_are_managed() {
        let id = Uuid::now_v7();
        let upper = id.hyphenated().to_string().to_uppercase();
        assert_eq!(ContentId::classify(&upper), ContentId::Managed(id));

        for other in [
            id.simple().to_string(),
            id.braced().to_string(),
            id.urn().to_string(),
        ] {
            assert_eq!(ContentId::classify(&other), ContentId::Legacy(other.clone()));
        }
    }

    #[test]
    fn managed_projection_falls_back_to_created_at() {
        let created = Utc::now() - Duration::days(3);
        let record = ManagedRecord {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            slug: "star-fox".into(),
            status: RecordStatus::Draft,
            claimed_legacy_id: Some("17".into()),
            title: "Star Fox".into(),
            description: String::new(),
            kind: ContentKind::Game,
            tags: vec!["shooter".into()],
            developer: "nova".into(),
            features: vec![],
            screenshots: vec![],
            links: vec![],
            created_at: created,
            updated_at: created,
            published_at: None,
        };
        let item = ContentItem::from_managed(record);
        assert_eq!(item.published_at, created);
        assert_eq!(item.source, ContentSource::Managed);
        assert_eq!(item.claimed_legacy_id.as_deref(), Some("17"));
    }

    #[test]
    fn action_type_round_trips_through_str() {
        assert_eq!("review_request".parse::<ActionType>().unwrap(), ActionType::ReviewRequest);
        assert!("purge".parse::<ActionType>().is_err());
    }
}
