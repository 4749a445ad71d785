//! Media items as listed by the gallery catalog.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

const LOG_TARGET: &str = "mediagate::media";

/// Unique item key: the file path relative to the gallery root.
pub type MediaId = String;

/// What kind of surface an item is displayed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Every kind, in the order the kind facet lists them.
    pub const ALL: [Self; 2] = [Self::Image, Self::Video];

    /// Wire name used by the catalog and the filter query string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Star rating attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(pub u8);

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item metadata exactly as `GET /api/media` returns it, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_rating", deserialize_with = "deserialize_rating")]
    pub rating: Rating,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

const fn default_rating() -> Rating {
    Rating(1)
}

/// The index file is edited by hand, so ratings show up as numbers, numeric
/// strings or fractions. Anything unreadable falls back to the default.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<Rating, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(rating_from_value(&value).unwrap_or_else(default_rating))
}

fn rating_from_value(value: &Value) -> Option<Rating> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = number.round();
    if !(0.0..=f64::from(u8::MAX)).contains(&rounded) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rating = rounded as u8;
    Some(Rating(rating))
}

/// A single gallery item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: MediaId,
    pub kind: MediaKind,
    /// Owner label (the folder the file lives in)
    pub owner: String,
    pub category: String,
    pub rating: Rating,
}

impl MediaItem {
    pub fn new(
        id: impl Into<MediaId>,
        kind: MediaKind,
        owner: impl Into<String>,
        category: impl Into<String>,
        rating: Rating,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            owner: owner.into(),
            category: category.into(),
            rating,
        }
    }

    fn from_record(id: MediaId, record: MediaRecord) -> Self {
        Self {
            id,
            kind: record.kind,
            owner: record.nickname,
            category: record.category,
            rating: record.rating,
        }
    }

    /// Convert back into the wire shape.
    #[must_use]
    pub fn to_record(&self) -> MediaRecord {
        MediaRecord {
            nickname: self.owner.clone(),
            category: self.category.clone(),
            rating: self.rating,
            kind: self.kind,
        }
    }
}

/// Snapshot of the full catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: BTreeMap<MediaId, MediaItem>,
}

impl Catalog {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = MediaItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    /// Build from the id -> record map returned by the listing endpoint.
    #[must_use]
    pub fn from_records(records: HashMap<MediaId, MediaRecord>) -> Self {
        Self {
            items: records
                .into_iter()
                .map(|(id, record)| (id.clone(), MediaItem::from_record(id, record)))
                .collect(),
        }
    }

    /// Build from the raw listing, skipping entries that are not valid records.
    #[must_use]
    pub fn from_listing(listing: HashMap<MediaId, Value>) -> Self {
        let records = listing
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<MediaRecord>(value) {
                Ok(record) => Some((id, record)),
                Err(e) => {
                    warn!(target: LOG_TARGET, "Skipping malformed catalog entry {}: {}", id, e);
                    None
                }
            })
            .collect();
        Self::from_records(records)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MediaItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.values()
    }

    /// Distinct non-empty owner labels, sorted.
    #[must_use]
    pub fn owners(&self) -> Vec<String> {
        distinct_labels(self.items.values().map(|item| item.owner.as_str()))
    }

    /// Distinct non-empty category labels, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        distinct_labels(self.items.values().map(|item| item.category.as_str()))
    }
}

fn distinct_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    labels
        .filter(|label| !label.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
