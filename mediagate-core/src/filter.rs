//! Filter facets and the user's current selection.
//!
//! Each facet is multi-valued and independent. An empty facet places no
//! restriction on the result; a non-empty facet restricts the result to items
//! whose attribute is one of the selected values. Facets combine as a
//! conjunction.

use crate::media::{Catalog, MediaItem, MediaKind, Rating};
use std::collections::BTreeSet;

/// One independent filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Rating,
    Owner,
    Category,
    Kind,
}

impl Facet {
    pub const ALL: [Self; 4] = [Self::Rating, Self::Owner, Self::Category, Self::Kind];

    /// Query parameter name used by the filtered listing endpoint.
    #[must_use]
    pub const fn query_key(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Owner => "nickname",
            Self::Category => "category",
            Self::Kind => "type",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Rating => "Rating",
            Self::Owner => "Owner",
            Self::Category => "Category",
            Self::Kind => "Type",
        }
    }
}

fn parse_kind(value: &str) -> Option<MediaKind> {
    MediaKind::ALL.into_iter().find(|kind| kind.as_str() == value)
}

fn parse_rating(value: &str) -> Option<Rating> {
    value.trim().parse().ok().map(Rating)
}

/// Values available in each facet control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOptions {
    pub ratings: Vec<Rating>,
    pub owners: Vec<String>,
    pub categories: Vec<String>,
    pub kinds: Vec<MediaKind>,
}

impl FacetOptions {
    /// Options before any catalog has been loaded: only the fixed enumerations.
    #[must_use]
    pub fn fixed(ratings: &[Rating]) -> Self {
        let ratings: BTreeSet<Rating> = ratings.iter().copied().collect();
        Self {
            ratings: ratings.into_iter().collect(),
            owners: Vec::new(),
            categories: Vec::new(),
            kinds: MediaKind::ALL.to_vec(),
        }
    }

    /// Fixed enumerations plus the owner/category labels present in `catalog`.
    #[must_use]
    pub fn from_catalog(ratings: &[Rating], catalog: &Catalog) -> Self {
        Self {
            owners: catalog.owners(),
            categories: catalog.categories(),
            ..Self::fixed(ratings)
        }
    }

    /// Option values of one facet as display strings.
    #[must_use]
    pub fn values(&self, facet: Facet) -> Vec<String> {
        match facet {
            Facet::Rating => self.ratings.iter().map(ToString::to_string).collect(),
            Facet::Owner => self.owners.clone(),
            Facet::Category => self.categories.clone(),
            Facet::Kind => self.kinds.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Active values per facet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub ratings: BTreeSet<Rating>,
    pub owners: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub kinds: BTreeSet<MediaKind>,
}

impl FilterSelection {
    /// True when no facet restricts the result.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.ratings.is_empty()
            && self.owners.is_empty()
            && self.categories.is_empty()
            && self.kinds.is_empty()
    }

    /// The conjunctive filter predicate.
    #[must_use]
    pub fn matches(&self, item: &MediaItem) -> bool {
        (self.ratings.is_empty() || self.ratings.contains(&item.rating))
            && (self.owners.is_empty() || self.owners.contains(&item.owner))
            && (self.categories.is_empty() || self.categories.contains(&item.category))
            && (self.kinds.is_empty() || self.kinds.contains(&item.kind))
    }

    #[must_use]
    pub fn is_selected(&self, facet: Facet, value: &str) -> bool {
        match facet {
            Facet::Rating => parse_rating(value).is_some_and(|r| self.ratings.contains(&r)),
            Facet::Owner => self.owners.contains(value),
            Facet::Category => self.categories.contains(value),
            Facet::Kind => parse_kind(value).is_some_and(|k| self.kinds.contains(&k)),
        }
    }

    /// Select or deselect one value. Returns `false` if the value does not
    /// parse for the facet, leaving the selection unchanged.
    pub fn set_value(&mut self, facet: Facet, value: &str, selected: bool) -> bool {
        fn apply<T: Ord>(set: &mut BTreeSet<T>, value: T, selected: bool) {
            if selected {
                set.insert(value);
            } else {
                set.remove(&value);
            }
        }

        match facet {
            Facet::Rating => match parse_rating(value) {
                Some(rating) => apply(&mut self.ratings, rating, selected),
                None => return false,
            },
            Facet::Owner => apply(&mut self.owners, value.to_string(), selected),
            Facet::Category => apply(&mut self.categories, value.to_string(), selected),
            Facet::Kind => match parse_kind(value) {
                Some(kind) => apply(&mut self.kinds, kind, selected),
                None => return false,
            },
        }
        true
    }

    /// Flip one value. Returns the new selected state, or `None` if the value
    /// does not parse for the facet.
    pub fn toggle_value(&mut self, facet: Facet, value: &str) -> Option<bool> {
        let selected = !self.is_selected(facet, value);
        self.set_value(facet, value, selected).then_some(selected)
    }

    /// Drop selections whose value is no longer offered.
    pub fn retain_available(&mut self, options: &FacetOptions) {
        self.ratings.retain(|r| options.ratings.contains(r));
        self.owners.retain(|o| options.owners.contains(o));
        self.categories.retain(|c| options.categories.contains(c));
        self.kinds.retain(|k| options.kinds.contains(k));
    }

    /// Query pairs for the filtered listing endpoint. Empty facets are omitted.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        pairs.extend(
            self.ratings
                .iter()
                .map(|r| (Facet::Rating.query_key(), r.to_string())),
        );
        pairs.extend(
            self.owners
                .iter()
                .map(|o| (Facet::Owner.query_key(), o.clone())),
        );
        pairs.extend(
            self.categories
                .iter()
                .map(|c| (Facet::Category.query_key(), c.clone())),
        );
        pairs.extend(
            self.kinds
                .iter()
                .map(|k| (Facet::Kind.query_key(), k.to_string())),
        );
        pairs
    }

    /// Rebuild a selection from query pairs, ignoring unknown keys and
    /// unparseable values.
    #[must_use]
    pub fn from_query_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut selection = Self::default();
        for (key, value) in pairs {
            if let Some(facet) = Facet::ALL.into_iter().find(|f| f.query_key() == key) {
                selection.set_value(facet, value, true);
            }
        }
        selection
    }
}
