use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::parsing::{parse_title, ContractType};

/// One `<item>` as read from the feed, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    pub title: String,
    pub link: String,
    /// HTML, kept as-is.
    pub description: String,
    pub pub_date: String,
    pub guid: Option<String>,
    /// `dc:creator` (or plain `author`), usually the hiring organization.
    pub author: Option<String>,
}

impl RawFeedItem {
    /// The guid text, else the link. `None` when the item has neither.
    pub fn identifier(&self) -> Option<&str> {
        self.guid
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .or_else(|| Some(self.link.trim()).filter(|l| !l.is_empty()))
    }
}

/// A job listing with its parsed title and, once resolved, its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub contract_type: ContractType,
    pub company: Option<String>,
    pub city: String,
    pub department: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    /// `[lat, lon]`; absent until resolved, and for good if resolution fails.
    pub coordinates: Option<Coordinates>,
}

impl JobRecord {
    /// Builds an unresolved record. Returns `None` for items with no identifier.
    pub fn from_item(item: RawFeedItem) -> Option<Self> {
        let id = item.identifier()?.to_string();
        let parsed = parse_title(&item.title);
        let published_at = DateTime::parse_from_rfc2822(item.pub_date.trim()).ok();

        Some(JobRecord {
            id,
            title: parsed.clean_title,
            contract_type: parsed.contract_type,
            company: item.author.filter(|a| !a.trim().is_empty()),
            city: parsed.city,
            department: parsed.department,
            description: item.description,
            link: item.link,
            pub_date: item.pub_date,
            published_at,
            coordinates: None,
        })
    }

    /// Whether the title carried anything the resolver could work with.
    pub fn has_location_hint(&self) -> bool {
        !self.city.is_empty() || !self.department.is_empty()
    }
}
