//! Window and tab data model.
//!
//! `LiveWindow`/`LiveTab` mirror what the host reports for the current
//! session. `SavedWindow`/`SavedTab` are the named records kept in the store.
//! Live ids are only valid for the current session and are never persisted.

pub mod matcher;
pub mod url_policy;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use matcher::windows_match;
pub use url_policy::{MatchKind, UrlAction, UrlPolicy, UrlRule};

/// Host-assigned window id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

/// Host-assigned tab id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Window position and size. Any field the host did not report stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A tab as currently reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTab {
    pub id: Option<TabId>,
    pub url: String,
    pub active: bool,
    pub pinned: bool,
    /// Cookie store / container profile the tab belongs to.
    pub cookie_store_id: Option<String>,
}

/// A window as currently reported by the host.
///
/// `tabs` is `None` when the host returned the window without populating
/// its tab list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveWindow {
    pub id: Option<WindowId>,
    pub geometry: Geometry,
    pub incognito: bool,
    pub tabs: Option<Vec<LiveTab>>,
}

impl LiveWindow {
    /// Tabs of the window, empty when the list was not populated.
    pub fn tabs(&self) -> &[LiveTab] {
        self.tabs.as_deref().unwrap_or_default()
    }

    /// Ids of every tab the host assigned one to.
    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs().iter().filter_map(|t| t.id).collect()
    }
}

/// One tab of a saved window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    pub url: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_store_id: Option<String>,
    /// Live tab id, present only while the saved window is open.
    #[serde(skip)]
    pub id: Option<TabId>,
}

impl From<&LiveTab> for SavedTab {
    fn from(tab: &LiveTab) -> Self {
        Self {
            url: tab.url.clone(),
            active: tab.active,
            pinned: tab.pinned,
            cookie_store_id: tab.cookie_store_id.clone(),
            id: tab.id,
        }
    }
}

/// A named, persisted snapshot of a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWindow {
    /// Unique key, stable across renames of the display name.
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub incognito: bool,
    pub tabs: Vec<SavedTab>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Live window id, present only while the saved window is open.
    #[serde(skip)]
    pub id: Option<WindowId>,
}

impl SavedWindow {
    /// Snapshot a live window's geometry and tabs under the given names.
    pub fn snapshot(
        window: &LiveWindow,
        name: &str,
        display_name: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            geometry: window.geometry,
            incognito: window.incognito,
            tabs: window.tabs().iter().map(SavedTab::from).collect(),
            created_at,
            id: window.id,
        }
    }

    /// Rebuild a live-window view of this record, as used when re-saving it.
    pub fn to_live(&self, id: Option<WindowId>) -> LiveWindow {
        LiveWindow {
            id,
            geometry: self.geometry,
            incognito: self.incognito,
            tabs: Some(
                self.tabs
                    .iter()
                    .map(|t| LiveTab {
                        id: if id.is_some() { t.id } else { None },
                        url: t.url.clone(),
                        active: t.active,
                        pinned: t.pinned,
                        cookie_store_id: t.cookie_store_id.clone(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn is_open(&self) -> bool {
        self.id.is_some()
    }

    /// Forget every live id, keeping urls and flags.
    pub(crate) fn clear_live_ids(&mut self) {
        self.id = None;
        for tab in &mut self.tabs {
            tab.id = None;
        }
    }

    pub fn tab_ids(&self) -> impl Iterator<Item = TabId> + '_ {
        self.tabs.iter().filter_map(|t| t.id)
    }
}
