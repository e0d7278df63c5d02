//! Read model for the saved-windows list and the save prompt.

use crate::index::StateIndex;
use crate::window::{LiveWindow, SavedWindow, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Open in the window the list is shown for.
    Current,
    Open,
    Closed,
}

/// One row of the saved-windows list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub display_name: String,
    pub tab_count: usize,
    pub status: EntryStatus,
}

impl ListEntry {
    fn new(record: &SavedWindow, current: Option<WindowId>) -> Self {
        let status = match record.id {
            Some(id) if Some(id) == current => EntryStatus::Current,
            Some(_) => EntryStatus::Open,
            None => EntryStatus::Closed,
        };
        Self {
            name: record.name.clone(),
            display_name: record.display_name.clone(),
            tab_count: record.tabs.len(),
            status,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.tab_count)
    }
}

/// Saved windows, most recently used first.
pub fn entries(index: &StateIndex, current: Option<WindowId>) -> Vec<ListEntry> {
    index
        .names()
        .iter()
        .rev()
        .filter_map(|name| index.get(name))
        .map(|record| ListEntry::new(record, current))
        .collect()
}

/// What the save control should offer for a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavePrompt {
    /// Already saved under this name.
    AlreadySaved(String),
    /// Private windows are never saved.
    Incognito,
    Offer { default_name: String },
}

pub fn save_prompt(index: &StateIndex, default_name: &str, window: &LiveWindow) -> SavePrompt {
    if let Some(name) = window.id.and_then(|id| index.name_for_window(id)) {
        return SavePrompt::AlreadySaved(name.to_string());
    }
    if window.incognito {
        return SavePrompt::Incognito;
    }
    SavePrompt::Offer {
        default_name: default_name.to_string(),
    }
}
