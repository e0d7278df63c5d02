//! In-memory index of saved windows and their live counterparts.
//!
//! Every saved window is either open (it has a live window id and that id
//! is in `window_names`) or closed (its name is in `closed`), never both.
//! The store is the source of truth; this index is rebuilt from it at
//! startup and kept in step with it by the engine.

use std::collections::{HashMap, HashSet};

use crate::window::{SavedWindow, TabId, WindowId};

#[derive(Debug, Default)]
pub struct StateIndex {
    /// Saved window names, most recently opened or saved last
    names: Vec<String>,
    /// name -> record, open and closed alike
    windows: HashMap<String, SavedWindow>,
    /// Names of records with no live window
    closed: HashSet<String>,
    /// live window id -> name, open records only
    window_names: HashMap<WindowId, String>,
    /// live tab id -> live window id; a removed tab does not name its window
    tab_windows: HashMap<TabId, WindowId>,
}

impl StateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names in recency order, most recent last.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&SavedWindow> {
        self.windows.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.windows.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Records in recency order, most recent last.
    pub fn saved_windows(&self) -> impl Iterator<Item = &SavedWindow> {
        self.names.iter().filter_map(|name| self.windows.get(name))
    }

    pub fn name_for_window(&self, id: WindowId) -> Option<&str> {
        self.window_names.get(&id).map(String::as_str)
    }

    pub fn window_id_to_name(&self) -> &HashMap<WindowId, String> {
        &self.window_names
    }

    pub fn window_for_tab(&self, id: TabId) -> Option<WindowId> {
        self.tab_windows.get(&id).copied()
    }

    pub fn is_closed(&self, name: &str) -> bool {
        self.closed.contains(name)
    }

    /// Closed records in recency order, the pool for re-matching.
    pub fn closed_windows(&self) -> impl Iterator<Item = &SavedWindow> {
        self.names
            .iter()
            .filter(|name| self.closed.contains(*name))
            .filter_map(|name| self.windows.get(name))
    }

    /// Add or replace a record, keeping the open/closed state of an
    /// existing one.
    ///
    /// A new name is appended as the most recent and starts closed. An open
    /// record keeps its live window id and the tab map for that window is
    /// rebuilt from the new snapshot. A closed record keeps the snapshot's
    /// tab ids unmapped until `mark_open`.
    pub fn upsert(&mut self, mut record: SavedWindow) {
        let name = record.name.clone();
        match self.windows.get(&name).map(|current| current.id) {
            Some(Some(window_id)) => {
                record.id = Some(window_id);
                self.tab_windows.retain(|_, w| *w != window_id);
                for tab_id in record.tab_ids() {
                    self.tab_windows.insert(tab_id, window_id);
                }
            }
            Some(None) => record.id = None,
            None => {
                record.id = None;
                self.names.push(name.clone());
                self.closed.insert(name.clone());
            }
        }
        self.windows.insert(name, record);
    }

    /// Associate a record with a live window.
    ///
    /// Maps the window id and every tab id the record carries. A window id
    /// previously mapped to another record closes that record first.
    /// Returns false when `name` is unknown.
    pub fn mark_open(&mut self, name: &str, window_id: WindowId) -> bool {
        if !self.contains(name) {
            return false;
        }
        if let Some(other) = self.window_names.get(&window_id).cloned() {
            if other != name {
                self.mark_closed(&other);
            }
        }
        let Some(record) = self.windows.get_mut(name) else {
            return false;
        };
        if let Some(previous) = record.id.filter(|id| *id != window_id) {
            self.window_names.remove(&previous);
            self.tab_windows.retain(|_, w| *w != previous);
        }
        record.id = Some(window_id);

        self.closed.remove(name);
        self.window_names.insert(window_id, name.to_string());
        self.tab_windows.retain(|_, w| *w != window_id);
        for tab_id in record.tab_ids() {
            self.tab_windows.insert(tab_id, window_id);
        }
        true
    }

    /// Detach a record from its live window, keeping its tab urls.
    ///
    /// Clears the window mapping and every tab mapping into that window.
    /// Returns the former live window id, `None` if it was not open.
    pub fn mark_closed(&mut self, name: &str) -> Option<WindowId> {
        let record = self.windows.get_mut(name)?;
        let window_id = record.id;
        record.clear_live_ids();
        self.closed.insert(name.to_string());

        let window_id = window_id?;
        self.window_names.remove(&window_id);
        self.tab_windows.retain(|_, w| *w != window_id);
        Some(window_id)
    }

    /// Drop a record from every table. Closes it first when open.
    pub fn remove(&mut self, name: &str) -> Option<SavedWindow> {
        self.mark_closed(name);
        self.closed.remove(name);
        self.names.retain(|n| n != name);
        self.windows.remove(name)
    }

    /// Move `name` to the most recent position.
    pub fn bump(&mut self, name: &str) {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            let name = self.names.remove(pos);
            self.names.push(name);
        }
    }

    /// Map a single live tab to a live window.
    pub fn map_tab(&mut self, tab_id: TabId, window_id: WindowId) {
        self.tab_windows.insert(tab_id, window_id);
    }

    pub fn unmap_tab(&mut self, tab_id: TabId) -> Option<WindowId> {
        self.tab_windows.remove(&tab_id)
    }

    /// Keep only the tabs of a record that were restored into a live window,
    /// giving each its live id.
    ///
    /// `restored` pairs a saved tab position with the live tab created for
    /// it. Tabs that were skipped or failed to open are dropped.
    pub(crate) fn keep_restored_tabs(&mut self, name: &str, restored: &[(usize, TabId)]) {
        let Some(record) = self.windows.get_mut(name) else {
            return;
        };
        let saved = std::mem::take(&mut record.tabs);
        record.tabs = restored
            .iter()
            .filter_map(|&(index, tab_id)| {
                let mut tab = saved.get(index)?.clone();
                tab.id = Some(tab_id);
                Some(tab)
            })
            .collect();
        if let Some(window_id) = record.id {
            for &(_, tab_id) in restored {
                self.tab_windows.insert(tab_id, window_id);
            }
        }
    }

    /// Verify the partition and mapping invariants, describing the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.names.len() != self.windows.len() {
            return Err(format!(
                "{} names for {} records",
                self.names.len(),
                self.windows.len()
            ));
        }
        for name in &self.names {
            let Some(record) = self.windows.get(name) else {
                return Err(format!("name '{name}' has no record"));
            };
            let closed = self.closed.contains(name);
            match record.id {
                Some(id) => {
                    if closed {
                        return Err(format!("'{name}' is open and closed"));
                    }
                    if self.window_names.get(&id) != Some(name) {
                        return Err(format!("open '{name}' is not mapped from window {id}"));
                    }
                }
                None if !closed => return Err(format!("'{name}' is neither open nor closed")),
                None => {}
            }
        }
        for (id, name) in &self.window_names {
            if self.windows.get(name).and_then(|r| r.id) != Some(*id) {
                return Err(format!("window {id} maps to '{name}' which is not open there"));
            }
        }
        for name in &self.closed {
            if !self.windows.contains_key(name) {
                return Err(format!("closed name '{name}' has no record"));
            }
        }
        Ok(())
    }
}
