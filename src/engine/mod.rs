//! Reconciliation engine: saves, resnapshots, opens, closes and deletes
//! saved windows.
//!
//! Every operation writes the store before it touches the `StateIndex`, so
//! a failed write leaves the index as it was. A name counts as stored once
//! the name list references it; a record left behind by a failed delete is
//! unreachable and harmless.

mod open;

pub use open::OpenedTab;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::Config;
use crate::error::{Error, Result, StoreError};
use crate::host::{BadgeState, NoopNotifier, Notifier};
use crate::index::StateIndex;
use crate::store::{window_key, Store, NAMES_KEY};
use crate::window::{windows_match, LiveWindow, SavedWindow, TabId, UrlPolicy, WindowId};

/// A saved window removed by `delete_saved_window`, kept so the deletion
/// can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedWindow {
    /// The record as it was, live ids included.
    pub record: SavedWindow,
    /// Live window it was open in, if any.
    pub window_id: Option<WindowId>,
}

pub struct Engine<S> {
    store: S,
    index: StateIndex,
    notifier: Box<dyn Notifier>,
    default_name: String,
    url_policy: UrlPolicy,
}

impl<S: Store> Engine<S> {
    /// Engine with an empty index. Nothing is read from `store`.
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            index: StateIndex::new(),
            notifier: Box::new(NoopNotifier),
            default_name: config.default_name.clone(),
            url_policy: config.url_policy(),
        }
    }

    /// Rebuild the index from the store. Every saved window starts closed.
    ///
    /// Names whose record is missing or unreadable are dropped from the
    /// name list, which is then written back. An unreadable name list is
    /// logged and the engine starts empty; the store is left as it is.
    pub fn load(store: S, config: &Config) -> Result<Self> {
        let mut engine = Self::new(store, config);
        let names = match engine.read_names() {
            Ok(names) => names,
            Err(e @ StoreError::Corrupt { .. }) => {
                log::error!("Starting without saved windows: {e}");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut pruned = false;
        for name in &names {
            if engine.index.contains(name) {
                log::warn!("Saved window '{name}' is listed twice");
                pruned = true;
                continue;
            }
            match engine.read_record(name) {
                Ok(Some(mut record)) => {
                    record.name = name.clone();
                    engine.index.upsert(record);
                }
                Ok(None) => {
                    log::error!("Window {name} was not found in the store");
                    pruned = true;
                }
                Err(e) => {
                    log::error!("Dropping saved window {name}: {e}");
                    pruned = true;
                }
            }
        }

        if pruned {
            let kept = engine.index.names().to_vec();
            engine.write_names(&kept)?;
        }
        log::debug!("Loaded {} saved windows", engine.index.len());
        Ok(engine)
    }

    /// Install the badge/list hooks.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn index(&self) -> &StateIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Names in recency order, most recent last.
    pub fn saved_window_names(&self) -> &[String] {
        self.index.names()
    }

    pub fn saved_window(&self, name: &str) -> Option<&SavedWindow> {
        self.index.get(name)
    }

    pub fn name_for_window(&self, id: WindowId) -> Option<&str> {
        self.index.name_for_window(id)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn badge_for(&self, window_id: WindowId) -> BadgeState {
        self.index
            .name_for_window(window_id)
            .and_then(|name| self.index.get(name))
            .map_or(BadgeState::Unsaved, |record| BadgeState::Saved {
                display_name: record.display_name.clone(),
                tab_count: record.tabs.len(),
            })
    }

    /// Save a live window under a new name derived from `display_name`.
    ///
    /// An empty display name becomes the configured default. The name is
    /// the display name, or the first free of `display_name0`,
    /// `display_name1`, ... The window becomes the most recent entry and,
    /// when it has a live id, is marked open. Incognito windows are
    /// refused with `Error::Incognito`.
    pub fn save_window(&mut self, window: &LiveWindow, display_name: &str) -> Result<SavedWindow> {
        if window.incognito {
            log::debug!("Not saving incognito window");
            return Err(Error::Incognito);
        }
        let display_name = if display_name.is_empty() {
            self.default_name.clone()
        } else {
            display_name.to_string()
        };
        let name = self.unused_name(&display_name);

        self.add_window(window, &name, &display_name, Some(Utc::now()))?;
        if let Some(window_id) = window.id {
            self.mark_window_as_open(&name, window_id);
        }
        log::info!("Saved window '{name}'");
        self.notifier.saved_windows_changed();
        Ok(self.stored(&name, window))
    }

    /// Snapshot a live window into the record `name`, creating it if needed.
    ///
    /// Writes through to the store. The open/closed state of an existing
    /// record is kept, as is its creation time, so repeating the call with
    /// unchanged live state writes identical bytes.
    pub fn store_window(
        &mut self,
        window: &LiveWindow,
        name: &str,
        display_name: &str,
    ) -> Result<SavedWindow> {
        let Some(existing) = self.index.get(name) else {
            self.add_window(window, name, display_name, Some(Utc::now()))?;
            return Ok(self.stored(name, window));
        };

        let record = SavedWindow::snapshot(window, name, display_name, existing.created_at);
        self.write_record(&record)?;
        self.index.upsert(record);
        Ok(self.stored(name, window))
    }

    /// Associate a saved window with a live window and refresh its badge.
    ///
    /// Returns false for an unknown name.
    pub fn mark_window_as_open(&mut self, name: &str, window_id: WindowId) -> bool {
        if !self.index.mark_open(name, window_id) {
            return false;
        }
        let badge = self.badge_for(window_id);
        self.notifier.window_changed(window_id, &badge);
        true
    }

    /// Detach a saved window from its live window. Returns the former live
    /// window id.
    pub fn mark_window_as_closed(&mut self, name: &str) -> Option<WindowId> {
        let window_id = self.index.mark_closed(name)?;
        log::debug!("Saved window '{name}' closed (was window {window_id})");
        Some(window_id)
    }

    /// Remove a saved window everywhere. Unknown names are a no-op.
    ///
    /// An open window is closed first, so no live id keeps pointing at the
    /// deleted name.
    pub fn delete_saved_window(&mut self, name: &str) -> Result<Option<DeletedWindow>> {
        let Some(record) = self.index.get(name).cloned() else {
            log::debug!("Ignoring delete of unknown saved window '{name}'");
            return Ok(None);
        };

        let names: Vec<String> = self
            .index
            .names()
            .iter()
            .filter(|n| *n != name)
            .cloned()
            .collect();
        self.write_names(&names)?;
        if let Err(e) = self.store.delete(&window_key(name)) {
            log::warn!("Saved window '{name}' left an orphaned record: {e}");
        }

        let window_id = self.index.mark_closed(name);
        if let Some(id) = window_id {
            self.notifier.window_changed(id, &BadgeState::Unsaved);
        }
        self.index.remove(name);

        log::info!("Deleted saved window '{name}'");
        self.notifier.saved_windows_changed();
        Ok(Some(DeletedWindow { record, window_id }))
    }

    /// Resnapshot a live window after one of its tabs changed.
    ///
    /// A tracked window is stored under its existing name. An untracked one
    /// is compared against closed saved windows and the first match is
    /// stored and marked open. Returns the name the window is saved under.
    pub fn resnapshot(&mut self, window: &LiveWindow) -> Result<Option<String>> {
        let Some(window_id) = window.id.filter(|_| !window.incognito) else {
            return Ok(None);
        };

        if let Some(name) = self.index.name_for_window(window_id).map(str::to_string) {
            let display_name = self
                .index
                .get(&name)
                .map_or_else(|| name.clone(), |r| r.display_name.clone());
            self.store_window(window, &name, &display_name)?;
            return Ok(Some(name));
        }

        let Some((name, display_name)) = self
            .index
            .closed_windows()
            .find(|saved| windows_match(window, saved))
            .map(|saved| (saved.name.clone(), saved.display_name.clone()))
        else {
            return Ok(None);
        };

        self.store_window(window, &name, &display_name)?;
        self.mark_window_as_open(&name, window_id);
        log::info!("Window {window_id} matches saved window '{name}'");
        self.notifier.saved_windows_changed();
        Ok(Some(name))
    }

    /// Forget which window a tab belonged to, returning it.
    pub fn forget_tab(&mut self, tab_id: TabId) -> Option<WindowId> {
        self.index.unmap_tab(tab_id)
    }

    /// Fire the per-tab badge hook.
    pub fn notify_tab_changed(&self, tab_id: TabId, window_id: WindowId) {
        let badge = self.badge_for(window_id);
        self.notifier.tab_changed(tab_id, window_id, &badge);
    }

    fn unused_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 0;
        while self.index.contains(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    /// Write a new record and append its name, then index it closed.
    fn add_window(
        &mut self,
        window: &LiveWindow,
        name: &str,
        display_name: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let record = SavedWindow::snapshot(window, name, display_name, created_at);
        self.write_record(&record)?;

        let mut names = self.index.names().to_vec();
        names.push(name.to_string());
        if let Err(e) = self.write_names(&names) {
            if let Err(cleanup) = self.store.delete(&window_key(name)) {
                log::warn!("Saved window '{name}' left an orphaned record: {cleanup}");
            }
            return Err(e.into());
        }

        self.index.upsert(record);
        Ok(())
    }

    /// Indexed record for `name`, or a fresh snapshot if it vanished.
    fn stored(&self, name: &str, window: &LiveWindow) -> SavedWindow {
        self.index
            .get(name)
            .cloned()
            .unwrap_or_else(|| SavedWindow::snapshot(window, name, name, None))
    }

    fn read_names(&self) -> Result<Vec<String>, StoreError> {
        let Some(value) = self.store.get(NAMES_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_value(value).map_err(|source| StoreError::Corrupt {
            key: NAMES_KEY.to_string(),
            source,
        })
    }

    fn read_record(&self, name: &str) -> Result<Option<SavedWindow>, StoreError> {
        let key = window_key(name);
        let Some(value) = self.store.get(&key)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { key, source })
    }

    fn write_record(&mut self, record: &SavedWindow) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.store.set(&window_key(&record.name), value)
    }

    fn write_names(&mut self, names: &[String]) -> Result<(), StoreError> {
        self.store.set(NAMES_KEY, json!(names))
    }
}
