//! Operations that wait on the host: restoring saved windows into live
//! ones, focusing them, and matching saved windows against what is already
//! open at startup.

use std::collections::HashSet;

use super::{DeletedWindow, Engine};
use crate::error::{HostError, Result};
use crate::host::{CreateTab, CreateWindow, Host};
use crate::store::Store;
use crate::window::{windows_match, LiveTab, SavedWindow, WindowId};

/// A tab created while restoring a saved window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTab {
    /// Position of the saved tab it restores.
    pub index: usize,
    pub tab: LiveTab,
}

/// Whether a tab shows the host's new-tab page or another internal page.
fn is_new_tab_page(url: &str) -> bool {
    url.split(':').next() == Some("about") || url.starts_with("chrome://newtab")
}

impl<S: Store> Engine<S> {
    /// Match closed saved windows against the windows already open.
    ///
    /// Each saved window, in recency order, claims the first untracked live
    /// window it matches; the window is resnapshotted under that name and
    /// marked open.
    pub async fn reconcile_open_windows<H: Host>(&mut self, host: &H) -> Result<()> {
        let windows = host.all_windows().await?;
        let mut claimed: HashSet<WindowId> = HashSet::new();

        let candidates: Vec<String> = self
            .index
            .closed_windows()
            .map(|saved| saved.name.clone())
            .collect();
        for name in candidates {
            let Some(saved) = self.index.get(&name) else {
                continue;
            };
            let found = windows.iter().find(|live| {
                live.id.is_some_and(|id| {
                    !claimed.contains(&id) && self.index.name_for_window(id).is_none()
                }) && windows_match(live, saved)
            });
            let Some((live, window_id)) = found.and_then(|live| live.id.map(|id| (live, id)))
            else {
                continue;
            };
            let display_name = saved.display_name.clone();

            claimed.insert(window_id);
            if let Err(e) = self.store_window(live, &name, &display_name) {
                log::error!("Failed to store reopened window '{name}': {e}");
                continue;
            }
            self.mark_window_as_open(&name, window_id);
            log::info!("Saved window '{name}' is open as window {window_id}");
        }

        if !claimed.is_empty() {
            self.notifier.saved_windows_changed();
        }
        Ok(())
    }

    /// Restore a saved window into a new live window.
    ///
    /// Tabs are created one at a time in saved order; urls the url policy
    /// skips are left out and a tab that fails to open is logged and
    /// skipped. An already open saved window is focused instead. Unknown
    /// names are a no-op.
    pub async fn open_window<H: Host>(&mut self, host: &H, name: &str) -> Result<()> {
        let Some(saved) = self.index.get(name).cloned() else {
            log::warn!("Cannot open unknown saved window '{name}'");
            return Ok(());
        };
        if let Some(window_id) = saved.id {
            log::debug!("Saved window '{name}' is already open, focusing it");
            host.focus_window(window_id).await?;
            return Ok(());
        }

        self.close_new_tab_page(host).await;

        let window = host
            .create_window(CreateWindow {
                geometry: saved.geometry,
                incognito: saved.incognito,
            })
            .await?;
        let Some(window_id) = window.id else {
            return Err(HostError::Call("created window has no id".to_string()).into());
        };

        let opened = self.create_tabs(host, &saved, window_id).await;

        let initial = window.tab_ids();
        if !initial.is_empty() {
            if let Err(e) = host.remove_tabs(&initial).await {
                log::warn!("Failed to remove initial tabs of window {window_id}: {e}");
            }
        }

        self.on_window_opened(host, name, window_id, &opened).await;
        Ok(())
    }

    /// Create the restorable tabs of `saved` in order, awaiting each.
    async fn create_tabs<H: Host>(
        &self,
        host: &H,
        saved: &SavedWindow,
        window_id: WindowId,
    ) -> Vec<OpenedTab> {
        let mut opened = Vec::with_capacity(saved.tabs.len());
        for (index, tab) in saved.tabs.iter().enumerate() {
            let Some(url) = self.url_policy.resolve(&tab.url) else {
                log::debug!("Not restoring {}", tab.url);
                continue;
            };
            let request = CreateTab {
                window_id,
                url: (!url.is_empty()).then(|| url.to_string()),
                active: tab.active,
                pinned: tab.pinned,
                cookie_store_id: tab.cookie_store_id.clone(),
            };
            match host.create_tab(request).await {
                Ok(created) => opened.push(OpenedTab {
                    index,
                    tab: created,
                }),
                Err(e) => log::warn!("Failed to restore {} in '{}': {e}", tab.url, saved.name),
            }
        }
        opened
    }

    /// Close the active tab when it is a new-tab or internal page, since
    /// the restore was most likely started from it. Best effort.
    async fn close_new_tab_page<H: Host>(&self, host: &H) {
        let tab = match host.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                log::debug!("Could not query the active tab: {e}");
                return;
            }
        };
        let Some(LiveTab { id: Some(id), url, .. }) = tab else {
            return;
        };
        if is_new_tab_page(&url) {
            if let Err(e) = host.remove_tabs(&[id]).await {
                log::debug!("Could not close new tab page {id}: {e}");
            }
        }
    }

    /// Mark a restored saved window open on `window_id` and finish it up.
    ///
    /// The record keeps only the tabs that were created, each with its live
    /// id, before it is marked open. Pinned flags are applied again (hosts
    /// drop them during bulk creation) and the name becomes the most recent.
    pub async fn on_window_opened<H: Host>(
        &mut self,
        host: &H,
        name: &str,
        window_id: WindowId,
        opened: &[OpenedTab],
    ) {
        let Some(saved) = self.index.get(name) else {
            return;
        };
        let to_pin: Vec<_> = opened
            .iter()
            .filter(|o| saved.tabs.get(o.index).is_some_and(|tab| tab.pinned))
            .filter_map(|o| o.tab.id)
            .collect();
        let restored: Vec<_> = opened
            .iter()
            .filter_map(|o| o.tab.id.map(|id| (o.index, id)))
            .collect();

        self.index.keep_restored_tabs(name, &restored);
        if !self.mark_window_as_open(name, window_id) {
            return;
        }

        for tab_id in to_pin {
            if let Err(e) = host.set_tab_pinned(tab_id, true).await {
                log::warn!("Failed to pin tab {tab_id}: {e}");
            }
        }

        self.index.bump(name);
        let names = self.index.names().to_vec();
        if let Err(e) = self.write_names(&names) {
            log::error!("Failed to persist window order: {e}");
        }
        log::info!("Opened saved window '{name}' as window {window_id}");
        self.notifier.saved_windows_changed();
    }

    /// Bring an open saved window to the front. Returns false when the name
    /// is unknown or not open.
    pub async fn focus_window<H: Host>(&self, host: &H, name: &str) -> Result<bool> {
        let Some(window_id) = self.index.get(name).and_then(|saved| saved.id) else {
            return Ok(false);
        };
        host.focus_window(window_id).await?;
        Ok(true)
    }

    /// Save a deleted window again.
    ///
    /// It gets its old name back when that is still free and keeps its
    /// display name and creation time. It is marked open again only if its
    /// former live window still exists and nothing else claimed it.
    pub async fn undo_delete<H: Host>(
        &mut self,
        host: &H,
        deleted: DeletedWindow,
    ) -> Result<SavedWindow> {
        let DeletedWindow { record, window_id } = deleted;

        let window_id = match window_id {
            Some(id) if self.index.name_for_window(id).is_none() => {
                host.window(id).await?.map(|_| id)
            }
            _ => None,
        };

        let name = self.unused_name(&record.name);
        let live = record.to_live(window_id);
        self.add_window(&live, &name, &record.display_name, record.created_at)?;
        if let Some(id) = window_id {
            self.mark_window_as_open(&name, id);
        }
        log::info!("Restored deleted window '{name}'");
        self.notifier.saved_windows_changed();
        Ok(self.stored(&name, &live))
    }
}
