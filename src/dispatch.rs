//! Routes host notifications and list UI requests into the engine, one at
//! a time.
//!
//! The dispatcher is the single queue through which both host events and
//! user operations reach the engine. `run` drains one stream of `Input`s,
//! so a save or open requested while events keep arriving is handled in
//! its place in the stream. Every entry point takes `&mut self` and runs
//! to completion before the next starts. A failing handler is logged and
//! never stops later inputs from being processed.

use std::collections::HashSet;

use futures::{Stream, StreamExt};

use crate::engine::{DeletedWindow, Engine};
use crate::error::Result;
use crate::host::{Host, HostEvent};
use crate::store::Store;
use crate::window::{LiveWindow, SavedWindow, TabId, WindowId};

/// One item of the dispatcher queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Event(HostEvent),
    /// Save a live window under a name derived from `display_name`.
    Save {
        window_id: WindowId,
        display_name: String,
    },
    Open(String),
    Focus(String),
    Delete(String),
    /// Restore the most recently deleted saved window.
    UndoDelete,
}

impl From<HostEvent> for Input {
    fn from(event: HostEvent) -> Self {
        Self::Event(event)
    }
}

pub struct Dispatcher<S, H> {
    engine: Engine<S>,
    host: H,
    /// Windows whose tab removals said the window is closing. Their tab
    /// notifications are ignored until the window-removed notification.
    closing: HashSet<WindowId>,
    last_deleted: Option<DeletedWindow>,
}

impl<S: Store, H: Host> Dispatcher<S, H> {
    pub fn new(engine: Engine<S>, host: H) -> Self {
        Self {
            engine,
            host,
            closing: HashSet::new(),
            last_deleted: None,
        }
    }

    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_parts(self) -> (Engine<S>, H) {
        (self.engine, self.host)
    }

    pub fn is_closing(&self, window_id: WindowId) -> bool {
        self.closing.contains(&window_id)
    }

    /// Match saved windows against the windows open at startup.
    pub async fn start(&mut self) {
        if let Err(e) = self.engine.reconcile_open_windows(&self.host).await {
            log::error!("Failed to match saved windows against open windows: {e}");
        }
    }

    /// Process inputs in arrival order until the stream ends.
    ///
    /// A stream of bare host events can be fed in with
    /// `events.map(Input::from)`.
    pub async fn run<I>(&mut self, mut inputs: I)
    where
        I: Stream<Item = Input> + Unpin,
    {
        while let Some(input) = inputs.next().await {
            self.process(input).await;
        }
        log::debug!("Input stream ended");
    }

    /// Process one input. Failures are logged, never returned.
    pub async fn process(&mut self, input: Input) {
        match input {
            Input::Event(event) => self.handle(event).await,
            Input::Save {
                window_id,
                display_name,
            } => match self.save_live_window(window_id, &display_name).await {
                Ok(Some(saved)) => log::debug!("Window {window_id} saved as '{}'", saved.name),
                Ok(None) => log::warn!("Window {window_id} is gone or has no tabs, not saved"),
                Err(e) => log::warn!("Failed to save window {window_id}: {e}"),
            },
            Input::Open(name) => {
                if let Err(e) = self.open_window(&name).await {
                    log::error!("Failed to open saved window '{name}': {e}");
                }
            }
            Input::Focus(name) => {
                if let Err(e) = self.focus_window(&name).await {
                    log::warn!("Failed to focus saved window '{name}': {e}");
                }
            }
            Input::Delete(name) => {
                if let Err(e) = self.delete_saved_window(&name) {
                    log::error!("Failed to delete saved window '{name}': {e}");
                }
            }
            Input::UndoDelete => {
                if let Err(e) = self.undo_last_delete().await {
                    log::error!("Failed to restore deleted window: {e}");
                }
            }
        }
    }

    pub async fn handle(&mut self, event: HostEvent) {
        log::trace!("Host event: {event:?}");
        match event {
            HostEvent::TabCreated { tab_id, window_id }
            | HostEvent::TabMoved { tab_id, window_id }
            | HostEvent::TabUpdated { tab_id, window_id }
            | HostEvent::TabActivated { tab_id, window_id } => {
                self.on_tab_changed(tab_id, Some(window_id)).await;
            }
            HostEvent::TabAttached {
                tab_id,
                new_window_id,
            } => {
                self.on_tab_changed(tab_id, Some(new_window_id)).await;
            }
            HostEvent::TabDetached {
                tab_id,
                old_window_id,
            } => {
                self.engine.forget_tab(tab_id);
                self.on_tab_changed(tab_id, Some(old_window_id)).await;
            }
            HostEvent::TabRemoved {
                tab_id,
                is_window_closing,
            } => {
                let window_id = self.engine.forget_tab(tab_id);
                if let Some(id) = window_id {
                    if is_window_closing {
                        self.closing.insert(id);
                    } else {
                        self.closing.remove(&id);
                    }
                }
                self.on_tab_changed(tab_id, window_id).await;
            }
            HostEvent::WindowRemoved { window_id } => self.on_window_removed(window_id),
        }
    }

    /// Resnapshot the window a tab notification concerns.
    async fn on_tab_changed(&mut self, tab_id: TabId, window_id: Option<WindowId>) {
        let Some(window_id) = window_id else {
            log::debug!("Tab {tab_id} belongs to no known window");
            return;
        };
        // Checked before any host call so a closing window is never resaved
        if self.closing.contains(&window_id) {
            log::debug!("Window {window_id} is closing, ignoring tab {tab_id}");
            return;
        }

        match self.host.populated_window(window_id).await {
            Ok(Some(mut window)) => {
                window.id.get_or_insert(window_id);
                if let Err(e) = self.engine.resnapshot(&window) {
                    log::error!("Failed to update window {window_id}: {e}");
                }
            }
            Ok(None) => log::debug!("Window {window_id} is gone or has no tabs"),
            Err(e) => log::warn!("Failed to fetch window {window_id}: {e}"),
        }

        self.engine.notify_tab_changed(tab_id, window_id);
    }

    fn on_window_removed(&mut self, window_id: WindowId) {
        if let Some(name) = self.engine.name_for_window(window_id).map(str::to_string) {
            self.engine.mark_window_as_closed(&name);
        }
        self.closing.remove(&window_id);
    }

    pub fn save_window(&mut self, window: &LiveWindow, display_name: &str) -> Result<SavedWindow> {
        self.engine.save_window(window, display_name)
    }

    /// Fetch a live window from the host and save it. `Ok(None)` when the
    /// window is gone or has no tabs.
    pub async fn save_live_window(
        &mut self,
        window_id: WindowId,
        display_name: &str,
    ) -> Result<Option<SavedWindow>> {
        let Some(mut window) = self.host.populated_window(window_id).await? else {
            return Ok(None);
        };
        window.id.get_or_insert(window_id);
        self.engine.save_window(&window, display_name).map(Some)
    }

    pub async fn open_window(&mut self, name: &str) -> Result<()> {
        self.engine.open_window(&self.host, name).await
    }

    /// Delete a saved window, remembering it for `undo_last_delete`.
    pub fn delete_saved_window(&mut self, name: &str) -> Result<Option<DeletedWindow>> {
        let deleted = self.engine.delete_saved_window(name)?;
        if let Some(deleted) = &deleted {
            self.last_deleted = Some(deleted.clone());
        }
        Ok(deleted)
    }

    pub async fn undo_delete(&mut self, deleted: DeletedWindow) -> Result<SavedWindow> {
        self.engine.undo_delete(&self.host, deleted).await
    }

    /// Restore the window removed by the last `delete_saved_window`.
    /// `Ok(None)` when there is nothing to restore.
    pub async fn undo_last_delete(&mut self) -> Result<Option<SavedWindow>> {
        let Some(deleted) = self.last_deleted.take() else {
            return Ok(None);
        };
        self.engine.undo_delete(&self.host, deleted).await.map(Some)
    }

    pub async fn focus_window(&mut self, name: &str) -> Result<bool> {
        self.engine.focus_window(&self.host, name).await
    }
}
