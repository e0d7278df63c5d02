//! Interface to the host windowing environment.
//!
//! The host owns the live windows and tabs. It answers queries, carries out
//! window/tab manipulation, and emits `HostEvent`s that the dispatcher turns
//! into reconciliation calls. Side effects towards the badge and the list UI
//! go through `Notifier`.

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::window::{Geometry, LiveTab, LiveWindow, TabId, WindowId};

/// Parameters for creating a live window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWindow {
    pub geometry: Geometry,
    pub incognito: bool,
}

/// Parameters for creating a live tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTab {
    pub window_id: WindowId,
    /// `None` opens the host's default page.
    pub url: Option<String>,
    pub active: bool,
    pub pinned: bool,
    pub cookie_store_id: Option<String>,
}

/// Asynchronous operations the host environment provides.
///
/// Calls may suspend; other notifications can arrive while one is pending.
#[allow(async_fn_in_trait)]
pub trait Host {
    /// Every window, each with its tab list populated.
    async fn all_windows(&self) -> Result<Vec<LiveWindow>, HostError>;

    /// One window, without its tabs. `None` when it no longer exists.
    async fn window(&self, id: WindowId) -> Result<Option<LiveWindow>, HostError>;

    async fn tabs_in_window(&self, id: WindowId) -> Result<Vec<LiveTab>, HostError>;

    /// The active tab of the focused window, if any.
    async fn active_tab(&self) -> Result<Option<LiveTab>, HostError>;

    /// Create a window; the returned window carries its initial blank tabs.
    async fn create_window(&self, request: CreateWindow) -> Result<LiveWindow, HostError>;

    async fn create_tab(&self, request: CreateTab) -> Result<LiveTab, HostError>;

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), HostError>;

    async fn set_tab_pinned(&self, id: TabId, pinned: bool) -> Result<(), HostError>;

    async fn focus_window(&self, id: WindowId) -> Result<(), HostError>;

    /// Fetch a window together with its current tabs.
    ///
    /// `Ok(None)` when the window is gone or has no tabs, so callers never
    /// overwrite a good snapshot with an empty one.
    async fn populated_window(&self, id: WindowId) -> Result<Option<LiveWindow>, HostError> {
        let Some(mut window) = self.window(id).await? else {
            return Ok(None);
        };
        let tabs = self.tabs_in_window(id).await?;
        if tabs.is_empty() {
            return Ok(None);
        }
        window.tabs = Some(tabs);
        Ok(Some(window))
    }
}

/// Lifecycle notifications emitted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    TabCreated { tab_id: TabId, window_id: WindowId },
    /// Removal does not name the window; it is looked up from the tab id.
    #[serde(rename_all = "camelCase")]
    TabRemoved {
        tab_id: TabId,
        is_window_closing: bool,
    },
    #[serde(rename_all = "camelCase")]
    TabMoved { tab_id: TabId, window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    TabAttached {
        tab_id: TabId,
        new_window_id: WindowId,
    },
    #[serde(rename_all = "camelCase")]
    TabDetached {
        tab_id: TabId,
        old_window_id: WindowId,
    },
    #[serde(rename_all = "camelCase")]
    TabUpdated { tab_id: TabId, window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId, window_id: WindowId },
    #[serde(rename_all = "camelCase")]
    WindowRemoved { window_id: WindowId },
}

/// What the badge of a live window should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeState {
    Saved {
        display_name: String,
        tab_count: usize,
    },
    Unsaved,
}

/// Side-effect hooks towards the badge/icon and list UI layers.
///
/// Every method defaults to doing nothing.
pub trait Notifier {
    /// A window's open/closed state or tab count may have changed.
    fn window_changed(&self, _window_id: WindowId, _badge: &BadgeState) {}

    /// A tab-level notification for this tab was handled.
    fn tab_changed(&self, _tab_id: TabId, _window_id: WindowId, _badge: &BadgeState) {}

    /// The set or order of saved windows changed.
    fn saved_windows_changed(&self) {}
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn window_changed(&self, window_id: WindowId, badge: &BadgeState) {
        (**self).window_changed(window_id, badge);
    }

    fn tab_changed(&self, tab_id: TabId, window_id: WindowId, badge: &BadgeState) {
        (**self).tab_changed(tab_id, window_id, badge);
    }

    fn saved_windows_changed(&self) {
        (**self).saved_windows_changed();
    }
}

/// Notifier that ignores every hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}
