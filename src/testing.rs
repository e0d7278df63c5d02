//! Test doubles: an in-memory host environment and a recording notifier.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::error::HostError;
use crate::host::{BadgeState, CreateTab, CreateWindow, Host, Notifier};
use crate::window::{Geometry, LiveTab, LiveWindow, SavedTab, SavedWindow, TabId, WindowId};

/// Url a tab gets when created without one.
pub const DEFAULT_TAB_URL: &str = "about:newtab";

/// Live window with tab ids `id * 100 + position`.
pub fn live_window(id: u64, urls: &[&str]) -> LiveWindow {
    LiveWindow {
        id: Some(WindowId(id)),
        geometry: Geometry::default(),
        incognito: false,
        tabs: Some(
            urls.iter()
                .enumerate()
                .map(|(i, url)| LiveTab {
                    id: Some(TabId(id * 100 + i as u64)),
                    url: (*url).to_string(),
                    active: i == 0,
                    pinned: false,
                    cookie_store_id: None,
                })
                .collect(),
        ),
    }
}

/// Closed saved window with the given tab urls.
pub fn saved_window(name: &str, urls: &[&str]) -> SavedWindow {
    SavedWindow {
        name: name.to_string(),
        display_name: name.to_string(),
        geometry: Geometry::default(),
        incognito: false,
        tabs: urls
            .iter()
            .map(|url| SavedTab {
                url: (*url).to_string(),
                active: false,
                pinned: false,
                cookie_store_id: None,
                id: None,
            })
            .collect(),
        created_at: None,
        id: None,
    }
}

/// Give a record a live window id and consecutive tab ids.
pub fn with_ids(mut record: SavedWindow, window_id: u64, first_tab_id: u64) -> SavedWindow {
    record.id = Some(WindowId(window_id));
    for (i, tab) in record.tabs.iter_mut().enumerate() {
        tab.id = Some(TabId(first_tab_id + i as u64));
    }
    record
}

#[derive(Debug, Clone)]
struct FakeWindow {
    geometry: Geometry,
    incognito: bool,
    tabs: Vec<LiveTab>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    windows: BTreeMap<WindowId, FakeWindow>,
    active_tab: Option<TabId>,
    failing_urls: HashSet<String>,
    created_tabs: Vec<CreateTab>,
    pinned_calls: Vec<TabId>,
    focused: Vec<WindowId>,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_tab(&mut self, url: &str) -> LiveTab {
        LiveTab {
            id: Some(TabId(self.next_id())),
            url: url.to_string(),
            active: false,
            pinned: false,
            cookie_store_id: None,
        }
    }

    fn live(&self, id: WindowId, window: &FakeWindow, populate: bool) -> LiveWindow {
        LiveWindow {
            id: Some(id),
            geometry: window.geometry,
            incognito: window.incognito,
            tabs: populate.then(|| window.tabs.clone()),
        }
    }
}

/// In-memory host. Windows are not closed when their last tab goes away;
/// tests close them explicitly. Like real hosts, `create_tab` does not
/// reliably pin: the pinned flag is only applied by `set_tab_pinned`.
#[derive(Debug, Default)]
pub struct FakeHost {
    state: RefCell<FakeState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_window(&self, urls: &[&str]) -> WindowId {
        self.open_window_with(urls, false)
    }

    pub fn open_incognito_window(&self, urls: &[&str]) -> WindowId {
        self.open_window_with(urls, true)
    }

    fn open_window_with(&self, urls: &[&str], incognito: bool) -> WindowId {
        let mut state = self.state.borrow_mut();
        let id = WindowId(state.next_id());
        let tabs = urls.iter().map(|url| state.new_tab(url)).collect();
        state.windows.insert(
            id,
            FakeWindow {
                geometry: Geometry::default(),
                incognito,
                tabs,
            },
        );
        id
    }

    pub fn add_tab(&self, window_id: WindowId, url: &str) -> TabId {
        let mut state = self.state.borrow_mut();
        let tab = state.new_tab(url);
        let id = tab.id.unwrap_or(TabId(0));
        if let Some(window) = state.windows.get_mut(&window_id) {
            window.tabs.push(tab);
        }
        id
    }

    pub fn navigate(&self, tab_id: TabId, url: &str) {
        let mut state = self.state.borrow_mut();
        for window in state.windows.values_mut() {
            for tab in &mut window.tabs {
                if tab.id == Some(tab_id) {
                    tab.url = url.to_string();
                }
            }
        }
    }

    /// Move a tab to the end of another window.
    pub fn move_tab(&self, tab_id: TabId, to: WindowId) {
        let mut state = self.state.borrow_mut();
        let mut moved = None;
        for window in state.windows.values_mut() {
            if let Some(pos) = window.tabs.iter().position(|t| t.id == Some(tab_id)) {
                moved = Some(window.tabs.remove(pos));
            }
        }
        if let (Some(tab), Some(window)) = (moved, state.windows.get_mut(&to)) {
            window.tabs.push(tab);
        }
    }

    pub fn close_window(&self, id: WindowId) {
        self.state.borrow_mut().windows.remove(&id);
    }

    pub fn set_active_tab(&self, tab_id: TabId) {
        self.state.borrow_mut().active_tab = Some(tab_id);
    }

    pub fn fail_url(&self, url: &str) {
        self.state.borrow_mut().failing_urls.insert(url.to_string());
    }

    pub fn tab_ids(&self, id: WindowId) -> Vec<TabId> {
        self.state
            .borrow()
            .windows
            .get(&id)
            .map(|w| w.tabs.iter().filter_map(|t| t.id).collect())
            .unwrap_or_default()
    }

    pub fn tabs(&self, id: WindowId) -> Vec<LiveTab> {
        self.state
            .borrow()
            .windows
            .get(&id)
            .map(|w| w.tabs.clone())
            .unwrap_or_default()
    }

    pub fn urls(&self, id: WindowId) -> Vec<String> {
        self.tabs(id).into_iter().map(|t| t.url).collect()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.state.borrow().windows.keys().copied().collect()
    }

    pub fn has_tab(&self, tab_id: TabId) -> bool {
        self.state
            .borrow()
            .windows
            .values()
            .any(|w| w.tabs.iter().any(|t| t.id == Some(tab_id)))
    }

    pub fn created_tabs(&self) -> Vec<CreateTab> {
        self.state.borrow().created_tabs.clone()
    }

    pub fn pinned_calls(&self) -> Vec<TabId> {
        self.state.borrow().pinned_calls.clone()
    }

    pub fn focused(&self) -> Vec<WindowId> {
        self.state.borrow().focused.clone()
    }

    /// Snapshot of one window as the host would report it, tabs populated.
    pub fn snapshot(&self, id: WindowId) -> Option<LiveWindow> {
        let state = self.state.borrow();
        state.windows.get(&id).map(|w| state.live(id, w, true))
    }
}

impl Host for FakeHost {
    async fn all_windows(&self) -> Result<Vec<LiveWindow>, HostError> {
        let state = self.state.borrow();
        Ok(state
            .windows
            .iter()
            .map(|(id, w)| state.live(*id, w, true))
            .collect())
    }

    async fn window(&self, id: WindowId) -> Result<Option<LiveWindow>, HostError> {
        let state = self.state.borrow();
        Ok(state.windows.get(&id).map(|w| state.live(id, w, false)))
    }

    async fn tabs_in_window(&self, id: WindowId) -> Result<Vec<LiveTab>, HostError> {
        self.state
            .borrow()
            .windows
            .get(&id)
            .map(|w| w.tabs.clone())
            .ok_or(HostError::WindowNotFound(id))
    }

    async fn active_tab(&self) -> Result<Option<LiveTab>, HostError> {
        let state = self.state.borrow();
        let Some(active) = state.active_tab else {
            return Ok(None);
        };
        Ok(state
            .windows
            .values()
            .flat_map(|w| w.tabs.iter())
            .find(|t| t.id == Some(active))
            .cloned())
    }

    async fn create_window(&self, request: CreateWindow) -> Result<LiveWindow, HostError> {
        let mut state = self.state.borrow_mut();
        let id = WindowId(state.next_id());
        let blank = state.new_tab("about:blank");
        let window = FakeWindow {
            geometry: request.geometry,
            incognito: request.incognito,
            tabs: vec![blank],
        };
        let live = state.live(id, &window, true);
        state.windows.insert(id, window);
        Ok(live)
    }

    async fn create_tab(&self, request: CreateTab) -> Result<LiveTab, HostError> {
        let mut state = self.state.borrow_mut();
        state.created_tabs.push(request.clone());

        let url = request.url.as_deref().unwrap_or(DEFAULT_TAB_URL);
        if state.failing_urls.contains(url) {
            return Err(HostError::Call(format!("cannot open {url}")));
        }
        if !state.windows.contains_key(&request.window_id) {
            return Err(HostError::WindowNotFound(request.window_id));
        }

        let mut tab = state.new_tab(url);
        tab.active = request.active;
        tab.cookie_store_id = request.cookie_store_id;
        if let Some(window) = state.windows.get_mut(&request.window_id) {
            window.tabs.push(tab.clone());
        }
        Ok(tab)
    }

    async fn remove_tabs(&self, ids: &[TabId]) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        for window in state.windows.values_mut() {
            window.tabs.retain(|t| t.id.map_or(true, |id| !ids.contains(&id)));
        }
        Ok(())
    }

    async fn set_tab_pinned(&self, id: TabId, pinned: bool) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        state.pinned_calls.push(id);
        let tab = state
            .windows
            .values_mut()
            .flat_map(|w| w.tabs.iter_mut())
            .find(|t| t.id == Some(id))
            .ok_or(HostError::TabNotFound(id))?;
        tab.pinned = pinned;
        Ok(())
    }

    async fn focus_window(&self, id: WindowId) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.windows.contains_key(&id) {
            return Err(HostError::WindowNotFound(id));
        }
        state.focused.push(id);
        Ok(())
    }
}

/// A hook call seen by `RecordingNotifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Window(WindowId, BadgeState),
    Tab(TabId, WindowId),
    ListChanged,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn window_badges(&self, id: WindowId) -> Vec<BadgeState> {
        self.notices
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notice::Window(w, badge) if *w == id => Some(badge.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn tab_notices(&self) -> usize {
        self.notices
            .borrow()
            .iter()
            .filter(|n| matches!(n, Notice::Tab(..)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn window_changed(&self, window_id: WindowId, badge: &BadgeState) {
        self.notices
            .borrow_mut()
            .push(Notice::Window(window_id, badge.clone()));
    }

    fn tab_changed(&self, tab_id: TabId, window_id: WindowId, _badge: &BadgeState) {
        self.notices.borrow_mut().push(Notice::Tab(tab_id, window_id));
    }

    fn saved_windows_changed(&self) {
        self.notices.borrow_mut().push(Notice::ListChanged);
    }
}
