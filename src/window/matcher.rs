//! Decides whether a live window "is" a saved window.
//!
//! Host ids do not survive a restart, so the only durable fingerprint is the
//! sequence of tab urls. The match is a prefix relation: a live window still
//! matches after the user opens more tabs at its end. Two different windows
//! that share a url prefix will match the same record.

use super::{LiveWindow, SavedWindow};

/// True when every saved tab url appears, in order, at the start of the
/// live window's tabs.
///
/// Incognito windows never match. A side without tabs never matches.
pub fn windows_match(live: &LiveWindow, saved: &SavedWindow) -> bool {
    if live.incognito {
        return false;
    }
    let Some(live_tabs) = live.tabs.as_deref() else {
        return false;
    };
    if saved.tabs.is_empty() || live_tabs.len() < saved.tabs.len() {
        return false;
    }

    saved
        .tabs
        .iter()
        .zip(live_tabs)
        .all(|(saved_tab, live_tab)| saved_tab.url == live_tab.url)
}
