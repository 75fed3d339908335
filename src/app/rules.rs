//! State for the rules template editor tab.

use chrono::{DateTime, Utc};

use crate::error::ResultExt;
use crate::prefs::{self, PrefStore};

#[derive(Debug)]
pub struct RulesPane {
    pub buffer: String,
    pub last_saved: Option<DateTime<Utc>>,
    pub editing: bool,
    /// A clear has been requested and awaits explicit confirmation.
    pub confirm_clear: bool,
    pub notice: Option<String>,
}

impl RulesPane {
    pub fn from_store(store: &dyn PrefStore) -> Self {
        let buffer = store.get(prefs::RULES_TEMPLATE).unwrap_or_default();
        let last_saved = store
            .get(prefs::RULES_SAVED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Self {
            buffer,
            last_saved,
            editing: false,
            confirm_clear: false,
            notice: None,
        }
    }

    /// Persist the buffer and the save timestamp. The store broadcast then
    /// reaches the tester, which revokes its acceptance checkbox.
    pub fn save(&mut self, store: &dyn PrefStore) {
        if self.buffer.is_empty() {
            return;
        }
        let now = Utc::now();
        // Losing the template on disk is worse than a stale selection.
        store
            .set(prefs::RULES_TEMPLATE, &self.buffer)
            .emit_error()
            .ok();
        store
            .set(prefs::RULES_SAVED_AT, &now.to_rfc3339())
            .emit_error()
            .ok();
        self.last_saved = Some(now);
        self.notice = Some("Saved".to_string());
    }

    pub fn request_clear(&mut self) {
        if !self.buffer.is_empty() {
            self.confirm_clear = true;
        }
    }

    pub fn cancel_clear(&mut self) {
        self.confirm_clear = false;
    }

    /// Second step of the clear flow: empty the buffer and drop both
    /// persisted entries.
    pub fn execute_clear(&mut self, store: &dyn PrefStore) {
        self.confirm_clear = false;
        self.buffer.clear();
        self.last_saved = None;
        self.notice = Some("Cleared".to_string());
        store.remove(prefs::RULES_TEMPLATE).emit_error().ok();
        store.remove(prefs::RULES_SAVED_AT).emit_error().ok();
    }
}
