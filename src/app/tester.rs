//! State for the prompt tester tab: model picker, prompt input with its
//! send-gate, and the response viewer.

use std::collections::HashMap;

use crate::api::catalog::{ModelInfo, ShowcaseModel};
use crate::api::execute::ExecOutcome;
use crate::error::ResultExt;
use crate::gateway::Command;
use crate::prefs::{self, PrefStore};

/// The three mutually exclusive render states of the response viewer.
#[derive(Debug, Clone)]
pub enum ResponseView {
    Empty,
    Error(String),
    Ready(Box<ExecOutcome>),
}

#[derive(Debug)]
pub struct TesterPane {
    pub models: Vec<ModelInfo>,
    pub showcase: HashMap<String, ShowcaseModel>,
    /// Persisted selection, always an id present in `models` once set here.
    pub selected: Option<String>,
    /// Highlighted row in the picker list.
    pub cursor: usize,
    pub loading: bool,
    pub load_error: Option<String>,
    pub rules_template: String,
    /// In-memory acceptance checkbox; resets whenever the template changes.
    pub rules_accepted: bool,
    pub prompt: String,
    pub editing: bool,
    pub show_rules: bool,
    pub sending: bool,
    pub response: ResponseView,
    pub show_raw: bool,
    pub notice: Option<String>,
}

impl TesterPane {
    pub fn new(rules_template: String) -> Self {
        Self {
            models: Vec::new(),
            showcase: HashMap::new(),
            selected: None,
            cursor: 0,
            loading: false,
            load_error: None,
            rules_template,
            rules_accepted: false,
            prompt: String::new(),
            editing: false,
            show_rules: false,
            sending: false,
            response: ResponseView::Empty,
            show_raw: false,
            notice: None,
        }
    }

    /// The send-gate: rules present, rules re-accepted, model selected,
    /// prompt non-empty, and nothing already in flight.
    pub fn can_send(&self) -> bool {
        !self.rules_template.trim().is_empty()
            && self.rules_accepted
            && self.selected.is_some()
            && !self.prompt.trim().is_empty()
            && !self.sending
    }

    /// The four gate conditions with display labels, for the checklist.
    pub fn gate_items(&self) -> [(&'static str, bool); 4] {
        [
            (
                "Rules template defined",
                !self.rules_template.trim().is_empty(),
            ),
            ("Rules accepted", self.rules_accepted),
            ("Model selected", self.selected.is_some()),
            ("Prompt entered", !self.prompt.trim().is_empty()),
        ]
    }

    /// Adopt an externally edited rules template. Acceptance is tied to the
    /// exact text the operator confirmed, so any change revokes it.
    pub fn apply_rules_update(&mut self, rules_template: String) {
        if rules_template != self.rules_template {
            self.rules_template = rules_template;
            self.rules_accepted = false;
        }
    }

    pub fn toggle_accepted(&mut self) {
        if !self.rules_template.trim().is_empty() {
            self.rules_accepted = !self.rules_accepted;
        }
    }

    pub fn on_catalog_loaded(
        &mut self,
        models: Vec<ModelInfo>,
        showcase: HashMap<String, ShowcaseModel>,
        persisted: Option<String>,
    ) {
        self.loading = false;
        self.load_error = None;
        self.models = models;
        self.showcase = showcase;
        self.cursor = self.cursor.min(self.models.len().saturating_sub(1));
        if self.selected.is_none() {
            self.selected = restore_selection(&self.models, persisted);
        } else if let Some(current) = &self.selected {
            // The previous selection may have disappeared from the catalog.
            if !self.models.iter().any(|m| &m.id == current) {
                self.selected = None;
            }
        }
    }

    pub fn on_catalog_failed(&mut self, message: String) {
        self.loading = false;
        self.load_error = Some(message);
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.models.is_empty() {
            return;
        }
        let last = self.models.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    /// Select the highlighted model and persist the choice.
    pub fn select_under_cursor(&mut self, store: &dyn PrefStore) {
        if let Some(model) = self.models.get(self.cursor) {
            self.selected = Some(model.id.clone());
            store.set(prefs::SELECTED_MODEL, &model.id).emit_warning().ok();
        }
    }

    /// Clear the selection and drop the persisted entry.
    pub fn clear_selection(&mut self, store: &dyn PrefStore) {
        if self.selected.take().is_some() {
            store.remove(prefs::SELECTED_MODEL).emit_warning().ok();
        }
    }

    pub fn selected_info(&self) -> Option<&ModelInfo> {
        let id = self.selected.as_deref()?;
        self.models.iter().find(|m| m.id == id)
    }

    pub fn selected_showcase(&self) -> Option<&ShowcaseModel> {
        self.showcase.get(self.selected.as_deref()?)
    }

    /// Open the gate and produce the execution command, or `None` when the
    /// gate is closed.
    pub fn begin_send(&mut self) -> Option<Command> {
        if !self.can_send() {
            return None;
        }
        let model = self.selected.clone()?;
        self.sending = true;
        self.response = ResponseView::Empty;
        self.notice = None;
        Some(Command::Execute {
            model,
            rules_template: self.rules_template.clone(),
            prompt: self.prompt.clone(),
        })
    }

    pub fn on_exec_completed(&mut self, outcome: Box<ExecOutcome>) {
        self.sending = false;
        self.response = ResponseView::Ready(outcome);
    }

    pub fn on_exec_failed(&mut self, message: String) {
        self.sending = false;
        self.response = ResponseView::Error(message);
    }
}

/// Restore a persisted model selection only when it still exists in the
/// freshly loaded catalog; a stale id is discarded silently.
pub fn restore_selection(models: &[ModelInfo], persisted: Option<String>) -> Option<String> {
    let id = persisted?;
    models.iter().any(|m| m.id == id).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPrefs;
    use serde_json::json;

    fn model(id: &str) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            name: id.to_string(),
            provider: None,
            description: None,
        }
    }

    fn ready_pane() -> TesterPane {
        let mut pane = TesterPane::new("Be concise.".to_string());
        pane.models = vec![model("gpt-x")];
        pane.selected = Some("gpt-x".to_string());
        pane.rules_accepted = true;
        pane.prompt = "Hello".to_string();
        pane
    }

    #[test]
    fn gate_opens_only_when_all_conditions_hold() {
        let mut pane = ready_pane();
        pane.prompt = String::new();
        assert!(!pane.can_send());

        pane.prompt = "Hello".to_string();
        assert!(pane.can_send());
    }

    #[test]
    fn any_single_failed_condition_closes_the_gate() {
        let mut pane = ready_pane();
        pane.rules_template = String::new();
        assert!(!pane.can_send());

        let mut pane = ready_pane();
        pane.rules_accepted = false;
        assert!(!pane.can_send());

        let mut pane = ready_pane();
        pane.selected = None;
        assert!(!pane.can_send());

        let mut pane = ready_pane();
        pane.prompt = "   ".to_string();
        assert!(!pane.can_send());

        let mut pane = ready_pane();
        pane.sending = true;
        assert!(!pane.can_send());
    }

    #[test]
    fn rules_update_revokes_acceptance() {
        let mut pane = ready_pane();
        assert!(pane.rules_accepted);

        pane.apply_rules_update("Be verbose.".to_string());
        assert!(!pane.rules_accepted);
        assert_eq!(pane.rules_template, "Be verbose.");

        // Re-applying identical text is not a change.
        pane.rules_accepted = true;
        pane.apply_rules_update("Be verbose.".to_string());
        assert!(pane.rules_accepted);
    }

    #[test]
    fn stale_persisted_selection_is_discarded() {
        let models = vec![model("m2")];
        assert_eq!(restore_selection(&models, Some("m1".to_string())), None);
        assert_eq!(
            restore_selection(&models, Some("m2".to_string())),
            Some("m2".to_string())
        );
        assert_eq!(restore_selection(&models, None), None);
    }

    #[test]
    fn catalog_load_restores_selection_once() {
        let mut pane = TesterPane::new("rules".to_string());
        pane.on_catalog_loaded(
            vec![model("m1"), model("m2")],
            HashMap::new(),
            Some("m2".to_string()),
        );
        assert_eq!(pane.selected.as_deref(), Some("m2"));

        // An explicit selection survives later reloads.
        pane.on_catalog_loaded(vec![model("m2")], HashMap::new(), Some("m1".to_string()));
        assert_eq!(pane.selected.as_deref(), Some("m2"));

        // But vanishes when the catalog no longer contains it.
        pane.on_catalog_loaded(vec![model("m3")], HashMap::new(), None);
        assert_eq!(pane.selected, None);
    }

    #[test]
    fn selection_persists_and_clears_through_the_store() {
        let store = MemoryPrefs::new();
        let mut pane = TesterPane::new("rules".to_string());
        pane.models = vec![model("m1"), model("m2")];
        pane.cursor = 1;

        pane.select_under_cursor(&store);
        assert_eq!(pane.selected.as_deref(), Some("m2"));
        assert_eq!(store.get(crate::prefs::SELECTED_MODEL), Some("m2".to_string()));

        pane.clear_selection(&store);
        assert_eq!(pane.selected, None);
        assert_eq!(store.get(crate::prefs::SELECTED_MODEL), None);
    }

    #[test]
    fn begin_send_closes_the_gate_until_a_result_arrives() {
        let mut pane = ready_pane();
        let cmd = pane.begin_send().expect("gate was open");
        match cmd {
            Command::Execute {
                model,
                rules_template,
                prompt,
            } => {
                assert_eq!(model, "gpt-x");
                assert_eq!(rules_template, "Be concise.");
                assert_eq!(prompt, "Hello");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(pane.sending);
        assert!(pane.begin_send().is_none());

        pane.on_exec_failed("boom".to_string());
        assert!(!pane.sending);
        assert!(matches!(&pane.response, ResponseView::Error(m) if m == "boom"));
    }

    #[test]
    fn exec_completion_replaces_the_response_state() {
        let mut pane = ready_pane();
        pane.begin_send();
        let raw = json!({"status": "completed", "routing": {}, "usage": {}});
        let outcome = ExecOutcome {
            response: serde_json::from_value(raw.clone()).unwrap(),
            raw,
        };
        pane.on_exec_completed(Box::new(outcome));
        assert!(matches!(pane.response, ResponseView::Ready(_)));
        assert!(!pane.sending);
    }
}
