pub mod clipboard;
pub mod embed;
pub mod rules;
pub mod tester;

use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;

use crate::event_bus::{EventBus, EventPriority};
use crate::gateway::Command;
use crate::prefs::{self, PrefChange, PrefStore};
use crate::user_config::UserConfig;
use crate::{AppEvent, CatalogEvent, ExecEvent, ui};

use embed::EmbedPane;
use rules::RulesPane;
use tester::{ResponseView, TesterPane};

/// The four mutually exclusive screens.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tab {
    Tester,
    Showcase,
    Models,
    Rules,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Tester, Tab::Showcase, Tab::Models, Tab::Rules];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Tester => "Test Prompt",
            Tab::Showcase => "Models Showcase",
            Tab::Models => "Models",
            Tab::Rules => "Rules Template",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Tester => 0,
            Tab::Showcase => 1,
            Tab::Models => 2,
            Tab::Rules => 3,
        }
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

pub struct App {
    running: bool,
    pub tab: Tab,
    pub tester: TesterPane,
    pub rules: RulesPane,
    pub showcase_embed: EmbedPane,
    pub models_embed: EmbedPane,
    pub api_key_configured: bool,
    prefs: Arc<dyn PrefStore>,
    event_bus: Arc<EventBus>,
}

impl App {
    pub fn new(config: UserConfig, prefs: Arc<dyn PrefStore>, event_bus: &Arc<EventBus>) -> Self {
        let rules_template = prefs.get(prefs::RULES_TEMPLATE).unwrap_or_default();
        Self {
            running: false,
            tab: Tab::Tester,
            tester: TesterPane::new(rules_template),
            rules: RulesPane::from_store(prefs.as_ref()),
            showcase_embed: embed::SHOWCASE_EMBED,
            models_embed: embed::MODELS_EMBED,
            api_key_configured: config.api_key_configured(),
            prefs,
            event_bus: Arc::clone(event_bus),
        }
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        let mut crossterm_events = crossterm::event::EventStream::new();
        // Subscribe before the first command so no result can slip past.
        let mut event_rx = self.event_bus.subscribe(EventPriority::Realtime);
        let mut pref_rx = self.prefs.subscribe();

        if self.api_key_configured {
            self.refresh_catalog();
        }

        while self.running {
            terminal.draw(|frame| ui::render(frame, &self))?;

            tokio::select! {
                // Prioritize input responsiveness
                biased;

                maybe_event = crossterm_events.next().fuse() => {
                    if let Some(Ok(Event::Key(key_event))) = maybe_event {
                        self.on_key_event(key_event);
                    }
                }

                Ok(event) = event_rx.recv() => {
                    self.on_app_event(event);
                }

                Ok(change) = pref_rx.recv() => {
                    self.on_pref_change(change);
                }
            }
        }
        Ok(())
    }

    fn on_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Catalog(CatalogEvent::Loaded { models, showcase }) => {
                let persisted = self.prefs.get(prefs::SELECTED_MODEL);
                self.tester.on_catalog_loaded(models, showcase, persisted);
            }
            AppEvent::Catalog(CatalogEvent::Failed { message }) => {
                self.tester.on_catalog_failed(message);
            }
            AppEvent::Exec(ExecEvent::Completed { outcome }) => {
                self.tester.on_exec_completed(outcome);
            }
            AppEvent::Exec(ExecEvent::Failed { message }) => {
                self.tester.on_exec_failed(message);
            }
            // Commands live on the background channel.
            AppEvent::Gateway(_) => {}
        }
    }

    fn on_pref_change(&mut self, change: PrefChange) {
        if change.key == prefs::RULES_TEMPLATE {
            let rules = self.prefs.get(prefs::RULES_TEMPLATE).unwrap_or_default();
            self.tester.apply_rules_update(rules);
        }
    }

    fn on_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        if self.tab == Tab::Rules && self.rules.confirm_clear {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.rules.execute_clear(self.prefs.as_ref());
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.rules.cancel_clear();
                }
                _ => {}
            }
            return;
        }

        if self.is_editing() {
            self.on_editing_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char('1') => self.tab = Tab::Tester,
            KeyCode::Char('2') => self.tab = Tab::Showcase,
            KeyCode::Char('3') => self.tab = Tab::Models,
            KeyCode::Char('4') => self.tab = Tab::Rules,
            _ => match self.tab {
                Tab::Tester => self.on_tester_key(key),
                Tab::Rules => self.on_rules_key(key),
                Tab::Showcase | Tab::Models => {}
            },
        }
    }

    fn is_editing(&self) -> bool {
        match self.tab {
            Tab::Tester => self.tester.editing,
            Tab::Rules => self.rules.editing,
            _ => false,
        }
    }

    fn on_editing_key(&mut self, key: KeyEvent) {
        match self.tab {
            Tab::Tester => {
                if key.code == KeyCode::Enter && key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.send_prompt();
                    return;
                }
                match key.code {
                    KeyCode::Esc => self.tester.editing = false,
                    KeyCode::Enter => self.tester.prompt.push('\n'),
                    KeyCode::Backspace => {
                        self.tester.prompt.pop();
                    }
                    KeyCode::Char(c) => self.tester.prompt.push(c),
                    _ => {}
                }
            }
            Tab::Rules => {
                if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.rules.save(self.prefs.as_ref());
                    return;
                }
                match key.code {
                    KeyCode::Esc => self.rules.editing = false,
                    KeyCode::Enter => self.rules.buffer.push('\n'),
                    KeyCode::Backspace => {
                        self.rules.buffer.pop();
                    }
                    KeyCode::Char(c) => self.rules.buffer.push(c),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn on_tester_key(&mut self, key: KeyEvent) {
        // Without a key the screen is a configuration notice; no calls leave.
        if !self.api_key_configured {
            return;
        }
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.send_prompt();
            }
            KeyCode::Enter => self.tester.select_under_cursor(self.prefs.as_ref()),
            KeyCode::Char('j') | KeyCode::Down => self.tester.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.tester.move_cursor(-1),
            KeyCode::Char('x') => self.tester.clear_selection(self.prefs.as_ref()),
            KeyCode::Char('r') => self.refresh_catalog(),
            KeyCode::Char('a') => self.tester.toggle_accepted(),
            KeyCode::Char('i') => {
                self.tester.editing = true;
                self.tester.notice = None;
            }
            KeyCode::Char('v') => self.tester.show_rules = !self.tester.show_rules,
            KeyCode::Char('o') => self.tester.show_raw = !self.tester.show_raw,
            KeyCode::Char('c') => self.copy_response(),
            _ => {}
        }
    }

    fn on_rules_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.rules.save(self.prefs.as_ref());
            }
            KeyCode::Char('i') => {
                self.rules.editing = true;
                self.rules.notice = None;
            }
            KeyCode::Char('d') => self.rules.request_clear(),
            _ => {}
        }
    }

    fn refresh_catalog(&mut self) {
        if self.tester.loading {
            return;
        }
        self.tester.loading = true;
        self.tester.load_error = None;
        self.event_bus
            .send(AppEvent::Gateway(Command::RefreshCatalog));
    }

    fn send_prompt(&mut self) {
        if let Some(cmd) = self.tester.begin_send() {
            self.event_bus.send(AppEvent::Gateway(cmd));
        }
    }

    fn copy_response(&mut self) {
        if let ResponseView::Ready(outcome) = &self.tester.response {
            match clipboard::copy_text(&outcome.raw_pretty()) {
                Ok(()) => {
                    self.tester.notice = Some("Response JSON copied to clipboard".to_string());
                }
                Err(e) => {
                    tracing::warn!("clipboard copy failed: {e}");
                    self.tester.notice = Some("Clipboard unavailable".to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBusCaps;
    use crate::prefs::MemoryPrefs;

    fn test_app(api_key: Option<&str>) -> App {
        let config = UserConfig {
            base_url: "http://localhost:8000".to_string(),
            api_key: api_key.map(str::to_string),
        };
        let prefs: Arc<dyn PrefStore> = Arc::new(MemoryPrefs::new());
        let event_bus = Arc::new(EventBus::new(EventBusCaps::default()));
        App::new(config, prefs, &event_bus)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn tabs_cycle_in_both_directions() {
        let mut app = test_app(Some("k"));
        app.running = true;
        assert_eq!(app.tab, Tab::Tester);

        app.on_key_event(press(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Showcase);
        app.on_key_event(press(KeyCode::BackTab));
        assert_eq!(app.tab, Tab::Tester);
        app.on_key_event(press(KeyCode::BackTab));
        assert_eq!(app.tab, Tab::Rules);

        app.on_key_event(press(KeyCode::Char('3')));
        assert_eq!(app.tab, Tab::Models);
    }

    #[test]
    fn rules_edit_save_propagates_to_tester_and_revokes_acceptance() {
        let mut app = test_app(Some("k"));
        app.tab = Tab::Rules;
        app.rules.buffer = "Be concise.".to_string();
        app.rules.save(app.prefs.as_ref());

        // The store broadcast normally delivers this through the run loop.
        app.on_pref_change(PrefChange {
            key: prefs::RULES_TEMPLATE.to_string(),
        });
        assert_eq!(app.tester.rules_template, "Be concise.");
        assert!(!app.tester.rules_accepted);

        app.tester.rules_accepted = true;
        app.rules.buffer.push_str(" Always.");
        app.rules.save(app.prefs.as_ref());
        app.on_pref_change(PrefChange {
            key: prefs::RULES_TEMPLATE.to_string(),
        });
        assert!(!app.tester.rules_accepted);
    }

    #[test]
    fn tester_keys_are_inert_without_an_api_key() {
        let mut app = test_app(None);
        assert!(!app.api_key_configured);
        app.on_key_event(press(KeyCode::Char('i')));
        assert!(!app.tester.editing);
        app.on_key_event(press(KeyCode::Char('a')));
        assert!(!app.tester.rules_accepted);
    }

    #[test]
    fn clear_confirmation_gates_the_destructive_path() {
        let mut app = test_app(Some("k"));
        app.tab = Tab::Rules;
        app.rules.buffer = "rules".to_string();
        app.rules.save(app.prefs.as_ref());

        app.on_key_event(press(KeyCode::Char('d')));
        assert!(app.rules.confirm_clear);

        app.on_key_event(press(KeyCode::Char('n')));
        assert!(!app.rules.confirm_clear);
        assert_eq!(app.rules.buffer, "rules");

        app.on_key_event(press(KeyCode::Char('d')));
        app.on_key_event(press(KeyCode::Char('y')));
        assert!(app.rules.buffer.is_empty());
        assert_eq!(app.prefs.get(prefs::RULES_TEMPLATE), None);
    }
}
