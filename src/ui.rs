use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};

use crate::api::execute::{ExecOutcome, RoutingInfo, UsageInfo};
use crate::app::embed::EmbedPane;
use crate::app::tester::{ResponseView, TesterPane};
use crate::app::{App, Tab};

/// Helper to create centered rects for modal dialogs
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Renders the application's UI.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Gateway Test Console"),
        );
    frame.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Tester => render_tester(frame, app, chunks[1]),
        Tab::Showcase => render_embed(frame, &app.showcase_embed, chunks[1]),
        Tab::Models => render_embed(frame, &app.models_embed, chunks[1]),
        Tab::Rules => render_rules(frame, app, chunks[1]),
    }

    let hints = match app.tab {
        Tab::Tester => {
            "Tab switch | j/k models | Enter select | x clear | a accept | i prompt | Ctrl+Enter send | r refresh | v rules | o raw | c copy | q quit"
        }
        Tab::Rules => "Tab switch | i edit | Ctrl+S save | d clear | Esc done | q quit",
        _ => "Tab switch | 1-4 jump | q quit",
    };
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn render_tester(frame: &mut Frame, app: &App, area: Rect) {
    if !app.api_key_configured {
        let msg = Paragraph::new(vec![
            Line::from("API key required"),
            Line::from(""),
            Line::from("Set GATEWAY_API_KEY in your environment or .env file,"),
            Line::from("or add api_key to ~/.config/promptdeck/config.toml,"),
            Line::from("then restart."),
        ])
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL).title("Configuration"));
        frame.render_widget(msg, area);
        return;
    }

    // Same trimmed check as the send gate, so blanks cannot dodge the notice.
    if app.tester.rules_template.trim().is_empty() {
        let msg = Paragraph::new(vec![
            Line::from("No rules template defined"),
            Line::from(""),
            Line::from("Open the Rules Template tab (4) and save your rules"),
            Line::from("before testing prompts."),
        ])
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Test Prompt"));
        frame.render_widget(msg, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(40)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[0]);
    render_model_list(frame, &app.tester, left[0]);
    render_synopsis(frame, &app.tester, left[1]);

    let rules_height = if app.tester.show_rules { 8 } else { 3 };
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(rules_height),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(5),
        ])
        .split(columns[1]);
    render_rules_preview(frame, &app.tester, right[0]);
    render_prompt(frame, &app.tester, right[1]);
    render_validation(frame, &app.tester, right[2]);
    render_response(frame, &app.tester, right[3]);
}

fn render_model_list(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let title = if tester.loading {
        "Models (loading...)"
    } else {
        "Models"
    };

    let mut lines: Vec<Line> = Vec::new();
    if let Some(err) = &tester.load_error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if tester.models.is_empty() && !tester.loading {
        lines.push(Line::from(
            "No models available. Check your API configuration.",
        ));
    }

    for (i, model) in tester.models.iter().enumerate() {
        let marker = if tester.selected.as_deref() == Some(model.id.as_str()) {
            "> "
        } else {
            "  "
        };
        let label = match &model.provider {
            Some(provider) => format!("{marker}{} ({provider})", model.name),
            None => format!("{marker}{}", model.name),
        };
        let style = if i == tester.cursor {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(label, style)));
    }

    // Keep the cursor row visible in small terminals.
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = tester.cursor.saturating_sub(visible.saturating_sub(1)) as u16;

    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll, 0));
    frame.render_widget(list, area);
}

fn render_synopsis(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    if let Some(info) = tester.selected_info() {
        lines.push(Line::from(Span::styled(
            info.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if let Some(provider) = &info.provider {
            lines.push(Line::from(provider.clone()));
        }
        if let Some(showcase) = tester.selected_showcase() {
            push_string_list(&mut lines, "Best for", &showcase.best_for);
            push_string_list(&mut lines, "Strengths", &showcase.strengths);
            push_string_list(&mut lines, "Limitations", &showcase.limitations);
            if let Some(specs) = &showcase.output_specs {
                lines.push(Line::from(format!("Output: {specs}")));
            }
            if let Some(cost) = &showcase.estimated_cost {
                lines.push(Line::from(format!("Estimated cost: {cost}")));
            }
            push_string_list(&mut lines, "Use cases", &showcase.use_cases);
        } else {
            lines.push(Line::from(format!("Model ID: {}", info.id)));
            lines.push(Line::from("Detailed information not available."));
        }
    } else {
        lines.push(Line::from("No model selected."));
    }

    let synopsis = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Model Info"));
    frame.render_widget(synopsis, area);
}

fn push_string_list(lines: &mut Vec<Line>, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        format!("{label}:"),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for item in items {
        lines.push(Line::from(format!("- {item}")));
    }
}

fn render_rules_preview(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let header = format!(
        "{} Current Rules Template ({} chars) [v]",
        if tester.show_rules { "v" } else { ">" },
        tester.rules_template.len()
    );
    let mut lines = vec![Line::from(header)];
    if tester.show_rules {
        for line in tester.rules_template.lines() {
            lines.push(Line::from(line.to_string()));
        }
    }
    let preview = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Rules"));
    frame.render_widget(preview, area);
}

fn render_prompt(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let title = if tester.sending {
        "Your Prompt (sending...)"
    } else if tester.editing {
        "Your Prompt (editing, Esc to stop)"
    } else {
        "Your Prompt (i to edit)"
    };
    let style = if tester.editing {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let prompt = Paragraph::new(tester.prompt.as_str())
        .style(style)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(prompt, area);
}

fn render_validation(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let mut lines: Vec<Line> = tester
        .gate_items()
        .into_iter()
        .map(|(label, satisfied)| {
            let (icon, color) = if satisfied {
                ("[x]", Color::Green)
            } else {
                ("[ ]", Color::DarkGray)
            };
            Line::from(Span::styled(
                format!("{icon} {label}"),
                Style::default().fg(color),
            ))
        })
        .collect();
    lines.push(Line::from(Span::styled(
        if tester.can_send() {
            "Ready: Ctrl+Enter to send"
        } else {
            "Complete the checklist to send (a toggles acceptance)"
        },
        Style::default().fg(Color::DarkGray),
    )));
    let checklist = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Send Checklist"),
    );
    frame.render_widget(checklist, area);
}

fn render_response(frame: &mut Frame, tester: &TesterPane, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    match &tester.response {
        ResponseView::Error(message) => {
            lines.push(Line::from(Span::styled(
                "Request failed",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        ResponseView::Empty => {
            lines.push(Line::from(if tester.sending {
                "Waiting for the gateway..."
            } else {
                "No response yet. Send a prompt to see the result here."
            }));
        }
        ResponseView::Ready(outcome) => render_outcome(&mut lines, outcome, tester.show_raw),
    }
    if let Some(notice) = &tester.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }

    let response = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Response"));
    frame.render_widget(response, area);
}

fn render_outcome(lines: &mut Vec<Line>, outcome: &ExecOutcome, show_raw: bool) {
    if let Some(message) = outcome.response.assistant_message() {
        lines.push(Line::from(Span::styled(
            "Assistant Message:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in message.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::from(""));
    }

    let usage = usage_lines(&outcome.response.usage);
    if !usage.is_empty() {
        lines.push(Line::from(Span::styled(
            "Usage & Cost:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(usage);
        lines.push(Line::from(""));
    }

    let routing = routing_lines(&outcome.response.routing);
    if !routing.is_empty() {
        lines.push(Line::from(Span::styled(
            "Routing Information:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(routing);
        lines.push(Line::from(""));
    }

    if show_raw {
        lines.push(Line::from(Span::styled(
            "Full Response (o to collapse, c to copy):",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in outcome.raw_pretty().lines() {
            lines.push(Line::from(line.to_string()));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "o expands the full JSON response; c copies it.",
            Style::default().fg(Color::DarkGray),
        )));
    }
}

fn usage_lines(usage: &UsageInfo) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(n) = usage.input_tokens {
        lines.push(Line::from(format!("Input tokens:  {n}")));
    }
    if let Some(n) = usage.output_tokens {
        lines.push(Line::from(format!("Output tokens: {n}")));
    }
    if let Some(n) = usage.total_tokens {
        lines.push(Line::from(format!("Total tokens:  {n}")));
    }
    if let Some(c) = usage.input_cost {
        lines.push(Line::from(format!("Input cost:  ${c:.6}")));
    }
    if let Some(c) = usage.output_cost {
        lines.push(Line::from(format!("Output cost: ${c:.6}")));
    }
    if let Some(c) = usage.total_cost {
        lines.push(Line::from(format!("Total cost:  ${c:.6}")));
    }
    if usage.estimated {
        lines.push(Line::from("Cost values are estimated."));
    }
    lines
}

fn routing_lines(routing: &RoutingInfo) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(provider) = &routing.provider {
        lines.push(Line::from(format!("Provider: {provider}")));
    }
    if let Some(model) = &routing.model {
        lines.push(Line::from(format!("Model:    {model}")));
    }
    if let Some(endpoint) = &routing.endpoint {
        lines.push(Line::from(format!("Endpoint: {endpoint}")));
    }
    lines
}

fn render_rules(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let description = Paragraph::new(
        "Rules are prepended to every prompt sent from the Test Prompt tab. Saving a new \
         template requires re-accepting it before the next send.",
    )
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Rules Template"));
    frame.render_widget(description, chunks[0]);

    let title = if app.rules.editing {
        "Template (editing, Esc to stop)"
    } else {
        "Template (i to edit)"
    };
    let style = if app.rules.editing {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let editor = Paragraph::new(app.rules.buffer.as_str())
        .style(style)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(editor, chunks[1]);

    let mut status: Vec<Span> = vec![Span::raw(format!("{} characters", app.rules.buffer.len()))];
    if let Some(saved) = app.rules.last_saved {
        status.push(Span::raw(format!(
            " | Last saved: {}",
            saved.format("%Y-%m-%d %H:%M:%S UTC")
        )));
    }
    if let Some(notice) = &app.rules.notice {
        status.push(Span::styled(
            format!(" | {notice}"),
            Style::default().fg(Color::Cyan),
        ));
    }
    if app.rules.buffer.is_empty() {
        status.push(Span::styled(
            " | Define a rules template before sending prompts.",
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(status))
            .block(Block::default().borders(Borders::ALL).title("Status")),
        chunks[2],
    );

    if app.rules.confirm_clear {
        let dialog = Paragraph::new("Clear the rules template? (y/n)")
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Confirm Clear"));
        let dialog_area = centered_rect(60, 20, frame.area());
        frame.render_widget(Clear, dialog_area);
        frame.render_widget(dialog, dialog_area);
    }
}

fn render_embed(frame: &mut Frame, embed: &EmbedPane, area: Rect) {
    let body = Paragraph::new(vec![
        Line::from(embed.blurb),
        Line::from(""),
        Line::from("This page is hosted externally; open it in a browser:"),
        Line::from(Span::styled(
            embed.url,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(embed.title));
    frame.render_widget(body, area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::event_bus::{EventBus, EventBusCaps};
    use crate::prefs::{MemoryPrefs, PrefStore, RULES_TEMPLATE};
    use crate::user_config::UserConfig;

    fn rendered_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app_with_template(template: &str) -> App {
        let store: Arc<dyn PrefStore> = Arc::new(MemoryPrefs::new());
        store.set(RULES_TEMPLATE, template).unwrap();
        let config = UserConfig {
            base_url: "http://localhost:8000".to_string(),
            api_key: Some("k".to_string()),
        };
        let bus = Arc::new(EventBus::new(EventBusCaps::default()));
        App::new(config, store, &bus)
    }

    #[test]
    fn whitespace_only_template_shows_the_rules_notice() {
        let app = app_with_template(" \n  ");
        assert!(rendered_text(&app).contains("No rules template defined"));
    }

    #[test]
    fn real_template_renders_the_tester() {
        let app = app_with_template("Be concise.");
        let text = rendered_text(&app);
        assert!(!text.contains("No rules template defined"));
        assert!(text.contains("Send Checklist"));
    }
}
