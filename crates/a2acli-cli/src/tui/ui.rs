//! TUI rendering using ratatui.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use a2acli_core::projection::{LineKind, LogLine, TaskProjection};
use a2acli_core::protocol::Phase;

use super::app::App;

// -- Palette --

const ACCENT: Color = Color::Rgb(0x59, 0xc2, 0xff);
const COMMAND: Color = Color::Rgb(0xbf, 0xbd, 0xb6);
const MUTED: Color = Color::Rgb(0x6c, 0x76, 0x80);
const PASS: Color = Color::Rgb(0xc2, 0xd9, 0x4c);
const WARN: Color = Color::Rgb(0xff, 0xb4, 0x54);
const FAIL: Color = Color::Rgb(0xf0, 0x71, 0x78);
const ID: Color = Color::Rgb(0x95, 0xe6, 0xcb);

fn accent() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

fn muted() -> Style {
    Style::default().fg(MUTED)
}

fn fail() -> Style {
    Style::default().fg(FAIL).add_modifier(Modifier::BOLD)
}

/// Style for a phase label: green when completed, red when failed or
/// rejected, amber otherwise.
pub fn phase_style(phase: &Phase) -> Style {
    let color = match phase {
        Phase::Completed => PASS,
        Phase::Failed | Phase::Rejected => FAIL,
        _ => WARN,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Render the session view.
pub fn render(f: &mut Frame, app: &App, state: &TaskProjection) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .vertical_margin(1)
        .constraints([
            Constraint::Min(3),    // log
            Constraint::Length(1), // spacer
            Constraint::Length(1), // status bar
            Constraint::Length(1), // help
        ])
        .split(f.area());

    render_log(f, state, chunks[0]);
    f.render_widget(Paragraph::new(status_bar(app, state)), chunks[2]);
    f.render_widget(
        Paragraph::new(Span::styled(help_text(app), muted())),
        chunks[3],
    );
}

fn render_log(f: &mut Frame, state: &TaskProjection, area: Rect) {
    let log = Paragraph::new(log_lines(state)).wrap(Wrap { trim: false });
    // Keep the newest rows in view, counting rows after wrapping.
    let overflow = log
        .line_count(area.width)
        .saturating_sub(area.height as usize);
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    f.render_widget(log.scroll((scroll, 0)), area);
}

/// Every retained log line, split into terminal lines and styled by kind.
pub fn log_lines(state: &TaskProjection) -> Vec<Line<'static>> {
    state.lines().flat_map(styled).collect()
}

fn styled(line: &LogLine) -> Vec<Line<'static>> {
    let mut rows = line.text.split('\n');
    let head = rows.next().unwrap_or_default().to_string();
    let rest = rows.map(|r| Line::raw(r.to_string()));

    let first = match &line.kind {
        LineKind::Agent => match head.strip_prefix("Agent:") {
            Some(text) => Line::from(vec![
                Span::styled(
                    "Agent:",
                    Style::default().fg(COMMAND).add_modifier(Modifier::BOLD),
                ),
                Span::raw(text.to_string()),
            ]),
            None => Line::raw(head),
        },
        LineKind::Status(phase) => {
            let label = format!("[{phase}]");
            match head.strip_prefix(label.as_str()) {
                Some(text) => Line::from(vec![
                    Span::raw("["),
                    Span::styled(phase.to_string(), phase_style(phase)),
                    Span::raw("]"),
                    Span::styled(text.to_string(), muted()),
                ]),
                None => Line::styled(head, muted()),
            }
        }
        LineKind::Artifact => Line::styled(
            head,
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::UNDERLINED),
        ),
        LineKind::Preview | LineKind::Info => Line::styled(head, muted()),
        LineKind::Saved => Line::styled(head, accent()),
        LineKind::SaveFailed | LineKind::Error => Line::styled(head, fail()),
    };

    std::iter::once(first).chain(rest).collect()
}

/// `<spinner> ACTIVITY | Task: <id>`
///
/// The spinner only shows while the task is still running.
pub fn status_bar(app: &App, state: &TaskProjection) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(frame) = app.spinner().filter(|_| !state.is_terminal()) {
        spans.push(Span::styled(format!("{frame} "), accent()));
    }

    let activity = state.activity().to_uppercase();
    let activity_style = if state.error().is_some() {
        fail()
    } else {
        accent()
    };
    spans.push(Span::styled(activity, activity_style));

    if let Some(id) = state.task_id() {
        spans.push(Span::raw(" | Task: "));
        spans.push(Span::styled(id.to_string(), Style::default().fg(ID)));
    }
    Line::from(spans)
}

fn help_text(app: &App) -> &'static str {
    if app.frozen {
        "(press any key to exit)"
    } else {
        "(ctrl+c to quit)"
    }
}
