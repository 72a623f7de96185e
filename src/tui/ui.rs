// UI rendering logic
//
// Everything here is a pure function of App: the layout is rebuilt and
// drawn on every frame.

use super::app::App;
use super::components::logs_panel;
use super::modal::{FormFocus, Modal, ScheduleModal, WindowModal};
use crate::api::RemoteApi;
use crate::explore::{Content, Frame as ExploreFrame, ViewKind};
use crate::readings::{ReadingsView, NO_DATA};
use crate::schedule::{ScheduleType, TriggerMode};
use crate::session::{NextEventKind, SessionState, Status};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

const KEY_HINTS: &str =
    " q:quit  ?:help  s:start  x:stop  c:schedule  v/a/z/d:files  g:logs ";

/// Main UI render function - called on every frame
pub fn draw<A: RemoteApi>(f: &mut Frame, app: &App<A>) {
    let logs_height = if app.show_logs { 8 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),           // Session header
            Constraint::Min(8),              // Readings | Explorer
            Constraint::Length(logs_height), // System logs
            Constraint::Length(1),           // Key hints
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_readings(f, body[0], &app.readings);
    render_explorer(f, body[1], app);

    if app.show_logs {
        let entries = app.log_buffer.tail(logs_panel::capacity(chunks[2]));
        logs_panel::render(f, chunks[2], &entries);
    }

    f.render_widget(
        Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );

    match &app.modal {
        Some(Modal::Help) => render_help(f),
        Some(Modal::Schedule(form)) => render_schedule_form(f, form),
        Some(Modal::AnalysisWindow(window)) => render_window_form(f, window),
        None => {}
    }

    if let Some(toast) = &app.toast {
        let area = f.area();
        toast.render(f, area);
    }
}

fn status_style(status: Status) -> Style {
    let color = match status {
        Status::Logging => Color::Green,
        Status::Scheduled => Color::Cyan,
        Status::Idle => Color::Gray,
        Status::Unknown => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn header_lines(session: Option<&SessionState>) -> Vec<Line<'static>> {
    let Some(state) = session else {
        return vec![Line::from("Connecting...")];
    };

    let mut first = vec![
        Span::raw("Status: "),
        Span::styled(state.status.label(), status_style(state.status)),
        Span::raw(format!("   Mode: {}", state.mode)),
    ];
    if let Some(ts) = state.last_updated {
        first.push(Span::raw(format!(
            "   Last update: {}",
            ts.format("%Y-%m-%d %H:%M:%S")
        )));
    }

    let mut second = Vec::new();
    if let Some(file) = &state.active_file {
        second.push(Span::raw(format!("File: {}   ", file)));
    }
    if let Some(next) = &state.next_event {
        let kind = match next.kind {
            NextEventKind::Start => "start",
            NextEventKind::Stop => "stop",
        };
        second.push(Span::raw(format!(
            "Next {}: {}",
            kind,
            next.at.format("%Y-%m-%d %H:%M")
        )));
    }
    if state.is_unconfigured() {
        second.push(Span::styled(
            "No schedule configured (c to set one)",
            Style::default().fg(Color::DarkGray),
        ));
    }

    vec![Line::from(first), Line::from(second)]
}

fn render_header<A: RemoteApi>(f: &mut Frame, area: Rect, app: &App<A>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" eldash - {} ", app.base_url));
    f.render_widget(
        Paragraph::new(header_lines(app.session.as_ref())).block(block),
        area,
    );
}

fn render_readings(f: &mut Frame, area: Rect, view: &ReadingsView) {
    let block = Block::default().borders(Borders::ALL).title(" Readings ");

    let rows = match view {
        ReadingsView::NoData => {
            let text = Paragraph::new(NO_DATA)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(text, area);
            return;
        }
        ReadingsView::Table(rows) => rows,
    };

    let rows: Vec<Row> = rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.name.clone()),
                Cell::from(r.value.clone()).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(
            Row::new(vec!["Parameter", "Value"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(block);
    f.render_widget(table, area);
}

fn render_explorer<A: RemoteApi>(f: &mut Frame, area: Rect, app: &App<A>) {
    let Some(top) = app.navigator.top() else {
        let hint = Paragraph::new(vec![
            Line::from("Browse logged files:"),
            Line::from("  v  view      a  analyze"),
            Line::from("  z  visualize d  download"),
            Line::from("  V / D  service logs"),
        ])
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Files "));
        f.render_widget(hint, area);
        return;
    };

    let busy = if app.navigator.is_pending() { " ..." } else { "" };
    let title = format!(" {} ({}){} ", top.title(), app.navigator.depth(), busy);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let mut lines = top.render();
    if let Some(link) = &app.link {
        lines.insert(0, format!("Link: {}", link));
        lines.insert(1, String::new());
    }

    if top.selectable_len() == 0 {
        let style = match &top.content {
            Content::Error(_) => Style::default().fg(Color::Red),
            Content::Loading => Style::default().fg(Color::DarkGray),
            _ => Style::default(),
        };
        let mut text: Vec<Line> = lines.into_iter().map(Line::from).collect();
        if let Some(hint) = frame_hint(top) {
            text.push(Line::from(""));
            text.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));
        }
        let body = Paragraph::new(text)
            .style(style)
            .wrap(Wrap { trim: false })
            .block(block);
        f.render_widget(body, area);
        return;
    }

    // The link lines (if any) sit above the selectable rows
    let offset = if app.link.is_some() { 2 } else { 0 };
    let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.cursor + offset));
    f.render_stateful_widget(list, area, &mut state);
}

/// Keys that apply to a non-list frame
fn frame_hint(frame: &ExploreFrame) -> Option<&'static str> {
    match &frame.content {
        Content::Error(_) => Some("r: retry   Backspace: back   Esc: close"),
        Content::Analysis(_) if frame.view == ViewKind::FileAction => {
            Some("w: time window   Backspace: back   Esc: close")
        }
        Content::Analysis(_) | Content::Plots { .. } => Some("Backspace: back   Esc: close"),
        _ => None,
    }
}

fn render_help(f: &mut Frame) {
    let lines = vec![
        Line::styled("Session", Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  s        start logging now"),
        Line::from("  x        stop logging, clear schedules"),
        Line::from("  c        schedule form"),
        Line::from(""),
        Line::styled("Files", Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  v/a/z/d  view, analyze, visualize, download"),
        Line::from("  V/D      view or download service logs"),
        Line::from("  ↑↓ Enter select"),
        Line::from("  Space    toggle column (custom plot)"),
        Line::from("  w        analysis time window"),
        Line::from("  r        retry a failed request"),
        Line::from("  Bksp     back, Esc close"),
        Line::from(""),
        Line::from("  g        toggle logs    q  quit"),
    ];
    render_overlay(f, " Help ", lines, 50, 19);
}

fn render_schedule_form(f: &mut Frame, modal: &ScheduleModal) {
    let focus = modal.focus();
    let marker = |row: FormFocus| if row == focus { "> " } else { "  " };
    let choice = |label: &str, on: bool| {
        if on {
            Span::styled(
                format!("[{}]", label),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!(" {} ", label))
        }
    };

    let trigger = modal.form.trigger();
    let mut lines = vec![Line::from(vec![
        Span::raw(marker(FormFocus::Trigger)),
        Span::raw("Trigger:  "),
        choice("default", trigger == TriggerMode::Default),
        Span::raw(" "),
        choice("scheduled", trigger == TriggerMode::Scheduled),
    ])];

    if let Some(kind) = modal.form.schedule_type() {
        lines.push(Line::from(vec![
            Span::raw(marker(FormFocus::Type)),
            Span::raw("Type:     "),
            choice("once", kind == ScheduleType::Once),
            Span::raw(" "),
            choice("recurring", kind == ScheduleType::Recurring),
        ]));
    }

    let required = modal.form.required_fields();
    for field in modal.form.visible_fields() {
        let star = if required.contains(field) { "*" } else { " " };
        lines.push(Line::from(vec![
            Span::raw(marker(FormFocus::Field(*field))),
            Span::raw(format!("{:<13}{} ", field.label(), star)),
            Span::styled(
                modal.form.field(*field).to_string(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    }

    lines.push(Line::from(""));
    match (&modal.error, modal.submitting) {
        (_, true) => lines.push(Line::styled(
            "Submitting...",
            Style::default().fg(Color::DarkGray),
        )),
        (Some(error), false) => {
            lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)))
        }
        (None, false) => lines.push(Line::styled(
            "Tab: next  ←→: change  Enter: submit  Esc: close",
            Style::default().fg(Color::DarkGray),
        )),
    }

    render_overlay(f, " Schedule ", lines, 60, 11);
}

fn render_window_form(f: &mut Frame, modal: &WindowModal) {
    let row = |label: &str, value: &str, focused: bool| {
        Line::from(vec![
            Span::raw(if focused { "> " } else { "  " }),
            Span::raw(format!("{:<8}", label)),
            Span::styled(
                value.to_string(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
        ])
    };
    let lines = vec![
        row("Start", &modal.start_time, !modal.on_end),
        row("End", &modal.end_time, modal.on_end),
        Line::from(""),
        Line::styled(
            "Blank bound = open.  Enter: run  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    render_overlay(f, " Analysis window ", lines, 54, 6);
}

fn render_overlay(f: &mut Frame, title: &str, lines: Vec<Line>, width: u16, height: u16) {
    let area = centered(f.area(), width, height + 2);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.to_string());
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
