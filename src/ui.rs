//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a three-row split: a one-line header with the server
//!   total, the scrollable incident list, and a one-line status bar.
//! * The detail panel is drawn last, over the list, when an incident is open.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::loader::Phase;
use crate::source::{Incident, PageSource};

/// Draw the complete UI for one frame.
pub fn draw<S: PageSource<Record = Incident>>(app: &mut App<S>, frame: &mut Frame) {
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(app, frame, header_area);
    draw_incident_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);

    if let Some(incident) = &app.detail {
        draw_detail(incident, frame, main_area);
    }
}

fn draw_header<S: PageSource<Record = Incident>>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::raw(" Total of "),
        Span::styled(
            format!("{} cases", app.loader.state().total()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]));
    frame.render_widget(header, area);
}

/// Render the scrollable incident list, or a placeholder when empty.
fn draw_incident_list<S: PageSource<Record = Incident>>(
    app: &mut App<S>,
    frame: &mut Frame,
    area: Rect,
) {
    let block = Block::default().title(" Incidents ").borders(Borders::ALL);

    if app.incidents().is_empty() {
        let empty = Paragraph::new("No incidents to show.").block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list_items: Vec<ListItem> = app
        .loader
        .state()
        .items()
        .iter()
        .map(|incident| {
            ListItem::new(Line::from(vec![
                Span::styled(&incident.title, Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", incident.name),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw("  "),
                Span::styled(incident.value_brl(), Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .block(block)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar<S: PageSource<Record = Incident>>(app: &App<S>, frame: &mut Frame, area: Rect) {
    let state = app.loader.state();
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{}/{} loaded", state.items().len(), state.total()),
            Style::default().fg(Color::Green),
        ),
    ];
    match state.phase() {
        Phase::Loading => spans.push(Span::raw(format!("  loading page {}…", state.next_page()))),
        Phase::Exhausted => spans.push(Span::raw("  (end)")),
        Phase::IdleEmpty if app.loader.retry_armed() => {
            spans.push(Span::raw("  waiting for incidents…"))
        }
        Phase::IdleEmpty | Phase::IdlePartial => {}
    }
    if let Some(error) = state.last_error() {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    if let Some(at) = state.last_loaded_at() {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::raw("  q: quit  ↑/↓: scroll  Enter: details  r: more  R: reload"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the selected incident over the list.
fn draw_detail(incident: &Incident, frame: &mut Frame, area: Rect) {
    let area = centered(area, 70, 10);
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(vec![
            Span::styled("CASE: ", label),
            Span::raw(&incident.title),
        ]),
        Line::from(vec![
            Span::styled("ONG: ", label),
            Span::raw(format!("{} ({}/{})", incident.name, incident.city, incident.uf)),
        ]),
        Line::from(vec![
            Span::styled("VALUE: ", label),
            Span::styled(incident.value_brl(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("CONTACT: ", label),
            Span::raw(format!("{}  {}", incident.email, incident.whatsapp)),
        ]),
        Line::raw(""),
        Line::raw(incident.description.as_str()),
    ];

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" Incident #{} (Esc to close) ", incident.id))
                .borders(Borders::ALL),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(detail, area);
}

/// A `width_pct` wide, `height` tall rectangle centred in `area`.
fn centered(area: Rect, width_pct: u16, height: u16) -> Rect {
    // u32 so wide terminals cannot overflow the product.
    let width = (u32::from(area.width) * u32::from(width_pct.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
