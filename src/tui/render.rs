use super::state::UiState;
use crate::engine::DataState;
use crate::record::{parse_date, IrbClass, Priority, Project};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, data: &DataState, ui: &UiState, filtered: &[Project]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, data, filtered.len(), chunks[0]);
    draw_filter_bar(f, ui, chunks[1]);

    if let Some(error) = &data.error {
        if data.projects.is_empty() {
            draw_error(f, error, chunks[2]);
        } else {
            draw_projects(f, ui, filtered, chunks[2]);
        }
    } else {
        draw_projects(f, ui, filtered, chunks[2]);
    }

    draw_logs(f, data, chunks[3]);
    draw_footer(f, chunks[4]);
}

fn draw_header(f: &mut Frame, data: &DataState, showing: usize, area: Rect) {
    let total = data.projects.len();
    let count_text = if showing == total {
        format!("Showing all {} projects", total)
    } else {
        format!("Showing {} of {} projects", showing, total)
    };

    let source = match data.source {
        Some(tag) => format!("Source: {}", tag.label()),
        None => "Source: -".to_string(),
    };

    let activity = if data.loading {
        Span::styled(" LOADING", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else if data.error.is_some() {
        Span::styled(" ERROR", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(" OK", Style::default().fg(Color::Green))
    };

    let line = Line::from(vec![
        Span::styled("Project Dashboard", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::raw(count_text),
        Span::raw("  |  "),
        Span::styled(source, Style::default().fg(Color::Cyan)),
        Span::raw("  |  "),
        Span::raw(last_updated_text(&data.projects)),
        activity,
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

/// Most recent activity/timestamp across the loaded records.
fn last_updated_text(projects: &[Project]) -> String {
    let most_recent = projects.iter().filter_map(Project::recency).max();
    match most_recent {
        Some(dt) => format!("Last updated: {}", dt.format("%b %-d, %Y")),
        None => "Last updated: unknown".to_string(),
    }
}

fn draw_filter_bar(f: &mut Frame, ui: &UiState, area: Rect) {
    let search_style = if ui.search_focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw("Search: "),
        Span::styled(
            if ui.search_input.is_empty() && !ui.search_focus {
                "(press /)".to_string()
            } else {
                format!("{}_", ui.search_input)
            },
            search_style,
        ),
        Span::raw("   "),
        filter_span("Status", ui.filters.status.as_deref()),
        Span::raw("  "),
        filter_span("Priority", ui.filters.priority.as_deref()),
        Span::raw("  "),
        filter_span("IRB", ui.filters.irb.map(IrbClass::label)),
    ];
    if !ui.collaborator_options.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(filter_span("Collab", ui.filters.collaborator.as_deref()));
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Filters "));
    f.render_widget(bar, area);
}

fn filter_span(label: &str, value: Option<&str>) -> Span<'static> {
    match value {
        Some(v) => Span::styled(
            format!("{}: {}", label, v),
            Style::default().fg(Color::Cyan),
        ),
        None => Span::styled(
            format!("{}: all", label),
            Style::default().fg(Color::DarkGray),
        ),
    }
}

fn draw_projects(f: &mut Frame, ui: &UiState, filtered: &[Project], area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    draw_project_table(f, ui, filtered, halves[0]);
    draw_project_card(f, filtered.get(ui.selected), halves[1]);
}

fn draw_project_table(f: &mut Frame, ui: &UiState, filtered: &[Project], area: Rect) {
    let header = Row::new(vec!["Title", "Status", "Priority", "Deadline", "IRB"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let visible = area.height.saturating_sub(3) as usize;
    let offset = ui.selected.saturating_sub(visible.saturating_sub(1));

    let rows = filtered.iter().enumerate().skip(offset).map(|(i, p)| {
        let style = if i == ui.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(p.title.clone()),
            Cell::from(Span::styled(p.status.clone(), status_style(&p.status))),
            Cell::from(Span::styled(p.priority.clone(), priority_style(&p.priority))),
            Cell::from(p.deadline.clone()),
            Cell::from(p.irb_class().label()),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Length(15),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Projects "));

    f.render_widget(table, area);
}

/// Detail card for the selected project, the dashboard's equivalent of the
/// rendered project card.
fn draw_project_card(f: &mut Frame, project: Option<&Project>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Card ");

    let Some(p) = project else {
        let empty = Paragraph::new("No projects match your filters.")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            p.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(p.r#abstract.clone()),
        Line::from(""),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(p.status.clone(), status_style(&p.status)),
            Span::raw("   Priority: "),
            Span::styled(p.priority.clone(), priority_style(&p.priority)),
        ]),
    ];

    if !p.target_journal.is_empty() && p.status != "Submitted" {
        lines.push(Line::from(format!("Target: {}", p.target_journal)));
    }
    if p.status == "Submitted" && !p.submission_date.is_empty() {
        let to = if p.target_journal.is_empty() {
            String::new()
        } else {
            format!(" to {}", p.target_journal)
        };
        lines.push(Line::from(format!("Submitted: {}{}", p.submission_date, to)));
    }
    if !p.deadline.is_empty() {
        lines.push(Line::from(format!("Deadline: {}", p.deadline)));
    }
    if !p.irb_status.is_empty() {
        lines.push(Line::from(format!("IRB: {}", p.irb_status)));
    }
    if !p.funding.is_empty() {
        lines.push(Line::from(format!("Funding: {}", p.funding)));
    }
    if !p.coauthors.is_empty() {
        lines.push(Line::from(format!("Coauthors: {}", p.coauthors)));
    }
    if !p.collaborator.is_empty() {
        lines.push(Line::from(format!("Collaborator: {}", p.collaborator)));
    }
    let tags = p.keyword_tags();
    if !tags.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("[{}]", tags.join("] [")),
            Style::default().fg(Color::Magenta),
        )));
    }
    if !p.docs_link.is_empty() {
        lines.push(Line::from(Span::styled(
            p.docs_link.clone(),
            Style::default().fg(Color::Blue),
        )));
    }
    if !p.notes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(p.notes.clone()));
    }
    lines.push(Line::from(""));
    let activity = if p.last_activity.is_empty() {
        &p.timestamp
    } else {
        &p.last_activity
    };
    lines.push(Line::from(Span::styled(
        format!("Last activity: {}", format_date(activity)),
        Style::default().fg(Color::DarkGray),
    )));

    let card = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(card, area);
}

fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None if raw.is_empty() => "Unknown".to_string(),
        None => raw.to_string(),
    }
}

fn status_style(status: &str) -> Style {
    let color = match status.to_lowercase().as_str() {
        "idea" => Color::Gray,
        "research design" => Color::Blue,
        "data collected" => Color::Cyan,
        "data analyzed" => Color::Magenta,
        "writing" => Color::Yellow,
        "submitted" => Color::Green,
        _ => Color::White,
    };
    Style::default().fg(color)
}

fn priority_style(priority: &str) -> Style {
    match Priority::parse(priority) {
        Priority::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
        Priority::Unset => Style::default().fg(Color::DarkGray),
    }
}

/// The single user-visible failure channel: raw message, nothing swallowed.
fn draw_error(f: &mut Frame, error: &str, area: Rect) {
    let panel = Paragraph::new(vec![
        Line::from(Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(error.to_string()),
    ])
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)))
    .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn draw_logs(f: &mut Frame, data: &DataState, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = data
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let level_style = match entry.level.as_str() {
                "ERROR" => Style::default().fg(Color::Red),
                "WARN" => Style::default().fg(Color::Yellow),
                _ => Style::default().fg(Color::DarkGray),
            };
            Line::from(vec![
                Span::styled(format!("{} ", entry.time), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:5} ", entry.level), level_style),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();

    let logs = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(logs, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " / search  s status  p priority  i irb  o collab  c clear  r refresh  1-4 refresh source  q quit",
        Style::default().fg(Color::DarkGray),
    )]));
    f.render_widget(footer, area);
}
