use std::time::Instant;

use ratatui::{
    prelude::*,
    style::Style,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroizing;

use crate::controller::view::{CreateField, TemplateField, CONFIG_MENU_ITEMS, SECURITY_OPTIONS};
use crate::controller::{Controller, StatusKind, View};
use crate::guard::clipboard::display_secs;

const COLOR_SAND: Color = Color::Rgb(0xEB, 0xDB, 0xB2);
const COLOR_OLIVE: Color = Color::Rgb(0x98, 0x97, 0x1A);
const COLOR_MOSS: Color = Color::Rgb(0x67, 0x67, 0x1C);
const COLOR_RUST: Color = Color::Rgb(0xB3, 0x88, 0x45);

const LIST_HINT: &str = "↑/↓ move | Enter open | / filter | n new | d delete | ^R refresh | ^S settings | ^P project | q quit";
const DETAIL_HINT: &str = "↑/↓ version | r reveal | c copy | a add version | g code | d delete | Esc back";
const REVEAL_HINT: &str = "c copy | Esc hide";
const CREATE_HINT: &str = "Tab field | ←/→ location | ^E multi-line | ^S / Enter create | Esc cancel";
const MENU_HINT: &str = "↑/↓ move | Enter select | Esc back";
const SECURITY_HINT: &str = "↑/↓ move | Enter/Space toggle | Esc back";
const AUDIT_HINT: &str = "↑/↓ scroll | g/G top/bottom | r refresh | Esc back";
const TEMPLATES_HINT: &str = "↑/↓ move | Enter edit | n new | d delete | Esc back";
const TEMPLATE_EDIT_HINT: &str = "Tab field | ^S save | Esc back";
const RECENT_HINT: &str = "↑/↓ move | Enter switch | d remove | Esc back";
const GENERATE_HINT: &str = "↑/↓ template | Enter render | c copy | Esc back";

const LOCK_BANNER: [&str; 5] = [
    "████████╗███████╗███████╗ ██████╗",
    "╚══██╔══╝██╔════╝██╔════╝██╔════╝",
    "   ██║   ███████╗█████╗  ██║     ",
    "   ██║   ╚════██║██╔══╝  ██║     ",
    "   ██║   ███████║███████╗╚██████╗",
];

#[derive(Clone, Copy)]
struct OverlayTheme {
    border: Color,
    title: Color,
    text: Color,
    bg: Color,
}

fn themed_overlay(title: &str) -> OverlayTheme {
    match title {
        "Delete secret" => OverlayTheme {
            border: COLOR_RUST,
            title: Color::Rgb(0xF0, 0xD8, 0xA8),
            text: COLOR_SAND,
            bg: Color::Rgb(0x2A, 0x1C, 0x11),
        },
        "Revealed value" => OverlayTheme {
            border: Color::Rgb(0xB3, 0xB2, 0x3A),
            title: COLOR_OLIVE,
            text: COLOR_SAND,
            bg: Color::Rgb(0x20, 0x23, 0x12),
        },
        "Switch project" => OverlayTheme {
            border: COLOR_OLIVE,
            title: COLOR_SAND,
            text: COLOR_SAND,
            bg: Color::Rgb(0x1D, 0x21, 0x10),
        },
        _ => OverlayTheme {
            border: COLOR_MOSS,
            title: COLOR_SAND,
            text: COLOR_SAND,
            bg: Color::Rgb(0x1E, 0x20, 0x12),
        },
    }
}

fn centered_overlay_area(frame_size: Rect, lines: &[String]) -> Rect {
    let maxw = lines.iter().map(|s| s.chars().count()).max().unwrap_or(0) as u16 + 4;
    let maxw = maxw.max(30);
    let maxh = lines.len() as u16 + 2;
    Rect::new(
        (frame_size.width.saturating_sub(maxw)) / 2,
        (frame_size.height.saturating_sub(maxh)) / 2,
        maxw.min(frame_size.width),
        maxh.min(frame_size.height),
    )
}

fn render_overlay(f: &mut Frame<'_>, lines: &[String], title: &str) {
    let area = centered_overlay_area(f.size(), lines);
    let theme = themed_overlay(title);
    let paragraph = Paragraph::new(
        lines
            .iter()
            .map(|l| Line::from(l.as_str()))
            .collect::<Vec<Line>>(),
    )
    .style(Style::default().fg(theme.text).bg(theme.bg))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                title,
                Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(theme.border).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(theme.bg)),
    );
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .bg(Color::Rgb(40, 40, 40))
        .add_modifier(Modifier::BOLD)
}

fn render_list(
    f: &mut Frame<'_>,
    area: Rect,
    title: &str,
    items: Vec<ListItem<'_>>,
    selected: usize,
    offset: Option<usize>,
) {
    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(selected.min(items.len() - 1)));
    }
    if let Some(offset) = offset {
        *state.offset_mut() = offset;
    }
    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_symbol("▶ ")
        .highlight_style(highlight());
    f.render_stateful_widget(list, area, &mut state);
}

fn masked(len: usize) -> String {
    "•".repeat(len)
}

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let marker = if focused { "▶ " } else { "  " };
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(COLOR_SAND)
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label}: "), style),
        Span::raw(value),
    ])
}

fn on_off(flag: bool) -> &'static str {
    if flag { "On" } else { "Off" }
}

pub fn draw(f: &mut Frame<'_>, c: &Controller, now: Instant) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    draw_header(f, c, now, layout[0]);

    match c.view {
        View::Locked => draw_locked(f, layout[1]),
        View::ProjectPrompt => draw_project_prompt(f, c, layout[1]),
        View::List | View::Filter => draw_list(f, c, layout[1]),
        View::Detail | View::Reveal | View::AddVersion => draw_detail(f, c, layout[1]),
        View::DeleteConfirm => {
            if c.delete_return == View::Detail {
                draw_detail(f, c, layout[1]);
            } else {
                draw_list(f, c, layout[1]);
            }
        }
        View::GenerateCode => draw_generate(f, c, layout[1]),
        View::Create => draw_create(f, c, layout[1]),
        View::ConfigMenu => draw_config_menu(f, c, layout[1]),
        View::ConfigBasic => draw_config_basic(f, c, layout[1]),
        View::ConfigTemplates => draw_templates(f, c, layout[1]),
        View::ConfigTemplateEdit => draw_template_edit(f, c, layout[1]),
        View::ConfigRecentProjects => draw_recent(f, c, layout[1]),
        View::ConfigSecurity => draw_security(f, c, layout[1]),
        View::AuditLog => draw_audit(f, c, layout[1]),
        View::ProjectSwitch => draw_list(f, c, layout[1]),
    }

    draw_footer(f, c, layout[2]);

    match c.view {
        View::Reveal => draw_reveal_overlay(f, c),
        View::AddVersion => {
            let name = c.selected.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
            let lines = vec![
                format!("Secret: {name}"),
                String::new(),
                format!("Value: {}", masked(c.new_version.value().chars().count())),
                String::new(),
                "[Enter] Add   [Esc] Cancel".to_string(),
            ];
            render_overlay(f, &lines, "Add version");
        }
        View::DeleteConfirm => {
            let name = c.selected.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
            let lines = vec![
                format!("Delete '{name}' and all its versions?"),
                String::new(),
                "[y] Yes   [n] No".to_string(),
            ];
            render_overlay(f, &lines, "Delete secret");
        }
        View::ProjectSwitch => draw_switch_overlay(f, c),
        _ => {}
    }
}

fn draw_header(f: &mut Frame<'_>, c: &Controller, now: Instant, area: Rect) {
    let project = if c.active_project.is_empty() {
        "-"
    } else {
        c.active_project.as_str()
    };
    let sep = &c.settings.folder_separator;
    let path = if c.path.is_empty() {
        sep.clone()
    } else {
        format!("{}{sep}", c.path.join(sep))
    };
    let mut spans = vec![
        Span::styled("tsec", Style::default().fg(COLOR_SAND).add_modifier(Modifier::BOLD)),
        Span::raw("  project: "),
        Span::styled(project.to_string(), Style::default().fg(COLOR_OLIVE)),
        Span::raw("  path: "),
        Span::raw(path),
    ];
    if let Some(remaining) = c.clipboard.remaining(now) {
        spans.push(Span::styled(
            format!("  clipboard clears in {}s", display_secs(remaining)),
            Style::default().fg(Color::Yellow),
        ));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(c.view.title()));
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let line = match &c.loading {
        Some(text) => Line::from(Span::styled(text.clone(), Style::default().fg(Color::Yellow))),
        None => {
            let color = match c.status.kind {
                StatusKind::Info => COLOR_SAND,
                StatusKind::Success => Color::Green,
                StatusKind::Warning => Color::Yellow,
                StatusKind::Error => Color::Red,
            };
            Line::from(Span::styled(c.status.text.clone(), Style::default().fg(color)))
        }
    };
    let hint = match c.view {
        View::List | View::Filter => LIST_HINT,
        View::Detail | View::DeleteConfirm | View::AddVersion => DETAIL_HINT,
        View::Reveal => REVEAL_HINT,
        View::Create => CREATE_HINT,
        View::GenerateCode => GENERATE_HINT,
        View::ConfigMenu | View::ConfigBasic => MENU_HINT,
        View::ConfigTemplates => TEMPLATES_HINT,
        View::ConfigTemplateEdit => TEMPLATE_EDIT_HINT,
        View::ConfigRecentProjects => RECENT_HINT,
        View::ConfigSecurity => SECURITY_HINT,
        View::AuditLog => AUDIT_HINT,
        View::ProjectPrompt | View::ProjectSwitch => "Enter confirm | Esc cancel",
        View::Locked => "Enter/Space unlock | ^C quit",
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(hint));
    f.render_widget(footer, area);
}

fn draw_locked(f: &mut Frame<'_>, area: Rect) {
    let mut lines: Vec<Line> = LOCK_BANNER
        .iter()
        .map(|l| {
            let spans: Vec<Span> = l
                .chars()
                .map(|ch| {
                    let color = match ch {
                        '█' => COLOR_SAND,
                        '═' => COLOR_OLIVE,
                        '║' | '╗' | '╔' | '╝' | '╚' => COLOR_MOSS,
                        _ => Color::Reset,
                    };
                    Span::styled(ch.to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD))
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Session locked after inactivity",
        Style::default().fg(COLOR_SAND).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from("Press Enter or Space to unlock"));
    let height = lines.len() as u16;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let inner = Rect::new(area.x, y, area.width, height.min(area.height));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_project_prompt(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let box_width: u16 = 50;
    let w = box_width.min(area.width);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(4) / 2;
    let label = Paragraph::new("Enter the project to open")
        .alignment(Alignment::Center)
        .style(Style::default().fg(COLOR_SAND).add_modifier(Modifier::BOLD));
    f.render_widget(label, Rect::new(x, y, w, 1));
    let prompt = Paragraph::new(format!("> {}", c.project_input.value()))
        .block(Block::default().borders(Borders::ALL).title("Project ID"));
    f.render_widget(prompt, Rect::new(x, y + 1, w, 3.min(area.height)));
}

fn draw_list(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let (filter_area, list_area) = if c.view == View::Filter || !c.filter.is_empty() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);
        (Some(split[0]), split[1])
    } else {
        (None, area)
    };

    if let Some(filter_area) = filter_area {
        let style = if c.view == View::Filter {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let filter = Paragraph::new(format!("/{}", c.filter.value()))
            .style(style)
            .block(Block::default().borders(Borders::ALL).title("Filter"));
        f.render_widget(filter, filter_area);
    }

    let nodes = c.items();
    let items: Vec<ListItem> = if nodes.is_empty() {
        let text = if c.loading.is_some() { "Loading..." } else { "No secrets" };
        vec![ListItem::new(text)]
    } else {
        nodes
            .iter()
            .map(|node| {
                if node.is_folder {
                    ListItem::new(Line::from(vec![
                        Span::styled("▸ ", Style::default().fg(COLOR_OLIVE)),
                        Span::styled(
                            format!("{}{}", node.name, c.settings.folder_separator),
                            Style::default().fg(COLOR_OLIVE).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  ({})", node.children.len()),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                } else {
                    ListItem::new(format!("  {}", node.name))
                }
            })
            .collect()
    };
    let title = format!("Secrets ({})", c.secrets.len());
    render_list(f, list_area, &title, items, c.cursor, Some(c.offset));
}

fn draw_detail(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let lines = match &c.selected {
        Some(secret) => {
            let mut lines = vec![
                Line::from(format!("Name: {}", secret.name)),
                Line::from(format!("Created: {}", secret.create_time)),
                Line::from(format!("Replication: {}", secret.replication)),
            ];
            if secret.labels.is_empty() {
                lines.push(Line::from("Labels: -"));
            } else {
                lines.push(Line::from("Labels:"));
                for (key, value) in &secret.labels {
                    lines.push(Line::from(format!("  {key}={value}")));
                }
            }
            lines
        }
        None => vec![Line::from("No secret selected.")],
    };
    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Secret").borders(Borders::ALL));
    f.render_widget(detail, body[0]);

    let items: Vec<ListItem> = if c.versions.is_empty() {
        let text = if c.loading.is_some() { "Loading..." } else { "No versions" };
        vec![ListItem::new(text)]
    } else {
        c.versions
            .iter()
            .map(|v| {
                let color = match v.state {
                    crate::models::VersionState::Enabled => Color::Green,
                    crate::models::VersionState::Disabled => Color::Yellow,
                    crate::models::VersionState::Destroyed => Color::Red,
                };
                ListItem::new(Line::from(vec![
                    Span::raw(format!("v{:<5} ", v.name)),
                    Span::styled(format!("{:<10}", v.state.label()), Style::default().fg(color)),
                    Span::styled(v.create_time.clone(), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect()
    };
    render_list(f, body[1], "Versions", items, c.version_cursor, None);
}

fn draw_reveal_overlay(f: &mut Frame<'_>, c: &Controller) {
    let name = c.selected.as_ref().map(|s| s.name.as_str()).unwrap_or("-");
    let text = c.revealed_text();
    let mut lines = Zeroizing::new(vec![
        format!("{name} (version {})", c.revealed_version),
        String::new(),
    ]);
    lines.extend(text.lines().map(str::to_string));
    lines.push(String::new());
    lines.push("[c] Copy   [Esc] Hide".to_string());
    render_overlay(f, &lines, "Revealed value");
}

fn draw_switch_overlay(f: &mut Frame<'_>, c: &Controller) {
    let typed = !c.switch.input.is_empty();
    let mut options: Vec<String> = Vec::new();
    if typed {
        options.push(format!("Use '{}'", c.switch.input.value()));
    }
    options.extend(c.switch_candidates().iter().map(|p| {
        if *p == c.active_project {
            format!("{p} (current)")
        } else {
            p.to_string()
        }
    }));

    let mut lines = vec![format!("> {}", c.switch.input.value()), String::new()];
    if options.is_empty() {
        lines.push("Type a project ID".to_string());
    }
    for (idx, option) in options.iter().enumerate() {
        let marker = if idx == c.switch.cursor { "▶ " } else { "  " };
        lines.push(format!("{marker}{option}"));
    }
    render_overlay(f, &lines, "Switch project");
}

fn draw_generate(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);
    let items: Vec<ListItem> = c
        .settings
        .templates
        .iter()
        .map(|t| ListItem::new(t.title.clone()))
        .collect();
    render_list(f, body[0], "Templates", items, c.generate.cursor, None);

    let (text, style) = match &c.generate.output {
        Some(Ok(code)) => (code.clone(), Style::default().fg(COLOR_SAND)),
        Some(Err(err)) => (format!("Template error: {err}"), Style::default().fg(Color::Red)),
        None => (
            "Press Enter to render the selected template".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let output = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Code").borders(Borders::ALL));
    f.render_widget(output, body[1]);
}

fn draw_create(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let form = &c.create;
    let location = match form.location {
        -1 => "+ Add new location".to_string(),
        0 => "Automatic".to_string(),
        n => c
            .settings
            .secret_locations
            .get(n as usize - 1)
            .cloned()
            .unwrap_or_else(|| "Automatic".to_string()),
    };
    let value_len = form.value.value().chars().count();
    let value = if form.multiline {
        format!("{} ({} lines, multi-line)", masked(value_len.min(32)), form.value.value().lines().count())
    } else {
        masked(value_len)
    };
    let mut lines = vec![
        field_line("Name", form.name.value().to_string(), form.focus == CreateField::Name),
        Line::from(""),
        field_line("Value", value, form.focus == CreateField::Value),
        Line::from(""),
        field_line("Location", format!("◀ {location} ▶"), form.focus == CreateField::Location),
    ];
    if form.adding_location {
        lines.push(Line::from(""));
        lines.push(Line::from(format!("New location: {}", form.new_location.value())));
        lines.push(Line::from(Span::styled(
            "Enter save | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(conflict) = c.tree.conflict_for(form.name.value()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Warning: {conflict}"),
            Style::default().fg(Color::Yellow),
        )));
    }
    let panel = Paragraph::new(lines).block(Block::default().title("New secret").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_config_menu(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let items: Vec<ListItem> = CONFIG_MENU_ITEMS.iter().map(|item| ListItem::new(*item)).collect();
    render_list(f, area, "Settings", items, c.menu_cursor, None);
}

fn draw_config_basic(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let lines = vec![
        field_line("Project ID", c.basic.project.value().to_string(), c.basic.focus == 0),
        Line::from(""),
        field_line("Folder separator", c.basic.separator.value().to_string(), c.basic.focus == 1),
        Line::from(""),
        Line::from(Span::styled(
            "Enter apply | Esc discard",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let panel = Paragraph::new(lines).block(Block::default().title("Basic settings").borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_templates(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let mut items: Vec<ListItem> = c
        .settings
        .templates
        .iter()
        .map(|t| ListItem::new(t.title.clone()))
        .collect();
    items.push(ListItem::new(Span::styled("+ New template", Style::default().fg(COLOR_OLIVE))));
    render_list(f, area, "Templates", items, c.template_cursor, None);
}

fn draw_template_edit(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let form = &c.template_form;
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    let focus_style = |focused: bool| {
        if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(COLOR_SAND)
        }
    };
    let title = Paragraph::new(form.title.value().to_string())
        .style(focus_style(form.focus == TemplateField::Title))
        .block(Block::default().title("Title").borders(Borders::ALL));
    f.render_widget(title, split[0]);
    let code = Paragraph::new(form.code.value().to_string())
        .style(focus_style(form.focus == TemplateField::Code))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Code ({{.SecretName}} {{.FullSecretName}} {{.ProjectID}})")
                .borders(Borders::ALL),
        );
    f.render_widget(code, split[1]);
}

fn draw_recent(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let items: Vec<ListItem> = if c.settings.recent_projects.is_empty() {
        vec![ListItem::new("No recent projects")]
    } else {
        c.settings
            .recent_projects
            .iter()
            .map(|p| {
                if *p == c.active_project {
                    ListItem::new(format!("{p} (current)"))
                } else {
                    ListItem::new(p.clone())
                }
            })
            .collect()
    };
    render_list(f, area, "Recent projects", items, c.recent_cursor, None);
}

fn draw_security(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let s = &c.settings;
    let inactivity = if s.session.inactivity_timeout_minutes == 0 {
        "Disabled".to_string()
    } else {
        format!("{} minutes", s.session.inactivity_timeout_minutes)
    };
    let options: [String; SECURITY_OPTIONS] = [
        format!("Clipboard auto-clear: {}", on_off(s.clipboard.auto_clear)),
        format!("Clipboard timeout: {}s", s.clipboard.timeout_seconds),
        format!("Audit logging: {}", on_off(s.audit.enabled)),
        format!("Audit retention: {} days", s.audit.max_age_days),
        format!("View audit log ({})", c.audit.path().display()),
        format!("Lock on inactivity: {}", on_off(s.session.lock_on_timeout)),
        format!("Inactivity timeout: {inactivity}"),
    ];
    let items: Vec<ListItem> = options.into_iter().map(ListItem::new).collect();
    render_list(f, area, "Security", items, c.security_cursor, None);
}

fn draw_audit(f: &mut Frame<'_>, c: &Controller, area: Rect) {
    let lines: Vec<Line> = c
        .audit_lines
        .iter()
        .skip(c.audit_offset)
        .map(|l| {
            let color = if l.contains('✗') { Color::Red } else { COLOR_SAND };
            Line::from(Span::styled(l.clone(), Style::default().fg(color)))
        })
        .collect();
    let title = format!("Audit log ({} entries, newest first)", c.audit_lines.len());
    let panel = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(panel, area);
}
