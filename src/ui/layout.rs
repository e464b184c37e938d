use crate::app::{App, AppView, RunStatus};
use crate::settings::SettingsField;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

// Palette
const ACCENT: Color = Color::Rgb(115, 144, 211);
const ACCENT_DIM: Color = Color::Rgb(69, 82, 110);
const PANEL: Color = Color::Rgb(61, 66, 85);
const TRACK: Color = Color::Rgb(34, 34, 34);
const SUCCESS: Color = Color::Rgb(134, 194, 156);
const ERROR: Color = Color::Rgb(220, 120, 120);
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);

pub fn draw_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.view {
        AppView::Main => draw_main_view(frame, area, app),
        AppView::Settings => draw_settings_view(frame, area, app),
    }
}

fn draw_main_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .split(area);

    draw_header(frame, chunks[0], app);
    draw_results(frame, chunks[1], app);
    draw_progress(frame, chunks[2], app);
    draw_buttons(frame, chunks[3], app);
    draw_help(frame, chunks[5], app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (status, color) = match app.status {
        RunStatus::Idle => ("Ready", TEXT_MUTED),
        RunStatus::Running => ("Testing...", ACCENT),
        RunStatus::Complete => ("Complete", SUCCESS),
        RunStatus::Failed => ("Test failed", ERROR),
    };

    let lines = vec![
        Line::from(Span::styled(
            "Rocket Speed Test",
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Test your internet connection speed",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(Span::styled(status, Style::default().fg(color))),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn draw_results(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PANEL))
        .style(Style::default().bg(PANEL));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(inner);

    let failed = app.status == RunStatus::Failed;
    draw_metric(frame, columns[0], "Download", &app.metrics.download, failed);
    draw_metric(frame, columns[1], "Upload", &app.metrics.upload, failed);
    draw_metric(frame, columns[2], "Ping", &app.metrics.ping, failed);
}

fn draw_metric(frame: &mut Frame, area: Rect, label: &str, value: &str, failed: bool) {
    let value_color = if failed { ERROR } else { TEXT_PRIMARY };

    let lines = vec![
        Line::from(Span::styled(label.to_string(), Style::default().fg(TEXT_SECONDARY))),
        Line::default(),
        Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_progress(frame: &mut Frame, area: Rect, app: &App) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BORDER)))
        .gauge_style(Style::default().fg(ACCENT).bg(TRACK))
        .label(Span::styled(
            format!("{}%", app.progress.value()),
            Style::default().fg(TEXT_PRIMARY),
        ))
        .ratio(app.progress.ratio());

    frame.render_widget(gauge, area);
}

fn draw_buttons(frame: &mut Frame, area: Rect, app: &App) {
    let buttons = Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).split(area);

    draw_button(frame, buttons[0], "Start Test", "enter", app.controls_enabled);
    draw_button(frame, buttons[1], "Refresh", "r", app.controls_enabled);
}

fn draw_button(frame: &mut Frame, area: Rect, label: &str, hotkey: &str, enabled: bool) {
    let (bg, fg) = if enabled {
        (ACCENT, TEXT_PRIMARY)
    } else {
        (ACCENT_DIM, TEXT_MUTED)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(bg))
        .style(Style::default().bg(bg));

    let text = Line::from(vec![
        Span::styled(label.to_string(), Style::default().fg(fg).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  [{}]", hotkey), Style::default().fg(fg)),
    ]);

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
}

// Settings
const SETTING_FIELDS: [SettingsField; 3] = [
    SettingsField::PingCount,
    SettingsField::DownloadSize,
    SettingsField::UploadSize,
];

fn draw_settings_view(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Min(4),
        Constraint::Length(1),
    ])
    .split(area);

    let header = vec![
        Line::from(Span::styled(
            "Test Settings",
            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Changes apply to the next test",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];
    frame.render_widget(Paragraph::new(header).alignment(Alignment::Center), chunks[0]);

    let editable = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PANEL))
        .style(Style::default().bg(PANEL));
    let rows: Vec<Line> = SETTING_FIELDS
        .iter()
        .map(|&field| setting_line(app, field))
        .collect();
    frame.render_widget(Paragraph::new(rows).block(editable), chunks[1]);

    let servers = app.settings.servers.join(", ");
    let fixed = vec![
        info_line("Servers", &servers),
        info_line(
            "Progress",
            &format!(
                "+1% every {} ms, up to {}%",
                app.settings.progress_tick_ms, app.settings.progress_ceiling
            ),
        ),
    ];
    let fixed_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" from config ", Style::default().fg(TEXT_MUTED)));
    frame.render_widget(Paragraph::new(fixed).block(fixed_block), chunks[2]);

    frame.render_widget(
        Paragraph::new("↑↓ choose · ←→ change · enter/esc back")
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn setting_line(app: &App, field: SettingsField) -> Line<'static> {
    let settings = &app.settings;
    let (label, value, range) = match field {
        SettingsField::PingCount => ("Ping samples", settings.ping_count.to_string(), "5–100"),
        SettingsField::DownloadSize => (
            "Download size",
            format!("{} MB", settings.download_size_mb),
            "25–500 MB",
        ),
        SettingsField::UploadSize => (
            "Upload size",
            format!("{} MB", settings.upload_size_mb),
            "25–250 MB",
        ),
    };

    let selected = app.selected_setting == field;
    let (marker, label_color, value_color) = if selected {
        ("▸ ", ACCENT, TEXT_PRIMARY)
    } else {
        ("  ", TEXT_SECONDARY, TEXT_SECONDARY)
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(ACCENT)),
        Span::styled(format!("{:<16}", label), Style::default().fg(label_color)),
        Span::styled(
            format!("{:>8}", value),
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("   ({})", range), Style::default().fg(TEXT_MUTED)),
    ])
}

fn info_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<12}", label), Style::default().fg(TEXT_SECONDARY)),
        Span::styled(value.to_string(), Style::default().fg(TEXT_MUTED)),
    ])
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.controls_enabled {
        "enter start · r refresh · s settings · q quit"
    } else {
        "test in progress · q quit"
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}
