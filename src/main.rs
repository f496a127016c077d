use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use cube_pulse::country::CountryCatalog;
use cube_pulse::feed::{self, ProviderConfig};
use cube_pulse::state::{self, AppState, CompetitionRecord, Selection, apply_delta};

const CARD_HEIGHT: u16 = 3;
const SOON_DAYS: i64 = 7;
const EVENT_BADGE_LIMIT: usize = 5;

const CHART_PALETTE: [Color; 10] = [
    Color::Rgb(0x88, 0x84, 0xd8),
    Color::Rgb(0x82, 0xca, 0x9d),
    Color::Rgb(0xff, 0xc6, 0x58),
    Color::Rgb(0xff, 0x73, 0x00),
    Color::Rgb(0x00, 0x88, 0xfe),
    Color::Rgb(0x00, 0xc4, 0x9f),
    Color::Rgb(0xff, 0xbb, 0x28),
    Color::Rgb(0xff, 0x80, 0x42),
    Color::Rgb(0xa0, 0x51, 0x95),
    Color::Rgb(0xd4, 0x50, 0x87),
];

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
}

impl App {
    fn new(
        catalog: Arc<CountryCatalog>,
        cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
    ) -> Self {
        Self {
            state: AppState::new(catalog),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.guide.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('b') | KeyCode::Enter => self.state.close_guide(),
                KeyCode::Char('j') | KeyCode::Down => {
                    if let Some(guide) = self.state.guide.as_mut() {
                        guide.scroll = guide.scroll.saturating_add(1);
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    if let Some(guide) = self.state.guide.as_mut() {
                        guide.scroll = guide.scroll.saturating_sub(1);
                    }
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                self.state.cycle_selection(true)
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.state.cycle_selection(false)
            }
            KeyCode::Char('0') | KeyCode::Char('a') => self.state.set_selection(Selection::All),
            KeyCode::Char('g') | KeyCode::Enter => self.request_guide(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_refresh(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_guide(&mut self) {
        let Some(record) = self.state.open_guide() else {
            self.state.push_log("[INFO] No competition selected");
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Travel guide unavailable");
            return;
        };
        if tx.send(state::ProviderCommand::FetchGuide(record)).is_err() {
            self.state.push_log("[WARN] Travel guide request failed");
        }
    }

    fn request_refresh(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Refresh unavailable");
            return;
        };
        if tx.send(state::ProviderCommand::Refresh).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        } else {
            self.state.push_log("[INFO] Refresh requested");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = ProviderConfig::from_env();
    let catalog = Arc::new(CountryCatalog::supported());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_provider(tx, cmd_rx, catalog.clone(), cfg);

    let mut app = App::new(catalog, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_dashboard(frame, chunks[1], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.guide.is_some() {
        render_guide_modal(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let as_of = state
        .reference_date
        .map(|d| format!("from {}", d.format("%Y-%m-%d")))
        .unwrap_or_else(|| "loading".to_string());
    let title = format!(
        "CUBE PULSE | Upcoming WCA Competitions | {} | {} events {}",
        state.selection.label(&state.catalog),
        state.view.total(),
        as_of
    );
    let line1 = format!(" +--+  {title}");
    let line2 = " |##|".to_string();
    let line3 = " +--+".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    if state.guide.is_some() {
        return "j/k/↑/↓ Scroll | Esc/b Close | q Quit".to_string();
    }
    "j/k/↑/↓ Move | h/l/←/→ Region | 0 All | Enter/g Guide | r Refresh | ? Help | q Quit"
        .to_string()
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(5),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Percentage(35)])
        .split(rows[0]);

    render_chart(frame, top[0], state);
    render_insights(frame, top[1], state);
    render_filter_strip(frame, rows[1], state);
    render_cards(frame, rows[2], state);

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[3]);
}

fn render_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Competitions by Region")
        .borders(Borders::ALL);

    if state.view.ranked_countries.is_empty() {
        let msg = if state.loading {
            "Fetching upcoming competitions..."
        } else {
            "No data"
        };
        let empty = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = state
        .view
        .ranked_countries
        .iter()
        .enumerate()
        .map(|(idx, code)| {
            let count = state.view.count_for(code) as u64;
            let mut style = Style::default().fg(CHART_PALETTE[idx % CHART_PALETTE.len()]);
            if state.selection == Selection::Country(code.clone()) {
                style = style.add_modifier(Modifier::BOLD);
            }
            Bar::default()
                .value(count)
                .label(Line::from(code.clone()))
                .text_value(count.to_string())
                .style(style)
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(4)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn render_insights(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("AI Insights").borders(Borders::ALL);
    let (text, style) = match state.summary_text() {
        Some(text) if !text.is_empty() => (text, Style::default()),
        Some(_) => (
            "No insights available.".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        None if state.loading => (String::new(), Style::default()),
        None => (
            "Analyzing upcoming events...".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_filter_strip(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = Vec::new();
    for option in state.selection_options() {
        let label = match &option {
            Selection::All => format!(" All Regions ({}) ", state.view.total()),
            Selection::Country(code) => format!(
                " {} {} {} ",
                state.catalog.flag(code),
                state.catalog.name(code),
                state.view.count_for(code)
            ),
        };
        let style = if option == state.selection {
            Style::default()
                .fg(Color::White)
                .bg(Color::Indexed(61))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(frame: &mut Frame, area: Rect, state: &AppState) {
    let filtered = state.filtered();
    if filtered.is_empty() {
        let msg = if state.loading {
            "Fetching upcoming competitions..."
        } else {
            "No competitions found for this selection. Press 0 to view all events."
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    if area.height < CARD_HEIGHT {
        let empty = Paragraph::new("Listing needs more height")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let today = state
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let visible = (area.height / CARD_HEIGHT) as usize;
    let (start, end) = visible_range(state.selected, filtered.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let card_area = Rect {
            x: area.x,
            y: area.y + (i as u16) * CARD_HEIGHT,
            width: area.width,
            height: CARD_HEIGHT,
        };
        let selected = idx == state.selected;
        let base = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(base), card_area);
        }
        let card = Paragraph::new(card_lines(filtered[idx], state, today)).style(base);
        frame.render_widget(card, card_area);
    }
}

fn card_lines<'a>(
    record: &'a CompetitionRecord,
    state: &'a AppState,
    today: chrono::NaiveDate,
) -> Vec<Line<'a>> {
    let date_style = if record.starts_within(today, SOON_DAYS) {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Indexed(61))
    };
    let country = format!(
        "{} {}",
        state.catalog.flag(&record.country_code),
        state.catalog.name(&record.country_code)
    );
    let badges = record.event_badges(EVENT_BADGE_LIMIT).join(" ");

    vec![
        Line::from(vec![
            Span::styled(country, Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(record.date_label(), date_style),
        ]),
        Line::from(Span::styled(
            record.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw(format!("@ {}", record.city)),
            Span::raw("  "),
            Span::styled(badges, Style::default().fg(Color::DarkGray)),
        ]),
    ]
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_guide_modal(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(guide) = state.guide.as_ref() else {
        return;
    };
    let popup_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup_area);

    let record = &guide.record;
    let mut lines = vec![
        format!(
            "{} {}, {}",
            state.catalog.flag(&record.country_code),
            record.city,
            state.catalog.name(&record.country_code)
        ),
        format!(
            "{} to {}",
            record.start_date.format("%Y-%m-%d"),
            record.end_date.format("%Y-%m-%d")
        ),
    ];
    if let Some(venue) = record.venue_address.as_deref() {
        lines.push(format!("Venue: {venue}"));
    }
    if !record.website_url.is_empty() {
        lines.push(format!("Website: {}", record.website_url));
    }
    if !record.detail_url.is_empty() {
        lines.push(format!("WCA: {}", record.detail_url));
    }
    lines.push(String::new());
    match state.guide_text() {
        Some(text) => lines.push(text),
        None => lines.push("Generating travel guide...".to_string()),
    }

    let title = format!("Travel Guide: {}", record.name);
    let modal = Paragraph::new(lines.join("\n"))
        .wrap(Wrap { trim: false })
        .scroll((guide.scroll, 0))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(modal, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Cube Pulse - Help",
        "",
        "Listing:",
        "  j/k or ↑/↓     Move",
        "  h/l or ←/→     Previous / next region",
        "  Tab            Next region",
        "  0 / a          All regions",
        "  Enter / g      Travel guide for competition",
        "  r              Refresh competitions",
        "",
        "Guide:",
        "  j/k or ↑/↓     Scroll",
        "  Esc / b        Close",
        "",
        "  ?              Toggle help",
        "  q              Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
