use exoplanet_sky::display::{available_records, pick_record, Fact, PlanetView};
use exoplanet_sky::preferences::{self, InfoSection, Preferences};
use exoplanet_sky::{DatasetStore, KeyValueStore, PlanetRecord, PlanetType};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::ThreadRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use tracing::warn;

pub struct App<S: KeyValueStore> {
    pub records: Vec<PlanetRecord>,
    pub current: PlanetView,
    pub prefs: Preferences,
    pub store: DatasetStore<S>,
    /// Last persistence problem, shown in the status bar
    pub notice: Option<String>,
    rng: ThreadRng,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: DatasetStore<S>) -> Self {
        let records = available_records(&store);
        let prefs = Preferences::load(store.kv());
        let mut rng = rand::rng();
        let current = Self::pick(&records, &mut rng);

        Self {
            records,
            current,
            prefs,
            store,
            notice: None,
            rng,
        }
    }

    fn pick(records: &[PlanetRecord], rng: &mut ThreadRng) -> PlanetView {
        let fallback = exoplanet_sky::default_planets();
        let record = pick_record(records, rng).unwrap_or(&fallback[0]);
        PlanetView::from_record(record)
    }

    /// Another random planet (may repeat)
    pub fn next_planet(&mut self) {
        self.current = Self::pick(&self.records, &mut self.rng);
    }

    pub fn toggle_unit(&mut self) {
        let unit = self.prefs.temperature_unit.toggled();
        self.prefs.temperature_unit = unit;
        if let Err(e) = preferences::set_temperature_unit(self.store.kv_mut(), unit) {
            warn!(error = %e, "failed to save temperature unit");
            self.notice = Some("unit not saved".to_string());
        }
    }

    pub fn toggle_section(&mut self, section: InfoSection) {
        match preferences::toggle_section(self.store.kv_mut(), section) {
            Ok(open) => self.set_open(section, open),
            Err(e) => {
                warn!(error = %e, section = section.id(), "failed to save section state");
                self.notice = Some("section state not saved".to_string());
                let open = !self.prefs.is_open(section);
                self.set_open(section, open);
            }
        }
    }

    fn set_open(&mut self, section: InfoSection, open: bool) {
        match section {
            InfoSection::Description => self.prefs.description_open = open,
            InfoSection::Facts => self.prefs.facts_open = open,
        }
    }

    /// Apply one key. Returns false when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Enter => self.next_planet(),
            KeyCode::Char('u') => self.toggle_unit(),
            KeyCode::Char('d') => self.toggle_section(InfoSection::Description),
            KeyCode::Char('f') => self.toggle_section(InfoSection::Facts),
            _ => {}
        }
        true
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Name + type
            Constraint::Min(0),    // Info panel
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_info(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
}

fn type_color(planet_type: PlanetType) -> Color {
    match planet_type {
        PlanetType::GasGiant => Color::Yellow,
        PlanetType::NeptuneLike => Color::Blue,
        PlanetType::SuperEarth => Color::Green,
        PlanetType::Terrestrial => Color::Red,
        PlanetType::Unknown => Color::Gray,
    }
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let view = &app.current;
    let mut spans = vec![
        Span::styled(
            format!(" 🪐 {}", view.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            view.planet_type.label(),
            Style::default().fg(type_color(view.planet_type)),
        ),
    ];
    if let (Some(subtitle), None) = (&view.subtitle, &view.description) {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            subtitle.clone(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn section_title(title: &str, open: bool, key: char) -> Line<'static> {
    let marker = if open { "▾" } else { "▸" };
    Line::from(vec![
        Span::styled(
            format!("  {} {}", marker, title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::styled(format!("  ({})", key), Style::default().fg(Color::DarkGray)),
    ])
}

fn fact_line(fact: Fact) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("    {:<16}", fact.label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{:<20}", fact.value)),
        Span::styled(fact.help, Style::default().fg(Color::DarkGray)),
    ])
}

fn render_info<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let view = &app.current;
    let mut content = vec![Line::from("")];

    if let Some(description) = &view.description {
        content.push(section_title(view.heading(), app.prefs.description_open, 'd'));
        if app.prefs.description_open {
            content.push(Line::from(""));
            content.push(Line::from(Span::styled(
                format!("    {}", description),
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )));
        }
        content.push(Line::from(""));
    }

    content.push(section_title("Facts", app.prefs.facts_open, 'f'));
    if app.prefs.facts_open {
        content.push(Line::from(""));
        content.extend(view.facts(app.prefs.temperature_unit).into_iter().map(fact_line));
    }

    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    if let Some(reference) = &view.reference {
        content.push(Line::from(vec![
            Span::styled("  Ref: ", Style::default().fg(Color::DarkGray)),
            Span::raw(reference.clone()),
        ]));
    }
    if let Some(url) = view.article_url.as_ref().or(view.reference_url.as_ref()) {
        content.push(Line::from(Span::styled(
            format!("  {}", url),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        )));
    }

    let panel = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(type_color(view.planet_type)))
            .title(" Planet Info "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut status_spans = vec![Span::styled(
        format!(" {} planets ", app.records.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(notice) = &app.notice {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Red)));
    }

    for (key, label) in [("n", " Next"), ("u", " °C/°F"), ("d", " Description"), ("f", " Facts")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
