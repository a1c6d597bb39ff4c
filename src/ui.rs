// Interactive surface - login screen, tracker form, and report view
// All state lives in App; the session flow and the stores do the real work
// and this module only validates-and-calls-through, then draws the result.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

use expense_tracker::{report, Expense, LedgerStore, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Tracker,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

impl LoginField {
    pub fn next(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerField {
    Date,
    Category,
    Amount,
}

impl TrackerField {
    pub fn next(self) -> Self {
        match self {
            TrackerField::Date => TrackerField::Category,
            TrackerField::Category => TrackerField::Amount,
            TrackerField::Amount => TrackerField::Date,
        }
    }
}

/// One-line feedback above the key hints
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub conn: Connection,
    pub store: LedgerStore,
    pub session: Session,
    pub screen: Screen,
    // Login inputs
    pub login_focus: LoginField,
    pub username_input: String,
    pub password_input: String,
    // Tracker inputs
    pub tracker_focus: TrackerField,
    pub date_input: String,
    pub category_input: String,
    pub amount_input: String,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
}

impl App {
    pub fn new(conn: Connection, store: LedgerStore) -> Self {
        Self {
            conn,
            store,
            session: Session::new(),
            screen: Screen::Login,
            login_focus: LoginField::Username,
            username_input: String::new(),
            password_input: String::new(),
            tracker_focus: TrackerField::Date,
            date_input: String::new(),
            category_input: String::new(),
            amount_input: String::new(),
            status: None,
            should_quit: false,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match self.screen {
            Screen::Login | Screen::Report => match self.login_focus {
                LoginField::Username => &mut self.username_input,
                LoginField::Password => &mut self.password_input,
            },
            Screen::Tracker => match self.tracker_focus {
                TrackerField::Date => &mut self.date_input,
                TrackerField::Category => &mut self.category_input,
                TrackerField::Amount => &mut self.amount_input,
            },
        }
    }

    fn clear_tracker_fields(&mut self) {
        self.date_input.clear();
        self.category_input.clear();
        self.amount_input.clear();
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    fn submit_register(&mut self) {
        let username = self.username_input.trim().to_string();
        let password = self.password_input.trim().to_string();

        if username.is_empty() || password.is_empty() {
            self.error("Username and password are required.");
            return;
        }

        match self.session.register(&self.conn, &username, &password) {
            Ok(_) => self.info("User registered successfully!"),
            Err(e) => self.error(e.to_string()),
        }
    }

    fn submit_login(&mut self) {
        let username = self.username_input.trim().to_string();
        let password = self.password_input.trim().to_string();

        match self.session.login(&self.conn, &username, &password) {
            Ok(()) => {
                self.username_input.clear();
                self.password_input.clear();
                self.login_focus = LoginField::Username;
                self.screen = Screen::Tracker;
                self.tracker_focus = TrackerField::Date;
                self.info(format!("Logged in as {}.", username));
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    fn submit_add_expense(&mut self) {
        let date = self.date_input.trim().to_string();
        let category = self.category_input.trim().to_string();
        let amount = self.amount_input.clone();

        match self.session.add_expense(&self.store, &date, &category, &amount) {
            Ok(()) => {
                // Field values are only cleared on success; a rejected amount
                // stays in place for correction
                self.clear_tracker_fields();
                self.tracker_focus = TrackerField::Date;
                self.info("Expense added successfully!");
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    fn clear_all_expenses(&mut self) {
        match self.session.clear_expenses(&self.store) {
            Ok(()) => self.info("All expenses cleared."),
            Err(e) => self.error(e.to_string()),
        }
    }

    fn open_report(&mut self) {
        let expenses = match self.session.ledger() {
            Some(ledger) => self.store.load(ledger),
            None => return,
        };

        if report::is_empty(&expenses) {
            self.info("No expenses to visualize.");
        } else {
            self.screen = Screen::Report;
        }
    }

    fn logout(&mut self) {
        self.session.logout();
        self.clear_tracker_fields();
        self.screen = Screen::Login;
        self.login_focus = LoginField::Username;
        self.info("Logged out.");
    }

    // ========================================================================
    // KEY HANDLING
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Tracker => self.handle_tracker_key(key),
            Screen::Report => self.handle_report_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                self.login_focus = self.login_focus.next();
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_register();
            }
            KeyCode::Backspace => {
                self.focused_input_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_input_mut().push(c);
            }
            _ => {}
        }
    }

    fn handle_tracker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => {
                self.tracker_focus = self.tracker_focus.next();
            }
            KeyCode::Enter => self.submit_add_expense(),
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.open_report();
            }
            KeyCode::Char('x') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear_all_expenses();
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.logout();
            }
            KeyCode::Backspace => {
                self.focused_input_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_input_mut().push(c);
            }
            _ => {}
        }
    }

    fn handle_report_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('v') => {
                self.screen = Screen::Tracker;
            }
            _ => {}
        }
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.handle_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.screen {
        Screen::Login => render_login(f, chunks[1], app),
        Screen::Tracker => render_tracker(f, chunks[1], app),
        Screen::Report => render_report(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " Expense Tracker ",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(username) = app.session.username() {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            format!("User: {}", username),
            Style::default().fg(Color::Green),
        ));
    } else {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            "Not logged in",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

/// Bordered one-line input box; yellow border marks focus
fn render_input(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border_color = if focused { Color::Yellow } else { Color::White };

    let input = Paragraph::new(value.to_string()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ", title)),
    );

    f.render_widget(input, area);

    if focused {
        // Place the cursor right after the typed text
        f.set_cursor(area.x + 1 + value.len() as u16, area.y + 1);
    }
}

fn render_login(f: &mut Frame, area: Rect, app: &App) {
    // Center a fixed-size form in the content area
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(9),
            Constraint::Min(1),
        ])
        .split(area);

    let form = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1])[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(form);

    render_input(
        f,
        rows[0],
        "Username",
        &app.username_input,
        app.login_focus == LoginField::Username,
    );

    // Never echo the password itself
    let masked = "*".repeat(app.password_input.len());
    render_input(
        f,
        rows[1],
        "Password",
        &masked,
        app.login_focus == LoginField::Password,
    );

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Login  "),
        Span::styled("Ctrl+R", Style::default().fg(Color::Yellow)),
        Span::raw(" Register  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Switch field"),
    ]))
    .alignment(Alignment::Center);

    f.render_widget(hint, rows[2]);
}

fn render_tracker(f: &mut Frame, area: Rect, app: &App) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(12),
            Constraint::Min(1),
        ])
        .split(area);

    let form = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(vertical[1])[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(form);

    render_input(
        f,
        rows[0],
        "Date (YYYY-MM-DD)",
        &app.date_input,
        app.tracker_focus == TrackerField::Date,
    );
    render_input(
        f,
        rows[1],
        "Category",
        &app.category_input,
        app.tracker_focus == TrackerField::Category,
    );
    render_input(
        f,
        rows[2],
        "Amount",
        &app.amount_input,
        app.tracker_focus == TrackerField::Amount,
    );

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Add expense  "),
        Span::styled("Ctrl+V", Style::default().fg(Color::Yellow)),
        Span::raw(" Visualize  "),
        Span::styled("Ctrl+X", Style::default().fg(Color::Yellow)),
        Span::raw(" Clear all  "),
        Span::styled("Ctrl+L", Style::default().fg(Color::Yellow)),
        Span::raw(" Logout"),
    ]))
    .alignment(Alignment::Center);

    f.render_widget(hint, rows[3]);
}

fn render_report(f: &mut Frame, area: Rect, app: &App) {
    let expenses = match app.session.ledger() {
        Some(ledger) => app.store.load(ledger),
        None => Vec::new(),
    };

    // Side-by-side panels: category bars on the left, monthly line on the right
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_category_chart(f, panels[0], &expenses);
    render_monthly_chart(f, panels[1], &expenses);
}

fn render_category_chart(f: &mut Frame, area: Rect, expenses: &[Expense]) {
    let totals = report::totals_by_category(expenses);

    let data: Vec<(&str, u64)> = totals
        .iter()
        .map(|(category, total)| (category.as_str(), total.round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Total Expenses by Category "),
        )
        .data(&data)
        .bar_width(9)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(chart, area);
}

fn render_monthly_chart(f: &mut Frame, area: Rect, expenses: &[Expense]) {
    let totals = report::totals_by_month(expenses);

    let points: Vec<(f64, f64)> = totals
        .iter()
        .enumerate()
        .map(|(i, (_, total))| (i as f64, *total))
        .collect();

    let max_total = totals.iter().map(|(_, t)| *t).fold(0.0_f64, f64::max);
    let x_max = (totals.len().saturating_sub(1)).max(1) as f64;

    let x_labels: Vec<Span> = totals
        .iter()
        .map(|(month, _)| Span::styled(month.clone(), Style::default().fg(Color::DarkGray)))
        .collect();

    let y_labels = vec![
        Span::raw("0"),
        Span::raw(format!("{:.0}", max_total / 2.0)),
        Span::raw(format!("{:.0}", max_total)),
    ];

    let dataset = Dataset::default()
        .name("Monthly total")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Monthly Expenses "),
        )
        .x_axis(
            Axis::default()
                .title("Month")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Amount")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_total * 1.1])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();

    if let Some(status) = &app.status {
        let color = if status.is_error {
            Color::Red
        } else {
            Color::Green
        };
        spans.push(Span::styled(
            format!(" {} ", status.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("| "));
    }

    match app.screen {
        Screen::Login => {
            spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Exit"));
        }
        Screen::Tracker => {
            spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" Next field | "));
            spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Exit"));
        }
        Screen::Report => {
            spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" Back to tracker"));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
