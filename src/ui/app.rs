use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Tabs, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::db;
use crate::models::{Book, LoanRecord, Member};

use super::helpers::surface_error;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the tab strip including its border.
const TABS_HEIGHT: u16 = 3;
/// Key reminder shown under the status line.
const FOOTER_HELP: &str = "Tab/\u{2190}\u{2192}: switch  \u{2191}\u{2193}: move  r: reload  q: quit";

/// The three listings the browser can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Books,
    Members,
    Loans,
}

impl Tab {
    const ORDER: [Tab; 3] = [Tab::Books, Tab::Members, Tab::Loans];

    fn title(self) -> &'static str {
        match self {
            Tab::Books => "Books",
            Tab::Members => "Members",
            Tab::Loans => "Loans",
        }
    }

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Read-only state for the browser. Rows are loaded with a short-lived
/// connection on start and on every refresh.
pub struct BrowseApp {
    db_path: PathBuf,
    tab: Tab,
    books: Vec<Book>,
    members: Vec<Member>,
    loans: Vec<LoanRecord>,
    table_state: TableState,
    status: Option<StatusMessage>,
}

impl BrowseApp {
    pub fn new(db_path: PathBuf) -> Self {
        let mut app = Self {
            db_path,
            tab: Tab::Books,
            books: Vec::new(),
            members: Vec::new(),
            loans: Vec::new(),
            table_state: TableState::default(),
            status: None,
        };
        app.refresh();
        app
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    /// Reload all three listings. Failures land in the footer instead of
    /// closing the view.
    pub fn refresh(&mut self) {
        match self.load() {
            Ok(()) => {
                let message = format!(
                    "Loaded {} books, {} members, {} loans.",
                    self.books.len(),
                    self.members.len(),
                    self.loans.len()
                );
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "failed to load listings");
                self.set_status(surface_error(&err), StatusKind::Error);
            }
        }
        self.clamp_selection();
    }

    fn load(&mut self) -> Result<()> {
        let conn = db::open(&self.db_path)?;
        db::ensure_schema(&conn)?;
        self.books = db::list_books(&conn)?;
        self.members = db::list_members(&conn)?;
        self.loans = db::list_loans(&conn)?;
        Ok(())
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn row_count(&self) -> usize {
        match self.tab {
            Tab::Books => self.books.len(),
            Tab::Members => self.members.len(),
            Tab::Loans => self.loans.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let count = self.row_count();
        let selected = match self.table_state.selected() {
            _ if count == 0 => None,
            Some(index) => Some(index.min(count - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn move_selection(&mut self, delta: isize) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, count as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.table_state.select(None);
        self.clamp_selection();
    }

    /// Apply a key press. Returns `true` when the browser should close.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.previous()),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
        Ok(false)
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TABS_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(frame.area());

        let titles = Tab::ORDER.iter().map(|tab| tab.title());
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Library"))
            .select(self.tab.index())
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
        frame.render_widget(tabs, chunks[0]);

        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_table(&mut self, frame: &mut Frame, area: Rect) {
        let (header, widths, rows): (Vec<&str>, Vec<Constraint>, Vec<Row>) = match self.tab {
            Tab::Books => (
                vec!["Id", "Title", "Author", "Status"],
                vec![
                    Constraint::Length(6),
                    Constraint::Percentage(40),
                    Constraint::Percentage(35),
                    Constraint::Length(10),
                ],
                self.books
                    .iter()
                    .map(|book| {
                        Row::new(vec![
                            book.id.to_string(),
                            book.title.clone(),
                            book.author.clone(),
                            book.status_label().to_string(),
                        ])
                    })
                    .collect(),
            ),
            Tab::Members => (
                vec!["Id", "Name", "Email"],
                vec![
                    Constraint::Length(6),
                    Constraint::Percentage(45),
                    Constraint::Percentage(45),
                ],
                self.members
                    .iter()
                    .map(|member| {
                        Row::new(vec![
                            member.id.to_string(),
                            member.name.clone(),
                            member.email.clone(),
                        ])
                    })
                    .collect(),
            ),
            Tab::Loans => (
                vec!["Loan", "Book", "Member", "Loaned", "Returned"],
                vec![
                    Constraint::Length(6),
                    Constraint::Percentage(30),
                    Constraint::Percentage(25),
                    Constraint::Length(12),
                    Constraint::Length(14),
                ],
                self.loans
                    .iter()
                    .map(|loan| {
                        Row::new(vec![
                            loan.id.to_string(),
                            loan.book_title.clone(),
                            loan.member_name.clone(),
                            loan.loan_date.to_string(),
                            loan.returned_label(),
                        ])
                    })
                    .collect(),
            ),
        };

        if rows.is_empty() {
            let message = Paragraph::new(format!("No {} yet.", self.tab.title().to_lowercase()))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, area);
            return;
        }

        let table = Table::new(rows, widths)
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().borders(Borders::ALL).title(self.tab.title()))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };
        let instructions = Line::from(FOOTER_HELP);

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
