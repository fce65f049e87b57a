//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing the date range, the sort
//! order, and the displayed fuel types, then renders the hourly mix as a
//! multi-series line chart with ranked totals.
//!
//! The UI is only an event-driven shell: every input change re-runs the same
//! pipeline the CLI uses. Selection and sort changes recompute from the
//! last-fetched records; date changes refetch.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plotters::style::RGBColor;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::FetchArgs;
use crate::data::{EiaClient, RawRecord, RESPONDENT};
use crate::domain::{ReshapeConfig, SortOrder};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{MixChart, Series};

/// Chart/legend color pairs; series cycle through these in ranked order.
/// The Plotters color feeds the chart, the Ratatui color the legend text.
const PALETTE: [(RGBColor, Color); 8] = [
    (RGBColor(0, 255, 255), Color::Cyan),
    (RGBColor(0, 255, 0), Color::Green),
    (RGBColor(255, 255, 0), Color::Yellow),
    (RGBColor(255, 0, 255), Color::Magenta),
    (RGBColor(255, 0, 0), Color::Red),
    (RGBColor(0, 128, 255), Color::Blue),
    (RGBColor(255, 128, 0), Color::LightRed),
    (RGBColor(255, 255, 255), Color::White),
];

fn palette(idx: usize) -> (RGBColor, Color) {
    PALETTE[idx % PALETTE.len()]
}

/// Start the TUI.
pub fn run(args: FetchArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::Terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Start,
    End,
}

/// Fuel-type multiselect overlay state.
struct SourcePicker {
    /// (code, human label) in discovery order.
    entries: Vec<(String, Option<String>)>,
    checked: BTreeSet<String>,
    cursor: usize,
}

struct App {
    client: EiaClient,
    start: NaiveDate,
    end: NaiveDate,
    config: ReshapeConfig,
    /// `None` means "every discovered fuel type".
    selection: Option<BTreeSet<String>>,
    /// Last successful fetch; selection/sort changes rebuild from this.
    records: Option<Vec<RawRecord>>,
    run: Option<RunOutput>,
    selected_field: usize,
    editing: Option<DateField>,
    date_input: String,
    picker: Option<SourcePicker>,
    status: String,
}

impl App {
    fn new(args: FetchArgs) -> Result<Self, AppError> {
        let client = EiaClient::from_env()?;
        let config = crate::app::reshape_config_from_args(&args);
        let mut app = Self {
            client,
            start: args.start,
            end: args.end,
            config,
            selection: args.selection(),
            records: None,
            run: None,
            selected_field: 0,
            editing: None,
            date_input: String::new(),
            picker: None,
            status: "Fetching EIA data...".to_string(),
        };
        app.refetch();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::Terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(StdDuration::from_millis(100))
                .map_err(|e| AppError::Terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::Terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        if self.picker.is_some() {
            return self.handle_picker_key(code);
        }
        if self.editing.is_some() {
            return self.handle_date_edit(code);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 3 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => match self.selected_field {
                0 => self.begin_date_edit(DateField::Start),
                1 => self.begin_date_edit(DateField::End),
                2 => self.toggle_order(),
                3 => self.open_picker(),
                _ => {}
            },
            KeyCode::Char('r') => self.refetch(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }

        Ok(false)
    }

    fn begin_date_edit(&mut self, field: DateField) {
        self.date_input = match field {
            DateField::Start => self.start.to_string(),
            DateField::End => self.end.to_string(),
        };
        self.editing = Some(field);
        self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
    }

    fn handle_date_edit(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.apply_date_input();
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn apply_date_input(&mut self) {
        let Some(field) = self.editing.take() else {
            return;
        };
        let trimmed = self.date_input.trim();
        let date = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                self.status = format!("Invalid date '{trimmed}': {e}");
                return;
            }
        };
        match field {
            DateField::Start => self.start = date,
            DateField::End => self.end = date,
        }
        self.refetch();
    }

    fn adjust_field(&mut self, delta: i64) {
        match self.selected_field {
            0 => {
                if let Some(date) = self.start.checked_add_signed(Duration::days(delta)) {
                    self.start = date;
                    self.refetch();
                }
            }
            1 => {
                if let Some(date) = self.end.checked_add_signed(Duration::days(delta)) {
                    self.end = date;
                    self.refetch();
                }
            }
            2 => self.toggle_order(),
            _ => {}
        }
    }

    fn toggle_order(&mut self) {
        self.config.order = match self.config.order {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        };
        self.recompute();
        self.status = format!("order: {}", order_label(self.config.order));
    }

    /// Fetch the current range and rebuild everything.
    ///
    /// Errors (invalid range, fetch failure, malformed batch) land in the
    /// status line and clear the previous run, so a stale chart is never
    /// shown alongside a fatal condition.
    fn refetch(&mut self) {
        self.status = "Fetching EIA data...".to_string();
        match pipeline::run(
            &self.client,
            self.start,
            self.end,
            self.selection.as_ref(),
            &self.config,
        ) {
            Ok(run) => {
                self.records = Some(run.records.clone());
                self.status = format!("{} records fetched.", run.records.len());
                self.run = Some(run);
            }
            Err(err) => {
                self.records = None;
                self.run = None;
                self.status = err.to_string();
            }
        }
    }

    /// Rebuild from the last fetch (selection or sort order changed).
    fn recompute(&mut self) {
        let Some(records) = self.records.clone() else {
            return;
        };
        match pipeline::run_with_records(records, self.selection.as_ref(), &self.config) {
            Ok(run) => self.run = Some(run),
            Err(err) => {
                self.run = None;
                self.status = err.to_string();
            }
        }
    }

    fn export(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        if run.reshaped.chart.is_empty() {
            self.status = "No data to export.".to_string();
            return;
        }
        let path = PathBuf::from(format!("fuelmix_{}_{}.csv", self.start, self.end));
        match crate::io::export::write_wide_csv(&path, &run.reshaped, self.config.missing) {
            Ok(()) => self.status = format!("Wrote {}", path.display()),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn open_picker(&mut self) {
        let Some(run) = &self.run else {
            self.status = "No data to choose from.".to_string();
            return;
        };
        if run.discovered.is_empty() {
            self.status = "No fuel types in the current fetch.".to_string();
            return;
        }

        let labels = fuel_labels(self.records.as_deref().unwrap_or(&[]));
        let entries = run
            .discovered
            .iter()
            .map(|code| (code.clone(), labels.get(code).cloned()))
            .collect();

        self.picker = Some(SourcePicker {
            entries,
            checked: run.selected.clone(),
            cursor: 0,
        });
        self.status = "Space toggles, a all, n none, Enter applies, Esc cancels.".to_string();
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        let Some(picker) = self.picker.as_mut() else {
            return Ok(false);
        };

        match code {
            KeyCode::Up => {
                if picker.cursor > 0 {
                    picker.cursor -= 1;
                }
            }
            KeyCode::Down => {
                if picker.cursor + 1 < picker.entries.len() {
                    picker.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                let entry = picker.entries[picker.cursor].0.clone();
                if !picker.checked.remove(&entry) {
                    picker.checked.insert(entry);
                }
            }
            KeyCode::Char('a') => {
                picker.checked = picker.entries.iter().map(|(code, _)| code.clone()).collect();
            }
            KeyCode::Char('n') => {
                picker.checked.clear();
            }
            KeyCode::Enter => {
                let checked = picker.checked.clone();
                self.picker = None;
                self.status = format!("{} fuel types selected.", checked.len());
                self.selection = Some(checked);
                self.recompute();
            }
            KeyCode::Esc => {
                self.picker = None;
                self.status = "Selection unchanged.".to_string();
            }
            _ => {}
        }

        Ok(false)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(6),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_settings(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
        self.draw_picker(frame, size);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("fuelmix", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" — {RESPONDENT} hourly generation by fuel type")),
        ]));

        let (selected, discovered) = self
            .run
            .as_ref()
            .map(|r| (r.selected.len(), r.discovered.len()))
            .unwrap_or((0, 0));
        let records = self.records.as_ref().map(|r| r.len()).unwrap_or(0);

        lines.push(Line::from(Span::styled(
            format!(
                "range: {} .. {} | order: {} | fuel types: {selected}/{discovered} | records: {records}",
                self.start,
                self.end,
                order_label(self.config.order),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(26)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_totals(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Hourly mix (MWh)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        if run.reshaped.chart.is_empty() {
            let msg = Paragraph::new("No data available.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        }

        let Some((&t0, _)) = run.reshaped.wide.rows.iter().next() else {
            return;
        };

        // The chart consumes the flattened rows: already grouped per fuel type
        // in ranked series order, timestamps ascending within each series.
        let mut series: Vec<Series> = Vec::new();
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let mut x_max = 1.0_f64;

        for (idx, entry) in run.reshaped.totals.iter().enumerate() {
            let (rgb, _) = palette(idx);
            let points: Vec<(f64, f64)> = run
                .reshaped
                .chart
                .iter()
                .filter(|row| row.category == entry.category)
                .map(|row| ((row.timestamp - t0).num_hours() as f64, row.magnitude))
                .collect();
            for &(x, y) in &points {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
                x_max = x_max.max(x);
            }
            if !points.is_empty() {
                series.push(Series { color: rgb, points });
            }
        }

        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        if y_max <= y_min {
            y_min -= 1.0;
            y_max += 1.0;
        }
        let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
        let x_bounds = [0.0, x_max];
        let y_bounds = [y_min - pad, y_max + pad];

        let fmt_x = move |v: f64| (t0 + Duration::hours(v.round() as i64)).format("%d/%H").to_string();
        let fmt_y = |v: f64| format!("{v:.0}");

        let widget = MixChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label: "day/hour",
            y_label: "MWh",
            fmt_x: &fmt_x,
            fmt_y: &fmt_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_totals(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Ranked totals").borders(Borders::ALL);

        let mut lines: Vec<Line> = Vec::new();
        if let Some(run) = &self.run {
            for (idx, entry) in run.reshaped.totals.iter().enumerate() {
                let (_, color) = palette(idx);
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<6}", entry.category), Style::default().fg(color)),
                    Span::raw(format!("{:>16.1}", entry.total)),
                ]));
            }
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "no data",
                Style::default().fg(Color::Yellow),
            )));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let start_label = match self.editing {
            Some(DateField::Start) => format!("Start: {}_", self.date_input),
            _ => format!("Start: {}", self.start),
        };
        let end_label = match self.editing {
            Some(DateField::End) => format!("End: {}_", self.date_input),
            _ => format!("End: {}", self.end),
        };
        let sources_label = {
            let discovered = self
                .run
                .as_ref()
                .map(|r| r.discovered.len())
                .unwrap_or(0);
            match &self.selection {
                None => format!("Sources: all ({discovered})"),
                Some(set) => format!("Sources: {} of {discovered}", set.len()),
            }
        };

        let items = vec![
            ListItem::new(start_label),
            ListItem::new(end_label),
            ListItem::new(format!("Order: {}", order_label(self.config.order))),
            ListItem::new(sources_label),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit/toggle  r refetch  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(self.status.as_str(), Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_picker(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(picker) = &self.picker else {
            return;
        };

        let height = (picker.entries.len() as u16 + 2).min(area.height.saturating_sub(4));
        let rect = centered_rect(area, 44, height.max(3));
        frame.render_widget(Clear, rect);

        let items: Vec<ListItem> = picker
            .entries
            .iter()
            .map(|(code, label)| {
                let mark = if picker.checked.contains(code) { "[x]" } else { "[ ]" };
                let text = match label {
                    Some(label) => format!("{mark} {code:<6} {label}"),
                    None => format!("{mark} {code}"),
                };
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Fuel types").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(picker.cursor));
        frame.render_stateful_widget(list, rect, &mut state);
    }
}

fn order_label(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "asc",
        SortOrder::Desc => "desc",
    }
}

/// Map fuel-type codes to the human labels the API sends alongside them.
fn fuel_labels(records: &[RawRecord]) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for record in records {
        if let Some(label) = &record.type_name {
            labels
                .entry(record.fueltype.clone())
                .or_insert_with(|| label.clone());
        }
    }
    labels
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
