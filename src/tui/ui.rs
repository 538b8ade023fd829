//! Rendering for the sparkline plotter.

use super::app::SparklinePlotter;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame, Terminal,
};
use std::io::{self, Stdout};

pub type Term = Terminal<CrosstermBackend<Stdout>>;

/// Vertical resolution the samples are scaled to.
const PLOT_STEPS: u64 = 100;

/// Set up the terminal for TUI rendering.
pub fn setup_terminal() -> io::Result<Term> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(mut terminal: Term) -> io::Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn render(app: &SparklinePlotter, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Plot
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(app, frame, chunks[0]);
    render_plot(app, frame, chunks[1]);
    render_status_bar(app, frame, chunks[2]);
}

fn render_header(app: &SparklinePlotter, frame: &mut Frame, area: Rect) {
    let p = &app.palette;
    let header = Line::from(vec![
        Span::styled(
            " serial-plot ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.port_label.as_str(), Style::default().fg(p.text)),
        Span::raw(" | "),
        Span::styled(format!("{:?}", app.format).to_lowercase(), Style::default().fg(p.text)),
        Span::raw(" | "),
        Span::styled(app.uptime_string(), Style::default().fg(p.text)),
    ]);

    frame.render_widget(Paragraph::new(header).style(Style::default().bg(p.bar)), area);
}

/// Newest `width` points of `data`.
fn visible_tail(data: &[u64], width: usize) -> &[u64] {
    &data[data.len().saturating_sub(width)..]
}

fn render_plot(app: &SparklinePlotter, frame: &mut Frame, area: Rect) {
    let p = &app.palette;
    let title = match (app.window.bounds(), app.window.latest()) {
        (Some((lo, hi)), Some(last)) => format!(" last {last:.3}  min {lo:.3}  max {hi:.3} "),
        _ => " waiting for samples ".to_string(),
    };

    let data = app.window.scaled(PLOT_STEPS);
    let width = area.width.saturating_sub(2) as usize;
    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(p.muted))
                .title(title),
        )
        .data(visible_tail(&data, width))
        .max(PLOT_STEPS)
        .style(Style::default().fg(p.trace));

    frame.render_widget(sparkline, area);
}

fn render_status_bar(app: &SparklinePlotter, frame: &mut Frame, area: Rect) {
    let p = &app.palette;
    let (status, colour) = match &app.status {
        Some(msg) if msg.starts_with("Error") => (msg.clone(), p.alert),
        Some(msg) => (msg.clone(), p.text),
        None => (format!("{} samples", app.summary.samples), p.text),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {status} "), Style::default().fg(colour)),
        Span::raw(" | "),
        Span::styled("q:quit  p:pause  c:clear", Style::default().fg(p.muted)),
    ]);

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(p.bar)), area);
}
