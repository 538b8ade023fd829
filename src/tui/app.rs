//! Sparkline plotter state and main loop.

use super::event::{Event, EventHandler};
use super::theme::Palette;
use super::ui;
use crate::config::{PlotConfig, SampleFormat};
use crate::consumer::{send_start_command, ConsumeSummary, SampleDecoder, SampleWindow, StreamConsumer};
use crate::error::{AppError, AppResult};
use crate::port::{InByteStream, StreamPair};
use crate::shutdown::ShutdownSignal;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io::{self, Read};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotState {
    Running,
    Quitting,
}

/// Full-screen consumer drawing the sample history as a sparkline.
#[derive(Debug)]
pub struct SparklinePlotter {
    pub(super) state: PlotState,
    pub(super) port_label: String,
    pub(super) format: SampleFormat,
    pub(super) window: SampleWindow,
    pub(super) palette: Palette,
    pub(super) paused: bool,
    pub(super) status: Option<String>,
    pub(super) summary: ConsumeSummary,
    pub(super) started: Instant,
    refresh: Duration,
    start_command: Option<Vec<u8>>,
    failure: Option<String>,
}

impl SparklinePlotter {
    pub fn new(port_label: impl Into<String>, plot: &PlotConfig) -> Self {
        let palette = Palette::by_name(&plot.theme).cloned().unwrap_or_else(|| {
            warn!(theme = %plot.theme, "Unknown theme, using dark");
            Palette::default()
        });

        Self {
            state: PlotState::Running,
            port_label: port_label.into(),
            format: plot.format,
            window: SampleWindow::new(plot.history),
            palette,
            paused: false,
            status: None,
            summary: ConsumeSummary::default(),
            started: Instant::now(),
            refresh: plot.refresh_interval(),
            start_command: plot.start_bytes(),
            failure: None,
        }
    }

    pub fn state(&self) -> PlotState {
        self.state
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn summary(&self) -> ConsumeSummary {
        self.summary
    }

    /// Apply one event to the plotter state.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Tick | Event::Resize(_, _) => {}
            Event::Key(key) => self.handle_key(key),
            Event::Samples { bytes, values } => {
                self.summary.bytes_read += bytes as u64;
                self.summary.samples += values.len() as u64;
                if !self.paused {
                    self.window.extend(values);
                }
            }
            Event::InputClosed => {
                debug!("Input closed, leaving plotter");
                self.state = PlotState::Quitting;
            }
            Event::Error(err) => {
                self.status = Some(format!("Error: {err}"));
                self.failure = Some(err);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state = PlotState::Quitting,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state = PlotState::Quitting
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.paused = !self.paused;
                self.status = Some(if self.paused { "Paused" } else { "Running" }.to_string());
            }
            KeyCode::Char('c') => {
                self.window = SampleWindow::new(self.window_capacity());
                self.status = Some("Cleared".to_string());
            }
            _ => {}
        }
    }

    fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Elapsed time as `hh:mm:ss`.
    pub fn uptime_string(&self) -> String {
        let secs = self.started.elapsed().as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    fn run_loop(
        &mut self,
        terminal: &mut ui::Term,
        events: &EventHandler,
        shutdown: &ShutdownSignal,
    ) -> AppResult<()> {
        while self.state == PlotState::Running {
            terminal.draw(|frame| ui::render(self, frame))?;

            match events.next() {
                Ok(event) => self.handle_event(event),
                Err(_) => self.state = PlotState::Quitting,
            }
            if shutdown.is_triggered() {
                self.state = PlotState::Quitting;
            }
        }
        Ok(())
    }
}

/// Decode everything the input yields and forward it to the plotter loop.
fn forward_samples(input: &mut InByteStream, format: SampleFormat, tx: mpsc::Sender<Event>) {
    let mut decoder = SampleDecoder::new(format);
    let mut buf = [0u8; READ_CHUNK];
    let mut decoded = Vec::new();

    loop {
        let event = match input.read(&mut buf) {
            Ok(0) => {
                let _ = tx.send(Event::InputClosed);
                return;
            }
            Ok(n) => {
                decoder.push(&buf[..n], &mut decoded);
                Event::Samples {
                    bytes: n,
                    values: std::mem::take(&mut decoded),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Event::Error(e.to_string()));
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

impl StreamConsumer for SparklinePlotter {
    fn consume(
        &mut self,
        streams: &mut StreamPair,
        shutdown: &ShutdownSignal,
    ) -> AppResult<ConsumeSummary> {
        send_start_command(&mut streams.output, self.start_command.as_deref())?;

        let events = EventHandler::new(self.refresh, shutdown.clone());
        let reader_tx = events.sender();
        let format = self.format;
        let mut terminal = ui::setup_terminal()?;

        let outcome = thread::scope(|scope| {
            let input = &mut streams.input;
            scope.spawn(move || forward_samples(input, format, reader_tx));

            let outcome = self.run_loop(&mut terminal, &events, shutdown);
            // The reader leaves at its next poll timeout.
            shutdown.trigger();
            outcome
        });

        ui::restore_terminal(terminal)?;
        outcome?;

        info!(
            bytes = self.summary.bytes_read,
            samples = self.summary.samples,
            "Sparkline plotter finished"
        );
        match self.failure.take() {
            Some(err) => Err(AppError::Consumer(err)),
            None => Ok(self.summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{open_input, MockSerialPort, StreamMode};

    fn plotter() -> SparklinePlotter {
        SparklinePlotter::new("/dev/ttyUSB0", &PlotConfig::default())
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_samples_fill_window() {
        let mut app = plotter();
        app.handle_event(Event::Samples {
            bytes: 3,
            values: vec![1.0, 2.0, 3.0],
        });
        assert_eq!(app.window().len(), 3);
        assert_eq!(app.summary().bytes_read, 3);
    }

    #[test]
    fn test_pause_keeps_counting() {
        let mut app = plotter();
        app.handle_event(key(KeyCode::Char('p')));
        app.handle_event(Event::Samples {
            bytes: 2,
            values: vec![1.0, 2.0],
        });
        assert!(app.window().is_empty());
        assert_eq!(app.summary().samples, 2);
    }

    #[test]
    fn test_quit_keys() {
        for event in [
            key(KeyCode::Char('q')),
            key(KeyCode::Esc),
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Event::InputClosed,
        ] {
            let mut app = plotter();
            app.handle_event(event);
            assert_eq!(app.state(), PlotState::Quitting);
        }
    }

    #[test]
    fn test_clear_empties_window() {
        let mut app = plotter();
        app.handle_event(Event::Samples {
            bytes: 1,
            values: vec![4.0],
        });
        app.handle_event(key(KeyCode::Char('c')));
        assert!(app.window().is_empty());
        assert_eq!(app.state(), PlotState::Running);
    }

    #[test]
    fn test_forward_samples_until_shutdown() {
        let mut mock = MockSerialPort::new("MOCK0");
        mock.enqueue_read(&[5, 6]);
        let shutdown = ShutdownSignal::new();
        let mut input = open_input(&mock, StreamMode::Blocking)
            .unwrap()
            .with_shutdown(shutdown.clone());
        let (tx, rx) = mpsc::channel();

        shutdown.trigger();
        forward_samples(&mut input, SampleFormat::Raw, tx);

        let events: Vec<Event> = rx.iter().collect();
        assert!(matches!(
            &events[..],
            [Event::Samples { bytes: 2, values }, Event::InputClosed] if values == &vec![5.0, 6.0]
        ));
    }
}
