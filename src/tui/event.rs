//! Event handling for the sparkline plotter.

use crate::shutdown::ShutdownSignal;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Everything the plotter loop reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// Redraw tick
    Tick,
    Key(KeyEvent),
    Resize(u16, u16),
    /// Decoded samples and the number of bytes they came from
    Samples { bytes: usize, values: Vec<f64> },
    /// The input stream reported end of stream
    InputClosed,
    Error(String),
}

/// Polls the terminal on its own thread and merges in events pushed
/// through [`EventHandler::sender`].
pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
    #[allow(dead_code)]
    handler: thread::JoinHandle<()>,
}

impl EventHandler {
    /// The polling thread exits once `stop` fires or the handler is dropped.
    pub fn new(tick_rate: Duration, stop: ShutdownSignal) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handler_sender = sender.clone();

        let handler = thread::spawn(move || {
            let mut last_tick = Instant::now();
            while !stop.is_triggered() {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);

                if event::poll(timeout).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(key)) => handler_sender.send(Event::Key(key)),
                        Ok(CrosstermEvent::Resize(width, height)) => {
                            handler_sender.send(Event::Resize(width, height))
                        }
                        Ok(_) => Ok(()),
                        Err(e) => handler_sender.send(Event::Error(e.to_string())),
                    };
                    if forwarded.is_err() {
                        break;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if handler_sender.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            sender,
            receiver,
            handler,
        }
    }

    /// Block until the next event.
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// A sender for events produced elsewhere, e.g. the serial reader.
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }
}
