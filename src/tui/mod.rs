//! Full-screen sparkline plotter (feature `tui`).
//!
//! [`SparklinePlotter`] is a [`StreamConsumer`](crate::consumer::StreamConsumer)
//! that owns the terminal while it runs. The serial reader lives on a scoped
//! thread and feeds decoded samples into the same channel as terminal
//! events. `q`, Esc or Ctrl+C fire the shutdown signal, which ends the
//! reader at its next poll timeout.
//!
//! Logging to stderr would corrupt the screen, so the binary only logs in
//! this mode when `[logging].file` is set.

mod app;
mod event;
mod theme;
mod ui;

pub use app::{PlotState, SparklinePlotter};
pub use event::{Event, EventHandler};
pub use theme::{Palette, PALETTES};
