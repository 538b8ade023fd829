//! Best-effort teardown of a session's resources.
//!
//! Teardown order is fixed: input stream, output stream, port handle. Every
//! step runs even if an earlier one failed; failures are logged and returned
//! in the report, never raised.

use crate::port::{PortError, PortHandle, StreamPair};
use tracing::{debug, info, warn};

/// The three resources of a session, in teardown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    InputStream,
    OutputStream,
    PortHandle,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputStream => f.write_str("input stream"),
            Self::OutputStream => f.write_str("output stream"),
            Self::PortHandle => f.write_str("port handle"),
        }
    }
}

/// What happened during one `on_app_exit` call.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// False when cleanup had already run and this call did nothing.
    pub attempted: bool,
    /// Steps that failed, in the order they were tried.
    pub failures: Vec<(Resource, PortError)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, resource: Resource, result: Result<(), PortError>) {
        match result {
            Ok(()) => debug!(%resource, "Closed"),
            Err(PortError::NotOpen) => debug!(%resource, "Already closed"),
            Err(error) => {
                warn!(%resource, %error, "Cleanup failed");
                self.failures.push((resource, error));
            }
        }
    }
}

/// Owns a session's resources until the application exits.
///
/// Runs on [`CleanupHandler::on_app_exit`] or, failing that, on drop.
#[derive(Debug)]
pub struct CleanupHandler {
    path: String,
    streams: StreamPair,
    handle: PortHandle,
    done: bool,
}

impl CleanupHandler {
    pub fn new(path: impl Into<String>, streams: StreamPair, handle: PortHandle) -> Self {
        Self {
            path: path.into(),
            streams,
            handle,
            done: false,
        }
    }

    /// Streams still owned by the handler; closed once cleanup has run.
    pub(crate) fn streams_mut(&mut self) -> &mut StreamPair {
        &mut self.streams
    }

    /// Close input, output and handle. Safe to call more than once.
    pub fn on_app_exit(&mut self) -> CleanupReport {
        if self.done {
            debug!(port = %self.path, "Cleanup already ran");
            return CleanupReport::default();
        }
        self.done = true;

        let mut report = CleanupReport {
            attempted: true,
            ..Default::default()
        };
        report.record(Resource::InputStream, self.streams.input.close());
        report.record(Resource::OutputStream, self.streams.output.close());
        report.record(Resource::PortHandle, self.handle.close());

        if report.is_clean() {
            info!(port = %self.path, "Clean up completed");
        } else {
            warn!(
                port = %self.path,
                failures = report.failures.len(),
                "Clean up finished with errors"
            );
        }
        report
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Drop for CleanupHandler {
    fn drop(&mut self) {
        if !self.is_done() {
            self.on_app_exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{open_input, open_output, MockSerialPort, StreamMode};

    fn handler_for(mock: &MockSerialPort) -> CleanupHandler {
        let output = open_output(mock, StreamMode::Blocking).unwrap();
        let input = open_input(mock, StreamMode::Blocking).unwrap();
        CleanupHandler::new(
            "MOCK0",
            StreamPair { input, output },
            Box::new(mock.clone()),
        )
    }

    #[test]
    fn test_closes_in_order() {
        let mock = MockSerialPort::new("MOCK0");
        let mut handler = handler_for(&mock);

        let report = handler.on_app_exit();
        assert!(report.attempted);
        assert!(report.is_clean());
        // output was cloned first (#1), input second (#2)
        assert_eq!(mock.close_log(), vec!["MOCK0#2", "MOCK0#1", "MOCK0"]);
    }

    #[test]
    fn test_first_failure_does_not_stop_teardown() {
        let mut mock = MockSerialPort::new("MOCK0");
        let mut handler = handler_for(&mock);
        mock.fail_next_closes(1);

        let report = handler.on_app_exit();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, Resource::InputStream);
        assert_eq!(mock.close_log(), vec!["MOCK0#1", "MOCK0"]);
    }

    #[test]
    fn test_every_step_failing_is_reported() {
        let mut mock = MockSerialPort::new("MOCK0");
        let mut handler = handler_for(&mock);
        mock.fail_next_closes(3);

        let report = handler.on_app_exit();
        let resources: Vec<Resource> = report.failures.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            resources,
            vec![Resource::InputStream, Resource::OutputStream, Resource::PortHandle]
        );
    }

    #[test]
    fn test_second_call_is_noop() {
        let mock = MockSerialPort::new("MOCK0");
        let mut handler = handler_for(&mock);

        assert!(!handler.is_done());
        handler.on_app_exit();
        assert!(handler.is_done());
        let second = handler.on_app_exit();
        assert!(!second.attempted);
        assert!(second.is_clean());
        assert_eq!(mock.close_log().len(), 3);
    }

    #[test]
    fn test_drop_runs_cleanup() {
        let mock = MockSerialPort::new("MOCK0");
        drop(handler_for(&mock));
        assert_eq!(mock.close_log().len(), 3);
    }

    #[test]
    fn test_already_closed_stream_is_not_a_failure() {
        let mock = MockSerialPort::new("MOCK0");
        let mut output = open_output(&mock, StreamMode::Blocking).unwrap();
        let input = open_input(&mock, StreamMode::Blocking).unwrap();
        output.close().unwrap();

        let mut handler =
            CleanupHandler::new("MOCK0", StreamPair { input, output }, Box::new(mock.clone()));
        let report = handler.on_app_exit();
        assert!(report.is_clean());
        assert_eq!(mock.close_log(), vec!["MOCK0#1", "MOCK0#2", "MOCK0"]);
    }
}
