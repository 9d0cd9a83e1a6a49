//! In-memory JSON log capture for tests.

use std::io;
use std::sync::{Arc, Mutex};

/// Collects every JSON log line emitted while [`Captured::run`] executes.
#[derive(Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("capture poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    /// Run `f` with a thread-local JSON subscriber and return `f`'s output.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Everything logged so far.
    pub(crate) fn output(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Returns `true` if any logged line carries `"event":"<event>"`.
    pub(crate) fn has_event(&self, event: &str) -> bool {
        self.output().contains(&format!("\"event\":\"{event}\""))
    }
}
