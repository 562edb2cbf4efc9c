//! Human-readable progress for collection runs.
//!
//! Each phase prints `label... [OK]` (or `[Error]`) on one line of stdout.
//! Failure details go to stderr so stdout stays a clean log of phases.

use std::io::Write;
use std::sync::Mutex;

/// Receives phase transitions from the collector.
pub trait Progress: Send + Sync {
    /// A phase has started (e.g. "Fetching channels").
    fn begin(&self, label: &str);

    /// Extra detail about the running phase (e.g. "42 messages").
    fn note(&self, note: &str);

    fn succeed(&self);

    /// The running phase failed; `detail` is the diagnostic for stderr.
    fn fail(&self, detail: &str);
}

/// Writes phase lines to a pair of writers (stdout/stderr in the CLI).
pub struct LineProgress<O, E> {
    out: Mutex<O>,
    err: Mutex<E>,
}

impl LineProgress<std::io::Stdout, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stderr())
    }
}

impl<O: Write + Send, E: Write + Send> LineProgress<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    pub fn into_inner(self) -> (O, E) {
        let out = self.out.into_inner().unwrap_or_else(|e| e.into_inner());
        let err = self.err.into_inner().unwrap_or_else(|e| e.into_inner());
        (out, err)
    }

    fn write_out(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl<O: Write + Send, E: Write + Send> Progress for LineProgress<O, E> {
    fn begin(&self, label: &str) {
        self.write_out(&format!("{}...", label));
    }

    fn note(&self, note: &str) {
        self.write_out(&format!(" {}", note));
    }

    fn succeed(&self) {
        self.write_out(" [OK]\n");
    }

    fn fail(&self, detail: &str) {
        self.write_out(" [Error]\n");
        let mut err = self.err.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(err, "{}", detail);
        let _ = err.flush();
    }
}
