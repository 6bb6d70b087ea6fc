//! Operator-facing output.
//!
//! Lifecycle and replication results are reported as plain lines. Production
//! code writes them to stdout; tests capture them with [`BufferConsole`].

/// Sink for human-readable progress and result lines.
pub trait Console: Send + Sync {
    fn line(&self, text: &str);
}

/// Writes every line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&self, text: &str) {
        println!("{text}");
    }
}

/// In-memory console that records every line.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct BufferConsole {
    lines: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "mock"))]
impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Returns `true` if any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

#[cfg(any(test, feature = "mock"))]
impl Console for BufferConsole {
    fn line(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}
