//! Output control and diagnostics
//!
//! [`Logger`] writes user-visible progress to stdout and errors to stderr,
//! honoring quiet and verbose modes. Diagnostics go through `tracing`;
//! [`init_tracing`] installs the subscriber once at process start.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Shared buffer that receives stdout text in place of the terminal
#[derive(Debug, Clone, Default)]
pub struct OutputCapture(Arc<Mutex<String>>);

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.0.lock().map(|buf| buf.clone()).unwrap_or_default()
    }

    fn push(&self, text: &str) {
        if let Ok(mut buf) = self.0.lock() {
            buf.push_str(text);
        }
    }
}

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
    capture: Option<OutputCapture>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
            capture: None,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
            capture: None,
        }
    }

    /// Send stdout text to `capture` instead of the terminal
    pub fn with_capture(mut self, capture: OutputCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    fn write_out(&self, text: &str) {
        match &self.capture {
            Some(capture) => capture.push(text),
            None => {
                print!("{}", text);
                let _ = io::stdout().flush();
            }
        }
    }

    /// Command result line. Printed even in quiet mode.
    pub fn output(&self, message: &str) {
        self.write_out(&format!("{}\n", message));
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.write_out(&format!("📝 {}\n", message));
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.write_out(&format!("ℹ️  {}\n", message));
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.write_out(&format!("✅ {}\n", message));
        }
    }

    /// Error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Progress information, completed by [`Logger::progress_done`]
    pub fn progress(&self, message: &str) {
        if !self.quiet {
            self.write_out(&format!("{}...", message));
        }
    }

    /// Progress completion
    pub fn progress_done(&self) {
        if !self.quiet {
            self.write_out(" Done\n");
        }
    }

    /// Abandon a pending progress line so the next message starts cleanly
    pub fn progress_failed(&self) {
        if !self.quiet {
            self.write_out(" Failed\n");
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.write_out(&format!("   {}\n", message));
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        if secs < 60 {
            format!("{:.1}s", duration.as_secs_f64())
        } else if secs < 3600 {
            format!("{}m{:02}s", secs / 60, secs % 60)
        } else {
            format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbose runs log this crate at debug
/// level and everything else stays at warn. Output goes to stderr so it never
/// mixes with command results on stdout.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "warn,sigref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
