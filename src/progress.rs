//! Live progress output
//!
//! [`ProgressReporter`] writes two kinds of output to one stream:
//! - durable lines (header, status, action, success, error), always on
//!   their own line
//! - an ephemeral "waiting" line, repainted in place by a background task
//!   while the caller blocks on polling
//!
//! One mutex guards the stream and the animation state. Durable writes erase
//! the animation line first, and [`ProgressReporter::stop_wait`] does not
//! return until the background task has exited, so no frame can land after
//! it.

use async_trait::async_trait;
use owo_colors::{OwoColorize, Stream};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Default repaint interval for the waiting line
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Erase the current terminal line and return the cursor to column 0
const CLEAR_LINE: &str = "\r\x1b[K";

/// Supplies the optional `| <stats>` suffix of the waiting line
///
/// Called once per frame, outside the reporter's lock. Returning `None`
/// (including on failure) renders the frame without stats.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Current stats text, if any
    async fn stats(&self) -> Option<String>;
}

/// Format a duration as `MM:SS`, or `HH:MM:SS` from one hour up
///
/// Rounds to the nearest second.
pub fn format_duration(d: Duration) -> String {
    let total = (d.as_millis() + 500) / 1000;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Emphasis,
    Accent,
    Success,
    Error,
}

fn paint(styled: bool, text: &str, tone: Tone) -> String {
    if !styled {
        return text.to_string();
    }
    match tone {
        Tone::Emphasis => text.if_supports_color(Stream::Stdout, |t| t.bold()).to_string(),
        Tone::Accent => text.if_supports_color(Stream::Stdout, |t| t.cyan()).to_string(),
        Tone::Success => text.if_supports_color(Stream::Stdout, |t| t.green()).to_string(),
        Tone::Error => text.if_supports_color(Stream::Stdout, |t| t.red()).to_string(),
    }
}

struct Session {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct State {
    out: Box<dyn Write + Send>,
    styled: bool,
    animating: bool,
    dots: usize,
    session_started: Instant,
    current_line: String,
    last_status: Option<String>,
    session: Option<Session>,
}

impl State {
    // Terminal write failures are not actionable mid-merge; they are dropped.
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn erase_line(&mut self) {
        self.emit(CLEAR_LINE);
        self.current_line.clear();
    }

    fn durable(&mut self, line: &str) {
        if self.animating {
            self.erase_line();
        }
        self.emit(&format!("{line}\n"));
    }

    fn render_frame(&mut self, label: &str, stats: Option<&str>) {
        self.dots = (self.dots % 3) + 1;
        let elapsed = format_duration(self.session_started.elapsed());

        let mut line = format!("{} {label} ({elapsed})", ".".repeat(self.dots));
        if let Some(stats) = stats.filter(|s| !s.is_empty()) {
            line.push_str(" | ");
            line.push_str(stats);
        }

        self.emit(&format!("{CLEAR_LINE}{line}"));
        self.current_line = line;
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concurrency-safe progress renderer
pub struct ProgressReporter {
    state: Arc<Mutex<State>>,
    started: Instant,
    tick: Duration,
}

impl ProgressReporter {
    /// Reporter on stdout, colored when the terminal supports it
    pub fn stdout() -> Self {
        Self::build(Box::new(anstream::stdout()), true)
    }

    /// Reporter on an arbitrary writer, without colors
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self::build(Box::new(out), false)
    }

    fn build(out: Box<dyn Write + Send>, styled: bool) -> Self {
        let now = Instant::now();
        Self {
            state: Arc::new(Mutex::new(State {
                out,
                styled,
                animating: false,
                dots: 0,
                session_started: now,
                current_line: String::new(),
                last_status: None,
                session: None,
            })),
            started: now,
            tick: DEFAULT_TICK,
        }
    }

    /// Override the repaint interval
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Print a header line
    pub fn header(&self, text: &str) {
        let mut state = lock(&self.state);
        let line = paint(state.styled, text, Tone::Emphasis);
        state.durable(&line);
    }

    /// Print `Status: <text>` preceded by an empty line
    ///
    /// Repeating the last printed status is a no-op until
    /// [`forget_status`](Self::forget_status) is called.
    pub fn status(&self, text: &str) {
        let mut state = lock(&self.state);
        if state.last_status.as_deref() == Some(text) {
            return;
        }
        let line = format!("\nStatus: {}", paint(state.styled, text, Tone::Accent));
        state.durable(&line);
        state.last_status = Some(text.to_string());
    }

    /// Forget the last printed status so the next `status` call prints
    pub fn forget_status(&self) {
        lock(&self.state).last_status = None;
    }

    /// Print `→ <text>`
    pub fn action(&self, text: &str) {
        let mut state = lock(&self.state);
        let line = format!("{} {text}", paint(state.styled, "→", Tone::Accent));
        state.durable(&line);
    }

    /// Print `✓ <text>`
    pub fn success(&self, text: &str) {
        let mut state = lock(&self.state);
        let line = format!("{} {text}", paint(state.styled, "✓", Tone::Success));
        state.durable(&line);
    }

    /// Print `✗ <text>`
    pub fn error(&self, text: &str) {
        let mut state = lock(&self.state);
        let line = format!("{} {text}", paint(state.styled, "✗", Tone::Error));
        state.durable(&line);
    }

    /// Whether a waiting animation is active
    pub fn is_animating(&self) -> bool {
        lock(&self.state).animating
    }

    /// The waiting line currently on screen, if any
    pub fn current_frame(&self) -> Option<String> {
        let state = lock(&self.state);
        (!state.current_line.is_empty()).then(|| state.current_line.clone())
    }

    /// Start the waiting animation
    ///
    /// Renders `<dots> <label> (<elapsed>) [| <stats>]` every tick. If an
    /// animation is already running this is a no-op: the running session
    /// keeps its label, provider and start time.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_wait(&self, label: &str, stats: Option<Arc<dyn StatsProvider>>) {
        let mut state = lock(&self.state);
        if state.animating {
            debug!(label, "wait already active, keeping current session");
            return;
        }

        state.animating = true;
        state.dots = 0;
        state.session_started = Instant::now();
        state.current_line.clear();

        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(animate(
            Arc::clone(&self.state),
            label.to_string(),
            stats,
            stop_rx,
            self.tick,
        ));
        state.session = Some(Session { stop, task });
    }

    /// Stop the waiting animation and erase its line
    ///
    /// Waits for the background task to exit before returning. Calling it
    /// while idle does nothing.
    pub async fn stop_wait(&self) {
        let session = {
            let mut state = lock(&self.state);
            if !state.animating {
                return;
            }
            // Frames are only written while `animating` holds under this
            // lock, so clearing it here ends output from the task.
            state.animating = false;
            state.erase_line();
            state.session.take()
        };

        if let Some(session) = session {
            let _ = session.stop.send(());
            if let Err(e) = session.task.await {
                debug!("animation task ended abnormally: {e}");
            }
        }
    }

    /// Time since the reporter was created
    pub fn total_time(&self) -> String {
        format_duration(self.started.elapsed())
    }
}

async fn animate(
    state: Arc<Mutex<State>>,
    label: String,
    stats: Option<Arc<dyn StatsProvider>>,
    mut stop: oneshot::Receiver<()>,
    tick: Duration,
) {
    let mut ticker = time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => return,
            _ = ticker.tick() => {}
        }

        let stats = match &stats {
            Some(provider) => tokio::select! {
                biased;
                _ = &mut stop => return,
                text = provider.stats() => text,
            },
            None => None,
        };

        let mut state = lock(&state);
        if !state.animating {
            return;
        }
        state.render_frame(&label, stats.as_deref());
    }
}
