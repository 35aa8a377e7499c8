//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize, frame tick)
//! - Boot phase: a [`BootSequencePlayer`] owns the screen until it hands off
//! - Log phase: a [`LiveLogCoordinator`] fills the log from the server
//!
//! All mutation happens in `monitor-core`; each frame the App snapshots the
//! shared surfaces and draws them.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use monitor_core::{
    boot_script, BootScreen, BootSequencePlayer, HttpFeed, LinkStatus, LiveLogCoordinator,
    LogSurface, MonitorConfig, PlaybackState, SkipTriggers,
};

use crate::audio::ProcessAudio;
use crate::theme;
use crate::widgets::{BootView, LogView, LogViewState};

/// Redraw interval
const FRAME: Duration = Duration::from_millis(33);

/// Boot cursor blink half-period
const BLINK: Duration = Duration::from_millis(500);

/// Which surface owns the screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The boot console
    Boot,
    /// Header, work log, status line
    Log,
}

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Current phase
    phase: Phase,
    /// Resolved configuration
    config: MonitorConfig,

    // === Boot ===
    /// Boot console contents
    boot_screen: BootScreen,
    /// Skip sources while the boot sequence runs
    skip: Option<SkipTriggers>,
    /// Boot player task
    boot_task: Option<JoinHandle<PlaybackState>>,
    /// Last drawn boot area (pointer skips only count inside it)
    boot_area: Rect,

    // === Log ===
    /// Work log contents
    log_surface: LogSurface,
    /// Scroll state for the log view
    log_state: LogViewState,
    /// Live link state from the coordinator
    link: Option<watch::Receiver<LinkStatus>>,
    /// Coordinator task
    log_task: Option<JoinHandle<()>>,

    // === Misc ===
    /// Frames drawn (drives the cursor blink)
    frames: u64,
}

impl App {
    /// Create an App for `config`; nothing runs until [`App::run`]
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        let phase = if config.boot_enabled {
            Phase::Boot
        } else {
            Phase::Log
        };
        Self {
            running: true,
            phase,
            config,
            boot_screen: BootScreen::new(),
            skip: None,
            boot_task: None,
            boot_area: Rect::default(),
            log_surface: LogSurface::new(),
            log_state: LogViewState::default(),
            link: None,
            log_task: None,
            frames: 0,
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the event loop should keep going
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The work log surface
    #[must_use]
    pub fn log_surface(&self) -> &LogSurface {
        &self.log_surface
    }

    /// The boot console surface
    #[must_use]
    pub fn boot_screen(&self) -> &BootScreen {
        &self.boot_screen
    }

    /// Main event loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        match self.phase {
            Phase::Boot => self.start_boot(),
            Phase::Log => self.start_log()?,
        }
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events first so skips and quits stay responsive
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(&event),
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                    }
                }

                _ = tokio::time::sleep(FRAME) => {}
            }

            self.update()?;
            terminal.draw(|frame| self.draw(frame))?;
        }

        self.shutdown();
        Ok(())
    }

    /// Spawn the boot player and attach the skip listeners
    fn start_boot(&mut self) {
        let audio = ProcessAudio::new(
            self.config.audio_player.clone(),
            self.config.audio_path.clone(),
            self.config.audio_volume,
        );
        let player = Arc::new(BootSequencePlayer::new(
            self.config.boot.clone(),
            boot_script(),
            self.boot_screen.clone(),
            audio,
        ));

        self.skip = Some(SkipTriggers::new(
            player.skip_handle(),
            self.config.boot.skip_listener_window,
        ));
        self.boot_task = Some(tokio::spawn(async move { player.run().await }));
        tracing::info!("Boot phase started");
    }

    /// Connect the coordinator and switch to the log
    fn start_log(&mut self) -> anyhow::Result<()> {
        let feed = HttpFeed::new(&self.config.base_url, self.config.connect_timeout)?
            .with_reconnect(self.config.reconnect_attempts, self.config.reconnect_delay);
        let coordinator =
            LiveLogCoordinator::new(self.config.log_config(), self.log_surface.clone());
        self.link = Some(coordinator.status());

        self.log_task = Some(tokio::spawn(async move {
            coordinator.run(&feed, &feed).await;
            // Keep revealing whatever is still queued
            coordinator.queue().wait_idle().await;
        }));

        self.phase = Phase::Log;
        tracing::info!(
            server = %self.config.base_url,
            user = ?self.config.user,
            "Log phase started"
        );
        Ok(())
    }

    /// Per-frame bookkeeping
    fn update(&mut self) -> anyhow::Result<()> {
        self.frames = self.frames.wrapping_add(1);

        if let Some(skip) = &mut self.skip {
            if tokio::time::Instant::now() >= skip.key_deadline() {
                skip.expire();
            }
        }

        if self.phase == Phase::Boot && self.boot_screen.is_dismissed() {
            self.skip = None;
            self.boot_task = None;
            self.start_log()?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.boot_task.take() {
            task.abort();
        }
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        tracing::info!("Monitor shut down");
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Apply one terminal event
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        match self.phase {
            Phase::Boot => {
                if let Some(skip) = &mut self.skip {
                    skip.key();
                }
            }
            Phase::Log => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Up => self.log_state.scroll(-1),
                KeyCode::Down => self.log_state.scroll(1),
                KeyCode::PageUp => self.log_state.page_up(),
                KeyCode::PageDown => self.log_state.page_down(),
                KeyCode::Home => self.log_state.scroll_to_top(),
                _ => {}
            },
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match (self.phase, mouse.kind) {
            (Phase::Boot, MouseEventKind::Down(MouseButton::Left)) => {
                let inside = self.boot_area.contains((mouse.column, mouse.row).into());
                match &self.skip {
                    Some(skip) if inside => {
                        skip.pointer();
                    }
                    _ => {}
                }
            }
            (Phase::Log, MouseEventKind::ScrollUp) => self.log_state.scroll(-3),
            (Phase::Log, MouseEventKind::ScrollDown) => self.log_state.scroll(3),
            _ => {}
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw the current phase
    pub fn draw(&mut self, frame: &mut Frame) {
        match self.phase {
            Phase::Boot => self.draw_boot(frame),
            Phase::Log => self.draw_log(frame),
        }
    }

    fn draw_boot(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.boot_area = area;

        let blink = u64::try_from(BLINK.as_millis() / FRAME.as_millis()).unwrap_or(1).max(1);
        let cursor_on = (self.frames / blink) % 2 == 0;
        let snapshot = self.boot_screen.snapshot();
        frame.render_widget(BootView::new(&snapshot).cursor_on(cursor_on), area);
    }

    fn draw_log(&mut self, frame: &mut Frame) {
        let [header, body, status] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(self.header_text()).style(theme::header_style()),
            header,
        );

        let nodes = self.log_surface.snapshot();
        frame.render_stateful_widget(LogView::new(&nodes), body, &mut self.log_state);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw(self.link_text()),
                Span::raw(format!("  {} entries  ", nodes.len())),
                Span::raw("q quit  ↑↓ scroll"),
            ]))
            .style(theme::status_style()),
            status,
        );
    }

    /// Header line, naming the monitored user when scoped
    #[must_use]
    pub fn header_text(&self) -> String {
        match &self.config.user {
            Some(user) => format!("[ HAL ] Monitoring Protocol: {user}"),
            None => "[ HAL ] Activity Monitor".to_string(),
        }
    }

    fn link_text(&self) -> &'static str {
        let status = self
            .link
            .as_ref()
            .map_or(LinkStatus::Idle, |link| *link.borrow());
        match status {
            LinkStatus::Idle | LinkStatus::Connecting => "○ connecting",
            LinkStatus::Live => "● live",
            LinkStatus::Disconnected => "◌ reconnecting",
            LinkStatus::Closed => "✕ offline",
        }
    }
}
