use log::warn;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use crate::session::{ChatClient, SendOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Where each surface element was drawn last frame. An element that did not
/// fit is `None` and is neither drawn nor hit-tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceAreas {
    pub messages: Option<Rect>,
    pub thinking: Option<Rect>,
    pub input: Option<Rect>,
    pub send: Option<Rect>,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub client: ChatClient,
    pub endpoint: String,

    // Input state
    pub cursor: usize, // cursor position in the session input, in chars

    // Message list state
    pub scroll: u16,
    pub follow_latest: bool,
    pub chat_height: u16,   // Inner height of the message list
    pub content_lines: u16, // Rendered height of all messages, measured at draw time

    // Pending exchange
    pub pending: Option<JoinHandle<String>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub areas: SurfaceAreas,
}

impl App {
    pub fn new(client: ChatClient, endpoint: String) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            client,
            endpoint,
            cursor: 0,
            scroll: 0,
            follow_latest: true,
            chat_height: 0,
            content_lines: 0,
            pending: None,
            animation_frame: 0,
            areas: SurfaceAreas::default(),
        }
    }

    pub fn input(&self) -> &str {
        &self.client.session().input
    }

    pub fn controls_enabled(&self) -> bool {
        self.client.state().controls_enabled()
    }

    /// Send the input buffer, spawning the exchange in the background.
    pub fn submit(&mut self) -> SendOutcome {
        match self.client.prepare(None) {
            Ok(exchange) => {
                self.cursor = 0;
                self.follow_latest = true;
                self.pending = Some(tokio::spawn(exchange.run()));
                SendOutcome::Sent
            }
            Err(outcome) => outcome,
        }
    }

    /// Collect the pending exchange if it has finished.
    pub async fn poll_pending(&mut self) {
        if !self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        let Some(task) = self.pending.take() else {
            return;
        };

        let reply = match task.await {
            Ok(text) => text,
            Err(e) => {
                warn!("Exchange task ended abnormally: {}", e);
                e.to_string()
            }
        };
        self.client.finish(reply);

        // Input regains focus once idle again
        self.input_mode = InputMode::Editing;
        self.follow_latest = true;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.client.state().is_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Recompute the scroll offset once the message list has been measured.
    pub fn update_scroll(&mut self, content_lines: u16, visible_height: u16) {
        self.content_lines = content_lines;
        self.chat_height = visible_height;
        let max_scroll = self.max_scroll();
        if self.follow_latest {
            self.scroll = max_scroll;
        } else {
            self.scroll = self.scroll.min(max_scroll);
        }
    }

    fn max_scroll(&self) -> u16 {
        self.content_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_latest = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
        self.follow_latest = self.scroll >= max_scroll;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow_latest = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_latest = true;
        self.scroll = self.max_scroll();
    }

    pub fn clicked_send(&self, column: u16, row: u16) -> bool {
        self.areas.send.is_some_and(|area| contains(area, column, row))
    }

    pub fn clicked_input(&self, column: u16, row: u16) -> bool {
        self.areas.input.is_some_and(|area| contains(area, column, row))
    }

    pub fn over_messages(&self, column: u16, row: u16) -> bool {
        self.areas.messages.is_some_and(|area| contains(area, column, row))
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
