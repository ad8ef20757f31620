//! TUI runtime: owns the terminal and the provider, runs the event loop and
//! executes effects.
//!
//! The reducer in [`crate::update`] only touches state. Everything with a
//! side effect (starting an exchange, talking to the provider) happens here.

use std::time::Duration;

use anyhow::Result;
use crossterm::event;
use tern_core::exchange::{Exchange, ExchangePoll};
use tern_core::providers::ChatProvider;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::TerminalSession;
use crate::{render, update};

/// Poll interval while a response is streaming (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

pub struct TuiRuntime {
    pub state: AppState,
    provider: Box<dyn ChatProvider>,
    exchange: Option<Exchange>,
}

impl TuiRuntime {
    pub fn new(state: AppState, provider: Box<dyn ChatProvider>) -> Self {
        Self {
            state,
            provider,
            exchange: None,
        }
    }

    /// Submits `prompt` before the first frame.
    pub fn submit(&mut self, prompt: String) {
        let effects = update::submit(&mut self.state, prompt);
        self.execute_effects(effects);
    }

    /// Runs until the user quits. Must be called inside a tokio runtime.
    pub fn run(&mut self) -> Result<()> {
        let mut session = TerminalSession::start()?;
        tracing::info!(model = %self.state.model_id, "interactive session started");

        while !self.state.should_quit {
            for event in self.collect_events()? {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }
            session
                .terminal()
                .draw(|frame| render::render(&mut self.state, frame))?;
        }

        tracing::info!(
            entries = self.state.transcript.entry_count(),
            "interactive session ended"
        );
        Ok(())
    }

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();
        let timeout = if self.exchange.is_some() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        if event::poll(timeout)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if let Some(exchange) = self.exchange.as_mut() {
            loop {
                match exchange.try_next() {
                    ExchangePoll::Chunk(chunk) => events.push(UiEvent::Chunk(chunk)),
                    ExchangePoll::Pending => break,
                    ExchangePoll::Closed => {
                        events.push(UiEvent::StreamClosed);
                        self.exchange = None;
                        break;
                    }
                }
            }
        }

        events.push(UiEvent::Tick);
        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::StartExchange { prompt } => {
                tracing::info!(
                    model = %self.provider.model_id(),
                    prompt_bytes = prompt.len(),
                    "starting exchange"
                );
                let request = self.provider.stream_completion(&prompt);
                self.exchange = Some(Exchange::start(request));
            }
            UiEffect::FinishExchange { response } => self.provider.finish_exchange(&response),
            UiEffect::ClearHistory => self.provider.clear_history(),
        }
    }
}
