// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Button state machine.
//!
//! The machine holds exactly one [`ButtonState`]. Every write goes through
//! [`ButtonStateMachine::transition`], which computes the animation
//! [`Effect`]s of the change and hands the resulting [`Transition`] to every
//! listener before returning.
//!
//! ```text
//!            tap            Running/Pending        Succeeded/Failed
//!   Idle ─────────▶ Clicked ───────────────▶ InProgress ───────────▶ Completed
//!                     ▲                                                 │
//!                     └──────────────────────── tap ────────────────────┘
//! ```

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Visual state of the download button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ButtonState {
    /// Nothing started yet
    #[default]
    Idle,
    /// Tap accepted, waiting for the first status poll
    Clicked,
    /// Transfer queued or running; the animation plays
    InProgress,
    /// Last transfer reached a terminal status
    Completed,
}

impl ButtonState {
    /// Returns true if a user tap may start a new download from this state.
    pub fn accepts_tap(&self) -> bool {
        matches!(self, ButtonState::Idle | ButtonState::Completed)
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonState::Idle => write!(f, "idle"),
            ButtonState::Clicked => write!(f, "clicked"),
            ButtonState::InProgress => write!(f, "in-progress"),
            ButtonState::Completed => write!(f, "completed"),
        }
    }
}

/// Side effect the owner of the animation clock must apply together with the
/// state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartClock,
    StopClock,
}

/// Effects of moving from `from` to `to`.
pub fn effects_for(from: ButtonState, to: ButtonState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if from == ButtonState::InProgress && to != ButtonState::InProgress {
        effects.push(Effect::StopClock);
    }
    if to == ButtonState::InProgress && from != ButtonState::InProgress {
        effects.push(Effect::StartClock);
    }
    effects
}

/// One applied state change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: ButtonState,
    pub to: ButtonState,
    pub effects: Vec<Effect>,
    /// When the change was applied; the clock origin for `StartClock`
    pub at: Instant,
}

/// A tap arrived while the button is non-interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapRejected {
    pub state: ButtonState,
}

impl fmt::Display for TapRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tap ignored while button is {}", self.state)
    }
}

impl std::error::Error for TapRejected {}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Transition)>;

/// Four-state machine shared by the download monitor (writer) and the
/// renderer (reader).
pub struct ButtonStateMachine {
    current: ButtonState,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Default for ButtonStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ButtonStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonStateMachine")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ButtonStateMachine {
    pub fn new() -> Self {
        Self {
            current: ButtonState::Idle,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// The present state.
    pub fn current(&self) -> ButtonState {
        self.current
    }

    /// Register a listener. Listeners run synchronously, in registration
    /// order, inside every effective transition.
    pub fn subscribe(&mut self, listener: impl FnMut(&Transition) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Move to `new_state`, stamped with the current time.
    pub fn transition(&mut self, new_state: ButtonState) -> Option<Transition> {
        self.transition_at(new_state, Instant::now())
    }

    /// Move to `new_state`. Returns `None` without notifying anyone if the
    /// machine is already there.
    pub fn transition_at(&mut self, new_state: ButtonState, at: Instant) -> Option<Transition> {
        if new_state == self.current {
            return None;
        }

        let transition = Transition {
            from: self.current,
            to: new_state,
            effects: effects_for(self.current, new_state),
            at,
        };
        self.current = new_state;
        tracing::debug!(from = %transition.from, to = %transition.to, "Button state changed");

        for (_, listener) in self.listeners.iter_mut() {
            listener(&transition);
        }
        Some(transition)
    }

    /// Guard for user taps: the button is non-interactive while a download is
    /// being started or is running.
    pub fn check_tap(&self) -> Result<(), TapRejected> {
        if self.current.accepts_tap() {
            Ok(())
        } else {
            Err(TapRejected { state: self.current })
        }
    }
}
