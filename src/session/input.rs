//! Per-frame input sampling and fixed-cadence transmission

use std::time::Instant;

use tracing::debug;

use crate::util::time::Cadence;
use crate::world::types::RawIntent;

/// Intent as packaged for one transmission
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub horizontal: f32,
    pub jump_held: bool,
    /// Jump went down since the previous transmission
    pub jump_pressed: bool,
}

/// Records the latest intent every frame. Keeps no history: the newest
/// sample wins.
#[derive(Debug, Default)]
pub struct InputSampler {
    horizontal: f32,
    jump_held: bool,
    jump_pressed: bool,
    override_intent: Option<RawIntent>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's device intent
    pub fn sample(&mut self, intent: RawIntent) {
        let intent = self.override_intent.unwrap_or(intent);
        let was_held = self.jump_held;

        self.horizontal = intent.horizontal.clamp(-1.0, 1.0);
        self.jump_held = intent.jump_held;
        if intent.jump_held && !was_held {
            self.jump_pressed = true;
        }
    }

    /// Replace device intent with a fixed one
    pub fn enable_override(&mut self, intent: RawIntent) {
        self.override_intent = Some(intent);
    }

    pub fn disable_override(&mut self) {
        self.override_intent = None;
    }

    pub fn snapshot(&self) -> InputFrame {
        InputFrame {
            horizontal: self.horizontal,
            jump_held: self.jump_held,
            jump_pressed: self.jump_pressed,
        }
    }

    /// Forget a press nobody has transmitted
    pub fn clear_press(&mut self) {
        self.jump_pressed = false;
    }

    /// Take the current frame and clear the press edge
    fn take(&mut self) -> InputFrame {
        let frame = self.snapshot();
        self.jump_pressed = false;
        frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitState {
    /// No owned entities; nothing is sent
    Idle,
    /// At least one owned entity; sending at the cadence
    Active,
}

/// Sends the newest sampled intent at a fixed wall-clock cadence,
/// independent of the frame rate.
#[derive(Debug)]
pub struct InputTransmitter {
    cadence: Cadence,
    state: TransmitState,
}

impl InputTransmitter {
    pub fn new(send_rate: u32) -> Self {
        Self {
            cadence: Cadence::per_second(send_rate),
            state: TransmitState::Idle,
        }
    }

    pub fn state(&self) -> TransmitState {
        self.state
    }

    /// Move between `Idle` and `Active` from the local owned-entity count
    pub fn update_state(&mut self, owned_entities: usize) {
        let next = if owned_entities > 0 {
            TransmitState::Active
        } else {
            TransmitState::Idle
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, owned_entities, "Input transmitter state change");
            self.state = next;
        }
    }

    /// Frame to transmit now, if active and the cadence is due. While idle,
    /// press edges are dropped so none carries over into the next life.
    pub fn poll(&mut self, now: Instant, sampler: &mut InputSampler) -> Option<InputFrame> {
        if self.state == TransmitState::Idle {
            sampler.clear_press();
            return None;
        }
        if !self.cadence.ready(now) {
            return None;
        }
        Some(sampler.take())
    }
}
