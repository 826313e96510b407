//! Session lifecycle and the per-frame update

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::net::transport::{NetEvent, NetEventReceiver, Outbound, TransportError};
use crate::util::time::FrameClock;
use crate::util::token;
use crate::world::types::{Identity, RawIntent};
use crate::world::{CameraFollow, World};

use super::bridge::ReplicationBridge;
use super::input::{InputSampler, InputTransmitter, TransmitState};
use super::signals::{self, SessionSignal, SignalReceiver, SignalSender};

/// State that exists only while connected
struct Session {
    bridge: ReplicationBridge,
    world: World,
}

/// Owns the connection's replicated state and drives one frame at a time.
///
/// Network events queue up on `events` and are applied at the start of
/// `frame`, before anything reads the world for that frame.
pub struct SessionCoordinator<O: Outbound> {
    config: Arc<Config>,
    outbound: O,
    events: NetEventReceiver,
    session: Option<Session>,
    sampler: InputSampler,
    transmitter: InputTransmitter,
    camera: CameraFollow,
    frame_clock: FrameClock,
    signals: SignalSender,
    transport_closed: bool,
}

impl<O: Outbound> SessionCoordinator<O> {
    pub fn new(config: Arc<Config>, outbound: O, events: NetEventReceiver) -> Self {
        let mut sampler = InputSampler::new();
        if let Some(intent) = config.test_input {
            sampler.enable_override(intent);
        }

        Self {
            transmitter: InputTransmitter::new(config.send_rate),
            camera: CameraFollow::new(config.camera_follow_speed),
            config,
            outbound,
            events,
            session: None,
            sampler,
            frame_clock: FrameClock::new(),
            signals: signals::channel(),
            transport_closed: false,
        }
    }

    /// Receive spawn, elimination and connection signals
    pub fn subscribe(&self) -> SignalReceiver {
        self.signals.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// True once the transport has gone away for good
    pub fn is_finished(&self) -> bool {
        self.transport_closed && self.session.is_none()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.as_ref().map(|s| s.bridge.identity())
    }

    /// Read-only view of the replicated world
    pub fn world(&self) -> Option<&World> {
        self.session.as_ref().map(|s| &s.world)
    }

    pub fn input_mut(&mut self) -> &mut InputSampler {
        &mut self.sampler
    }

    pub fn transmit_state(&self) -> TransmitState {
        self.transmitter.state()
    }

    pub fn camera(&self) -> &CameraFollow {
        &self.camera
    }

    /// Run one frame: apply queued replication, advance views, sample and
    /// maybe transmit input, then move the camera.
    pub fn frame(&mut self, intent: RawIntent, now: Instant) {
        self.drain_events();

        let dt = self.frame_clock.tick(now);
        if let Some(session) = self.session.as_mut() {
            session.world.registry.interpolate_all(dt);
        }

        self.sampler.sample(intent);
        let owned = self.owned_entity_count();
        self.transmitter.update_state(owned);
        if let Some(input) = self.transmitter.poll(now, &mut self.sampler) {
            self.outbound
                .update_player_input(input.horizontal, input.jump_pressed);
        }

        let target = self.center_of_mass();
        self.camera.update(target, dt);
    }

    /// Apply every queued network event. Returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.transport_closed {
                        self.transport_closed = true;
                        if self.session.is_some() {
                            self.teardown(None);
                        }
                    }
                    break;
                }
            }
        }
        applied
    }

    /// Close the connection and drop all replicated state
    pub fn disconnect(&mut self) {
        self.outbound.disconnect();
        if self.session.is_some() {
            self.teardown(None);
        }
    }

    fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected { identity, token } => self.on_connected(identity, &token),
            NetEvent::SubscriptionApplied => {
                let entities = self
                    .world()
                    .map(|w| w.cache().entity_count())
                    .unwrap_or(0);
                info!(entities, "Subscription applied");
                signals::emit(&self.signals, SessionSignal::SubscriptionApplied);
                self.outbound.enter_game(&self.config.player_name);
            }
            NetEvent::Transaction(events) => match self.session.as_mut() {
                Some(session) => {
                    session.bridge.apply_transaction(&mut session.world, events);
                }
                None => {
                    debug!(events = events.len(), "Transaction before identity, dropped");
                }
            },
            NetEvent::Disconnected { error } => {
                self.transport_closed = true;
                self.teardown(error);
            }
        }
    }

    fn on_connected(&mut self, identity: Identity, token: &str) {
        if self.session.is_some() {
            warn!("Identity received on a live session, resetting state");
            self.teardown(None);
        }
        info!(identity = %identity, "Connected");

        if let Some(path) = &self.config.token_path {
            if let Err(e) = token::save(path, token) {
                warn!(error = %e, "Failed to persist auth token");
            }
        }

        self.session = Some(Session {
            bridge: ReplicationBridge::new(identity, self.signals.clone()),
            world: World::new(),
        });
        signals::emit(&self.signals, SessionSignal::Connected { identity });
        self.outbound.subscribe_all();
    }

    /// All-or-nothing: every view, ownership set and the local binding go.
    fn teardown(&mut self, error: Option<TransportError>) {
        match &error {
            Some(e) => error!(error = %e, "Disconnected with error"),
            None => info!("Disconnected"),
        }

        if let Some(mut session) = self.session.take() {
            session.world.clear();
        }
        self.transmitter.update_state(0);
        self.sampler.clear_press();
        signals::emit(
            &self.signals,
            SessionSignal::Disconnected {
                error: error.map(|e| e.to_string()),
            },
        );
    }

    /// Entities the local player owns (0 when unbound)
    pub fn owned_entity_count(&self) -> usize {
        self.world()
            .and_then(|w| w.players().local_ownership())
            .map_or(0, |set| set.len())
    }

    pub fn total_mass(&self) -> Option<u32> {
        self.world().and_then(World::total_mass)
    }

    pub fn center_of_mass(&self) -> Option<Vec2> {
        self.world().and_then(World::center_of_mass)
    }

    /// Display name of the local player
    pub fn local_username(&self) -> Option<&str> {
        let world = self.world()?;
        let local = world.players().local_player()?;
        world
            .cache()
            .player(local.player_id)
            .map(|row| row.name.as_str())
    }

    /// HUD mass readout
    pub fn hud_label(&self) -> Option<String> {
        self.total_mass().map(|mass| format!("Total Mass: {mass}"))
    }
}
