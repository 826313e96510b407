use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use glam::Vec2;
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use uuid::Uuid;

use maple_client::net::protocol::{ClientMsg, RowChange, RowEvent};
use maple_client::net::transport::{NetEvent, NetEventSender, Outbound};
use maple_client::session::{SessionSignal, SignalReceiver, TransmitState};
use maple_client::world::types::{
    EntityId, EntityRow, Identity, MovementControllerRow, PlayerId, PlayerRow, RawIntent,
};
use maple_client::{Config, SessionCoordinator};

const FRAME: Duration = Duration::from_nanos(16_666_666);

#[derive(Clone, Default)]
struct RecordingOutbound {
    sent: Arc<Mutex<Vec<ClientMsg>>>,
    disconnects: Arc<Mutex<usize>>,
}

impl RecordingOutbound {
    fn sent(&self) -> Vec<ClientMsg> {
        self.sent.lock().unwrap().clone()
    }

    fn inputs(&self) -> Vec<(f32, bool)> {
        self.sent()
            .into_iter()
            .filter_map(|msg| match msg {
                ClientMsg::UpdatePlayerInput { horizontal, jump } => Some((horizontal, jump)),
                _ => None,
            })
            .collect()
    }
}

impl Outbound for RecordingOutbound {
    fn send(&self, msg: ClientMsg) {
        self.sent.lock().unwrap().push(msg);
    }

    fn disconnect(&self) {
        *self.disconnects.lock().unwrap() += 1;
    }
}

struct Harness {
    coordinator: SessionCoordinator<RecordingOutbound>,
    outbound: RecordingOutbound,
    tx: NetEventSender,
    signals: SignalReceiver,
    identity: Identity,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        let config = Config {
            token_path: None,
            player_name: "Tester".to_string(),
            ..Config::default()
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let outbound = RecordingOutbound::default();
        let coordinator = SessionCoordinator::new(Arc::new(config), outbound.clone(), rx);
        let signals = coordinator.subscribe();
        Self {
            coordinator,
            outbound,
            tx,
            signals,
            identity: Identity(Uuid::new_v4()),
            now: Instant::now(),
        }
    }

    fn push(&self, event: NetEvent) {
        assert_ok!(self.tx.send(event));
    }

    fn transaction(&self, events: Vec<RowEvent>) {
        self.push(NetEvent::Transaction(events));
    }

    fn frame(&mut self, intent: RawIntent) {
        self.coordinator.frame(intent, self.now);
        self.now += FRAME;
    }

    fn idle_frame(&mut self) {
        self.frame(RawIntent::default());
    }

    fn signals(&mut self) -> Vec<SessionSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = self.signals.try_recv() {
            out.push(signal);
        }
        out
    }

    /// Connect and bind the local player as player 1
    fn connect_local(&mut self) {
        self.push(NetEvent::Connected {
            identity: self.identity,
            token: "token".to_string(),
        });
        self.transaction(vec![player_inserted(1, self.identity, "Tester")]);
        self.push(NetEvent::SubscriptionApplied);
        self.idle_frame();
    }
}

fn player_inserted(id: u32, identity: Identity, name: &str) -> RowEvent {
    RowEvent::Player(RowChange::Inserted {
        row: PlayerRow {
            identity,
            player_id: PlayerId(id),
            name: name.to_string(),
        },
    })
}

fn spawn(entity: u32, player: u32, position: Vec2, mass: u32) -> Vec<RowEvent> {
    vec![
        RowEvent::Entity(RowChange::Inserted {
            row: EntityRow {
                entity_id: EntityId(entity),
                position,
                mass,
            },
        }),
        RowEvent::MovementController(RowChange::Inserted {
            row: MovementControllerRow {
                entity_id: EntityId(entity),
                player_id: PlayerId(player),
                move_speed: 5.0,
                jump_force: 10.0,
                can_jump: true,
            },
        }),
    ]
}

fn deleted(entity: u32) -> RowEvent {
    RowEvent::Entity(RowChange::Deleted {
        row: EntityRow {
            entity_id: EntityId(entity),
            position: Vec2::ZERO,
            mass: 0,
        },
    })
}

#[test]
fn connect_subscribes_then_enters_game() {
    let mut h = Harness::new();
    assert!(!h.coordinator.is_connected());

    h.connect_local();

    assert!(h.coordinator.is_connected());
    assert_eq!(h.coordinator.identity(), Some(h.identity));
    assert_eq!(
        h.outbound.sent(),
        vec![
            ClientMsg::subscribe_all(),
            ClientMsg::EnterGame {
                name: "Tester".to_string()
            },
        ]
    );
    assert_eq!(h.coordinator.local_username(), Some("Tester"));
    let signals = h.signals();
    assert_eq!(
        signals,
        vec![
            SessionSignal::Connected {
                identity: h.identity
            },
            SessionSignal::SubscriptionApplied,
        ]
    );
}

#[test]
fn events_apply_only_when_the_frame_drains_them() {
    let mut h = Harness::new();
    h.connect_local();

    h.transaction(spawn(10, 1, Vec2::ZERO, 15));
    assert_eq!(h.coordinator.owned_entity_count(), 0);

    h.idle_frame();
    assert_eq!(h.coordinator.owned_entity_count(), 1);
}

#[test]
fn aggregates_follow_local_entities() {
    let mut h = Harness::new();
    h.connect_local();

    let mut events = spawn(10, 1, Vec2::new(0.0, 0.0), 3);
    events.extend(spawn(11, 1, Vec2::new(10.0, 0.0), 5));
    events.extend(spawn(12, 1, Vec2::new(0.0, 10.0), 2));
    h.transaction(events);
    h.idle_frame();

    assert_eq!(h.coordinator.total_mass(), Some(10));
    assert_eq!(h.coordinator.hud_label().as_deref(), Some("Total Mass: 10"));
    let center = h.coordinator.center_of_mass().unwrap();
    assert_relative_eq!(center.x, 5.0, epsilon = 1e-4);
    assert_relative_eq!(center.y, 2.0, epsilon = 1e-4);

    for _ in 0..600 {
        h.idle_frame();
    }
    let camera = h.coordinator.camera().position;
    assert_relative_eq!(camera.x, 5.0, epsilon = 1e-2);
    assert_relative_eq!(camera.y, 3.0, epsilon = 1e-2);
}

#[test]
fn remote_entities_do_not_count_toward_local_aggregates() {
    let mut h = Harness::new();
    h.connect_local();

    let mut events = vec![player_inserted(2, Identity(Uuid::new_v4()), "Other")];
    events.extend(spawn(20, 2, Vec2::new(100.0, 0.0), 50));
    events.extend(spawn(10, 1, Vec2::new(1.0, 1.0), 4));
    h.transaction(events);
    h.idle_frame();

    let world = h.coordinator.world().unwrap();
    assert_eq!(world.registry().len(), 2);
    assert_eq!(h.coordinator.total_mass(), Some(4));
    let spawned: Vec<_> = h
        .signals()
        .into_iter()
        .filter(|s| matches!(s, SessionSignal::Spawned { .. }))
        .collect();
    assert_eq!(
        spawned,
        vec![SessionSignal::Spawned {
            entity_id: EntityId(10)
        }]
    );
}

#[test]
fn input_is_sent_at_cadence_only_while_owning_entities() {
    let mut h = Harness::new();
    h.connect_local();

    for _ in 0..30 {
        h.frame(RawIntent {
            horizontal: 1.0,
            jump_held: false,
        });
    }
    assert!(h.outbound.inputs().is_empty());
    assert_eq!(h.coordinator.transmit_state(), TransmitState::Idle);

    h.transaction(spawn(10, 1, Vec2::ZERO, 15));
    for _ in 0..60 {
        h.frame(RawIntent {
            horizontal: -0.25,
            jump_held: false,
        });
    }
    assert_eq!(h.coordinator.transmit_state(), TransmitState::Active);
    let inputs = h.outbound.inputs();
    assert!((19..=21).contains(&inputs.len()), "sent {}", inputs.len());
    assert!(inputs.iter().all(|(horizontal, _)| *horizontal == -0.25));

    h.transaction(vec![deleted(10)]);
    h.idle_frame();
    let before = h.outbound.inputs().len();
    for _ in 0..30 {
        h.idle_frame();
    }
    assert_eq!(h.outbound.inputs().len(), before);
    assert_eq!(h.coordinator.transmit_state(), TransmitState::Idle);
}

#[test]
fn held_jump_is_sent_as_a_single_press() {
    let mut h = Harness::new();
    h.connect_local();
    h.transaction(spawn(10, 1, Vec2::ZERO, 15));

    for _ in 0..30 {
        h.frame(RawIntent {
            horizontal: 0.0,
            jump_held: true,
        });
    }
    let jumps: Vec<bool> = h.outbound.inputs().into_iter().map(|(_, jump)| jump).collect();
    assert!(jumps.len() > 2);
    assert!(jumps[0]);
    assert!(jumps[1..].iter().all(|jump| !jump));
}

#[test]
fn jump_tapped_while_idle_is_not_sent_after_spawn() {
    let mut h = Harness::new();
    h.connect_local();

    h.frame(RawIntent {
        horizontal: 0.0,
        jump_held: true,
    });
    for _ in 0..300 {
        h.idle_frame();
    }

    h.transaction(spawn(10, 1, Vec2::ZERO, 15));
    h.idle_frame();

    assert_eq!(h.outbound.inputs(), vec![(0.0, false)]);
}

#[test]
fn losing_the_last_entity_signals_elimination_once() {
    let mut h = Harness::new();
    h.connect_local();
    let mut events = spawn(10, 1, Vec2::ZERO, 5);
    events.extend(spawn(11, 1, Vec2::ONE, 5));
    h.transaction(events);
    h.idle_frame();
    h.signals();

    h.transaction(vec![deleted(10), deleted(11), deleted(11)]);
    h.idle_frame();

    let eliminated = h
        .signals()
        .into_iter()
        .filter(|s| *s == SessionSignal::Eliminated)
        .count();
    assert_eq!(eliminated, 1);
    assert_eq!(h.coordinator.total_mass(), Some(0));
    assert!(h.coordinator.center_of_mass().is_none());
}

#[test]
fn disconnect_tears_down_all_state() {
    let mut h = Harness::new();
    h.connect_local();
    h.transaction(spawn(10, 1, Vec2::ZERO, 15));
    h.idle_frame();
    h.signals();

    h.push(NetEvent::Disconnected { error: None });
    h.idle_frame();

    assert!(!h.coordinator.is_connected());
    assert!(h.coordinator.world().is_none());
    assert_eq!(h.coordinator.owned_entity_count(), 0);
    assert!(h.coordinator.total_mass().is_none());
    assert!(h.coordinator.local_username().is_none());
    assert_eq!(h.coordinator.transmit_state(), TransmitState::Idle);
    assert!(h.coordinator.is_finished());
    assert_eq!(
        h.signals(),
        vec![SessionSignal::Disconnected { error: None }]
    );
}

#[test]
fn local_disconnect_closes_transport() {
    let mut h = Harness::new();
    h.connect_local();

    h.coordinator.disconnect();

    assert_eq!(*h.outbound.disconnects.lock().unwrap(), 1);
    assert!(!h.coordinator.is_connected());
}

#[test]
fn transactions_before_identity_are_dropped() {
    let mut h = Harness::new();
    h.transaction(spawn(10, 1, Vec2::ZERO, 15));
    h.idle_frame();
    assert!(h.coordinator.world().is_none());

    h.connect_local();
    assert!(h.coordinator.world().unwrap().registry().is_empty());
}

#[test]
fn dropped_transport_ends_the_session() {
    let mut h = Harness::new();
    h.connect_local();

    // Dropping the only sender closes the event channel
    let (replacement, _) = mpsc::unbounded_channel();
    h.tx = replacement;
    h.idle_frame();

    assert!(h.coordinator.is_finished());
    assert!(!h.coordinator.is_connected());
}
