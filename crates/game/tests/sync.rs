use std::time::{Duration, Instant};

use glam::Vec3;

use arena::{
    ChannelEnvelope, MemoryHub, MemoryRelay, MergePolicy, MessageOutcome, Payload, PlayerId,
    PlayerState, RelayChannel, RosterEvent, Session, StateMap, SyncConfig, SyncEngine,
};

fn engine(hub: &MemoryHub, channel: &str, id: &str, config: SyncConfig) -> SyncEngine<MemoryRelay> {
    let session = Session::new(channel.into(), id.into());
    SyncEngine::new(hub.join(), session, at(0.0, 0.0), config)
}

fn at(x: f32, z: f32) -> PlayerState {
    PlayerState::new(Vec3::new(x, 0.0, z), 0.0)
}

fn envelope(game: &str, name: &str, states: &[(&str, PlayerState)]) -> String {
    let map: StateMap = states
        .iter()
        .map(|(id, state)| (PlayerId::from(*id), *state))
        .collect();
    ChannelEnvelope::new(&game.into(), &name.into(), &map)
        .unwrap()
        .encode()
        .unwrap()
}

fn decode_payload(line: &str) -> Payload {
    ChannelEnvelope::decode(line).unwrap().payload().unwrap()
}

#[test]
fn test_two_client_handshake() {
    let hub = MemoryHub::new();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let mut b = engine(&hub, "g", "b2", SyncConfig::default());
    let now = Instant::now();

    assert!(a.announce(now));

    // B merges the delta and answers with everything it knows.
    b.pump(now);
    assert!(b.state().contains(&"a1".into()));
    assert_eq!(b.stats().deltas_merged, 1);

    // A drops its own echo, then takes B's snapshot wholesale.
    a.pump(now);
    assert_eq!(a.stats().filtered, 1);
    assert_eq!(a.stats().snapshots_applied, 1);
    assert_eq!(a.state().entries(), b.state().entries());

    let ids: Vec<_> = a.state().ids().map(PlayerId::as_str).collect();
    assert_eq!(ids, vec!["a1", "b2"]);

    let joined: Vec<_> = a.drain_events().collect();
    assert_eq!(
        joined,
        vec![RosterEvent::Joined {
            id: "b2".into(),
            state: at(0.0, 0.0)
        }]
    );
}

#[test]
fn test_delta_triggers_single_full_reply() {
    let hub = MemoryHub::new();
    let mut observer = hub.join();
    let mut b = engine(&hub, "g", "b2", SyncConfig::default());
    let now = Instant::now();

    b.handle_message(&envelope("g", "c3", &[("c3", at(4.0, 0.0))]), now);
    observer.poll().unwrap();

    let outcome = b.handle_message(&envelope("g", "a1", &[("a1", at(1.0, 2.0))]), now);
    assert_eq!(outcome, MessageOutcome::Merged);

    let sent = observer.poll().unwrap();
    assert_eq!(sent.len(), 1);

    let expected: StateMap = [
        (PlayerId::from("a1"), at(1.0, 2.0)),
        (PlayerId::from("b2"), at(0.0, 0.0)),
        (PlayerId::from("c3"), at(4.0, 0.0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(decode_payload(&sent[0]), Payload::Snapshot(expected.clone()));
    assert_eq!(b.state().entries(), &expected);
}

#[test]
fn test_delta_overwrites_existing_key() {
    let hub = MemoryHub::new();
    let mut b = engine(&hub, "g", "b2", SyncConfig::default());
    let now = Instant::now();

    b.handle_message(&envelope("g", "a1", &[("a1", at(1.0, 0.0))]), now);
    b.handle_message(&envelope("g", "a1", &[("a1", at(7.0, 0.0))]), now);

    assert_eq!(b.state().len(), 2);
    assert_eq!(b.state().get(&"a1".into()), Some(&at(7.0, 0.0)));
}

#[test]
fn test_snapshot_replaces_exactly() {
    let hub = MemoryHub::new();
    let mut observer = hub.join();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let now = Instant::now();

    a.handle_message(&envelope("g", "old", &[("old", at(9.0, 9.0))]), now);
    observer.poll().unwrap();

    let snapshot = [("a1", at(0.0, 0.0)), ("b2", at(1.0, 1.0)), ("c3", at(2.0, 2.0))];
    let outcome = a.handle_message(&envelope("g", "b2", &snapshot), now);

    assert_eq!(outcome, MessageOutcome::Replaced);
    let ids: Vec<_> = a.state().ids().map(PlayerId::as_str).collect();
    assert_eq!(ids, vec!["a1", "b2", "c3"]);

    // Snapshots are never answered.
    assert!(observer.poll().unwrap().is_empty());

    let events: Vec<_> = a.drain_events().collect();
    assert!(events.contains(&RosterEvent::Left { id: "old".into() }));
}

#[test]
fn test_self_and_foreign_messages_ignored() {
    let hub = MemoryHub::new();
    let mut observer = hub.join();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let now = Instant::now();
    let before = a.state().entries().clone();

    let own = envelope("g", "a1", &[("a1", at(3.0, 0.0)), ("x", at(1.0, 0.0))]);
    let foreign = envelope("h", "b2", &[("b2", at(1.0, 0.0))]);

    assert_eq!(a.handle_message(&own, now), MessageOutcome::Filtered);
    assert_eq!(a.handle_message(&foreign, now), MessageOutcome::Filtered);
    assert_eq!(a.state().entries(), &before);
    assert_eq!(a.stats().filtered, 2);
    assert!(observer.poll().unwrap().is_empty());
}

#[test]
fn test_malformed_messages_are_counted() {
    let hub = MemoryHub::new();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let now = Instant::now();

    let lines = [
        "not json",
        r#"{"Game":"g","Name":"b2"}"#,
        r#"{"Game":"g","Name":"b2","Message":"[1,2]"}"#,
        r#"{"Game":"g","Name":"b2","Message":"{}"}"#,
        r#"{"Game":"g","Name":"b2","Message":"{\"b2\":{\"position\":1}}"}"#,
    ];
    for line in lines {
        assert_eq!(a.handle_message(line, now), MessageOutcome::Malformed, "{}", line);
    }

    assert_eq!(a.stats().malformed, lines.len() as u64);
    assert_eq!(a.state().len(), 1);
}

#[test]
fn test_knockout_reaches_victim() {
    let hub = MemoryHub::new();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let mut b = engine(&hub, "g", "b2", SyncConfig::default());
    let now = Instant::now();

    a.announce(now);
    b.pump(now);
    a.pump(now);

    assert!(a.edit_entry(&"b2".into(), |state| state.position.y = 50.0));
    a.broadcast_full(now);

    b.pump(now);
    let pose = b.take_override().expect("victim should be teleported");
    assert_eq!(pose.position.y, 50.0);
    assert_eq!(b.last_broadcast().position.y, 50.0);
}

#[test]
fn test_versioned_merge_keeps_newer_entries() {
    let hub = MemoryHub::new();
    let config = SyncConfig {
        policy: MergePolicy::Versioned,
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let now = Instant::now();

    let mut fresh = at(5.0, 0.0);
    fresh.seq = 4;
    a.handle_message(&envelope("g", "b2", &[("b2", fresh)]), now);

    let mut stale = at(1.0, 0.0);
    stale.seq = 2;
    let outcome = a.handle_message(&envelope("g", "b2", &[("b2", stale)]), now);
    assert_eq!(outcome, MessageOutcome::Stale);

    // A snapshot missing c3 and carrying an older b2 changes neither.
    let mut c3 = at(2.0, 0.0);
    c3.seq = 1;
    a.handle_message(&envelope("g", "c3", &[("c3", c3)]), now);
    a.handle_message(&envelope("g", "d4", &[("b2", stale), ("d4", at(3.0, 0.0))]), now);

    assert_eq!(a.state().get(&"b2".into()), Some(&fresh));
    assert!(a.state().contains(&"c3".into()));
    assert!(a.state().contains(&"d4".into()));
    assert!(a.state().contains(&"a1".into()));
}

#[test]
fn test_versioned_broadcasts_bump_sequence() {
    let hub = MemoryHub::new();
    let mut observer = hub.join();
    let config = SyncConfig {
        policy: MergePolicy::Versioned,
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let now = Instant::now();

    a.broadcast_if_drifted(&at(1.0, 0.0), now);
    a.broadcast_if_drifted(&at(2.0, 0.0), now);

    let seqs: Vec<u64> = observer
        .poll()
        .unwrap()
        .iter()
        .map(|line| match decode_payload(line) {
            Payload::Delta(_, state) => state.seq,
            other => panic!("expected delta, got {:?}", other),
        })
        .collect();
    assert_eq!(seqs, vec![1, 2]);
}

#[test]
fn test_reaping_evicts_silent_players() {
    let hub = MemoryHub::new();
    let config = SyncConfig {
        reap_after: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let start = Instant::now();

    a.handle_message(&envelope("g", "b2", &[("b2", at(1.0, 0.0))]), start);
    a.handle_message(&envelope("g", "c3", &[("c3", at(2.0, 0.0))]), start + Duration::from_secs(4));
    a.drain_events().for_each(drop);

    let reaped = a.reap(start + Duration::from_secs(6));
    assert_eq!(reaped, vec![PlayerId::from("b2")]);
    assert!(!a.state().contains(&"b2".into()));
    assert!(a.state().contains(&"c3".into()));

    let events: Vec<_> = a.drain_events().collect();
    assert_eq!(events, vec![RosterEvent::Left { id: "b2".into() }]);
}

#[test]
fn test_reaped_player_stays_gone_while_peers_relay_it() {
    let hub = MemoryHub::new();
    let config = SyncConfig {
        reap_after: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let start = Instant::now();

    // c3 speaks once and then goes silent.
    let mut c3 = hub.join();
    let mut a = engine(&hub, "g", "a1", config.clone());
    c3.send(&envelope("g", "c3", &[("c3", at(9.0, 9.0))])).unwrap();
    a.pump(start);

    // d4 only hears of c3 second-hand, through a1's reply to its announce.
    let mut d = engine(&hub, "g", "d4", config);
    d.announce(start + Duration::from_secs(2));

    let mut present_at = Vec::new();
    let mut joins = 0;
    for sec in 2..=60u64 {
        let now = start + Duration::from_secs(sec);
        let pose = at(sec as f32, 0.0);
        for peer in [&mut a, &mut d] {
            peer.pump(now);
            peer.broadcast_if_drifted(&pose, now);
            peer.housekeeping(&pose, now);
        }

        joins += a
            .drain_events()
            .filter(|event| match event {
                RosterEvent::Joined { id, .. } => id.as_str() == "c3",
                _ => false,
            })
            .count();
        d.drain_events().for_each(drop);
        c3.poll().unwrap();

        if a.state().contains(&"c3".into()) {
            present_at.push(sec);
        }
    }

    assert_eq!(present_at, vec![2, 3, 4, 5]);
    assert_eq!(joins, 1);
    assert!(!d.state().contains(&"c3".into()));
}

#[test]
fn test_reaped_player_returns_when_it_speaks() {
    let hub = MemoryHub::new();
    let config = SyncConfig {
        reap_after: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let start = Instant::now();

    a.handle_message(&envelope("g", "c3", &[("c3", at(1.0, 0.0))]), start);
    assert_eq!(a.reap(start + Duration::from_secs(6)), vec![PlayerId::from("c3")]);

    // Relayed by someone else: ignored.
    let relayed = envelope("g", "b2", &[("b2", at(2.0, 0.0)), ("c3", at(1.0, 0.0))]);
    a.handle_message(&relayed, start + Duration::from_secs(7));
    assert!(!a.state().contains(&"c3".into()));
    assert!(a.state().contains(&"b2".into()));

    // From c3 itself: welcome back.
    let returning = envelope("g", "c3", &[("c3", at(3.0, 0.0))]);
    let outcome = a.handle_message(&returning, start + Duration::from_secs(8));
    assert_eq!(outcome, MessageOutcome::Merged);
    assert_eq!(a.state().get(&"c3".into()), Some(&at(3.0, 0.0)));
}

#[test]
fn test_versioned_reaped_player_returns_with_newer_seq() {
    let hub = MemoryHub::new();
    let config = SyncConfig {
        policy: MergePolicy::Versioned,
        reap_after: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let start = Instant::now();

    let mut old = at(1.0, 0.0);
    old.seq = 3;
    a.handle_message(&envelope("g", "c3", &[("c3", old)]), start);
    a.reap(start + Duration::from_secs(6));

    let mut newer = at(4.0, 0.0);
    newer.seq = 4;
    let later = start + Duration::from_secs(7);
    a.handle_message(&envelope("g", "b2", &[("b2", at(2.0, 0.0)), ("c3", old)]), later);
    assert!(!a.state().contains(&"c3".into()));

    a.handle_message(&envelope("g", "b2", &[("b2", at(2.0, 0.0)), ("c3", newer)]), later);
    assert_eq!(a.state().get(&"c3".into()), Some(&newer));
}

#[test]
fn test_reaping_disabled_by_default() {
    let hub = MemoryHub::new();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    let start = Instant::now();

    a.handle_message(&envelope("g", "b2", &[("b2", at(1.0, 0.0))]), start);
    assert!(a.reap(start + Duration::from_secs(3600)).is_empty());
    assert_eq!(a.remote_count(), 1);
}

#[test]
fn test_heartbeat_rebroadcasts_idle_player() {
    let hub = MemoryHub::new();
    let mut observer = hub.join();
    let config = SyncConfig {
        heartbeat: Some(Duration::from_secs(2)),
        ..Default::default()
    };
    let mut a = engine(&hub, "g", "a1", config);
    let start = Instant::now();
    let idle = at(0.0, 0.0);

    a.announce(start);
    observer.poll().unwrap();

    a.housekeeping(&idle, start + Duration::from_secs(1));
    assert!(observer.poll().unwrap().is_empty());

    a.housekeeping(&idle, start + Duration::from_secs(3));
    let sent = observer.poll().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(decode_payload(&sent[0]), Payload::Delta("a1".into(), idle));
}

#[test]
fn test_closed_relay_keeps_simulating() {
    let hub = MemoryHub::new();
    let mut a = engine(&hub, "g", "a1", SyncConfig::default());
    a.close();

    assert!(!a.relay().is_open());
    assert_eq!(a.pump(Instant::now()), 0);
    assert!(a.broadcast_if_drifted(&at(2.0, 0.0), Instant::now()));
    assert_eq!(a.state().get(&"a1".into()), Some(&at(2.0, 0.0)));
    assert_eq!(a.stats().sends_skipped, 1);
}
