//! Tests for the compliance engine
//!
//! End-to-end frame sequences: rule ordering, cooldown, debounce, dwell
//! boundaries, implicit exits and eviction.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hygiene_types::RuleConfig;

use super::ComplianceEngine;
use crate::events::{ComplianceEvent, EventKind, EventSink};
use crate::observation::{PersonFrameObservation as Obs, RegionTransition};

fn t(ms: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + TimeDelta::milliseconds(ms)
}

/// Deterministic config: no cooldown, short dwell minimums
fn test_config() -> RuleConfig {
    let mut config = RuleConfig::default();
    config.cooldown_secs = 0.0;
    config.min_dwell.stand_secs = 0.5;
    config.min_dwell.sink_secs = 0.5;
    config.min_dwell.dryer_secs = 0.5;
    config.handwash_min_consecutive_frames = 2;
    config
}

fn make_engine(config: RuleConfig) -> ComplianceEngine {
    ComplianceEngine::new(config).unwrap()
}

fn kinds(events: &[ComplianceEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Reference scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_no_hairnet_at_sink_single_frame() {
    let mut engine = make_engine(test_config());
    let events = engine.step(&[Obs::in_region(1, "sink").hairnet(false).at(t(0))], None);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::NoHairnetAtSink);
    assert_eq!(events[0].track_id, 1);
    assert_eq!(events[0].region(), Some("sink"));
}

#[test]
fn test_explicit_sink_to_work_without_dryer() {
    let mut engine = make_engine(test_config());
    let explicit = [RegionTransition::new(2, Some("sink"), Some("work")).at(t(0))];
    let events = engine.step(&[], Some(&explicit));

    assert_eq!(kinds(&events), vec![EventKind::SkipDrying]);
    assert_eq!(events[0].track_id, 2);
    assert_eq!(events[0].evidence["from"], "sink");
    assert_eq!(events[0].evidence["to"], "work");
}

#[test]
fn test_explicit_exit_short_stand_visit() {
    let mut engine = make_engine(test_config());
    assert!(engine.step(&[Obs::in_region(3, "stand").at(t(0))], None).is_empty());

    let explicit = [RegionTransition::new(3, Some("stand"), None).at(t(100))];
    let events = engine.step(&[], Some(&explicit));

    assert_eq!(kinds(&events), vec![EventKind::InsufficientDwellTime]);
    assert_eq!(events[0].track_id, 3);
    assert_eq!(events[0].region(), Some("stand"));
    let dwell = events[0].dwell_seconds().unwrap();
    assert!((dwell - 0.1).abs() < 1e-9);
    assert_eq!(events[0].evidence["required_seconds"], 0.5);
}

#[test]
fn test_handwashing_after_two_frames() {
    let mut engine = make_engine(test_config());
    let washing = |ms| Obs::in_region(4, "stand").hand_in_sink(true).at(t(ms));

    assert!(engine.step(&[washing(0)], None).is_empty());
    let events = engine.step(&[washing(100)], None);

    assert_eq!(kinds(&events), vec![EventKind::HandwashingActive]);
    assert_eq!(events[0].evidence["consecutive"], 2);
    assert_eq!(events[0].evidence["required_consecutive"], 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Enabled switch and determinism
// ─────────────────────────────────────────────────────────────────────────────

fn busy_sequence() -> Vec<Vec<Obs>> {
    vec![
        vec![
            Obs::in_region(1, "stand").hand_in_sink(true).at(t(0)),
            Obs::in_region(2, "sink").at(t(0)),
        ],
        vec![
            Obs::in_region(1, "stand").hand_in_sink(true).at(t(100)),
            Obs::in_region(2, "work").at(t(100)),
        ],
        vec![Obs::in_region(1, "sink").at(t(200))],
        vec![],
    ]
}

#[test]
fn test_disabled_engine_is_inert() {
    let mut config = test_config();
    config.enabled = false;
    let mut engine = make_engine(config);

    for frame in busy_sequence() {
        assert!(engine.step(&frame, None).is_empty());
    }
    let explicit = [RegionTransition::new(2, Some("sink"), Some("work")).at(t(500))];
    assert!(engine.step(&[], Some(&explicit)).is_empty());

    assert_eq!(engine.tracked_count(), 0);
    assert_eq!(engine.cooldown_entries(), 0);
    assert_eq!(engine.frames_processed(), 0);
}

#[test]
fn test_identical_inputs_identical_output() {
    let run = || {
        let mut engine = make_engine(test_config());
        let mut out = Vec::new();
        for frame in busy_sequence() {
            for event in engine.step_at(&frame, None, t(300)) {
                out.push(serde_json::to_string(&event).unwrap());
            }
        }
        out
    };

    let first = run();
    let second = run();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_rule_order_within_frame() {
    let mut engine = make_engine(test_config());
    engine.step(
        &[
            Obs::in_region(1, "stand").hand_in_sink(true).at(t(0)),
            Obs::in_region(2, "sink").hairnet(true).at(t(0)),
        ],
        None,
    );

    engine.step(
        &[
            Obs::in_region(3, "stand").hand_in_sink(true).at(t(100)),
            Obs::in_region(1, "stand").at(t(100)),
            Obs::in_region(2, "sink").hairnet(true).at(t(100)),
        ],
        None,
    );

    // Track 3: second qualifying stand frame.
    // Track 1: stand -> sink after 200ms, no hairnet.
    // Track 2: sink -> work after 200ms, never dried.
    let events = engine.step(
        &[
            Obs::in_region(3, "stand").hand_in_sink(true).at(t(200)),
            Obs::in_region(1, "sink").at(t(200)),
            Obs::in_region(2, "work").at(t(200)),
        ],
        None,
    );

    let summary: Vec<(EventKind, u64)> = events.iter().map(|e| (e.kind, e.track_id)).collect();
    assert_eq!(
        summary,
        vec![
            (EventKind::NoHairnetAtSink, 1),
            (EventKind::InsufficientDwellTime, 1),
            (EventKind::SkipDrying, 2),
            (EventKind::InsufficientDwellTime, 2),
            (EventKind::HandwashingActive, 3),
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Cooldown
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cooldown_collapses_repeats() {
    let mut config = test_config();
    config.cooldown_secs = 2.0;
    let mut engine = make_engine(config);
    let at_sink = |ms| Obs::in_region(1, "sink").at(t(ms));

    assert_eq!(engine.step(&[at_sink(0)], None).len(), 1);
    assert!(engine.step(&[at_sink(1_000)], None).is_empty());
    assert!(engine.step(&[at_sink(1_999)], None).is_empty());
    assert_eq!(engine.step(&[at_sink(2_000)], None).len(), 1);
}

#[test]
fn test_cooldown_is_per_track_and_kind() {
    let mut config = test_config();
    config.cooldown_secs = 60.0;
    let mut engine = make_engine(config);

    let sink = |id, ms| Obs::in_region(id, "sink").at(t(ms));

    assert_eq!(engine.step(&[sink(1, 0), sink(2, 0)], None).len(), 2);
    assert!(engine.step(&[sink(1, 100), sink(2, 100)], None).is_empty());

    // Same track, different kinds still pass while the hairnet alert is cooling down
    let events = engine.step(&[Obs::in_region(1, "work").at(t(200)), sink(2, 200)], None);
    assert_eq!(
        kinds(&events),
        vec![EventKind::SkipDrying, EventKind::InsufficientDwellTime]
    );
    assert!(events.iter().all(|e| e.track_id == 1));
}

#[test]
fn test_zero_cooldown_emits_every_frame() {
    let mut engine = make_engine(test_config());
    for ms in [0, 10, 20, 30] {
        assert_eq!(engine.step(&[Obs::in_region(1, "sink").at(t(ms))], None).len(), 1);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dwell
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_dwell_exactly_at_minimum_not_flagged() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "dryer").at(t(0))], None);
    let events = engine.step(&[Obs::new(1).at(t(500))], None);
    assert!(events.is_empty());
}

#[test]
fn test_dwell_one_ms_short_flagged() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "dryer").at(t(0))], None);
    let events = engine.step(&[Obs::new(1).at(t(499))], None);
    assert_eq!(kinds(&events), vec![EventKind::InsufficientDwellTime]);
    assert_eq!(events[0].dwell_seconds(), Some(0.499));
}

#[test]
fn test_dwell_evaluated_once_per_visit() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "stand").at(t(0))], None);
    assert_eq!(engine.step(&[Obs::new(1).at(t(100))], None).len(), 1);
    assert!(engine.track(1).unwrap().entered_at("stand").is_none());

    // A second exit of the same (already evaluated) visit is silent
    let explicit = [RegionTransition::new(1, Some("stand"), None).at(t(150))];
    assert!(engine.step(&[], Some(&explicit)).is_empty());
}

#[test]
fn test_dwell_counts_from_first_frame_in_region() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "sink").hairnet(true).at(t(0))], None);
    engine.step(&[Obs::in_region(1, "sink").hairnet(true).at(t(300))], None);
    let events = engine.step(&[Obs::in_region(1, "dryer").at(t(600))], None);
    assert!(events.is_empty());
}

#[test]
fn test_untimed_regions_never_flag_dwell() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "entrance").at(t(0))], None);
    assert!(engine.step(&[Obs::in_region(1, "hallway").at(t(10))], None).is_empty());
    assert!(engine.step(&[Obs::new(1).at(t(20))], None).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Implicit exits
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_lost_track_synthesizes_exit() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(7, "sink").hairnet(true).at(t(0))], None);

    let events = engine.step_at(&[], None, t(200));
    assert_eq!(kinds(&events), vec![EventKind::InsufficientDwellTime]);
    assert_eq!(events[0].region(), Some("sink"));
    assert_eq!(events[0].timestamp, t(200));
    assert!(engine.track(7).unwrap().current_region.is_none());
    assert!(engine.track(7).unwrap().has_visited("sink"));
}

#[test]
fn test_lost_track_not_stuck_occupied() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(7, "dryer").at(t(0))], None);
    engine.step_at(&[], None, t(1_000));
    // Exit already synthesized, nothing further on later empty frames
    assert!(engine.step_at(&[], None, t(2_000)).is_empty());
}

#[test]
fn test_explicit_list_disables_loss_detection() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(7, "sink").hairnet(true).at(t(0))], None);

    let explicit = [RegionTransition::new(8, None, Some("entrance")).at(t(100))];
    let events = engine.step(&[], Some(&explicit));
    assert!(events.is_empty());
    assert_eq!(engine.track(7).unwrap().current_region.as_deref(), Some("sink"));
}

#[test]
fn test_explicit_list_bypasses_observation_diff() {
    let mut engine = make_engine(test_config());
    let explicit: [RegionTransition; 0] = [];
    engine.step(&[Obs::in_region(1, "stand").at(t(0))], Some(&explicit));
    assert!(engine.track(1).unwrap().current_region.is_none());
}

#[test]
fn test_reappearing_track_is_ordinary_transition() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(5, "dryer").at(t(0))], None);
    engine.step_at(&[], None, t(1_000));

    let events = engine.step(&[Obs::in_region(5, "sink").hairnet(true).at(t(2_000))], None);
    assert!(events.is_empty());

    // Dryer visit before the gap still counts toward process order
    let events = engine.step(&[Obs::in_region(5, "work").at(t(3_000))], None);
    assert!(events.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Process order
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_full_process_is_clean() {
    let mut engine = make_engine(test_config());
    let steps = [
        Obs::in_region(1, "entrance").hairnet(true).at(t(0)),
        Obs::in_region(1, "stand").hairnet(true).hand_in_sink(true).at(t(1_000)),
        Obs::in_region(1, "stand").hairnet(true).at(t(2_000)),
        Obs::in_region(1, "sink").hairnet(true).at(t(3_000)),
        Obs::in_region(1, "dryer").hairnet(true).at(t(4_000)),
        Obs::in_region(1, "sink").hairnet(true).at(t(5_000)),
        Obs::in_region(1, "work").hairnet(true).at(t(6_000)),
    ];
    for obs in steps {
        assert!(engine.step(&[obs], None).is_empty());
    }
}

#[test]
fn test_sink_via_outside_to_work_is_not_skip() {
    let mut engine = make_engine(test_config());
    engine.step(&[Obs::in_region(1, "sink").hairnet(true).at(t(0))], None);
    engine.step(&[Obs::new(1).at(t(1_000))], None);
    let events = engine.step(&[Obs::in_region(1, "work").at(t(2_000))], None);
    assert!(events.is_empty());
}

#[test]
fn test_custom_region_names() {
    let mut config = test_config();
    config.regions.sink = "basin_a".to_string();
    config.regions.dryer = "blower".to_string();
    let mut engine = make_engine(config);

    let events = engine.step(&[Obs::in_region(1, "basin_a").at(t(0))], None);
    assert_eq!(kinds(&events), vec![EventKind::NoHairnetAtSink]);
    assert_eq!(events[0].region(), Some("basin_a"));

    let events = engine.step(
        &[
            Obs::in_region(1, "basin_a").hairnet(true).at(t(10)),
            Obs::in_region(2, "sink").at(t(10)),
        ],
        None,
    );
    assert!(events.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Hand-washing debounce
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_debounce_interrupted_never_fires() {
    let mut config = test_config();
    config.handwash_min_consecutive_frames = 4;
    let mut engine = make_engine(config);
    let washing = |ms| Obs::in_region(1, "stand").hand_in_sink(true).at(t(ms));

    for ms in [0, 100, 200] {
        assert!(engine.step(&[washing(ms)], None).is_empty());
    }
    assert!(engine.step(&[Obs::in_region(1, "stand").at(t(300))], None).is_empty());
    assert_eq!(engine.track(1).unwrap().handwash_frames, 0);

    for ms in [400, 500, 600] {
        assert!(engine.step(&[washing(ms)], None).is_empty());
    }
    let events = engine.step(&[washing(700)], None);
    assert_eq!(kinds(&events), vec![EventKind::HandwashingActive]);
    assert_eq!(events[0].evidence["consecutive"], 4);
}

#[test]
fn test_debounce_fires_every_qualifying_frame() {
    let mut engine = make_engine(test_config());
    let washing = |ms| Obs::in_region(1, "stand").hand_in_sink(true).at(t(ms));

    engine.step(&[washing(0)], None);
    for (i, ms) in [100, 200, 300].into_iter().enumerate() {
        let events = engine.step(&[washing(ms)], None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].evidence["consecutive"], i as u64 + 2);
    }
}

#[test]
fn test_missing_frame_does_not_reset_debounce() {
    let mut engine = make_engine(test_config());
    let washing = |ms| Obs::in_region(1, "stand").hand_in_sink(true).at(t(ms));

    engine.step(&[washing(0)], None);
    engine.step(&[Obs::in_region(9, "entrance").at(t(50))], None);
    // Loss detection exits the stand, but the counter only changes on observed frames
    let events = engine.step(&[washing(100)], None);
    assert_eq!(kinds(&events), vec![EventKind::HandwashingActive]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Eviction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_idle_tracks_evicted_with_cooldown_history() {
    let mut config = test_config();
    config.cooldown_secs = 600.0;
    config.track_idle_timeout_secs = 30.0;
    let mut engine = make_engine(config);

    assert_eq!(engine.step(&[Obs::in_region(1, "sink").at(t(0))], None).len(), 1);
    assert_eq!(engine.cooldown_entries(), 1);

    engine.step(&[Obs::in_region(2, "entrance").at(t(31_000))], None);
    assert!(engine.track(1).is_none());
    assert_eq!(engine.cooldown_entries(), 0);

    // Reused id starts fresh: no cooldown carry-over, no stale visit history
    let events = engine.step(&[Obs::in_region(1, "sink").at(t(32_000))], None);
    assert_eq!(kinds(&events), vec![EventKind::NoHairnetAtSink]);
    assert!(!engine.track(1).unwrap().has_visited("entrance"));
}

#[test]
fn test_no_eviction_when_disabled() {
    let mut config = test_config();
    config.track_idle_timeout_secs = 0.0;
    let mut engine = make_engine(config);

    engine.step(&[Obs::new(1).at(t(0))], None);
    engine.step_at(&[], None, t(86_400_000));
    assert!(engine.track(1).is_some());
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingSink {
    violations: usize,
    activity: usize,
}

impl EventSink for CountingSink {
    fn handle_event(&mut self, event: &ComplianceEvent) {
        if event.kind.is_violation() {
            self.violations += 1;
        } else {
            self.activity += 1;
        }
    }
}

#[test]
fn test_step_dispatch_feeds_all_sinks() {
    let mut engine = make_engine(test_config());
    let mut counter = CountingSink::default();
    let mut collected: Vec<ComplianceEvent> = Vec::new();

    let events = engine.step_dispatch(
        &[
            Obs::in_region(1, "sink").at(t(0)),
            Obs::in_region(2, "sink").at(t(0)),
        ],
        None,
        &mut [&mut counter, &mut collected],
    );

    assert_eq!(events.len(), 2);
    assert_eq!(collected, events);
    assert_eq!(counter.violations, 2);
    assert_eq!(counter.activity, 0);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = test_config();
    config.min_dwell.stand_secs = -0.5;
    assert!(ComplianceEngine::new(config).is_err());
}
