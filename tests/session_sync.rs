// Improvement potential. Run the permutation test against random legal games rather than a fixed
// opening.

mod common;

use common::*;
use itertools::Itertools;
use live_chess::clock::MillisDuration;
use live_chess::coord::Coord;
use live_chess::force::Force;
use live_chess::piece::PromotionPiece;
use live_chess::rules::Position;
use live_chess::session::{SessionEvent, SubmitOutcome};
use live_chess::test_util::{deterministic_rng, mv, sample_game_details};
use pretty_assertions::assert_eq;
use rand::seq::SliceRandom;
use serde_json::json;
use Force::{Black, White};


const RUY_LOPEZ: [&str; 10] =
    ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6", "e1g1", "f8e7"];

// White pawn on e7, black king on f6, white to move.
const BEFORE_PROMOTION: [&str; 8] =
    ["d2d4", "e7e5", "d4e5", "e8e7", "e5e6", "e7f6", "e6e7", "a7a6"];

fn new_game(history: &[&str]) -> TestSession {
    TestSession::new(sample_game_details("g1", history))
}

fn applied_indices(events: &[SessionEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MoveApplied(record) => Some(record.index),
            _ => None,
        })
        .collect()
}

// Everything except the local arrival time.
fn history_summary(game: &TestSession) -> Vec<(usize, Force, String, Position, Option<u64>)> {
    game.session
        .history()
        .iter()
        .map(|r| {
            (r.index, r.force, r.mv.to_string(), r.position_after, r.elapsed.map(|e| e.as_millis()))
        })
        .collect()
}


#[test]
fn arrival_order_does_not_matter() {
    let mut reference = new_game(&[]);
    for (index, m) in RUY_LOPEZ.iter().enumerate() {
        reference.deliver(index, m, Some(100 * index as u64), 0);
    }
    assert_eq!(reference.session.history().len(), RUY_LOPEZ.len());
    let expected = history_summary(&reference);

    let mut rng = deterministic_rng();
    for _ in 0..50 {
        let mut order = (0..RUY_LOPEZ.len()).collect_vec();
        order.shuffle(&mut rng);
        let mut game = new_game(&[]);
        for &index in &order {
            game.deliver(index, RUY_LOPEZ[index], Some(100 * index as u64), 0);
        }
        assert_eq!(history_summary(&game), expected, "order: {order:?}");
        assert_eq!(game.session.pending_indices().count(), 0);
        assert_eq!(
            applied_indices(&game.take_events()),
            (0..RUY_LOPEZ.len()).collect_vec(),
            "order: {order:?}"
        );
    }
}

#[test]
fn duplicates_never_add_moves() {
    let mut rng = deterministic_rng();
    for _ in 0..20 {
        let mut deliveries = (0..RUY_LOPEZ.len()).chain(0..RUY_LOPEZ.len()).collect_vec();
        deliveries.shuffle(&mut rng);
        let mut game = new_game(&[]);
        for &index in &deliveries {
            game.deliver(index, RUY_LOPEZ[index], None, 0);
        }
        assert_eq!(game.moves(), RUY_LOPEZ.to_vec());
        assert_eq!(applied_indices(&game.take_events()).len(), RUY_LOPEZ.len());
    }
}

#[test]
fn stashed_duplicate_keeps_last_copy() {
    let mut game = new_game(&[]);
    game.deliver(1, "e7e5", Some(100), 0);
    game.deliver(1, "e7e5", Some(200), 0);
    game.deliver(0, "e2e4", None, 0);
    assert_eq!(game.session.history()[1].elapsed, Some(MillisDuration::from_millis(200)));
}

#[test]
fn reply_before_opening_move() {
    let mut game = new_game(&[]);
    game.deliver(1, "e7e5", None, 0);
    assert!(game.session.history().is_empty());
    assert!(game.take_events().is_empty());
    assert_eq!(game.session.pending_indices().collect_vec(), vec![1]);

    game.deliver(0, "e2e4", None, 10);
    assert_eq!(game.moves(), vec!["e2e4", "e7e5"]);
    assert_eq!(game.session.pending_indices().count(), 0);
    assert_eq!(applied_indices(&game.take_events()), vec![0, 1]);
}

#[test]
fn local_move_and_echo() {
    let mut game = new_game(&[]);
    let outcome = game.session.submit_move(mv("e2e4"), game.at(1_000));
    assert_eq!(outcome, SubmitOutcome::Applied(0));
    assert_eq!(game.moves(), vec!["e2e4"]);
    assert_eq!(game.session.position().side_to_move(), Black);
    assert_eq!(game.sent_moves(), vec![json!({ "from": 12, "to": 28 })]);
    assert_eq!(applied_indices(&game.take_events()), vec![0]);

    game.deliver(0, "e2e4", Some(950), 1_200);
    assert_eq!(game.moves(), vec!["e2e4"]);
    assert_eq!(game.take_events(), vec![SessionEvent::TimingUpdated { index: 0 }]);
    assert!(game.session.history()[0].is_confirmed());
    assert_eq!(game.sent_moves().len(), 1);
}

#[test]
fn illegal_submission_is_silent() {
    let mut game = new_game(&[]);
    assert!(!game.session.is_legal_move(&mv("e2e5")));
    assert_eq!(game.session.submit_move(mv("e2e5"), game.at(0)), SubmitOutcome::Illegal);
    assert_eq!(game.session.submit_move(mv("e7e5"), game.at(0)), SubmitOutcome::Illegal);
    assert!(game.session.history().is_empty());
    assert!(game.take_events().is_empty());
    assert!(game.sent_moves().is_empty());
}

#[test]
fn no_moves_after_game_over() {
    let mut game = new_game(&["e2e4"]);
    game.session.end_game(game.at(500));
    assert_eq!(game.take_events(), vec![SessionEvent::GameOver]);
    assert!(!game.session.is_in_progress());
    assert!(!game.session.is_legal_move(&mv("e7e5")));
    assert_eq!(
        game.session.submit_move(mv("e7e5"), game.at(600)),
        SubmitOutcome::GameNotInProgress
    );
    assert_eq!(game.moves(), vec!["e2e4"]);
    assert!(game.sent_moves().is_empty());
    assert!(game.take_events().is_empty());

    // The server may still be replaying moves made before the end.
    game.deliver(1, "e7e5", None, 700);
    assert_eq!(game.moves(), vec!["e2e4", "e7e5"]);
}

#[test]
fn standard_blitz_opening() {
    let mut game = new_game(&[]);
    let five_minutes = 5 * 60 * 1000;
    assert_eq!(game.session.time_left(White, game.at(0)).as_millis(), five_minutes);

    game.session.submit_move(mv("e2e4"), game.at(2_000));
    assert_eq!(game.session.history().len(), 1);
    assert!(game.session.position().piece_at(Coord::from_algebraic("e4").unwrap()).is_some());

    let white_after_move = game.session.time_left(White, game.at(2_000));
    assert_eq!(white_after_move.as_millis(), five_minutes - 2_000);
    for t in [2_000, 10_000, 60_000] {
        let black = game.session.time_left(Black, game.at(t));
        assert_eq!(black.as_millis(), five_minutes - (t - 2_000));
        assert_eq!(game.session.time_left(White, game.at(t)), white_after_move);
    }
}

#[test]
fn black_clock_waits_for_white() {
    let game = new_game(&[]);
    let five_minutes = 5 * 60 * 1000;
    for t in [0, 1_000, 30_000] {
        assert_eq!(game.session.time_left(Black, game.at(t)).as_millis(), five_minutes);
    }
    let white_later = game.session.time_left(White, game.at(30_000));
    assert!(white_later < game.session.time_left(White, game.at(0)));
}

#[test]
fn clock_follows_history() {
    let mut game = new_game(&[]);
    let full = 300_000;
    let left = |game: &TestSession, force: Force, t: u64| {
        game.session.time_left(force, game.at(t)).as_millis()
    };

    let mut previous = left(&game, White, 0);
    for t in (0..3_000).step_by(250) {
        let current = left(&game, White, t);
        assert!(current <= previous);
        previous = current;
    }

    game.session.submit_move(mv("e2e4"), game.at(3_000));
    assert_eq!(left(&game, White, 3_000), full - 3_000);
    assert_eq!(left(&game, White, 5_000), full - 3_000);
    assert_eq!(left(&game, Black, 5_000), full - 2_000);

    // Server timing replaces the local estimate.
    game.deliver(0, "e2e4", Some(2_800), 3_500);
    assert_eq!(left(&game, White, 5_000), full - 2_800);

    // Black's move restarts white's countdown from the moment it was applied.
    game.deliver(1, "e7e5", Some(2_900), 6_000);
    assert_eq!(left(&game, Black, 6_000), full - 2_900);
    assert_eq!(left(&game, White, 6_000), full - 2_800);
    assert_eq!(left(&game, White, 7_000), full - 3_800);

    assert_eq!(left(&game, White, 60 * 60 * 1000), 0);
    assert!(!game.session.showing_for(White, game.at(60 * 60 * 1000)).out_of_time);
}

#[test]
fn clock_freezes_when_game_ends() {
    let mut game = new_game(&[]);
    game.session.end_game(game.at(4_000));
    let frozen = game.session.time_left(White, game.at(4_000));
    assert_eq!(frozen.as_millis(), 296_000);
    assert_eq!(game.session.time_left(White, game.at(90_000)), frozen);
}

#[test]
fn promotion_needs_a_piece() {
    let mut game = new_game(&BEFORE_PROMOTION);
    let before = game.moves();
    assert!(game.session.is_legal_move(&mv("e7e8")));

    let outcome = game.session.submit_move(mv("e7e8"), game.at(100));
    assert_eq!(outcome, SubmitOutcome::PromotionPieceNeeded);
    assert_eq!(game.take_events(), vec![SessionEvent::PromotionPieceNeeded(mv("e7e8"))]);
    assert_eq!(game.moves(), before);
    assert!(game.sent_moves().is_empty());

    let queen = mv("e7e8").with_promotion(PromotionPiece::QUEEN);
    assert_eq!(game.session.submit_move(queen, game.at(200)), SubmitOutcome::Applied(8));
    assert_eq!(game.moves().last().unwrap(), "e7e8q");
    assert_eq!(game.sent_moves(), vec![json!({ "from": 52, "to": 60, "promoteTo": "Q" })]);
}

#[test]
fn promotion_piece_is_dropped_for_regular_moves() {
    let mut game = new_game(&[]);
    let outcome = game.session.submit_move(mv("e2e4q"), game.at(0));
    assert_eq!(outcome, SubmitOutcome::Applied(0));
    assert_eq!(game.moves(), vec!["e2e4"]);
    assert_eq!(game.sent_moves(), vec![json!({ "from": 12, "to": 28 })]);
}

#[test]
fn corrupted_notification_is_dropped() {
    let mut game = new_game(&[]);
    game.deliver(0, "e2e5", None, 0);
    assert!(game.session.history().is_empty());
    assert!(game.take_events().is_empty());

    game.deliver(0, "e2e4", None, 100);
    assert_eq!(game.moves(), vec!["e2e4"]);
    assert_eq!(applied_indices(&game.take_events()), vec![0]);
}

#[test]
fn malformed_payloads_are_dropped() {
    let mut game = new_game(&[]);
    game.deliver_raw(json!({ "index": 0, "from": 12, "to": 64 }), 0);
    game.deliver_raw(json!({ "index": 0, "from": 12 }), 0);
    game.deliver_raw(json!({ "index": -1, "from": 12, "to": 28 }), 0);
    game.deliver_raw(json!({ "index": 0, "from": 12, "to": 28, "promoteTo": "K" }), 0);
    game.deliver_raw(json!("e2e4"), 0);
    assert!(game.session.history().is_empty());
    assert_eq!(game.session.pending_indices().count(), 0);
    assert!(game.take_events().is_empty());
}

#[test]
fn server_overrides_conflicting_local_move() {
    let mut game = new_game(&[]);
    game.session.submit_move(mv("e2e4"), game.at(0));
    game.take_events();

    game.deliver(0, "d2d4", Some(500), 300);
    let events = game.take_events();
    assert_eq!(events[0], SessionEvent::MovesRetracted { from_index: 0 });
    assert_eq!(applied_indices(&events), vec![0]);
    assert_eq!(game.moves(), vec!["d2d4"]);
    assert!(game.session.history()[0].is_confirmed());
}

#[test]
fn retraction_revalidates_confirmed_reply() {
    let mut game = new_game(&[]);
    game.session.submit_move(mv("e2e4"), game.at(0));
    game.deliver(1, "e7e5", Some(900), 100);
    assert_eq!(game.moves(), vec!["e2e4", "e7e5"]);
    game.take_events();

    game.deliver(0, "d2d4", Some(500), 200);
    let events = game.take_events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], SessionEvent::MovesRetracted { from_index: 0 });
    assert_eq!(applied_indices(&events), vec![0, 1]);
    assert_eq!(game.moves(), vec!["d2d4", "e7e5"]);
    assert_eq!(game.session.pending_indices().count(), 0);
    assert_eq!(game.session.history()[1].elapsed, Some(MillisDuration::from_millis(900)));
    assert!(game.session.history().iter().all(|r| r.is_confirmed()));
}

#[test]
fn huge_timing_values_do_not_overflow() {
    let mut game = new_game(&[]);
    game.deliver(0, "e2e4", Some(u64::MAX), 0);
    game.deliver(1, "e7e5", None, 1_000);
    game.deliver(2, "g1f3", Some(10), 2_000);
    assert_eq!(game.session.time_left(White, game.at(3_000)), MillisDuration::ZERO);
    assert_eq!(game.session.time_left(Black, game.at(3_000)).as_millis(), 300_000 - 2_000);

    let mut details = sample_game_details("g2", &[]);
    details.options.initial_time_minutes = u64::MAX / 1000;
    details.options.time_increment_seconds = u64::MAX;
    let game = TestSession::new(details);
    let left = game.session.time_left(White, game.at(1_000));
    assert_eq!(left.as_millis(), u64::MAX - 1_000);
}

#[test]
fn resume_from_history_prefix() {
    let mut game = new_game(&RUY_LOPEZ[..4]);
    assert_eq!(game.replay_requests(), vec![json!({ "startingIndex": 4 })]);
    assert_eq!(game.session.position().side_to_move(), White);

    // Replay of moves made while disconnected.
    game.deliver(5, "a7a6", None, 0);
    game.deliver(4, "f1b5", None, 0);
    assert_eq!(game.moves(), RUY_LOPEZ[..6].to_vec());

    game.session.resync();
    assert_eq!(game.replay_requests(), vec![
        json!({ "startingIndex": 4 }),
        json!({ "startingIndex": 6 })
    ]);
}
