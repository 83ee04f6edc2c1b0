use super::*;
use crate::advisor::testing::ScriptedAdvisor;
use std::sync::Arc;

const TIMEOUT: Duration = Duration::from_secs(5);

fn mv(text: &str) -> Move {
    text.parse().unwrap()
}

fn after_e4() -> GameState {
    let mut game = GameState::new();
    game.apply_move(mv("e2e4")).unwrap();
    game
}

fn cache_with(advisor: &Arc<ScriptedAdvisor>) -> PlanCache {
    PlanCache::new(advisor.clone(), TIMEOUT)
}

fn three_turn_advisor() -> ScriptedAdvisor {
    ScriptedAdvisor::new().with_plan(&[
        ("e7e5", Some("g1f3")),
        ("b8c6", Some("f1c4")),
        ("g8f6", None),
    ])
}

#[tokio::test]
async fn test_miss_then_hits_without_more_calls() {
    let advisor = Arc::new(three_turn_advisor());
    let cache = cache_with(&advisor);
    let mut game = after_e4();

    let first = cache.next(&game, Color::Black, 3).await.unwrap();
    assert_eq!(first, PlanOutcome::Fresh(mv("e7e5")));
    assert_eq!(cache.remaining(Color::Black), 2);
    game.apply_move(mv("e7e5")).unwrap();
    game.apply_move(mv("g1f3")).unwrap();

    let second = cache.next(&game, Color::Black, 3).await.unwrap();
    assert_eq!(second, PlanOutcome::Hit(mv("b8c6")));
    game.apply_move(mv("b8c6")).unwrap();
    game.apply_move(mv("f1c4")).unwrap();

    let third = cache.next(&game, Color::Black, 3).await.unwrap();
    assert_eq!(third, PlanOutcome::Hit(mv("g8f6")));

    assert_eq!(cache.remaining(Color::Black), 0);
    assert_eq!(advisor.plan_calls(), 1);
    assert_eq!(advisor.suggest_calls(), 0);
}

#[tokio::test]
async fn test_divergence_discards_and_falls_back() {
    let advisor = Arc::new(three_turn_advisor().with_suggestion("d7d5"));
    let cache = cache_with(&advisor);
    let mut game = after_e4();

    cache.next(&game, Color::Black, 3).await.unwrap();
    game.apply_move(mv("e7e5")).unwrap();
    game.apply_move(mv("d2d4")).unwrap();

    let outcome = cache.next(&game, Color::Black, 3).await.unwrap();
    assert_eq!(outcome, PlanOutcome::Fallback { mv: mv("d7d5"), discarded_plan: true });
    assert_eq!(cache.remaining(Color::Black), 0);
    assert_eq!(advisor.plan_calls(), 1);
    assert_eq!(advisor.suggest_calls(), 1);
}

#[tokio::test]
async fn test_unusable_plan_falls_back() {
    let advisor = Arc::new(
        ScriptedAdvisor::new()
            .with_plan(&[("a1a1", None)])
            .with_suggestion("c7c5"),
    );
    let cache = cache_with(&advisor);

    let outcome = cache.next(&after_e4(), Color::Black, 3).await.unwrap();
    assert_eq!(outcome, PlanOutcome::Fallback { mv: mv("c7c5"), discarded_plan: false });
    assert_eq!(advisor.suggest_calls(), 1);
}

#[tokio::test]
async fn test_exhausted_plan_refills() {
    let advisor = Arc::new(
        ScriptedAdvisor::new()
            .with_plan(&[("e7e5", None)])
            .with_plan(&[("b8c6", None)]),
    );
    let cache = cache_with(&advisor);
    let mut game = after_e4();

    assert_eq!(cache.next(&game, Color::Black, 1).await.unwrap(), PlanOutcome::Fresh(mv("e7e5")));
    game.apply_move(mv("e7e5")).unwrap();
    game.apply_move(mv("g1f3")).unwrap();
    assert_eq!(cache.next(&game, Color::Black, 1).await.unwrap(), PlanOutcome::Fresh(mv("b8c6")));
    assert_eq!(advisor.plan_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refills_are_coalesced() {
    let advisor = Arc::new(three_turn_advisor().with_delay(Duration::from_secs(1)));
    let cache = cache_with(&advisor);
    let game = after_e4();

    let (a, b) = tokio::join!(
        cache.refill(&game, Color::Black, 3),
        cache.refill(&game, Color::Black, 3)
    );

    assert_eq!(a.unwrap(), Some(mv("e7e5")));
    assert_eq!(b.unwrap(), Some(mv("e7e5")));
    assert_eq!(advisor.plan_calls(), 1);
    assert_eq!(cache.remaining(Color::Black), 2);
    assert!(!cache.refill_in_flight(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_joiner_from_other_position_keeps_owner_plan() {
    let advisor = Arc::new(three_turn_advisor().with_delay(Duration::from_secs(1)));
    let cache = cache_with(&advisor);
    let game = after_e4();
    let mut elsewhere = after_e4();
    elsewhere.apply_move(mv("d7d5")).unwrap();

    let (joined, owned) = tokio::join!(
        async {
            tokio::task::yield_now().await;
            cache.refill(&elsewhere, Color::Black, 3).await
        },
        cache.refill(&game, Color::Black, 3)
    );

    assert_eq!(joined.unwrap_err(), AdvisorError::Stale);
    assert_eq!(owned.unwrap(), Some(mv("e7e5")));
    assert_eq!(advisor.plan_calls(), 1);
    assert_eq!(cache.remaining(Color::Black), 2);
    assert!(!cache.refill_in_flight(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_drops_in_flight_refill() {
    let advisor = Arc::new(three_turn_advisor().with_delay(Duration::from_secs(1)));
    let cache = cache_with(&advisor);
    let game = after_e4();

    let (refilled, ()) = tokio::join!(cache.refill(&game, Color::Black, 3), async {
        assert!(cache.refill_in_flight(Color::Black));
        cache.invalidate();
    });

    assert_eq!(refilled.unwrap_err(), AdvisorError::Stale);
    assert_eq!(cache.remaining(Color::Black), 0);
    assert!(!cache.refill_in_flight(Color::Black));
}

#[tokio::test]
async fn test_invalidate_clears_stored_plan() {
    let advisor = Arc::new(three_turn_advisor());
    let cache = cache_with(&advisor);
    cache.next(&after_e4(), Color::Black, 3).await.unwrap();
    assert_eq!(cache.remaining(Color::Black), 2);

    cache.invalidate();
    assert_eq!(cache.remaining(Color::Black), 0);
}

#[tokio::test]
async fn test_advisor_failure_propagates_and_frees_slot() {
    let advisor = Arc::new(
        three_turn_advisor().with_error(AdvisorError::Transport("connection reset".into())),
    );
    let cache = cache_with(&advisor);

    let err = cache.next(&after_e4(), Color::Black, 3).await.unwrap_err();
    assert!(matches!(err, AdvisorError::Transport(_)));
    assert!(!cache.refill_in_flight(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_slow_advisor_times_out() {
    let advisor = Arc::new(three_turn_advisor().with_delay(Duration::from_secs(30)));
    let cache = cache_with(&advisor);

    let err = cache.next(&after_e4(), Color::Black, 3).await.unwrap_err();
    assert_eq!(err, AdvisorError::Timeout(TIMEOUT));
}
