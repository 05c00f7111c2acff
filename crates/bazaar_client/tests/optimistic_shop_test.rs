//! Optimistic shop scenarios, driven through the public API only.
//!
//! Each test feeds synthetic snapshots and checks what would be rendered.

use bazaar_client::{
    ActionDispatcher, DispatchError, DispatchOutcome, RecordingSink, ReconciliationEngine,
    RerollTransitionCoordinator, ShopConfig, ShopSession, StaticSession, TransitionEvent,
    TransitionState, UnaffordablePolicy,
};
use bazaar_shared::{
    ActionName, ActionResultMessage, ServerMessage, ShopCommand, ShopOffer, SnapshotMessage,
};

const A: ShopOffer = ShopOffer::new(101, 3);
const B: ShopOffer = ShopOffer::new(102, 4);
const C: ShopOffer = ShopOffer::new(103, 2);
const D: ShopOffer = ShopOffer::new(104, 1);

fn snapshot(
    tick: u64,
    gold: u32,
    free_rerolls: u32,
    slots: &[Option<ShopOffer>],
) -> SnapshotMessage {
    SnapshotMessage {
        tick,
        gold,
        free_rerolls,
        shop_slots: slots.to_vec(),
        level: 2,
        ..Default::default()
    }
}

fn harness() -> (
    ActionDispatcher<RecordingSink, StaticSession>,
    ReconciliationEngine,
    RerollTransitionCoordinator,
) {
    let config = ShopConfig::default();
    (
        ActionDispatcher::new(&config, RecordingSink::new(), StaticSession::in_game(1)),
        ReconciliationEngine::from_config(&config),
        RerollTransitionCoordinator::new(config.transition),
    )
}

#[test]
fn purchase_confirmed_by_snapshot() {
    let (mut dispatcher, mut engine, _) = harness();
    engine.on_snapshot_received(snapshot(1, 10, 0, &[Some(A), Some(C), Some(B), Some(D)]));

    dispatcher.request_purchase(&mut engine, 2).unwrap();
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 6);
    assert_eq!(shown.shop_slots[2], None);

    let report =
        engine.on_snapshot_received(snapshot(2, 6, 0, &[Some(A), Some(C), None, Some(D)]));
    assert_eq!(report.confirmed_slots, vec![2]);
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 6);
    assert_eq!(shown.shop_slots[2], None);
    assert!(shown.pending_slots.is_empty());
    assert!(engine.pending().is_empty());
}

#[test]
fn double_reroll_clamps_rendered_gold() {
    let (mut dispatcher, mut engine, mut transition) = harness();
    engine.on_snapshot_received(snapshot(1, 2, 0, &[Some(A)]));

    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    assert_eq!(engine.displayed().unwrap().gold, 0);

    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.unclamped_gold, -2);
    assert_eq!(shown.gold, 0);
    assert_eq!(dispatcher.sink().sent(), &[ShopCommand::Reroll, ShopCommand::Reroll]);

    // Second reroll rejected by the server
    engine.on_snapshot_received(snapshot(2, 0, 0, &[Some(B)]));
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 0);
    assert_eq!(shown.unclamped_gold, 0);
}

#[test]
fn early_snapshot_keeps_bought_slot_hidden() {
    let (mut dispatcher, mut engine, _) = harness();
    engine.on_snapshot_received(snapshot(1, 10, 0, &[Some(A), Some(B), Some(C), Some(D)]));
    dispatcher.request_purchase(&mut engine, 1).unwrap();

    // Generated before the server processed the purchase
    let report =
        engine.on_snapshot_received(snapshot(2, 10, 0, &[Some(A), Some(B), Some(C), Some(D)]));
    assert_eq!(report.still_pending, 1);
    assert_eq!(engine.displayed().unwrap().shop_slots[1], None);
    // Gold delta is cleared in bulk regardless
    assert_eq!(engine.displayed().unwrap().gold, 10);

    let report =
        engine.on_snapshot_received(snapshot(3, 6, 0, &[Some(A), None, Some(C), Some(D)]));
    assert_eq!(report.confirmed_slots, vec![1]);
    assert!(engine.pending().is_empty());
    assert_eq!(engine.displayed().unwrap().gold, 6);
}

#[test]
fn convergence_after_many_actions() {
    let (mut dispatcher, mut engine, mut transition) = harness();
    engine.on_snapshot_received(snapshot(1, 30, 2, &[Some(A), Some(B), Some(C), Some(D)]));

    dispatcher.request_purchase(&mut engine, 0).unwrap();
    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    dispatcher.request_buy_xp(&mut engine).unwrap();
    dispatcher.request_purchase(&mut engine, 3).unwrap();
    assert_eq!(engine.displayed().unwrap().gold, 30 - 3 - 2 - 4 - 1);
    assert_eq!(engine.displayed().unwrap().free_rerolls, 0);

    // Server processed everything; the numbers are whatever it says
    engine.on_snapshot_received(snapshot(2, 17, 1, &[None, Some(B), Some(C), None]));
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 17);
    assert_eq!(shown.free_rerolls, 1);
    assert!(shown.pending_slots.is_empty());
}

#[test]
fn repeated_snapshot_is_idempotent() {
    let (mut dispatcher, mut engine, _) = harness();
    engine.on_snapshot_received(snapshot(1, 12, 0, &[Some(A), Some(B)]));
    dispatcher.request_purchase(&mut engine, 0).unwrap();

    engine.on_snapshot_received(snapshot(2, 9, 0, &[None, Some(B)]));
    let first = engine.displayed().unwrap();

    // Same content, next tick
    engine.on_snapshot_received(snapshot(3, 9, 0, &[None, Some(B)]));
    let second = engine.displayed().unwrap();
    assert_eq!(first.gold, second.gold);
    assert_eq!(first.shop_slots, second.shop_slots);

    // Duplicate tick is discarded outright
    let report = engine.on_snapshot_received(snapshot(3, 1, 0, &[None, None]));
    assert!(!report.applied());
    assert_eq!(engine.displayed().unwrap().gold, 9);
    assert_eq!(engine.ingest_stats().discarded, 1);
}

#[test]
fn out_of_order_snapshot_cannot_resurrect_gold() {
    let (mut dispatcher, mut engine, _) = harness();
    engine.on_snapshot_received(snapshot(5, 10, 0, &[Some(A)]));
    dispatcher.request_purchase(&mut engine, 0).unwrap();
    engine.on_snapshot_received(snapshot(7, 7, 0, &[None]));

    let report = engine.on_snapshot_received(snapshot(6, 10, 0, &[Some(A)]));
    assert!(!report.applied());
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 7);
    assert_eq!(shown.shop_slots[0], None);
}

#[test]
fn rejected_purchase_heals_on_next_snapshot() {
    let mut session = ShopSession::new(
        &ShopConfig::default(),
        RecordingSink::new(),
        StaticSession::in_game(1),
    );
    session.handle_message(ServerMessage::Snapshot(snapshot(1, 10, 0, &[Some(A), Some(B)])));
    session.request_purchase(1).unwrap();
    assert_eq!(session.displayed().unwrap().shop_slots[1], None);

    session.handle_message(ServerMessage::ActionResult(ActionResultMessage {
        action: ActionName::BuyUnit,
        success: false,
        reason: Some("sold out".into()),
    }));
    let report = session
        .handle_message(ServerMessage::Snapshot(snapshot(2, 10, 0, &[Some(A), Some(B)])))
        .unwrap();
    assert_eq!(report.healed_slots, vec![1]);
    assert_eq!(session.displayed().unwrap().shop_slots[1], Some(B));
    assert_eq!(session.notices().len(), 1);
}

#[test]
fn unacknowledged_rejection_heals_within_allowance() {
    let (mut dispatcher, mut engine, _) = harness();
    let slots = [Some(A), Some(B)];
    engine.on_snapshot_received(snapshot(1, 10, 0, &slots));
    dispatcher.request_purchase(&mut engine, 1).unwrap();

    engine.on_snapshot_received(snapshot(2, 10, 0, &slots));
    assert_eq!(engine.displayed_slot(1), None);
    engine.on_snapshot_received(snapshot(3, 10, 0, &slots));
    assert_eq!(engine.displayed_slot(1), Some(B));
}

#[test]
fn gold_never_renders_negative() {
    let config = ShopConfig::default();
    let mut engine = ReconciliationEngine::from_config(&config);
    let mut dispatcher =
        ActionDispatcher::new(&config, RecordingSink::new(), StaticSession::in_game(1));
    let mut transition = RerollTransitionCoordinator::new(config.transition);
    engine.on_snapshot_received(snapshot(1, 2, 0, &[]));

    for _ in 0..5 {
        dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
        let shown = engine.displayed().unwrap();
        assert!(shown.unclamped_gold <= 0);
        assert_eq!(shown.gold, 0);
    }
    assert_eq!(engine.displayed_gold(), Some(-8));
}

#[test]
fn unaffordable_purchase_is_refused_without_side_effects() {
    let (mut dispatcher, mut engine, _) = harness();
    engine.on_snapshot_received(snapshot(1, 3, 0, &[Some(B)]));
    assert!(!dispatcher.can_purchase(&engine, 0));
    assert_eq!(
        dispatcher.request_purchase(&mut engine, 0),
        Err(DispatchError::InsufficientGold { required: 4, available: 3 })
    );
    assert!(dispatcher.sink().sent().is_empty());
    assert_eq!(engine.displayed().unwrap().shop_slots[0], Some(B));
}

#[test]
fn one_snapshot_after_processing_settles_numbers() {
    let (mut dispatcher, mut engine, mut transition) = harness();
    engine.on_snapshot_received(snapshot(1, 20, 1, &[Some(A), Some(B)]));
    dispatcher.request_reroll(&mut engine, &mut transition).unwrap();
    dispatcher.request_buy_xp(&mut engine).unwrap();

    // Exactly one round trip later
    engine.on_snapshot_received(snapshot(2, 16, 0, &[Some(C), Some(D)]));
    let shown = engine.displayed().unwrap();
    assert_eq!(shown.gold, 16);
    assert_eq!(shown.free_rerolls, 0);
    assert_eq!(engine.pending().gold_delta(), 0);
    assert_eq!(engine.pending().free_reroll_delta(), 0);
}

#[test]
fn lost_reroll_response_times_out_to_old_shop() {
    let mut session = ShopSession::new(
        &ShopConfig::default(),
        RecordingSink::new(),
        StaticSession::in_game(1),
    );
    session.handle_message(ServerMessage::Snapshot(snapshot(1, 10, 0, &[Some(A), Some(B)])));
    session.request_reroll().unwrap();

    assert_eq!(session.update(0.2), Some(TransitionEvent::Collapsed));
    assert_eq!(session.transition().state(), TransitionState::WaitingForServer);

    let mut events = Vec::new();
    for _ in 0..40 {
        events.extend(session.update(0.1));
    }
    assert_eq!(events, vec![TransitionEvent::TimedOut]);
    assert_eq!(session.transition().state(), TransitionState::Idle);
    assert!((session.slot_scale() - 1.0).abs() < f32::EPSILON);
    assert_eq!(session.displayed().unwrap().shop_slots, vec![Some(A), Some(B)]);

    // A late snapshot after the timeout does not restart the transition
    session.handle_message(ServerMessage::Snapshot(snapshot(2, 8, 0, &[Some(C), Some(D)])));
    assert_eq!(session.transition().state(), TransitionState::Idle);
}

fn buy_result(success: bool) -> ServerMessage {
    ServerMessage::ActionResult(ActionResultMessage {
        action: ActionName::BuyUnit,
        success,
        reason: (!success).then(|| "rejected".to_owned()),
    })
}

#[test]
fn forwarded_purchase_rejection_leaves_optimistic_purchase_hidden() {
    let config = ShopConfig {
        unaffordable_policy: UnaffordablePolicy::ForwardToServer,
        ..ShopConfig::default()
    };
    let mut session = ShopSession::new(&config, RecordingSink::new(), StaticSession::in_game(1));
    let a = ShopOffer::new(1, 3);
    let b = ShopOffer::new(2, 5);
    session.handle_message(ServerMessage::Snapshot(snapshot(1, 3, 0, &[Some(a), Some(b)])));

    assert_eq!(session.request_purchase(1), Ok(DispatchOutcome::Forwarded));
    assert_eq!(session.request_purchase(0), Ok(DispatchOutcome::Optimistic));

    // Answer for the forwarded purchase of slot 1
    session.handle_message(buy_result(false));
    // Generated before the server reached the slot 0 purchase
    session.handle_message(ServerMessage::Snapshot(snapshot(2, 3, 0, &[Some(a), Some(b)])));

    let shown = session.displayed().unwrap();
    assert_eq!(shown.shop_slots[0], None);
    assert_eq!(shown.pending_slots, vec![0]);
    assert!(!session.can_purchase(0));
}

#[test]
fn late_answer_for_settled_purchase_is_not_reassigned() {
    let mut session = ShopSession::new(
        &ShopConfig::default(),
        RecordingSink::new(),
        StaticSession::in_game(1),
    );
    let refreshed = ShopOffer::new(9, 2);
    session.handle_message(ServerMessage::Snapshot(snapshot(1, 10, 0, &[Some(A), Some(D)])));
    session.request_purchase(0).unwrap();

    // Shop moved on before the purchase was answered
    let shop = [Some(refreshed), Some(D)];
    let report = session
        .handle_message(ServerMessage::Snapshot(snapshot(2, 10, 0, &shop)))
        .unwrap();
    assert_eq!(report.healed_slots, vec![0]);

    session.request_purchase(1).unwrap();
    session.handle_message(buy_result(false));
    session.handle_message(ServerMessage::Snapshot(snapshot(3, 10, 0, &shop)));

    assert_eq!(session.displayed().unwrap().shop_slots[1], None);
    assert_eq!(session.engine().pending().unanswered_purchases(), 1);

    // Its own answer arrives; now it can heal
    session.handle_message(buy_result(false));
    session.handle_message(ServerMessage::Snapshot(snapshot(4, 10, 0, &shop)));
    assert_eq!(session.displayed().unwrap().shop_slots[1], Some(D));
    assert_eq!(session.engine().pending().unanswered_purchases(), 0);
}

#[test]
fn accepted_purchase_stays_hidden_until_confirmed() {
    let mut session = ShopSession::new(
        &ShopConfig::default(),
        RecordingSink::new(),
        StaticSession::in_game(1),
    );
    session.handle_message(ServerMessage::Snapshot(snapshot(1, 10, 0, &[Some(A), Some(B)])));
    session.request_purchase(0).unwrap();
    session.handle_message(buy_result(true));
    assert!(session.notices().is_empty());

    session.handle_message(ServerMessage::Snapshot(snapshot(2, 10, 0, &[Some(A), Some(B)])));
    assert_eq!(session.displayed().unwrap().shop_slots[0], None);

    let report = session
        .handle_message(ServerMessage::Snapshot(snapshot(3, 7, 0, &[None, Some(B)])))
        .unwrap();
    assert_eq!(report.confirmed_slots, vec![0]);
    assert_eq!(session.displayed().unwrap().gold, 7);
}
