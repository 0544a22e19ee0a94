//! End-to-end circle lifecycles driven through the public API.

#![allow(clippy::unwrap_used)] // Panics: test fixtures

use chrono::Duration;
use hustlex_core::event::Event;
use hustlex_core::money::{Currency, Money};
use hustlex_ledger::circle::{
    Circle, CircleError, CircleEvent, CircleStatus, CircleType, ContributionStatus, Frequency,
    NewCircle,
};
use hustlex_ledger::{AggregateRoot, CirclePolicy, MemberId, TransactionId, UserId};
use hustlex_testing::{ManualClock, manual_clock, test_epoch};

fn ngn(amount: u64) -> Money {
    Money::new(amount, Currency::Ngn)
}

fn weekly(max_members: u32, total_rounds: u32) -> NewCircle {
    NewCircle {
        name: "Balogun traders".to_string(),
        description: "Weekly ajo for shop owners".to_string(),
        circle_type: CircleType::Rotational,
        contribution_amount: ngn(1_000),
        frequency: Frequency::Weekly,
        max_members,
        total_rounds,
        is_private: false,
        invite_code: None,
    }
}

/// A full circle, started automatically when the last member joined.
fn started_circle(members: u32, total_rounds: u32, clock: &ManualClock) -> Circle {
    let mut circle =
        Circle::create(weekly(members, total_rounds), UserId::new(), clock, CirclePolicy::default())
            .unwrap();
    for _ in 1..members {
        circle.add_member(UserId::new(), clock).unwrap();
    }
    assert_eq!(circle.status(), CircleStatus::Active);
    circle.take_events();
    circle
}

fn member_at(circle: &Circle, position: u32) -> MemberId {
    circle.find_member_by_position(position).unwrap().id()
}

fn pay_round(circle: &mut Circle, clock: &ManualClock) {
    for position in 1..=circle.current_members() {
        let member = member_at(circle, position);
        circle
            .record_contribution(member, TransactionId::new(), clock)
            .unwrap();
    }
}

#[test]
fn first_round_pays_position_one_and_schedules_the_next() {
    let clock = manual_clock();
    let mut circle = started_circle(3, 3, &clock);
    let first = circle.find_member_by_position(1).unwrap().clone();
    assert_eq!(circle.next_payout_date(), Some(test_epoch() + Duration::days(7)));

    pay_round(&mut circle, &clock);

    let events = circle.take_events();
    let payout = events
        .iter()
        .find_map(|e| match e {
            CircleEvent::PayoutTriggered {
                recipient_member_id,
                recipient_user_id,
                round,
                amount,
                ..
            } => Some((*recipient_member_id, *recipient_user_id, *round, *amount)),
            _ => None,
        })
        .unwrap();
    assert_eq!(payout, (first.id(), first.user_id(), 1, ngn(3_000)));

    let types: Vec<_> = events.iter().map(Event::event_type).collect();
    assert_eq!(
        types,
        [
            "ContributionMade.v1",
            "ContributionMade.v1",
            "ContributionMade.v1",
            "PayoutTriggered.v1",
            "RoundCompleted.v1",
        ]
    );

    assert_eq!(circle.current_round(), 2);
    assert!(circle.pool_balance().is_zero());
    assert_eq!(circle.total_saved(), ngn(3_000));
    assert!(circle.find_member(first.id()).unwrap().has_received());

    let next = circle.contributions_for_round(2);
    assert_eq!(next.len(), 3);
    assert!(next.iter().all(|c| c.status() == ContributionStatus::Pending));
}

#[test]
fn late_payment_carries_five_percent_fee() {
    let clock = manual_clock();
    let mut circle = started_circle(3, 3, &clock);
    let member = member_at(&circle, 2);

    clock.advance(Duration::days(10));
    let receipt = circle
        .record_contribution(member, TransactionId::new(), &clock)
        .unwrap();

    assert_eq!(receipt.late_fee(), ngn(50));
    assert_eq!(circle.pool_balance(), ngn(1_050));
    assert_eq!(circle.total_saved(), ngn(1_050));
    assert_eq!(
        circle.find_member(member).unwrap().total_contributed(),
        ngn(1_050)
    );
}

#[test]
fn payment_on_the_due_date_is_not_late() {
    let clock = manual_clock();
    let mut circle = started_circle(2, 2, &clock);
    let member = member_at(&circle, 1);

    clock.advance(Duration::days(7));
    let receipt = circle
        .record_contribution(member, TransactionId::new(), &clock)
        .unwrap();

    assert!(receipt.late_fee().is_zero());
    assert_eq!(circle.pool_balance(), ngn(1_000));
}

#[test]
fn last_round_completes_the_circle() {
    let clock = manual_clock();
    let mut circle = started_circle(2, 2, &clock);

    pay_round(&mut circle, &clock);
    pay_round(&mut circle, &clock);

    assert_eq!(circle.status(), CircleStatus::Completed);
    assert_eq!(circle.current_round(), 3);
    assert_eq!(circle.total_saved(), ngn(4_000));
    assert_eq!(circle.next_payout_date(), None);
    assert!(circle.members().iter().all(|m| m.has_received()));
    assert!(matches!(
        circle.take_events().last(),
        Some(CircleEvent::CircleCompleted { total_rounds: 2, .. })
    ));

    let member = member_at(&circle, 1);
    assert_eq!(
        circle.record_contribution(member, TransactionId::new(), &clock),
        Err(CircleError::CircleNotActive)
    );
}

#[test]
fn rotation_wraps_into_a_new_cycle() {
    let clock = manual_clock();
    let mut circle = started_circle(2, 4, &clock);
    let first = member_at(&circle, 1);
    let second = member_at(&circle, 2);

    pay_round(&mut circle, &clock);
    pay_round(&mut circle, &clock);
    assert_eq!(circle.current_round(), 3);
    assert!(circle.members().iter().all(|m| !m.has_received()));

    circle.take_events();
    pay_round(&mut circle, &clock);
    let recipient = circle.take_events().into_iter().find_map(|e| match e {
        CircleEvent::PayoutTriggered {
            recipient_member_id,
            ..
        } => Some(recipient_member_id),
        _ => None,
    });
    assert_eq!(recipient, Some(first));
    assert_eq!(circle.recipient_for_round(4).map(|m| m.id()), Some(second));
}

#[test]
fn overdue_sweep_flags_unpaid_members_once() {
    let clock = manual_clock();
    let mut circle = started_circle(3, 3, &clock);
    let paid = member_at(&circle, 1);
    circle
        .record_contribution(paid, TransactionId::new(), &clock)
        .unwrap();

    assert_eq!(circle.mark_overdue_contributions(&clock), Ok(0));

    clock.advance(Duration::days(8));
    circle.take_events();
    let version = circle.version();
    assert_eq!(circle.mark_overdue_contributions(&clock), Ok(2));
    assert_eq!(circle.version(), version.next());
    assert_eq!(circle.take_events().len(), 2);

    let late = member_at(&circle, 2);
    assert_eq!(circle.find_member(late).unwrap().missed_payments(), 1);
    assert_eq!(circle.find_member(paid).unwrap().missed_payments(), 0);
    assert_eq!(circle.pending_contributions(late).len(), 1);

    assert_eq!(circle.mark_overdue_contributions(&clock), Ok(0));

    let receipt = circle
        .record_contribution(late, TransactionId::new(), &clock)
        .unwrap();
    assert_eq!(receipt.status(), ContributionStatus::Paid);
    assert_eq!(receipt.late_fee(), ngn(50));
}

#[test]
fn round_waits_for_the_last_contribution() {
    let clock = manual_clock();
    let mut circle = started_circle(3, 3, &clock);
    let last = member_at(&circle, 3);
    for position in 1..=2 {
        let member = member_at(&circle, position);
        circle
            .record_contribution(member, TransactionId::new(), &clock)
            .unwrap();
    }

    assert_eq!(circle.current_round(), 1);
    assert_eq!(circle.pool_balance(), ngn(2_000));
    let types: Vec<_> = circle.take_events().iter().map(Event::event_type).collect();
    assert_eq!(types, ["ContributionMade.v1", "ContributionMade.v1"]);

    clock.advance(Duration::days(8));
    assert_eq!(circle.mark_overdue_contributions(&clock), Ok(1));
    assert_eq!(circle.current_round(), 1);
    assert_eq!(circle.pool_balance(), ngn(2_000));
    assert!(circle.take_events().iter().all(|e| !matches!(
        e,
        CircleEvent::PayoutTriggered { .. } | CircleEvent::RoundCompleted { .. }
    )));
    assert_eq!(circle.contributions_for_round(2).len(), 0);

    circle
        .record_contribution(last, TransactionId::new(), &clock)
        .unwrap();

    assert_eq!(circle.current_round(), 2);
    assert!(circle.take_events().iter().any(|e| matches!(
        e,
        CircleEvent::PayoutTriggered { round: 1, amount, .. } if *amount == ngn(3_050)
    )));
}

#[test]
fn departure_before_start_keeps_positions_contiguous() {
    let clock = manual_clock();
    let admin = UserId::new();
    let mut circle =
        Circle::create(weekly(4, 4), admin, &clock, CirclePolicy::default()).unwrap();
    let users: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();
    circle.add_member(users[0], &clock).unwrap();
    circle.add_member(users[1], &clock).unwrap();

    circle.remove_member(users[0], &clock).unwrap();
    circle.add_member(users[2], &clock).unwrap();

    let positions: Vec<u32> = circle
        .members()
        .iter()
        .filter(|m| m.is_active())
        .map(|m| m.position())
        .collect();
    assert_eq!(positions, [1, 2, 3]);
    assert_eq!(
        circle.find_member_by_user(users[2]).map(|m| m.position()),
        Some(3)
    );

    circle.start(&clock).unwrap();
    assert_eq!(circle.contributions_for_round(1).len(), 3);
}

#[test]
fn cancelled_circle_keeps_its_pool() {
    let clock = manual_clock();
    let mut circle =
        Circle::create(weekly(3, 3), UserId::new(), &clock, CirclePolicy::default()).unwrap();
    let admin = circle.created_by();
    circle.add_member(UserId::new(), &clock).unwrap();
    circle.start(&clock).unwrap();
    let member = member_at(&circle, 2);
    circle
        .record_contribution(member, TransactionId::new(), &clock)
        .unwrap();

    circle.cancel(admin, "members relocated", &clock).unwrap();

    assert_eq!(circle.status(), CircleStatus::Cancelled);
    assert_eq!(circle.pool_balance(), ngn(1_000));
    assert!(matches!(
        circle.pending_events().last(),
        Some(CircleEvent::CircleCancelled { pool_balance, .. }) if *pool_balance == ngn(1_000)
    ));
}
