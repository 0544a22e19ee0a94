//! Event-store backed repositories: version checks, event hand-off, lookups.

#![allow(clippy::unwrap_used)] // Panics: test fixtures

use hustlex_core::money::{Currency, Money};
use hustlex_core::stream::{StreamId, Version};
use hustlex_ledger::circle::{Circle, CircleType, Frequency, NewCircle};
use hustlex_ledger::repository::{
    CircleRepository, InMemoryCircleRepository, InMemoryWalletRepository, RepositoryError,
    WalletRepository,
};
use hustlex_ledger::wallet::{Wallet, WalletEvent};
use hustlex_ledger::{AggregateRoot, CirclePolicy, UserId, WalletId};
use hustlex_testing::{InMemoryEventBus, InMemoryEventStore, init_test_tracing, test_clock};
use std::sync::Arc;

const WALLET_TOPIC: &str = "wallet-events";
const CIRCLE_TOPIC: &str = "circle-events";

fn ngn(amount: u64) -> Money {
    Money::new(amount, Currency::Ngn)
}

struct Fixture {
    store: Arc<InMemoryEventStore>,
    bus: Arc<InMemoryEventBus>,
    wallets: InMemoryWalletRepository,
    circles: InMemoryCircleRepository,
}

fn fixture() -> Fixture {
    init_test_tracing();
    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(InMemoryEventBus::new());
    Fixture {
        wallets: InMemoryWalletRepository::new(store.clone(), bus.clone(), WALLET_TOPIC),
        circles: InMemoryCircleRepository::new(store.clone(), bus.clone(), CIRCLE_TOPIC),
        store,
        bus,
    }
}

fn wallet_stream(id: WalletId) -> StreamId {
    StreamId::for_aggregate("wallet", id)
}

#[tokio::test]
async fn save_stores_snapshot_and_hands_off_events() {
    let fx = fixture();
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);
    wallet
        .credit(ngn(5_000), "bank_transfer", "DEP-1", "Top up", &clock)
        .unwrap();

    fx.wallets.save(&mut wallet).await.unwrap();

    assert!(wallet.pending_events().is_empty());
    assert!(!wallet.has_changes());
    assert_eq!(wallet.persisted_version(), Some(Version::new(2)));

    let stream = wallet_stream(wallet.id());
    assert_eq!(
        fx.store.event_types(&stream),
        ["WalletCreated.v1", "WalletCredited.v1"]
    );
    assert_eq!(fx.store.snapshot_version(&stream), Some(Version::new(2)));
    assert_eq!(
        fx.bus.published_types(WALLET_TOPIC),
        ["WalletCreated.v1", "WalletCredited.v1"]
    );

    let stored = fx.store.events(&stream);
    assert_eq!(stored[1].metadata_str("aggregate_type"), Some("wallet"));
    assert_eq!(
        stored[1].metadata_str("aggregate_id"),
        Some(wallet.id().to_string().as_str())
    );
    assert!(matches!(
        stored[1].decode::<WalletEvent>().unwrap(),
        WalletEvent::WalletCredited { amount, .. } if amount == ngn(5_000)
    ));
}

#[tokio::test]
async fn reload_restores_state_without_events() {
    let fx = fixture();
    let clock = test_clock();
    let user = UserId::new();
    let mut wallet = Wallet::open(user, Currency::Ngn, &clock);
    wallet
        .credit(ngn(700), "bank_transfer", "DEP-1", "", &clock)
        .unwrap();
    fx.wallets.save(&mut wallet).await.unwrap();

    let by_id = fx.wallets.find_by_id(wallet.id()).await.unwrap();
    let by_user = fx.wallets.find_by_user_id(user).await.unwrap();

    assert_eq!(by_id.snapshot(), wallet.snapshot());
    assert_eq!(by_user.id(), wallet.id());
    assert!(by_id.pending_events().is_empty());
    assert!(fx.wallets.exists_for_user(user).await.unwrap());
    assert!(!fx.wallets.exists_for_user(UserId::new()).await.unwrap());
}

#[tokio::test]
async fn missing_wallet_is_not_found() {
    let fx = fixture();
    assert!(matches!(
        fx.wallets.find_by_id(WalletId::new()).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(
        fx.wallets.find_by_user_id(UserId::new()).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn stale_copy_loses_the_version_race() {
    let fx = fixture();
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);
    wallet.credit(ngn(1_000), "bank", "DEP-1", "", &clock).unwrap();
    fx.wallets.save(&mut wallet).await.unwrap();

    let mut first = fx.wallets.find_by_id(wallet.id()).await.unwrap();
    let mut second = fx.wallets.find_by_id(wallet.id()).await.unwrap();

    first.debit(ngn(600), "acct", "TX-1", "", ngn(0), &clock).unwrap();
    second.debit(ngn(600), "acct", "TX-2", "", ngn(0), &clock).unwrap();

    fx.wallets.save(&mut first).await.unwrap();
    let err = fx.wallets.save(&mut second).await.unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::ConcurrentModification { expected, actual }
            if expected == Version::new(2) && actual == Version::new(3)
    ));
    assert_eq!(second.pending_events().len(), 1);

    let stored = fx.wallets.find_by_id(wallet.id()).await.unwrap();
    assert_eq!(stored.available_balance(), ngn(400));
    assert_eq!(fx.store.events(&wallet_stream(wallet.id())).len(), 3);
}

#[tokio::test]
async fn second_wallet_for_a_user_is_rejected() {
    let fx = fixture();
    let clock = test_clock();
    let user = UserId::new();
    let mut first = Wallet::open(user, Currency::Ngn, &clock);
    let mut second = Wallet::open(user, Currency::Usd, &clock);

    fx.wallets.save(&mut first).await.unwrap();

    assert!(matches!(
        fx.wallets.save(&mut second).await,
        Err(RepositoryError::AlreadyExists(_))
    ));
    assert!(fx.store.events(&wallet_stream(second.id())).is_empty());
    assert_eq!(fx.store.snapshot_version(&wallet_stream(second.id())), None);
    assert_eq!(fx.wallets.find_by_user_id(user).await.unwrap().id(), first.id());
}

#[tokio::test]
async fn failed_snapshot_write_leaves_the_stream_untouched() {
    let fx = fixture();
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);
    fx.wallets.save(&mut wallet).await.unwrap();
    let stream = wallet_stream(wallet.id());

    wallet.credit(ngn(5_000), "bank", "DEP-1", "", &clock).unwrap();
    fx.store.fail_snapshot_writes(true);

    assert!(matches!(
        fx.wallets.save(&mut wallet).await,
        Err(RepositoryError::EventStore(_))
    ));
    assert_eq!(fx.store.event_types(&stream), ["WalletCreated.v1"]);
    assert_eq!(fx.store.snapshot_version(&stream), Some(Version::new(1)));
    assert_eq!(wallet.pending_events().len(), 1);

    fx.store.fail_snapshot_writes(false);
    fx.wallets.save(&mut wallet).await.unwrap();

    assert_eq!(
        fx.store.event_types(&stream),
        ["WalletCreated.v1", "WalletCredited.v1"]
    );
    assert_eq!(
        fx.wallets.find_by_id(wallet.id()).await.unwrap().available_balance(),
        ngn(5_000)
    );
    assert_eq!(
        fx.bus.published_types(WALLET_TOPIC),
        ["WalletCreated.v1", "WalletCredited.v1"]
    );
}

#[tokio::test]
async fn lookups_are_shared_through_the_store() {
    let fx = fixture();
    let clock = test_clock();
    let user = UserId::new();
    let mut wallet = Wallet::open(user, Currency::Ngn, &clock);
    fx.wallets.save(&mut wallet).await.unwrap();

    let other = InMemoryWalletRepository::new(fx.store.clone(), fx.bus.clone(), WALLET_TOPIC);
    assert!(other.exists_for_user(user).await.unwrap());
    assert_eq!(other.find_by_user_id(user).await.unwrap().id(), wallet.id());

    let mut duplicate = Wallet::open(user, Currency::Ngn, &clock);
    assert!(matches!(
        other.save(&mut duplicate).await,
        Err(RepositoryError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn failed_first_save_does_not_reserve_the_user() {
    let fx = fixture();
    let clock = test_clock();
    let user = UserId::new();
    let mut abandoned = Wallet::open(user, Currency::Ngn, &clock);

    fx.store.fail_snapshot_writes(true);
    assert!(fx.wallets.save(&mut abandoned).await.is_err());
    fx.store.fail_snapshot_writes(false);
    assert!(!fx.wallets.exists_for_user(user).await.unwrap());

    let mut replacement = Wallet::open(user, Currency::Ngn, &clock);
    fx.wallets.save(&mut replacement).await.unwrap();
    assert_eq!(
        fx.wallets.find_by_user_id(user).await.unwrap().id(),
        replacement.id()
    );
}

#[tokio::test]
async fn unchanged_wallet_saves_nothing() {
    let fx = fixture();
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);
    fx.wallets.save(&mut wallet).await.unwrap();

    let mut reloaded = fx.wallets.find_by_id(wallet.id()).await.unwrap();
    fx.wallets.save(&mut reloaded).await.unwrap();

    assert_eq!(fx.bus.total_published(), 1);
}

#[tokio::test]
async fn publish_failure_does_not_fail_the_save() {
    let fx = fixture();
    fx.bus.fail_publishes(true);
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);

    fx.wallets.save(&mut wallet).await.unwrap();

    assert!(!wallet.has_changes());
    assert_eq!(fx.bus.total_published(), 0);
    assert_eq!(
        fx.store.event_types(&wallet_stream(wallet.id())),
        ["WalletCreated.v1"]
    );
}

#[tokio::test]
async fn store_failure_keeps_pending_events() {
    let fx = fixture();
    fx.store.fail_writes(true);
    let clock = test_clock();
    let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);

    assert!(matches!(
        fx.wallets.save(&mut wallet).await,
        Err(RepositoryError::EventStore(_))
    ));
    assert_eq!(wallet.pending_events().len(), 1);
    assert_eq!(wallet.persisted_version(), None);
    assert_eq!(fx.bus.total_published(), 0);
}

#[tokio::test]
async fn circle_round_trips_and_is_found_by_invite_code() {
    let fx = fixture();
    let clock = test_clock();
    let params = NewCircle {
        name: "Yaba tech bros".to_string(),
        description: String::new(),
        circle_type: CircleType::Rotational,
        contribution_amount: ngn(5_000),
        frequency: Frequency::Monthly,
        max_members: 3,
        total_rounds: 3,
        is_private: true,
        invite_code: Some("YABA2025".to_string()),
    };
    let mut circle = Circle::create(params, UserId::new(), &clock, CirclePolicy::default()).unwrap();
    circle.add_member(UserId::new(), &clock).unwrap();
    fx.circles.save(&mut circle).await.unwrap();

    let loaded = fx.circles.find_by_invite_code("YABA2025").await.unwrap();
    assert_eq!(loaded.snapshot(), circle.snapshot());
    assert_eq!(
        fx.bus.published_types(CIRCLE_TOPIC),
        ["CircleCreated.v1", "MemberJoined.v1"]
    );
    assert!(matches!(
        fx.circles.find_by_invite_code("NOPE").await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn invite_code_belongs_to_one_circle() {
    let fx = fixture();
    let clock = test_clock();
    let params = || NewCircle {
        name: "Surulere ajo".to_string(),
        description: String::new(),
        circle_type: CircleType::Rotational,
        contribution_amount: ngn(2_000),
        frequency: Frequency::Weekly,
        max_members: 4,
        total_rounds: 4,
        is_private: true,
        invite_code: Some("SURU2025".to_string()),
    };
    let mut first = Circle::create(params(), UserId::new(), &clock, CirclePolicy::default()).unwrap();
    let mut second = Circle::create(params(), UserId::new(), &clock, CirclePolicy::default()).unwrap();

    fx.circles.save(&mut first).await.unwrap();

    let other = InMemoryCircleRepository::new(fx.store.clone(), fx.bus.clone(), CIRCLE_TOPIC);
    assert!(matches!(
        other.save(&mut second).await,
        Err(RepositoryError::AlreadyExists(_))
    ));
    assert_eq!(other.find_by_invite_code("SURU2025").await.unwrap().id(), first.id());
}
