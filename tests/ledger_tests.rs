mod common;

use chrono::Duration;
use rust_decimal::Decimal;

use common::{StaticChain, ONE};
use pickjudge::db::{ledger_repo, totals_repo};
use pickjudge::errors::AppError;
use pickjudge::models::{NewWinLossEvent, Side};
use pickjudge::models::ledger_outcome::{LOSS, WIN};
use pickjudge::services::ledger::{build_ledger, store_ledger};
use pickjudge::services::totals::refresh_totals;

#[tokio::test]
async fn test_rebuild_replaces_rows_identically() {
    let pool = common::setup_test_db().await;
    let pick = common::seed_pick(&pool, "claiming", Duration::hours(-1), Some("yes"), Some(common::MARKET)).await;
    let alice = common::unique_wallet();
    let bob = common::unique_wallet();

    let chain = StaticChain::at(pick.expires_at, 10_000)
        .with_bought(9_990, &alice, true, 2 * ONE)
        .with_bought(9_991, &alice, true, ONE)
        .with_bought(9_995, &bob, false, 5 * ONE)
        // Bob hedged; the yes stake is a separate row
        .with_bought(9_996, &bob, true, ONE / 2);

    let first = build_ledger(&pool, &chain, common::scan_params(), pick.id).await.unwrap();
    let rows_first = ledger_repo::get_events_for_pick(&pool, pick.id).await.unwrap();

    let second = build_ledger(&pool, &chain, common::scan_params(), pick.id).await.unwrap();
    let rows_second = ledger_repo::get_events_for_pick(&pool, pick.id).await.unwrap();

    assert_eq!(first.winners, 2);
    assert_eq!(first.losers, 1);
    assert_eq!((second.winners, second.losers), (first.winners, first.losers));

    let key = |rows: &[pickjudge::models::WinLossEvent]| {
        rows.iter()
            .map(|r| (r.wallet.clone(), r.side.clone(), r.outcome.clone(), r.amount))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&rows_first[..]), key(&rows_second[..]));
    assert_eq!(rows_second.len(), 3);

    let alice_yes = rows_second.iter().find(|r| r.wallet == alice).unwrap();
    assert_eq!(alice_yes.outcome, WIN);
    assert_eq!(alice_yes.amount, Decimal::from(3));

    let bob_no = rows_second
        .iter()
        .find(|r| r.wallet == bob && r.side == "no")
        .unwrap();
    assert_eq!(bob_no.outcome, LOSS);
    assert_eq!(bob_no.amount, Decimal::from(5));
}

#[tokio::test]
async fn test_no_logs_is_not_found_yet_and_keeps_existing_rows() {
    let pool = common::setup_test_db().await;
    let pick = common::seed_pick(&pool, "claiming", Duration::hours(-1), Some("no"), Some(common::MARKET)).await;
    let wallet = common::unique_wallet();
    store_ledger(
        &pool,
        pick.id,
        &[NewWinLossEvent {
            wallet: wallet.clone(),
            side: Side::No,
            outcome: WIN,
            amount: Decimal::from(7),
        }],
    )
    .await
    .unwrap();

    let empty_chain = StaticChain::at(pick.expires_at, 10_000);
    let err = build_ledger(&pool, &empty_chain, common::scan_params(), pick.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotYetAvailable(_)), "{err:?}");
    assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);

    let rows = ledger_repo::get_events_for_pick(&pool, pick.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].wallet, wallet);
}

#[tokio::test]
async fn test_void_or_unresolved_pick_has_no_ledger() {
    let pool = common::setup_test_db().await;
    let void = common::seed_pick(&pool, "closed", Duration::hours(-1), Some("void"), Some(common::MARKET)).await;
    let open = common::seed_pick(&pool, "closed", Duration::hours(-1), None, Some(common::MARKET)).await;
    let no_contract = common::seed_pick(&pool, "closed", Duration::hours(-1), Some("yes"), None).await;
    let chain = StaticChain::at(void.expires_at, 10_000);

    for id in [void.id, open.id, no_contract.id] {
        let err = build_ledger(&pool, &chain, common::scan_params(), id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    }

    let err = build_ledger(&pool, &chain, common::scan_params(), uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_totals_sum_across_picks() {
    let pool = common::setup_test_db().await;
    let a = common::seed_pick(&pool, "claiming", Duration::hours(-3), Some("yes"), Some(common::MARKET)).await;
    let b = common::seed_pick(&pool, "claiming", Duration::hours(-1), Some("yes"), Some(common::MARKET)).await;
    let user = common::unique_wallet();

    store_ledger(
        &pool,
        a.id,
        &[NewWinLossEvent {
            wallet: user.clone(),
            side: Side::Yes,
            outcome: WIN,
            amount: Decimal::from(100),
        }],
    )
    .await
    .unwrap();
    store_ledger(
        &pool,
        b.id,
        &[NewWinLossEvent {
            wallet: user.clone(),
            side: Side::No,
            outcome: LOSS,
            amount: Decimal::from(50),
        }],
    )
    .await
    .unwrap();

    let summary = refresh_totals(&pool, b.id).await.unwrap();
    assert_eq!(summary.users_updated, 1);

    let totals = totals_repo::get_totals(&pool, &user).await.unwrap().unwrap();
    assert_eq!(totals.win_count, 1);
    assert_eq!(totals.loss_count, 1);
    assert_eq!(totals.win_amount, Decimal::from(100));
    assert_eq!(totals.loss_amount, Decimal::from(50));

    // Recompute is a full refresh, not an increment
    refresh_totals(&pool, a.id).await.unwrap();
    let again = totals_repo::get_totals(&pool, &user).await.unwrap().unwrap();
    assert_eq!((again.win_count, again.loss_count), (1, 1));
}

#[tokio::test]
async fn test_rebuild_recomputes_totals_for_wallets_that_left_the_ledger() {
    let pool = common::setup_test_db().await;
    let pick = common::seed_pick(&pool, "claiming", Duration::hours(-1), Some("yes"), Some(common::MARKET)).await;
    let gone = common::unique_wallet();
    let stays = common::unique_wallet();

    store_ledger(
        &pool,
        pick.id,
        &[NewWinLossEvent {
            wallet: gone.clone(),
            side: Side::Yes,
            outcome: WIN,
            amount: Decimal::from(100),
        }],
    )
    .await
    .unwrap();
    refresh_totals(&pool, pick.id).await.unwrap();
    let before = totals_repo::get_totals(&pool, &gone).await.unwrap().unwrap();
    assert_eq!((before.win_count, before.win_amount), (1, Decimal::from(100)));

    // The chain now only knows about the other wallet
    let chain = StaticChain::at(pick.expires_at, 10_000).with_bought(9_999, &stays, true, 4 * ONE);
    build_ledger(&pool, &chain, common::scan_params(), pick.id).await.unwrap();
    refresh_totals(&pool, pick.id).await.unwrap();

    let events_for_gone = ledger_repo::get_events_for_wallets(&pool, &[gone.clone()]).await.unwrap();
    assert!(events_for_gone.is_empty());
    let after = totals_repo::get_totals(&pool, &gone).await.unwrap().unwrap();
    assert_eq!((after.win_count, after.loss_count), (0, 0));
    assert_eq!(after.win_amount, Decimal::ZERO);

    let current = totals_repo::get_totals(&pool, &stays).await.unwrap().unwrap();
    assert_eq!((current.win_count, current.win_amount), (1, Decimal::from(4)));
}
