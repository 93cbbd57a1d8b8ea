mod common;

use chrono::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use common::ScriptedJudge;
use pickjudge::config::AppConfig;
use pickjudge::db::pick_repo;
use pickjudge::services::sweep::run_sweep_with;
use pickjudge::AppState;

const YES: &str = r#"{"result":"yes","confidence":0.8,"reason":"final score confirmed"}"#;
const GARBLED: &str = "I could not find reliable sources for this one.";

async fn seed_named(pool: &sqlx::PgPool, name: &str, status: &str, expires_in: Duration) -> Uuid {
    let pick = common::seed_pick(pool, status, expires_in, None, None).await;
    sqlx::query("UPDATE picks SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(pick.id)
        .execute(pool)
        .await
        .unwrap();
    pick.id
}

/// Single test in this binary: the sweep works on every open and closed pick.
#[tokio::test]
async fn test_sweep_skips_failed_pick_and_keeps_going() {
    let pool = common::setup_test_db().await;
    sqlx::query("UPDATE picks SET status = 'settled' WHERE status IN ('open', 'closed') AND result IS NULL")
        .execute(&pool)
        .await
        .unwrap();

    let oldest = seed_named(&pool, "sweep-1", "closed", Duration::hours(-5)).await;
    let garbled = seed_named(&pool, "sweep-2", "closed", Duration::hours(-4)).await;
    let third = seed_named(&pool, "sweep-3", "closed", Duration::hours(-3)).await;
    let beyond_batch = seed_named(&pool, "sweep-4", "closed", Duration::hours(-2)).await;
    let expired_open = seed_named(&pool, "sweep-5", "open", Duration::minutes(-30)).await;
    let future_open = seed_named(&pool, "sweep-6", "open", Duration::hours(6)).await;

    let mut config = AppConfig::for_database(common::test_database_url());
    config.sweep_batch_size = 3;
    let state = AppState {
        db: pool.clone(),
        config,
        http: reqwest::Client::new(),
        metrics_handle: pickjudge::metrics::init_metrics(),
    };
    let judge = ScriptedJudge::new(&[YES, GARBLED, YES]);

    let report = run_sweep_with(&state, &judge, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.closed, 1);
    assert_eq!(report.scanned, 3);
    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(judge.markets(), vec!["sweep-1", "sweep-2", "sweep-3"]);

    let result = |id| {
        let pool = pool.clone();
        async move { pick_repo::get_pick(&pool, id).await.unwrap().unwrap() }
    };
    assert_eq!(result(oldest).await.result.as_deref(), Some("yes"));
    assert_eq!(result(garbled).await.result, None);
    assert_eq!(result(third).await.result.as_deref(), Some("yes"));
    assert_eq!(result(beyond_batch).await.result, None);

    let closed_now = result(expired_open).await;
    assert_eq!(closed_now.status, "closed");
    assert_eq!(closed_now.result, None);
    assert_eq!(result(future_open).await.status, "open");

    // The skipped pick comes back first on the next sweep
    let retry = ScriptedJudge::new(&[YES]);
    let report = run_sweep_with(&state, &retry, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.closed, 0);
    assert_eq!((report.processed, report.skipped), (3, 0));
    assert_eq!(retry.markets(), vec!["sweep-2", "sweep-4", "sweep-5"]);
}
