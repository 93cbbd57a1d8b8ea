use sqlx::{PgConnection, PgPool};

use crate::models::UserTotals;

/// Overwrite the stored totals for each wallet with freshly computed values.
/// Runs on the caller's connection; wrap it in a transaction for atomicity.
pub async fn upsert_totals(conn: &mut PgConnection, totals: &[UserTotals]) -> anyhow::Result<()> {
    for t in totals {
        sqlx::query(
            r#"
            INSERT INTO user_totals (wallet, win_count, loss_count, win_amount, loss_amount, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (wallet) DO UPDATE
            SET win_count = EXCLUDED.win_count,
                loss_count = EXCLUDED.loss_count,
                win_amount = EXCLUDED.win_amount,
                loss_amount = EXCLUDED.loss_amount,
                updated_at = NOW()
            "#,
        )
        .bind(&t.wallet)
        .bind(t.win_count)
        .bind(t.loss_count)
        .bind(t.win_amount)
        .bind(t.loss_amount)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn get_totals(pool: &PgPool, wallet: &str) -> anyhow::Result<Option<UserTotals>> {
    let row = sqlx::query_as::<_, UserTotals>("SELECT * FROM user_totals WHERE wallet = $1")
        .bind(wallet)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}
