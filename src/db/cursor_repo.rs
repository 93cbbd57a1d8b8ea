use sqlx::PgPool;

/// Read the claim cycle watermark. A missing row means "start at zero".
pub async fn get_claim_offset(pool: &PgPool) -> anyhow::Result<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT next_offset FROM claim_cycle_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|r| r.0).unwrap_or(0))
}

pub async fn set_claim_offset(pool: &PgPool, next_offset: i64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO claim_cycle_cursor (id, next_offset, updated_at)
        VALUES (1, $1, NOW())
        ON CONFLICT (id) DO UPDATE SET next_offset = $1, updated_at = NOW()
        "#,
    )
    .bind(next_offset)
    .execute(pool)
    .await?;

    Ok(())
}
