use sqlx::PgPool;

use crate::db::{cursor_repo, follow_up_repo, pick_repo};
use crate::models::FollowUpKind;

/// One page of the claim cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimWindow {
    pub offset: i64,
    pub limit: i64,
    /// Where the next sweep starts; 0 once the end of the list is reached.
    pub next_offset: i64,
}

/// Pick the page to visit given the stored watermark.
///
/// A watermark past the end (the list shrank) wraps to the start. When the
/// page reaches the end of the list, the next page wraps to the start.
pub fn claim_window(offset: i64, total: i64, page_size: i64) -> ClaimWindow {
    let page_size = page_size.max(1);
    let total = total.max(0);
    let offset = if offset < 0 || offset >= total { 0 } else { offset };

    let limit = page_size.min(total - offset);
    let end = offset + limit;
    let next_offset = if end >= total { 0 } else { end };

    ClaimWindow {
        offset,
        limit,
        next_offset,
    }
}

/// Visit the next page of picks awaiting payouts and queue a claim for each.
/// Returns how many claims were queued.
pub async fn run_claim_cycle(pool: &PgPool, page_size: i64) -> anyhow::Result<usize> {
    let stored = cursor_repo::get_claim_offset(pool).await?;
    let total = pick_repo::count_claiming(pool).await?;
    let window = claim_window(stored, total, page_size);

    if window.limit == 0 {
        cursor_repo::set_claim_offset(pool, 0).await?;
        return Ok(0);
    }

    let picks = pick_repo::get_claiming_page(pool, window.offset, window.limit).await?;
    let mut queued = 0;
    for pick in &picks {
        match follow_up_repo::enqueue(pool, pick.id, FollowUpKind::Claim).await {
            Ok(true) => queued += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, pick_id = %pick.id, "Failed to queue claim");
            }
        }
    }

    cursor_repo::set_claim_offset(pool, window.next_offset).await?;

    tracing::info!(
        offset = window.offset,
        next_offset = window.next_offset,
        total,
        queued,
        "Claim cycle page processed"
    );

    Ok(queued)
}
