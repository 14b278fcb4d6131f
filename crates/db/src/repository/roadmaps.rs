//! Roadmap CRUD and tracking-column operations.
//!
//! The two `update_*` functions replace a whole JSONB column; they never
//! merge with what is stored.  [`modify_step_status`] is the one
//! read-modify-write path and holds a row lock for its duration.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{NewRoadmap, RoadmapRow, StatusLockRow, TrackingRow},
};

const ROADMAP_COLUMNS: &str =
    "id, user_id, job_role, skill_level, company, steps, node_positions, step_status, created_at";

/// Insert a new roadmap with empty tracking columns.
pub async fn create_roadmap(pool: &PgPool, new: NewRoadmap) -> Result<RoadmapRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, RoadmapRow>(&format!(
        r#"
        INSERT INTO roadmaps
            (id, user_id, job_role, skill_level, company, steps, node_positions, step_status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, '{{}}'::jsonb, '{{}}'::jsonb, $7)
        RETURNING {ROADMAP_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new.user_id)
    .bind(new.job_role)
    .bind(new.skill_level)
    .bind(new.company)
    .bind(new.steps)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single roadmap by its primary key.
pub async fn get_roadmap(pool: &PgPool, id: Uuid) -> Result<RoadmapRow, DbError> {
    let row = sqlx::query_as::<_, RoadmapRow>(&format!(
        "SELECT {ROADMAP_COLUMNS} FROM roadmaps WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Return roadmaps ordered by creation time (newest first), optionally for one user.
pub async fn list_roadmaps(pool: &PgPool, user_id: Option<Uuid>) -> Result<Vec<RoadmapRow>, DbError> {
    let rows = sqlx::query_as::<_, RoadmapRow>(&format!(
        r#"
        SELECT {ROADMAP_COLUMNS} FROM roadmaps
        WHERE $1::uuid IS NULL OR user_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Permanently delete a roadmap by its primary key.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_roadmap(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM roadmaps WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fetch only the tracked columns of a roadmap.
pub async fn get_tracking(pool: &PgPool, id: Uuid) -> Result<TrackingRow, DbError> {
    let row = sqlx::query_as::<_, TrackingRow>(
        "SELECT node_positions, step_status FROM roadmaps WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Replace the `step_status` column.
pub async fn update_step_status(
    pool: &PgPool,
    id: Uuid,
    step_status: serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE roadmaps SET step_status = $1 WHERE id = $2")
        .bind(step_status)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Replace the `node_positions` column.
pub async fn update_node_positions(
    pool: &PgPool,
    id: Uuid,
    node_positions: serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE roadmaps SET node_positions = $1 WHERE id = $2")
        .bind(node_positions)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Rewrite `step_status` from its current value inside one transaction.
///
/// The row is locked with `FOR UPDATE`, so concurrent callers for the same
/// roadmap are applied one after the other.  `modify` receives the stored
/// steps and status and returns the new status with a result for the caller,
/// or `None` to leave the row untouched.
pub async fn modify_step_status<F, T>(pool: &PgPool, id: Uuid, modify: F) -> Result<Option<T>, DbError>
where
    F: FnOnce(StatusLockRow) -> Result<Option<(serde_json::Value, T)>, serde_json::Error>,
{
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, StatusLockRow>(
        "SELECT steps, step_status FROM roadmaps WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let Some((step_status, output)) = modify(row)? else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query("UPDATE roadmaps SET step_status = $1 WHERE id = $2")
        .bind(step_status)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(output))
}
