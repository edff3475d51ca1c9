use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::caller::{Caller, CallerRow};
use crate::quota::UsageSnapshot;
use crate::store::ContextStore;

/// Postgres-backed store. Rows are projected with `to_jsonb` so the gateway stays
/// agnostic of column layout.
#[derive(Clone)]
pub struct PgContextStore {
    pool: PgPool,
}

impl PgContextStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_count(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

#[async_trait]
impl ContextStore for PgContextStore {
    async fn ensure_caller(&self, caller_id: &str) -> Result<Caller> {
        // Upsert-then-return: a no-op update makes RETURNING yield the existing row.
        let row: CallerRow = sqlx::query_as(
            r#"
            INSERT INTO callers (id, plan)
            VALUES ($1, 'free')
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING id, plan, created_at
            "#,
        )
        .bind(caller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_caller(&self, caller_id: &str) -> Result<Option<Caller>> {
        let row: Option<CallerRow> =
            sqlx::query_as("SELECT id, plan, created_at FROM callers WHERE id = $1")
                .bind(caller_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Caller::from))
    }

    async fn fetch_profile(&self, caller_id: &str) -> Result<Option<Value>> {
        let profile: Option<Value> =
            sqlx::query_scalar("SELECT to_jsonb(p) FROM profiles p WHERE p.user_id = $1")
                .bind(caller_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    async fn fetch_schools(&self, caller_id: &str) -> Result<Vec<Value>> {
        let schools: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT to_jsonb(s) || jsonb_build_object(
                'school_stats',
                COALESCE(
                    (SELECT jsonb_agg(to_jsonb(st) ORDER BY st.cycle_year DESC)
                     FROM school_stats st WHERE st.school_id = s.id),
                    '[]'::jsonb
                )
            )
            FROM user_schools us
            JOIN schools s ON s.id = us.school_id
            WHERE us.user_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(schools)
    }

    async fn fetch_applications(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>> {
        let applications: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT to_jsonb(a) FROM applications a
            WHERE a.user_id = $1 AND ($2::uuid IS NULL OR a.id = $2)
            ORDER BY a.created_at
            "#,
        )
        .bind(caller_id)
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn fetch_essays(&self, caller_id: &str) -> Result<Vec<Value>> {
        let essays: Vec<Value> = sqlx::query_scalar(
            "SELECT to_jsonb(e) FROM essays e WHERE e.user_id = $1 ORDER BY e.updated_at DESC",
        )
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(essays)
    }

    async fn fetch_memory(&self, caller_id: &str) -> Result<Vec<Value>> {
        let memory: Vec<Value> = sqlx::query_scalar(
            "SELECT to_jsonb(m) FROM coach_memory m WHERE m.user_id = $1 ORDER BY m.created_at",
        )
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memory)
    }

    async fn fetch_recommendations(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>> {
        let recommendations: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT to_jsonb(r) FROM recommendations r
            WHERE r.user_id = $1 AND ($2::uuid IS NULL OR r.application_id = $2)
            ORDER BY r.created_at
            "#,
        )
        .bind(caller_id)
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(recommendations)
    }

    async fn usage_snapshot(
        &self,
        caller_id: &str,
        month_start: DateTime<Utc>,
    ) -> Result<UsageSnapshot> {
        let (schools, essays, stories, variants, ai_calls): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM user_schools WHERE user_id = $1),
                    (SELECT COUNT(*) FROM essays WHERE user_id = $1),
                    (SELECT COUNT(*) FROM stories WHERE user_id = $1),
                    (SELECT COUNT(*) FROM essay_variants WHERE user_id = $1),
                    (SELECT COUNT(*) FROM ai_usage WHERE user_id = $1 AND created_at >= $2)
                "#,
            )
            .bind(caller_id)
            .bind(month_start)
            .fetch_one(&self.pool)
            .await?;

        Ok(UsageSnapshot {
            schools_count: to_count(schools),
            essays_count: to_count(essays),
            stories_count: to_count(stories),
            variants_count: to_count(variants),
            ai_calls_month: to_count(ai_calls),
        })
    }

    async fn record_ai_call(&self, caller_id: &str, feature: &str) -> Result<()> {
        sqlx::query("INSERT INTO ai_usage (user_id, feature) VALUES ($1, $2)")
            .bind(caller_id)
            .bind(feature)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_variants(
        &self,
        caller_id: &str,
        story_id: Uuid,
        school_id: Uuid,
    ) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM essay_variants
            WHERE user_id = $1 AND story_id = $2 AND school_id = $3
            "#,
        )
        .bind(caller_id)
        .bind(story_id)
        .bind(school_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(to_count(count))
    }
}
