//! Typed client for the Supabase record store (PostgREST dialect).
//!
//! ## Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/rest/v1/{table}?…` | Filtered select |
//! | POST   | `/rest/v1/{table}` | Insert (`Prefer: return=representation`) |
//! | PATCH  | `/rest/v1/{table}?…` | Filtered update |
//! | POST   | `/rest/v1/rpc/increment_points` | Atomic point increment |
//!
//! A `409 Conflict` on insert is a unique-constraint violation.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use streetcred_core::{
    Badge, BadgeId, BadgePool, EarnedBadge, NewBadge, NewReport, PointsChange, Profile, Report,
    UserBadge, UserId, SPONSOR_LOCATIONS,
};
use streetcred_rewards::{AwardInsert, RecordStore, StoreError};

use crate::error::ClientError;
use crate::retry::{self, Retry};
use crate::postgrest::{Order, Query};

const REST_PREFIX: &str = "rest/v1";

const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Deserialize)]
struct MilestoneRow {
    milestone: u32,
}

#[derive(Debug, Deserialize)]
struct PointsRow {
    previous_points: i64,
    new_points: i64,
}

#[derive(Debug, Serialize)]
struct AwardRow<'a> {
    user_id: &'a UserId,
    badge_id: BadgeId,
    milestone: u32,
}

#[derive(Debug, Serialize)]
struct IncrementArgs<'a> {
    p_user_id: &'a UserId,
    p_delta: u32,
}

/// Outcome of a single-row insert that may hit a unique constraint.
enum Inserted<T> {
    Row(T),
    Conflict,
}

/// Client for the `profiles`, `badges`, `user_badges` and `reports` tables.
#[derive(Debug, Clone)]
pub struct SupabaseRecords {
    http: reqwest::Client,
    base_url: url::Url,
}

impl SupabaseRecords {
    pub(crate) fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            REST_PREFIX,
            path
        )
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, ClientError> {
        let endpoint = format!("GET /{REST_PREFIX}/{table}");
        let url = self.url(table);
        let resp = retry::send(Retry::Idempotent, || {
            self.http.get(&url).query(query.pairs()).send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        decode(endpoint, resp).await
    }

    async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Inserted<T>, ClientError> {
        let endpoint = format!("POST /{REST_PREFIX}/{table}");
        let url = self.url(table);
        let resp = retry::send(Retry::ConnectOnly, || {
            self.http
                .post(&url)
                .header("Prefer", PREFER_REPRESENTATION)
                .json(body)
                .send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if resp.status() == reqwest::StatusCode::CONFLICT {
            return Ok(Inserted::Conflict);
        }
        let rows: Vec<T> = decode(endpoint.clone(), resp).await?;
        rows.into_iter()
            .next()
            .map(Inserted::Row)
            .ok_or(ClientError::Unexpected {
                endpoint,
                detail: "insert returned no row".to_string(),
            })
    }

    async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &Query,
        body: &B,
    ) -> Result<Vec<T>, ClientError> {
        let endpoint = format!("PATCH /{REST_PREFIX}/{table}");
        let url = self.url(table);
        let resp = retry::send(Retry::ConnectOnly, || {
            self.http
                .patch(&url)
                .query(query.pairs())
                .header("Prefer", PREFER_REPRESENTATION)
                .json(body)
                .send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        decode(endpoint, resp).await
    }

    async fn rpc<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        function: &str,
        args: &B,
    ) -> Result<T, ClientError> {
        let endpoint = format!("POST /{REST_PREFIX}/rpc/{function}");
        let url = self.url(&format!("rpc/{function}"));
        let resp = retry::send(Retry::ConnectOnly, || self.http.post(&url).json(args).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        decode(endpoint, resp).await
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: String,
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::ApiError {
            endpoint,
            status,
            body,
        });
    }
    resp.json()
        .await
        .map_err(|e| ClientError::Deserialization {
            endpoint,
            source: e,
        })
}

fn points(value: i64, operation: &'static str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Decode {
        operation,
        message: format!("points out of range: {value}"),
    })
}

impl RecordStore for SupabaseRecords {
    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let query = Query::new().select("*").eq("user_id", user_id).limit(1);
        let rows: Vec<Profile> = self
            .select("profiles", &query)
            .await
            .map_err(|e| e.into_store_error("profile"))?;
        Ok(rows.into_iter().next())
    }

    async fn increment_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> Result<Option<PointsChange>, StoreError> {
        const OP: &str = "increment_points";
        let args = IncrementArgs {
            p_user_id: user_id,
            p_delta: delta,
        };
        let rows: Vec<PointsRow> = self
            .rpc("increment_points", &args)
            .await
            .map_err(|e| e.into_store_error(OP))?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(PointsChange::new(
                points(row.previous_points, OP)?,
                points(row.new_points, OP)?,
            ))),
            None => Ok(None),
        }
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Profile>, StoreError> {
        let query = Query::new()
            .select("*")
            .order("points", Order::Desc)
            .limit(limit);
        self.select("profiles", &query)
            .await
            .map_err(|e| e.into_store_error("leaderboard"))
    }

    async fn awarded_milestones(&self, user_id: &UserId) -> Result<BTreeSet<u32>, StoreError> {
        let query = Query::new().select("milestone").eq("user_id", user_id);
        let rows: Vec<MilestoneRow> = self
            .select("user_badges", &query)
            .await
            .map_err(|e| e.into_store_error("awarded_milestones"))?;
        Ok(rows.into_iter().map(|r| r.milestone).collect())
    }

    async fn badge_pool(&self, pool: &BadgePool) -> Result<Vec<Badge>, StoreError> {
        let query = match pool {
            BadgePool::Sponsors => Query::new()
                .select("*")
                .in_list("location_name", SPONSOR_LOCATIONS),
            BadgePool::Neighborhood(name) => Query::new()
                .select("*")
                .eq("location_name", name)
                .not_in("location_name", SPONSOR_LOCATIONS),
        };
        self.select("badges", &query)
            .await
            .map_err(|e| e.into_store_error("badge_pool"))
    }

    async fn insert_badge(&self, badge: &NewBadge) -> Result<Badge, StoreError> {
        const OP: &str = "insert_badge";
        match self
            .insert::<Badge, _>("badges", badge)
            .await
            .map_err(|e| e.into_store_error(OP))?
        {
            Inserted::Row(badge) => Ok(badge),
            Inserted::Conflict => Err(StoreError::Rejected {
                operation: OP,
                message: "conflict".to_string(),
            }),
        }
    }

    async fn insert_award(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        milestone: u32,
    ) -> Result<AwardInsert, StoreError> {
        const OP: &str = "insert_award";
        let row = AwardRow {
            user_id,
            badge_id,
            milestone,
        };
        match self
            .insert::<UserBadge, _>("user_badges", &[row])
            .await
            .map_err(|e| e.into_store_error(OP))?
        {
            Inserted::Conflict => Ok(AwardInsert::AlreadyAwarded),
            Inserted::Row(row) => Ok(AwardInsert::Inserted(row)),
        }
    }

    async fn replace_award(
        &self,
        user_id: &UserId,
        milestone: u32,
        badge_id: BadgeId,
    ) -> Result<Option<UserBadge>, StoreError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("milestone", milestone);
        let rows: Vec<UserBadge> = self
            .update("user_badges", &query, &serde_json::json!({ "badge_id": badge_id }))
            .await
            .map_err(|e| e.into_store_error("replace_award"))?;
        Ok(rows.into_iter().next())
    }

    async fn user_badges(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, StoreError> {
        let query = Query::new()
            .select("*,badges(*)")
            .eq("user_id", user_id)
            .order("milestone", Order::Asc);
        self.select("user_badges", &query)
            .await
            .map_err(|e| e.into_store_error("user_badges"))
    }

    async fn insert_report(&self, report: &NewReport) -> Result<Report, StoreError> {
        const OP: &str = "insert_report";
        match self
            .insert::<Report, _>("reports", report)
            .await
            .map_err(|e| e.into_store_error(OP))?
        {
            Inserted::Row(report) => Ok(report),
            Inserted::Conflict => Err(StoreError::Rejected {
                operation: OP,
                message: "conflict".to_string(),
            }),
        }
    }

    async fn reports_by_user(&self, user_id: &UserId) -> Result<Vec<Report>, StoreError> {
        let query = Query::new()
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", Order::Desc);
        self.select("reports", &query)
            .await
            .map_err(|e| e.into_store_error("reports_by_user"))
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<Report>, StoreError> {
        let query = Query::new()
            .select("*")
            .order("created_at", Order::Desc)
            .limit(limit);
        self.select("reports", &query)
            .await
            .map_err(|e| e.into_store_error("recent_reports"))
    }

    async fn all_reports(&self) -> Result<Vec<Report>, StoreError> {
        self.select("reports", &Query::new().select("*"))
            .await
            .map_err(|e| e.into_store_error("all_reports"))
    }
}
