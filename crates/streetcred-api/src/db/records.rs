//! [`RecordStore`] over a Postgres pool.
//!
//! Award uniqueness is enforced by `ON CONFLICT (user_id, milestone) DO
//! NOTHING`; an empty `RETURNING` means the milestone was already awarded.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use streetcred_core::{
    Badge, BadgeId, BadgePool, EarnedBadge, NewBadge, NewReport, PointsChange, Profile, Report,
    UserBadge, UserId, SPONSOR_LOCATIONS,
};
use streetcred_rewards::{AwardInsert, RecordStore, StoreError};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    username: Option<String>,
    points: i32,
}

#[derive(sqlx::FromRow)]
struct BadgeRow {
    id: i64,
    animal: String,
    location_name: String,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AwardRow {
    user_id: String,
    badge_id: i64,
    milestone: i32,
    earned_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct EarnedRow {
    user_id: String,
    badge_id: i64,
    milestone: i32,
    earned_at: DateTime<Utc>,
    b_id: Option<i64>,
    animal: Option<String>,
    location_name: Option<String>,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    user_id: String,
    lat: f64,
    lon: f64,
    description: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PointsRow {
    previous_points: i32,
    new_points: i32,
}

const REPORT_COLUMNS: &str = "id, user_id, lat, lon, description, image_url, created_at";
const BADGE_COLUMNS: &str = "id, animal, location_name, image_url";

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map a driver error onto the store taxonomy.
fn store_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::Database(db) => {
            database_error(operation, db.code().as_deref(), db.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Unavailable(e.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => StoreError::Decode {
            operation,
            message: e.to_string(),
        },
        other => StoreError::Rejected {
            operation,
            message: other.to_string(),
        },
    }
}

fn database_error(operation: &'static str, code: Option<&str>, message: String) -> StoreError {
    match code {
        Some(NUMERIC_OUT_OF_RANGE) => StoreError::OutOfRange { operation, message },
        _ => StoreError::Rejected { operation, message },
    }
}

fn decode_err(operation: &'static str, message: String) -> StoreError {
    StoreError::Decode { operation, message }
}

fn user_id(raw: String, operation: &'static str) -> Result<UserId, StoreError> {
    UserId::new(&raw).map_err(|e| decode_err(operation, format!("{e}")))
}

fn unsigned(value: i32, operation: &'static str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| decode_err(operation, format!("negative value {value}")))
}

fn signed(value: u32, operation: &'static str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange {
        operation,
        message: format!("value {value} exceeds column range"),
    })
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile, StoreError> {
        Ok(Profile {
            user_id: user_id(self.user_id, "profile")?,
            username: self.username,
            points: u32::try_from(self.points).unwrap_or(0),
        })
    }
}

impl From<BadgeRow> for Badge {
    fn from(row: BadgeRow) -> Self {
        Badge {
            id: row.id,
            animal: row.animal,
            location_name: row.location_name,
            image_url: row.image_url,
        }
    }
}

impl AwardRow {
    fn into_award(self, operation: &'static str) -> Result<UserBadge, StoreError> {
        Ok(UserBadge {
            user_id: user_id(self.user_id, operation)?,
            badge_id: self.badge_id,
            milestone: unsigned(self.milestone, operation)?,
            earned_at: self.earned_at,
        })
    }
}

impl EarnedRow {
    fn into_earned(self) -> Result<EarnedBadge, StoreError> {
        const OP: &str = "user_badges";
        let badge = match (self.b_id, self.animal, self.location_name) {
            (Some(id), Some(animal), Some(location_name)) => Some(Badge {
                id,
                animal,
                location_name,
                image_url: self.image_url,
            }),
            _ => None,
        };
        let award = UserBadge {
            user_id: user_id(self.user_id, OP)?,
            badge_id: self.badge_id,
            milestone: unsigned(self.milestone, OP)?,
            earned_at: self.earned_at,
        };
        Ok(EarnedBadge::join(award, badge))
    }
}

impl ReportRow {
    fn into_report(self, operation: &'static str) -> Result<Report, StoreError> {
        Ok(Report {
            id: self.id,
            user_id: user_id(self.user_id, operation)?,
            lat: self.lat,
            lon: self.lon,
            description: self.description,
            image_url: self.image_url,
            created_at: self.created_at,
        })
    }
}

fn reports(rows: Vec<ReportRow>, operation: &'static str) -> Result<Vec<Report>, StoreError> {
    rows.into_iter().map(|r| r.into_report(operation)).collect()
}

fn sponsor_names() -> Vec<String> {
    SPONSOR_LOCATIONS.iter().map(|s| s.to_string()).collect()
}

/// Postgres-backed record store.
#[derive(Debug, Clone)]
pub struct PgRecords {
    pool: PgPool,
}

impl PgRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RecordStore for PgRecords {
    async fn profile(&self, user: &UserId) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, username, points FROM profiles WHERE user_id = $1",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error("profile"))?;
        row.map(ProfileRow::into_profile).transpose()
    }

    async fn increment_points(
        &self,
        user: &UserId,
        delta: u32,
    ) -> Result<Option<PointsChange>, StoreError> {
        const OP: &str = "increment_points";
        let row = sqlx::query_as::<_, PointsRow>(
            "SELECT previous_points, new_points FROM increment_points($1, $2)",
        )
        .bind(user.as_str())
        .bind(signed(delta, OP)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error(OP))?;
        row.map(|r| {
            Ok(PointsChange::new(
                unsigned(r.previous_points, OP)?,
                unsigned(r.new_points, OP)?,
            ))
        })
        .transpose()
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Profile>, StoreError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT user_id, username, points FROM profiles
             ORDER BY points DESC, user_id ASC
             LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("leaderboard"))?;
        rows.into_iter().map(ProfileRow::into_profile).collect()
    }

    async fn awarded_milestones(&self, user: &UserId) -> Result<BTreeSet<u32>, StoreError> {
        const OP: &str = "awarded_milestones";
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT milestone FROM user_badges WHERE user_id = $1")
                .bind(user.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(store_error(OP))?;
        rows.into_iter().map(|(m,)| unsigned(m, OP)).collect()
    }

    async fn badge_pool(&self, pool: &BadgePool) -> Result<Vec<Badge>, StoreError> {
        let (sql, location) = match pool {
            BadgePool::Sponsors => (
                format!("SELECT {BADGE_COLUMNS} FROM badges WHERE location_name = ANY($1) ORDER BY id"),
                None,
            ),
            BadgePool::Neighborhood(name) => (
                format!(
                    "SELECT {BADGE_COLUMNS} FROM badges
                     WHERE location_name = $2 AND location_name <> ALL($1) ORDER BY id"
                ),
                Some(name.clone()),
            ),
        };
        let mut query = sqlx::query_as::<_, BadgeRow>(&sql).bind(sponsor_names());
        if let Some(location) = location {
            query = query.bind(location);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(store_error("badge_pool"))?;
        Ok(rows.into_iter().map(Badge::from).collect())
    }

    async fn insert_badge(&self, badge: &NewBadge) -> Result<Badge, StoreError> {
        let row = sqlx::query_as::<_, BadgeRow>(&format!(
            "INSERT INTO badges (animal, location_name, image_url)
             VALUES ($1, $2, $3)
             RETURNING {BADGE_COLUMNS}"
        ))
        .bind(&badge.animal)
        .bind(&badge.location_name)
        .bind(badge.image_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error("insert_badge"))?;
        Ok(row.into())
    }

    async fn insert_award(
        &self,
        user: &UserId,
        badge_id: BadgeId,
        milestone: u32,
    ) -> Result<AwardInsert, StoreError> {
        const OP: &str = "insert_award";
        let row = sqlx::query_as::<_, AwardRow>(
            "INSERT INTO user_badges (user_id, badge_id, milestone)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, milestone) DO NOTHING
             RETURNING user_id, badge_id, milestone, earned_at",
        )
        .bind(user.as_str())
        .bind(badge_id)
        .bind(signed(milestone, OP)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error(OP))?;
        match row {
            Some(row) => Ok(AwardInsert::Inserted(row.into_award(OP)?)),
            None => Ok(AwardInsert::AlreadyAwarded),
        }
    }

    async fn replace_award(
        &self,
        user: &UserId,
        milestone: u32,
        badge_id: BadgeId,
    ) -> Result<Option<UserBadge>, StoreError> {
        const OP: &str = "replace_award";
        let row = sqlx::query_as::<_, AwardRow>(
            "UPDATE user_badges SET badge_id = $3
             WHERE user_id = $1 AND milestone = $2
             RETURNING user_id, badge_id, milestone, earned_at",
        )
        .bind(user.as_str())
        .bind(signed(milestone, OP)?)
        .bind(badge_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error(OP))?;
        row.map(|r| r.into_award(OP)).transpose()
    }

    async fn user_badges(&self, user: &UserId) -> Result<Vec<EarnedBadge>, StoreError> {
        let rows = sqlx::query_as::<_, EarnedRow>(
            "SELECT ub.user_id, ub.badge_id, ub.milestone, ub.earned_at,
                    b.id AS b_id, b.animal, b.location_name, b.image_url
             FROM user_badges ub
             LEFT JOIN badges b ON b.id = ub.badge_id
             WHERE ub.user_id = $1
             ORDER BY ub.milestone ASC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error("user_badges"))?;
        rows.into_iter().map(EarnedRow::into_earned).collect()
    }

    async fn insert_report(&self, report: &NewReport) -> Result<Report, StoreError> {
        const OP: &str = "insert_report";
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "INSERT INTO reports (user_id, lat, lon, description, image_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(report.user_id.as_str())
        .bind(report.at.lat())
        .bind(report.at.lon())
        .bind(&report.description)
        .bind(report.image_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error(OP))?;
        row.into_report(OP)
    }

    async fn reports_by_user(&self, user: &UserId) -> Result<Vec<Report>, StoreError> {
        const OP: &str = "reports_by_user";
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error(OP))?;
        reports(rows, OP)
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<Report>, StoreError> {
        const OP: &str = "recent_reports";
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error(OP))?;
        reports(rows, OP)
    }

    async fn all_reports(&self) -> Result<Vec<Report>, StoreError> {
        const OP: &str = "all_reports";
        let rows = sqlx::query_as::<_, ReportRow>(&format!("SELECT {REPORT_COLUMNS} FROM reports"))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error(OP))?;
        reports(rows, OP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_unavailable() {
        let err = store_error("profile")(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn missing_column_is_decode() {
        let err = store_error("profile")(sqlx::Error::ColumnNotFound("points".into()));
        assert!(matches!(err, StoreError::Decode { operation: "profile", .. }));
    }

    #[test]
    fn row_not_found_is_rejected() {
        let err = store_error("insert_report")(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Rejected { operation: "insert_report", .. }));
    }

    #[test]
    fn negative_stored_points_read_as_zero() {
        let row = ProfileRow {
            user_id: "alice".into(),
            username: None,
            points: -4,
        };
        assert_eq!(row.into_profile().unwrap().points, 0);
    }

    #[test]
    fn orphaned_award_has_no_badge() {
        let row = EarnedRow {
            user_id: "alice".into(),
            badge_id: 9,
            milestone: 5,
            earned_at: Utc::now(),
            b_id: None,
            animal: None,
            location_name: None,
            image_url: None,
        };
        let earned = row.into_earned().unwrap();
        assert_eq!(earned.badge_id, 9);
        assert!(earned.badge.is_none());
    }

    #[test]
    fn numeric_overflow_is_out_of_range() {
        let err = database_error(
            "increment_points",
            Some(NUMERIC_OUT_OF_RANGE),
            "integer out of range".into(),
        );
        assert!(matches!(err, StoreError::OutOfRange { operation: "increment_points", .. }));
    }

    #[test]
    fn other_database_errors_are_rejected() {
        let err = database_error("insert_award", Some("23503"), "foreign key".into());
        assert!(matches!(err, StoreError::Rejected { operation: "insert_award", .. }));
        let err = database_error("insert_award", None, "unknown".into());
        assert!(matches!(err, StoreError::Rejected { .. }));
    }

    #[test]
    fn oversized_delta_is_rejected_before_query() {
        assert!(matches!(
            signed(u32::MAX, "increment_points"),
            Err(StoreError::OutOfRange { .. })
        ));
        assert_eq!(signed(7, "increment_points").unwrap(), 7);
    }
}
