/// Reporting endpoints
///
/// Read-only aggregations computed per call, nothing cached. All three
/// reports require an admin-level session.
///
/// # Endpoints
///
/// - `GET /v1/reports/overview` - Counts by role/status across the system
/// - `GET /v1/reports/revenue?year=2026` - Monthly completed-project budgets
/// - `GET /v1/reports/time` - Hours logged per project

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use forgeboard_shared::auth::access::Caller;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub year: Option<i32>,
}

/// One month's revenue bucket
#[derive(Debug, Serialize)]
pub struct RevenueBucket {
    pub month: u32,
    pub revenue: f64,
    pub projects: i64,
}

/// Hours logged against one project
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTime {
    pub project_id: uuid::Uuid,
    pub project_name: String,
    pub total_hours: f64,
    pub entries: i64,
}

fn require_admin(caller: &Caller) -> ApiResult<()> {
    if !caller.role.is_admin_level() {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(())
}

/// System-wide counts: users by role, pending approvals, projects and
/// tasks by status
pub async fn overview(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    require_admin(&caller)?;

    let users_by_role = sqlx::query("SELECT role, COUNT(*) AS n FROM users GROUP BY role")
        .fetch_all(&state.db)
        .await?;
    let pending_users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_approved IS NULL")
            .fetch_one(&state.db)
            .await?;
    let projects_by_status =
        sqlx::query("SELECT status, COUNT(*) AS n FROM projects GROUP BY status")
            .fetch_all(&state.db)
            .await?;
    let tasks_by_status = sqlx::query("SELECT status, COUNT(*) AS n FROM tasks GROUP BY status")
        .fetch_all(&state.db)
        .await?;

    let bucket = |rows: Vec<sqlx::postgres::PgRow>| -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for row in rows {
            let key: String = row.get(0);
            let count: i64 = row.get("n");
            map.insert(key, json!(count));
        }
        serde_json::Value::Object(map)
    };

    Ok(Json(ApiResponse::new(json!({
        "users": bucket(users_by_role),
        "pendingApprovals": pending_users,
        "projects": bucket(projects_by_status),
        "tasks": bucket(tasks_by_status),
    }))))
}

/// Monthly revenue for one year
///
/// Revenue counts the budgets of projects completed in that month; a
/// project with no budget contributes zero. Months with no completions
/// still appear so charts get twelve points.
pub async fn revenue(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<RevenueQuery>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    require_admin(&caller)?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    if !(2000..=2100).contains(&year) {
        return Err(ApiError::BadRequest(
            "Year must be between 2000 and 2100".to_string(),
        ));
    }

    let rows = sqlx::query(
        r#"
        SELECT EXTRACT(MONTH FROM updated_at)::INT AS month,
               COALESCE(SUM(budget), 0)::DOUBLE PRECISION AS revenue,
               COUNT(*) AS projects
        FROM projects
        WHERE status = 'completed' AND EXTRACT(YEAR FROM updated_at)::INT = $1
        GROUP BY month
        "#,
    )
    .bind(year)
    .fetch_all(&state.db)
    .await?;

    let mut buckets: Vec<RevenueBucket> = (1..=12)
        .map(|month| RevenueBucket {
            month,
            revenue: 0.0,
            projects: 0,
        })
        .collect();
    for row in rows {
        let month: i32 = row.get("month");
        if let Some(bucket) = buckets.get_mut(month as usize - 1) {
            bucket.revenue = row.get("revenue");
            bucket.projects = row.get("projects");
        }
    }

    let total: f64 = buckets.iter().map(|b| b.revenue).sum();

    Ok(Json(ApiResponse::new(json!({
        "year": year,
        "months": buckets,
        "total": total,
    }))))
}

/// Hours logged per project, busiest first
pub async fn time_totals(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<Vec<ProjectTime>>>> {
    require_admin(&caller)?;

    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name,
               COALESCE(SUM(tl.hours), 0)::DOUBLE PRECISION AS total_hours,
               COUNT(tl.id) AS entries
        FROM projects p
        LEFT JOIN tasks t ON t.project_id = p.id
        LEFT JOIN time_logs tl ON tl.task_id = t.id
        GROUP BY p.id, p.name
        ORDER BY total_hours DESC, p.name
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let totals = rows
        .into_iter()
        .map(|row| ProjectTime {
            project_id: row.get("id"),
            project_name: row.get("name"),
            total_hours: row.get("total_hours"),
            entries: row.get("entries"),
        })
        .collect();

    Ok(Json(ApiResponse::new(totals)))
}
