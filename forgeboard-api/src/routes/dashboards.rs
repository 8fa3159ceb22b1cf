/// Per-caller dashboard endpoints
///
/// Both views are scoped to the caller and need no extra permissions:
/// clients see their own projects with task progress, developers see
/// their assigned tasks and logged hours.
///
/// # Endpoints
///
/// - `GET /v1/clients/dashboard` - Caller's projects with task counts
/// - `GET /v1/dev/dashboard` - Caller's assigned tasks grouped by status

use crate::{app::AppState, error::ApiResult, response::ApiResponse};
use axum::{extract::State, Extension, Json};
use forgeboard_shared::{
    auth::access::Caller,
    models::task::{Task, TaskStatus},
};
use serde::Serialize;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

/// One project row on the client dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub budget: Option<f64>,
    pub task_count: i64,
    pub done_count: i64,
}

/// Caller's projects with task progress
pub async fn client_dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name, p.status::TEXT AS status, p.budget,
               COUNT(t.id) AS task_count,
               COUNT(t.id) FILTER (WHERE t.status = 'done') AS done_count
        FROM projects p
        LEFT JOIN tasks t ON t.project_id = p.id
        WHERE p.owner_id = $1
        GROUP BY p.id, p.name, p.status, p.budget
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(caller.user_id)
    .fetch_all(&state.db)
    .await?;

    let projects: Vec<ProjectSummary> = rows
        .into_iter()
        .map(|row| ProjectSummary {
            id: row.get("id"),
            name: row.get("name"),
            status: row.get("status"),
            budget: row.get("budget"),
            task_count: row.get("task_count"),
            done_count: row.get("done_count"),
        })
        .collect();

    let active = projects
        .iter()
        .filter(|p| p.status != "completed" && p.status != "cancelled")
        .count();

    Ok(Json(ApiResponse::new(json!({
        "projects": projects,
        "activeProjects": active,
    }))))
}

/// Caller's assigned tasks grouped by board column, plus their logged hours
pub async fn dev_dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let tasks = Task::list_assigned_to(&state.db, caller.user_id, 200, 0).await?;

    let by_status = |status: TaskStatus| -> Vec<&Task> {
        tasks.iter().filter(|t| t.status == status).collect()
    };

    let hours: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(hours), 0)::DOUBLE PRECISION FROM time_logs WHERE user_id = $1",
    )
    .bind(caller.user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::new(json!({
        "todo": by_status(TaskStatus::Todo),
        "inProgress": by_status(TaskStatus::InProgress),
        "review": by_status(TaskStatus::Review),
        "done": by_status(TaskStatus::Done),
        "assignedTotal": tasks.len(),
        "hoursLogged": hours,
    }))))
}
