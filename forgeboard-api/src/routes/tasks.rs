/// Task endpoints
///
/// Tasks live inside projects; access is derived from project visibility.
/// Assignment requires `can_assign_tasks` and the assignee must belong to
/// the project (or hold an admin role). Time logs and comments hang off a
/// task and are append-only.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks?project_id=...` - List tasks for a project (paginated)
/// - `GET    /v1/tasks/:id` - Get one task
/// - `PUT    /v1/tasks/:id` - Update title/description/priority/due date
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `POST   /v1/tasks/:id/assign` - Assign or unassign
/// - `PUT    /v1/tasks/:id/status` - Move through the board
/// - `POST   /v1/tasks/:id/time-logs` - Log hours
/// - `GET    /v1/tasks/:id/time-logs` - List logged hours
/// - `POST   /v1/tasks/:id/comments` - Add a comment
/// - `GET    /v1/tasks/:id/comments` - List comments

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageQuery, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use forgeboard_shared::{
    audit::PostCommit,
    auth::access::{authorize, Access, Caller, Permission},
    models::{
        activity_log::ActivityType,
        comment::Comment,
        project::{Project, ProjectMember},
        task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        time_log::{CreateTimeLog, TimeLog},
        user::User,
    },
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Task update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    /// `null` clears the assignment
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub project_id: Uuid,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Time log request
#[derive(Debug, Deserialize, Validate)]
pub struct LogTimeRequest {
    #[validate(range(min = 0.01, max = 24.0, message = "Hours must be between 0.01 and 24"))]
    pub hours: f64,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

/// Comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub body: String,
}

async fn load_task(state: &AppState, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Read access mirrors the parent project: owner, member, view-all flag,
/// or super admin.
async fn authorize_project_view(
    state: &AppState,
    caller: &Caller,
    project: &Project,
) -> ApiResult<()> {
    if ProjectMember::is_member(&state.db, project.id, caller.user_id).await? {
        return Ok(());
    }

    authorize(
        caller,
        &Access::new()
            .permission(Permission::ViewAllProjects)
            .owned_by(project.owner_id),
    )?;
    Ok(())
}

/// Write access for task creation: project member, project owner, or
/// `can_manage_projects`.
async fn authorize_task_write(
    state: &AppState,
    caller: &Caller,
    project: &Project,
) -> ApiResult<()> {
    if ProjectMember::is_member(&state.db, project.id, caller.user_id).await? {
        return Ok(());
    }

    authorize(
        caller,
        &Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(project.owner_id),
    )?;
    Ok(())
}

/// Create a task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let project = load_project(&state, req.project_id).await?;
    authorize_task_write(&state, &caller, &project).await?;

    if project.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Project is {} and no longer accepts tasks",
            project.status.as_str()
        )));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: project.id,
            title: req.title,
            description: req.description,
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            created_by: caller.user_id,
            due_date: req.due_date,
        },
    )
    .await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TaskCreated,
        Some(task.id),
        Some("task"),
        json!({ "project_id": project.id, "title": task.title }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(task, "Task created")))
}

/// List tasks for a project
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let project = load_project(&state, query.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    let paging = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let (page_no, per_page) = paging.clamp();
    let (limit, offset) = paging.limit_offset();

    let tasks = Task::list_for_project(&state.db, project.id, limit, offset).await?;
    let total = Task::count_for_project(&state.db, project.id).await?;

    Ok(Json(ApiResponse::paginated(
        tasks,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Get one task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    Ok(Json(ApiResponse::new(task)))
}

/// Update a task's descriptive fields
///
/// Status and assignee have dedicated endpoints; this one covers title,
/// description, priority, and due date.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_task_write(&state, &caller, &project).await?;

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: None,
            priority: req.priority,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TaskUpdated,
        Some(id),
        Some("task"),
        json!({ "title": updated.title }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(updated, "Task updated")))
}

/// Delete a task
///
/// Allowed to the task's creator or admin-level callers. Time logs and
/// comments go with it (database cascade).
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let task = load_task(&state, id).await?;

    if task.created_by != caller.user_id && !caller.role.is_admin_level() {
        return Err(ApiError::Forbidden(
            "Only the task creator or an administrator can delete a task".to_string(),
        ));
    }

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TaskDeleted,
        Some(id),
        Some("task"),
        json!({ "title": task.title }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Task deleted")))
}

/// Assign or unassign a task
///
/// Requires `can_assign_tasks`. The assignee must be a member of the
/// task's project or hold an admin role. The assignee is notified.
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    authorize(&caller, &Access::new().permission(Permission::AssignTasks))?;

    let task = load_task(&state, id).await?;

    if let Some(assignee_id) = req.assignee_id {
        let assignee = User::find_by_id(&state.db, assignee_id)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Assignee does not exist".to_string()))?;

        let member = ProjectMember::is_member(&state.db, task.project_id, assignee_id).await?;
        if !member && !assignee.role.is_admin_level() {
            return Err(ApiError::BadRequest(
                "Assignee must be a member of the task's project".to_string(),
            ));
        }
    }

    let updated = Task::set_assignee(&state.db, id, req.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TaskAssigned,
        Some(id),
        Some("task"),
        json!({ "assignee_id": req.assignee_id }),
    );
    if let Some(assignee_id) = req.assignee_id {
        effects.notify(
            assignee_id,
            "Task assigned to you",
            &format!("You were assigned the task \"{}\".", updated.title),
        );
    }
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(updated, "Assignee updated")))
}

/// Move a task through the board
///
/// Allowed to the assignee, the creator, or admin-level callers.
pub async fn set_task_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let task = load_task(&state, id).await?;

    let allowed = task.assignee_id == Some(caller.user_id)
        || task.created_by == caller.user_id
        || caller.role.is_admin_level();
    if !allowed {
        return Err(ApiError::Forbidden(
            "Only the assignee, the creator, or an administrator can change task status"
                .to_string(),
        ));
    }

    let updated = Task::set_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TaskStatusChanged,
        Some(id),
        Some("task"),
        json!({ "from": task.status, "to": updated.status }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(updated, "Status updated")))
}

/// Log hours against a task
///
/// Hours are attributed to the caller. Anyone who can see the task's
/// project can log time on it.
pub async fn log_time(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<LogTimeRequest>,
) -> ApiResult<Json<ApiResponse<TimeLog>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    let entry = TimeLog::create(
        &state.db,
        CreateTimeLog {
            task_id: id,
            user_id: caller.user_id,
            hours: req.hours,
            note: req.note,
        },
    )
    .await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::TimeLogged,
        Some(id),
        Some("task"),
        json!({ "hours": entry.hours }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(entry, "Time logged")))
}

/// List time logs for a task, with the running total
pub async fn list_time_logs(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    let entries = TimeLog::list_for_task(&state.db, id).await?;
    let total_hours = TimeLog::total_hours_for_task(&state.db, id).await?;

    Ok(Json(ApiResponse::new(json!({
        "entries": entries,
        "totalHours": total_hours,
    }))))
}

/// Add a comment to a task
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<ApiResponse<Comment>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    let comment = Comment::create(&state.db, id, caller.user_id, &req.body).await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::CommentAdded,
        Some(id),
        Some("task"),
        json!({ "comment_id": comment.id }),
    );
    // Tell the assignee unless they wrote the comment themselves
    if let Some(assignee_id) = task.assignee_id {
        if assignee_id != caller.user_id {
            effects.notify(
                assignee_id,
                "New comment on your task",
                &format!("A comment was added to \"{}\".", task.title),
            );
        }
    }
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(comment, "Comment added")))
}

/// List comments for a task, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Comment>>>> {
    let task = load_task(&state, id).await?;
    let project = load_project(&state, task.project_id).await?;
    authorize_project_view(&state, &caller, &project).await?;

    let comments = Comment::list_for_task(&state.db, id).await?;
    Ok(Json(ApiResponse::new(comments)))
}
