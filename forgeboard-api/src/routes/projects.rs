/// Project endpoints
///
/// Clients own projects; developers see projects they are members of;
/// holders of `can_view_all_projects` and super admins see everything.
/// Mutations go to the owner or holders of `can_manage_projects`.
///
/// # Endpoints
///
/// - `POST   /v1/projects` - Create a project
/// - `GET    /v1/projects` - List visible projects (paginated)
/// - `GET    /v1/projects/:id` - Get one project
/// - `PUT    /v1/projects/:id` - Update name/description/status/budget
/// - `DELETE /v1/projects/:id` - Delete (blocked while tasks exist)
/// - `POST   /v1/projects/:id/members` - Add a member
/// - `GET    /v1/projects/:id/members` - List members
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove a member

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageQuery, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use forgeboard_shared::{
    audit::PostCommit,
    auth::access::{authorize, Access, Caller, Permission},
    models::{
        activity_log::ActivityType,
        project::{CreateProject, Project, ProjectMember, ProjectStatus, UpdateProject},
        user::User,
    },
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Project creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Budget must not be negative"))]
    pub budget: Option<f64>,

    /// Create on behalf of another owner (managers only)
    pub owner_id: Option<Uuid>,
}

/// Project update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub status: Option<ProjectStatus>,

    #[validate(range(min = 0.0, message = "Budget must not be negative"))]
    pub budget: Option<f64>,
}

/// Member addition request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: Uuid,

    /// Project-scoped role label, free-form
    #[validate(length(min = 1, max = 50, message = "Member role must be 1-50 characters"))]
    pub member_role: Option<String>,
}

/// Loads a project or 404s
async fn load_project(state: &AppState, id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// Read access: owner, member, view-all flag, or super admin
async fn authorize_view(state: &AppState, caller: &Caller, project: &Project) -> ApiResult<()> {
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

/// Create a project
///
/// Clients create their own projects. Creating on behalf of another owner
/// requires `can_manage_projects`.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let owner_id = req.owner_id.unwrap_or(caller.user_id);
    if owner_id != caller.user_id {
        authorize(
            &caller,
            &Access::new().permission(Permission::ManageProjects),
        )?;

        User::find_by_id(&state.db, owner_id)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Owner does not exist".to_string()))?;
    }

    let project = Project::create(
        &state.db,
        CreateProject {
            owner_id,
            name: req.name,
            description: req.description,
            budget: req.budget,
        },
    )
    .await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::ProjectCreated,
        Some(project.id),
        Some("project"),
        json!({ "name": project.name }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(project, "Project created")))
}

/// List projects visible to the caller
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Project>>>> {
    let (page_no, per_page) = page.clamp();
    let (limit, offset) = page.limit_offset();

    let sees_all =
        caller.is_super_admin() || caller.permissions.has(Permission::ViewAllProjects);

    let (projects, total) = if sees_all {
        (
            Project::list_all(&state.db, limit, offset).await?,
            Project::count_all(&state.db).await?,
        )
    } else {
        (
            Project::list_visible_to(&state.db, caller.user_id, limit, offset).await?,
            Project::count_visible_to(&state.db, caller.user_id).await?,
        )
    };

    Ok(Json(ApiResponse::paginated(
        projects,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Get one project
pub async fn get_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    let project = load_project(&state, id).await?;
    authorize_view(&state, &caller, &project).await?;

    Ok(Json(ApiResponse::new(project)))
}

/// Update a project
///
/// Allowed to the owner or `can_manage_projects`. Projects in a terminal
/// state (completed, cancelled) reject further updates with a conflict.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ApiResponse<Project>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let project = load_project(&state, id).await?;
    authorize(
        &caller,
        &Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(project.owner_id),
    )?;

    if project.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Project is {} and can no longer be updated",
            project.status.as_str()
        )));
    }

    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
            status: req.status,
            budget: req.budget,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::ProjectUpdated,
        Some(updated.id),
        Some("project"),
        json!({ "status": updated.status }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(updated, "Project updated")))
}

/// Delete a project
///
/// Rejected with a conflict while tasks exist; otherwise members,
/// project-scoped activity rows, and the project are removed in one
/// transaction.
///
/// # Errors
///
/// - `409 Conflict`: Project still has tasks
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let project = load_project(&state, id).await?;
    authorize(
        &caller,
        &Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(project.owner_id),
    )?;

    let mut tx = state.db.begin().await?;

    let tasks = Project::task_count(&mut *tx, id).await?;
    if tasks > 0 {
        return Err(ApiError::Conflict(format!(
            "Project still has {} task(s); delete them first",
            tasks
        )));
    }

    Project::delete_cascade(&mut tx, id).await?;

    tx.commit().await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::ProjectDeleted,
        Some(id),
        Some("project"),
        json!({ "name": project.name }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Project deleted")))
}

/// Add a member to a project
pub async fn add_member(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ApiResponse<ProjectMember>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let project = load_project(&state, id).await?;
    authorize(
        &caller,
        &Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(project.owner_id),
    )?;

    User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User does not exist".to_string()))?;

    if ProjectMember::is_member(&state.db, id, req.user_id).await? {
        return Err(ApiError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    let member_role = req.member_role.as_deref().unwrap_or("member");
    let member = ProjectMember::add(&state.db, id, req.user_id, member_role).await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::MemberAdded,
        Some(id),
        Some("project"),
        json!({ "user_id": req.user_id, "member_role": member_role }),
    );
    effects.notify(
        req.user_id,
        "Added to project",
        &format!("You were added to the project \"{}\".", project.name),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(member, "Member added")))
}

/// List project members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<ProjectMember>>>> {
    let project = load_project(&state, id).await?;
    authorize_view(&state, &caller, &project).await?;

    let members = ProjectMember::list_for_project(&state.db, id).await?;
    Ok(Json(ApiResponse::new(members)))
}

/// Remove a member from a project
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let project = load_project(&state, id).await?;
    authorize(
        &caller,
        &Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(project.owner_id),
    )?;

    let removed = ProjectMember::remove(&state.db, id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "User is not a member of this project".to_string(),
        ));
    }

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::MemberRemoved,
        Some(id),
        Some("project"),
        json!({ "user_id": user_id }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Member removed")))
}
