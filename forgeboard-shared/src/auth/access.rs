/// Authorization engine
///
/// This module decides whether an authenticated caller may perform an
/// operation. Every protected handler builds an [`Access`] descriptor for
/// the operation and runs it through [`authorize`]; nothing else in the
/// codebase grants or denies access.
///
/// # Decision Order
///
/// The rules are evaluated in a fixed order and the first match wins:
///
/// 1. **Super admin override**: a `SuperAdmin` caller passes every check.
/// 2. **Super-admin-only gate**: if the operation is marked super-admin-only,
///    everyone else is denied here.
/// 3. **Ownership**: if the operation names an owner and the caller is that
///    owner, allow.
/// 4. **Permission flag**: if the operation names a permission and the caller
///    holds the flag, allow.
/// 5. **Deny** with the most specific error available.
///
/// Role never shortcuts rules 2-5: an `Admin` without `can_delete_users`
/// cannot delete users, and a `Client` who owns a project can manage it.
///
/// # Example
///
/// ```
/// use forgeboard_shared::auth::access::{authorize, Access, Caller, Permission, PermissionSet};
/// use forgeboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let caller = Caller {
///     user_id: owner,
///     role: UserRole::Client,
///     permissions: PermissionSet::default(),
/// };
///
/// // Owner passes without any permission flag
/// let access = Access::new()
///     .permission(Permission::ManageProjects)
///     .owned_by(owner);
/// assert!(authorize(&caller, &access).is_ok());
/// ```

use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Error type for authorization decisions
///
/// Every variant maps to HTTP 403 at the API layer. Unauthenticated
/// requests never reach this module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Operation is restricted to super admins
    #[error("This operation requires super admin access")]
    SuperAdminOnly,

    /// Caller lacks the required permission flag
    #[error("Missing required permission: {0}")]
    MissingPermission(Permission),

    /// Caller is neither the owner nor otherwise permitted
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Grantable permission flags
///
/// Each variant corresponds to one boolean column on the users table.
/// Flags are granted per user by admins; roles carry no implicit flags
/// except that `SuperAdmin` bypasses flag checks entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Approve or reject pending registrations
    ApproveUsers,

    /// Delete user accounts
    DeleteUsers,

    /// Create, update, and delete any project
    ManageProjects,

    /// Assign tasks to users
    AssignTasks,

    /// View projects regardless of ownership or membership
    ViewAllProjects,
}

impl Permission {
    /// Gets permission as its wire/column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ApproveUsers => "can_approve_users",
            Permission::DeleteUsers => "can_delete_users",
            Permission::ManageProjects => "can_manage_projects",
            Permission::AssignTasks => "can_assign_tasks",
            Permission::ViewAllProjects => "can_view_all_projects",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The permission flags a caller holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub approve_users: bool,
    pub delete_users: bool,
    pub manage_projects: bool,
    pub assign_tasks: bool,
    pub view_all_projects: bool,
}

impl PermissionSet {
    /// A set with every flag granted
    pub fn all() -> Self {
        Self {
            approve_users: true,
            delete_users: true,
            manage_projects: true,
            assign_tasks: true,
            view_all_projects: true,
        }
    }

    /// Checks whether a flag is held
    pub fn has(&self, permission: Permission) -> bool {
        match permission {
            Permission::ApproveUsers => self.approve_users,
            Permission::DeleteUsers => self.delete_users,
            Permission::ManageProjects => self.manage_projects,
            Permission::AssignTasks => self.assign_tasks,
            Permission::ViewAllProjects => self.view_all_projects,
        }
    }
}

/// The authenticated identity an authorization decision runs against
///
/// Built once per request from the freshly loaded user row, so role and
/// flag changes take effect on the next request, not the next login.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
    pub permissions: PermissionSet,
}

impl Caller {
    /// Builds a caller from a loaded user row
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            permissions: PermissionSet {
                approve_users: user.can_approve_users,
                delete_users: user.can_delete_users,
                manage_projects: user.can_manage_projects,
                assign_tasks: user.can_assign_tasks,
                view_all_projects: user.can_view_all_projects,
            },
        }
    }

    /// Convenience check used by handlers that branch on visibility
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }
}

/// Describes what an operation demands of the caller
///
/// Built fluently: any combination of a required permission, a resource
/// owner, and the super-admin-only gate. An empty descriptor denies
/// everyone except super admins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Access {
    permission: Option<Permission>,
    owner: Option<Uuid>,
    super_admin_only: bool,
}

impl Access {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow callers holding this permission flag
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Allow the owner of the resource
    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Restrict the operation to super admins
    pub fn super_admin_only(mut self) -> Self {
        self.super_admin_only = true;
        self
    }
}

/// Runs the authorization decision
///
/// See the module docs for the rule order. Returns `Ok(())` when the
/// caller may proceed.
pub fn authorize(caller: &Caller, access: &Access) -> Result<(), AccessError> {
    // Rule 1: super admin override
    if caller.role == UserRole::SuperAdmin {
        return Ok(());
    }

    // Rule 2: super-admin-only gate
    if access.super_admin_only {
        return Err(AccessError::SuperAdminOnly);
    }

    // Rule 3: ownership
    if let Some(owner) = access.owner {
        if owner == caller.user_id {
            return Ok(());
        }
    }

    // Rule 4: permission flag
    if let Some(permission) = access.permission {
        if caller.permissions.has(permission) {
            return Ok(());
        }
    }

    // Rule 5: deny with the most specific error
    match access.permission {
        Some(permission) => Err(AccessError::MissingPermission(permission)),
        None => Err(AccessError::NotAuthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole, permissions: PermissionSet) -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            role,
            permissions,
        }
    }

    #[test]
    fn test_super_admin_passes_everything() {
        let c = caller(UserRole::SuperAdmin, PermissionSet::default());

        assert!(authorize(&c, &Access::new()).is_ok());
        assert!(authorize(&c, &Access::new().super_admin_only()).is_ok());
        assert!(authorize(&c, &Access::new().permission(Permission::DeleteUsers)).is_ok());
        assert!(authorize(&c, &Access::new().owned_by(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_super_admin_only_gate() {
        let access = Access::new()
            .super_admin_only()
            .permission(Permission::ManageProjects);

        // Even a caller holding the flag is denied at the gate
        let admin = caller(UserRole::Admin, PermissionSet::all());
        assert_eq!(
            authorize(&admin, &access),
            Err(AccessError::SuperAdminOnly)
        );

        // And so is the owner
        let owner = caller(UserRole::Admin, PermissionSet::all());
        let owned = Access::new().super_admin_only().owned_by(owner.user_id);
        assert_eq!(authorize(&owner, &owned), Err(AccessError::SuperAdminOnly));
    }

    #[test]
    fn test_ownership_allows_without_flags() {
        let c = caller(UserRole::Client, PermissionSet::default());
        let access = Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(c.user_id);

        assert!(authorize(&c, &access).is_ok());
    }

    #[test]
    fn test_permission_flag_allows_non_owner() {
        let mut perms = PermissionSet::default();
        perms.manage_projects = true;

        let c = caller(UserRole::Developer, perms);
        let access = Access::new()
            .permission(Permission::ManageProjects)
            .owned_by(Uuid::new_v4());

        assert!(authorize(&c, &access).is_ok());
    }

    #[test]
    fn test_role_does_not_imply_flags() {
        // Admin role without the flag is still denied
        let admin = caller(UserRole::Admin, PermissionSet::default());
        let access = Access::new().permission(Permission::DeleteUsers);

        assert_eq!(
            authorize(&admin, &access),
            Err(AccessError::MissingPermission(Permission::DeleteUsers))
        );
    }

    #[test]
    fn test_deny_picks_specific_error() {
        let c = caller(UserRole::Developer, PermissionSet::default());

        // With a named permission, the error says which flag is missing
        let flagged = Access::new().permission(Permission::AssignTasks);
        assert_eq!(
            authorize(&c, &flagged),
            Err(AccessError::MissingPermission(Permission::AssignTasks))
        );

        // Ownership-only check falls back to the generic denial
        let owned = Access::new().owned_by(Uuid::new_v4());
        assert_eq!(authorize(&c, &owned), Err(AccessError::NotAuthorized));

        // Empty descriptor denies everyone but super admins
        assert_eq!(
            authorize(&c, &Access::new()),
            Err(AccessError::NotAuthorized)
        );
    }

    #[test]
    fn test_permission_set_has() {
        let all = PermissionSet::all();
        let none = PermissionSet::default();

        for p in [
            Permission::ApproveUsers,
            Permission::DeleteUsers,
            Permission::ManageProjects,
            Permission::AssignTasks,
            Permission::ViewAllProjects,
        ] {
            assert!(all.has(p));
            assert!(!none.has(p));
        }
    }

    #[test]
    fn test_permission_wire_names() {
        assert_eq!(Permission::ApproveUsers.as_str(), "can_approve_users");
        assert_eq!(Permission::ViewAllProjects.as_str(), "can_view_all_projects");
        assert_eq!(
            Permission::DeleteUsers.to_string(),
            "can_delete_users"
        );
    }
}
