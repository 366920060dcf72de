/// The authorization policy
///
/// Every decision about who may read, create, update, or delete a project or
/// task lives here, as pure functions of the actor and a snapshot of the
/// resource. Nothing in this module touches the database or the request;
/// handlers load the snapshots and call in.
///
/// Two layers are exposed:
///
/// - `can_*` predicates returning `bool`, used directly for filtering and in
///   tests;
/// - `require_*` wrappers returning `Result<(), PolicyError>` carrying the
///   exact denial message for the operation, which the API maps to 403.
///
/// # Decision table
///
/// | Entity  | Operation      | Allowed when                                             |
/// |---------|----------------|----------------------------------------------------------|
/// | Project | read           | admin, owner, or member                                  |
/// | Project | create         | role is responsable or admin                             |
/// | Project | update/delete  | admin or owner                                           |
/// | Project | add member     | admin or owner                                           |
/// | Task    | read           | admin, creator, assignee, project owner, project member  |
/// | Task    | create         | admin, project owner, or project member                  |
/// | Task    | update/delete  | admin, task creator, or project owner                    |
///
/// List endpoints apply the same predicates as filters: non-admins see only
/// the projects they own or belong to and the tasks they created or are
/// assigned to.

use uuid::Uuid;

use super::middleware::Actor;
use crate::models::user::UserRole;

/// Error type for policy denials
///
/// The messages are part of the API contract and match the product's
/// historical wording, French and English alike.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Actor may not read the project
    #[error("Pas autorisé à accéder à ce projet")]
    ProjectRead,

    /// Actor's role may not create projects
    #[error("Not authorized to create projects")]
    ProjectCreate,

    /// Actor may not update the project
    #[error("Pas autorisé à modifier ce projet")]
    ProjectUpdate,

    /// Actor may not delete the project
    #[error("Not authorized to delete this project")]
    ProjectDelete,

    /// Actor may not manage the project's members
    #[error("Not authorized to add members to this project")]
    ProjectAddMember,

    /// Actor may not read the task
    #[error("Not authorized to access this task")]
    TaskRead,

    /// Actor may not create tasks in the project
    #[error("Not authorized to add tasks to this project")]
    TaskCreate,

    /// Actor may not update the task
    #[error("Not authorized to update this task")]
    TaskUpdate,

    /// Actor may not delete the task
    #[error("Not authorized to delete this task")]
    TaskDelete,
}

/// Snapshot of a project's access-relevant fields
///
/// Built once per request from the project row and its membership rows,
/// then evaluated without further I/O.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    /// Owner user ID
    pub owner_id: Uuid,

    /// Member user IDs (owner not included)
    pub member_ids: Vec<Uuid>,
}

impl ProjectAccess {
    /// Whether the user is in the member list
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Whether the user is the owner
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

// ---- Project decisions ----

/// Read access: admin, owner, or member
pub fn can_read_project(actor: &Actor, project: &ProjectAccess) -> bool {
    actor.is_admin() || project.is_owner(actor.id) || project.is_member(actor.id)
}

/// Creation is gated purely on role: responsable or admin
pub fn can_create_project(role: UserRole) -> bool {
    role.can_create_projects()
}

/// Update and delete: admin or owner only; members cannot modify
pub fn can_modify_project(actor: &Actor, project: &ProjectAccess) -> bool {
    actor.is_admin() || project.is_owner(actor.id)
}

// ---- Task decisions ----

/// Read access: admin, creator, assignee, or anyone with access to the
/// parent project
///
/// `assigned_to` may be absent and `project` may be gone (tasks outlive
/// deleted projects); both paths simply contribute nothing to the decision.
pub fn can_read_task(
    actor: &Actor,
    created_by: Uuid,
    assigned_to: Option<Uuid>,
    project: Option<&ProjectAccess>,
) -> bool {
    if actor.is_admin() || created_by == actor.id {
        return true;
    }

    if assigned_to == Some(actor.id) {
        return true;
    }

    match project {
        Some(p) => p.is_owner(actor.id) || p.is_member(actor.id),
        None => false,
    }
}

/// Creation requires standing in the parent project: owner, member, or admin
pub fn can_create_task(actor: &Actor, project: &ProjectAccess) -> bool {
    actor.is_admin() || project.is_owner(actor.id) || project.is_member(actor.id)
}

/// Update and delete: admin, the task's creator, or the parent project's
/// owner
///
/// A plain project member who neither created the task nor owns the project
/// may read it but not change it.
pub fn can_modify_task(actor: &Actor, created_by: Uuid, project_owner: Option<Uuid>) -> bool {
    actor.is_admin() || created_by == actor.id || project_owner == Some(actor.id)
}

// ---- Require wrappers ----

/// Project read or 403
pub fn require_read_project(actor: &Actor, project: &ProjectAccess) -> Result<(), PolicyError> {
    if can_read_project(actor, project) {
        Ok(())
    } else {
        Err(PolicyError::ProjectRead)
    }
}

/// Project creation or 403
pub fn require_create_project(role: UserRole) -> Result<(), PolicyError> {
    if can_create_project(role) {
        Ok(())
    } else {
        Err(PolicyError::ProjectCreate)
    }
}

/// Project update or 403
pub fn require_update_project(actor: &Actor, project: &ProjectAccess) -> Result<(), PolicyError> {
    if can_modify_project(actor, project) {
        Ok(())
    } else {
        Err(PolicyError::ProjectUpdate)
    }
}

/// Project delete or 403
pub fn require_delete_project(actor: &Actor, project: &ProjectAccess) -> Result<(), PolicyError> {
    if can_modify_project(actor, project) {
        Ok(())
    } else {
        Err(PolicyError::ProjectDelete)
    }
}

/// Member management or 403
pub fn require_add_member(actor: &Actor, project: &ProjectAccess) -> Result<(), PolicyError> {
    if can_modify_project(actor, project) {
        Ok(())
    } else {
        Err(PolicyError::ProjectAddMember)
    }
}

/// Task read or 403
pub fn require_read_task(
    actor: &Actor,
    created_by: Uuid,
    assigned_to: Option<Uuid>,
    project: Option<&ProjectAccess>,
) -> Result<(), PolicyError> {
    if can_read_task(actor, created_by, assigned_to, project) {
        Ok(())
    } else {
        Err(PolicyError::TaskRead)
    }
}

/// Task creation or 403
pub fn require_create_task(actor: &Actor, project: &ProjectAccess) -> Result<(), PolicyError> {
    if can_create_task(actor, project) {
        Ok(())
    } else {
        Err(PolicyError::TaskCreate)
    }
}

/// Task update or 403
pub fn require_update_task(
    actor: &Actor,
    created_by: Uuid,
    project_owner: Option<Uuid>,
) -> Result<(), PolicyError> {
    if can_modify_task(actor, created_by, project_owner) {
        Ok(())
    } else {
        Err(PolicyError::TaskUpdate)
    }
}

/// Task delete or 403
pub fn require_delete_task(
    actor: &Actor,
    created_by: Uuid,
    project_owner: Option<Uuid>,
) -> Result<(), PolicyError> {
    if can_modify_task(actor, created_by, project_owner) {
        Ok(())
    } else {
        Err(PolicyError::TaskDelete)
    }
}
