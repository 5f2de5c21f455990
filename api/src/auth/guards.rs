//! Centralized authorization checks shared by every route group.
//!
//! Coarse role/tenant gates live here; record-level ownership rules
//! (who authored an attendance record or result) live on the models.

use db::error::DomainError;
use db::models::user::{self, Role};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::auth::claims::Claims;

/// Load the caller's full user row from verified claims.
///
/// A valid token for a since-deleted account is treated as forbidden
/// rather than a server error.
pub async fn load_actor(
    db: &DatabaseConnection,
    claims: &Claims,
) -> Result<user::Model, DomainError> {
    user::Entity::find_by_id(claims.sub)
        .one(db)
        .await
        .map_err(DomainError::Db)?
        .ok_or_else(|| DomainError::forbidden("User account no longer exists"))
}

pub fn ensure_super_admin(actor: &user::Model) -> Result<(), DomainError> {
    if actor.role == Role::SuperAdmin {
        Ok(())
    } else {
        Err(DomainError::forbidden("Super admin access required"))
    }
}

/// Management access to one school: super admins anywhere, school admins
/// only within their own school.
pub fn ensure_school_admin(actor: &user::Model, school_id: i64) -> Result<(), DomainError> {
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::SchoolAdmin if actor.school_id == Some(school_id) => Ok(()),
        _ => Err(DomainError::forbidden("You may not manage this school")),
    }
}

/// Read access to school-scoped listings: any member of the school, or a
/// super admin.
pub fn ensure_same_school(actor: &user::Model, school_id: i64) -> Result<(), DomainError> {
    match actor.role {
        Role::SuperAdmin => Ok(()),
        _ if actor.school_id == Some(school_id) => Ok(()),
        _ => Err(DomainError::forbidden(
            "You may not access this school's records",
        )),
    }
}
