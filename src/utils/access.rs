// src/utils/access.rs

//! Role and ownership checks shared by the class and exam handlers.
//! Every failure here is a 403, never a 401: the caller is known.

use crate::{
    error::AppError,
    models::{class::Class, user::Role},
    utils::jwt::Claims,
};

/// Passes when the caller holds one of `roles`; returns the caller's id.
pub fn require_role(claims: &Claims, roles: &[Role], message: &str) -> Result<i64, AppError> {
    if !roles.contains(&claims.role) {
        return Err(AppError::Forbidden(message.to_string()));
    }
    claims.user_id()
}

/// Read access to a class: its teacher, an enrolled student, or a super admin.
pub fn ensure_class_access(class: &Class, claims: &Claims) -> Result<(), AppError> {
    let user_id = claims.user_id()?;
    match claims.role {
        Role::SuperAdmin => Ok(()),
        Role::Teacher if class.is_taught_by(user_id) => Ok(()),
        Role::Teacher => Err(AppError::Forbidden("Not your class".to_string())),
        Role::Student if class.has_student(user_id) => Ok(()),
        Role::Student => Err(AppError::Forbidden(
            "Not enrolled in this class".to_string(),
        )),
    }
}

/// Enrollment management: the owning teacher or a super admin.
pub fn ensure_class_manager(class: &Class, claims: &Claims) -> Result<(), AppError> {
    let user_id = claims.user_id()?;
    match claims.role {
        Role::SuperAdmin => Ok(()),
        Role::Teacher if class.is_taught_by(user_id) => Ok(()),
        Role::Teacher => Err(AppError::Forbidden("Not your class".to_string())),
        Role::Student => Err(AppError::Forbidden(
            "Only teachers and super admin can manage enrollment".to_string(),
        )),
    }
}

/// Authoring rights: only the teacher who owns the class.
pub fn ensure_class_owner(class: &Class, claims: &Claims) -> Result<(), AppError> {
    let user_id = require_role(claims, &[Role::Teacher], "Only teachers can manage exams")?;
    if !class.is_taught_by(user_id) {
        return Err(AppError::Forbidden("Not your class".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    fn claims(id: i64, role: Role) -> Claims {
        Claims {
            sub: id.to_string(),
            email: format!("user{}@school.test", id),
            role,
            full_name: format!("User {}", id),
            exp: usize::MAX,
            iat: 0,
        }
    }

    fn class() -> Class {
        Class {
            id: 1,
            class_name: "Biology".into(),
            subject: "Science".into(),
            teacher_id: 10,
            student_ids: Json(vec![20]),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn read_access_follows_ownership_and_enrollment() {
        let class = class();
        assert!(ensure_class_access(&class, &claims(10, Role::Teacher)).is_ok());
        assert!(ensure_class_access(&class, &claims(20, Role::Student)).is_ok());
        assert!(ensure_class_access(&class, &claims(1, Role::SuperAdmin)).is_ok());

        assert!(matches!(
            ensure_class_access(&class, &claims(11, Role::Teacher)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_class_access(&class, &claims(21, Role::Student)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn enrolled_students_cannot_manage_enrollment() {
        let class = class();
        assert!(ensure_class_manager(&class, &claims(1, Role::SuperAdmin)).is_ok());
        assert!(ensure_class_manager(&class, &claims(20, Role::Student)).is_err());
    }

    #[test]
    fn only_owning_teacher_authors() {
        let class = class();
        assert!(ensure_class_owner(&class, &claims(10, Role::Teacher)).is_ok());
        assert!(ensure_class_owner(&class, &claims(11, Role::Teacher)).is_err());
        assert!(ensure_class_owner(&class, &claims(1, Role::SuperAdmin)).is_err());
    }

    #[test]
    fn require_role_returns_caller_id() {
        let c = claims(7, Role::Teacher);
        assert_eq!(require_role(&c, &[Role::Teacher], "no").unwrap(), 7);
        assert!(require_role(&c, &[Role::Student], "no").is_err());
    }
}
