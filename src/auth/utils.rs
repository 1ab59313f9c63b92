use crate::{
    auth::claims::{Claims, UserRole},
    errors::{AppError, AppResult},
};

/// Quiz authoring and manual grading require an instructor or admin role.
pub fn require_instructor(claims: &Claims) -> AppResult<()> {
    match claims.role {
        UserRole::Instructor | UserRole::Admin => Ok(()),
        UserRole::Student => Err(AppError::Forbidden(
            "Only instructors can perform this action".to_string(),
        )),
    }
}

pub fn require_owner_or_admin(claims: &Claims, resource_owner: &str) -> AppResult<()> {
    if claims.role != UserRole::Admin && claims.sub != resource_owner {
        return Err(AppError::Forbidden(
            "You can only access your own resources".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_claims(user_id: &str, role: UserRole) -> Claims {
        Claims {
            sub: user_id.to_string(),
            role,
            iat: 0,
            exp: 9999999999,
        }
    }

    #[test]
    fn test_require_instructor_allows_instructor_and_admin() {
        assert!(require_instructor(&create_test_claims("i", UserRole::Instructor)).is_ok());
        assert!(require_instructor(&create_test_claims("a", UserRole::Admin)).is_ok());
    }

    #[test]
    fn test_require_instructor_rejects_student() {
        let result = require_instructor(&create_test_claims("s", UserRole::Student));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_require_owner_or_admin_as_owner() {
        let claims = create_test_claims("john", UserRole::Instructor);
        assert!(require_owner_or_admin(&claims, "john").is_ok());
    }

    #[test]
    fn test_require_owner_or_admin_as_admin() {
        let claims = create_test_claims("admin", UserRole::Admin);
        assert!(require_owner_or_admin(&claims, "other_user").is_ok());
    }

    #[test]
    fn test_require_owner_or_admin_failure() {
        let claims = create_test_claims("john", UserRole::Instructor);
        assert!(require_owner_or_admin(&claims, "jane").is_err());
    }
}
