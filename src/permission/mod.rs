use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    auth::{AuthUser, token::TokenKeys},
    util_resp::FailureResponse,
};

/// An authenticated caller whose token carries the `ADMIN` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::info!(user_id = user.id, "non-admin hit admin route");
            return Err(FailureResponse::Forbidden(
                "Admin access required".to_string(),
            ));
        }

        Ok(AdminUser(user))
    }
}

/// Passes if `user` is `owner_id` or an admin.
pub fn ensure_owner_or_admin(
    user: &AuthUser,
    owner_id: Option<i32>,
    msg: &str,
) -> Result<(), FailureResponse> {
    if user.is_admin() || owner_id == Some(user.id) {
        Ok(())
    } else {
        Err(FailureResponse::Forbidden(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Role;

    fn user(id: i32, role: Role) -> AuthUser {
        AuthUser {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn owners_and_admins_pass() {
        assert!(ensure_owner_or_admin(&user(1, Role::User), Some(1), "no").is_ok());
        assert!(ensure_owner_or_admin(&user(2, Role::Admin), Some(1), "no").is_ok());
        assert!(ensure_owner_or_admin(&user(2, Role::Admin), None, "no").is_ok());
    }

    #[test]
    fn others_are_forbidden() {
        let err = ensure_owner_or_admin(&user(2, Role::User), Some(1), "Nope")
            .unwrap_err();
        assert_eq!(err.to_string(), "Nope");
        assert!(ensure_owner_or_admin(&user(2, Role::User), None, "no").is_err());
    }
}
