//! Role- and ownership-based authorization for Trellis.
//!
//! This crate decides whether an authenticated identity may perform an
//! action. It combines two inputs:
//!
//! - a static role → permission table (`permissions::PermissionTable`)
//! - ownership facts supplied by the caller (`owner_id` of a project, the
//!   target id of a user account, ...)
//!
//! # Authorization Flow
//!
//! 1. **Request arrives** at the API layer
//! 2. **`require_authenticated`** turns the `Authorization` header into an
//!    `AuthContext` through the `user::auth::AuthService`
//! 3. **Handlers** run the checks relevant to the operation
//!    (`require_permission`, `require_owner_or_admin`, ...)
//! 4. **Decision** is `Allow` or `Deny(reason)`; the API layer maps the
//!    reason to 401 or 403
//!
//! Every check is a pure function of its arguments. The engine never reads
//! storage and keeps no state between requests.

pub mod error;
pub mod permissions;
pub mod types;

use tracing::{debug, warn};
use user::{auth::AuthService, AuthContext, Role};

pub use error::{AuthzError, Result};
pub use permissions::PermissionTable;
pub use types::{Decision, Denial, ForbiddenReason, Permission, UnauthorizedReason};

const BEARER_SCHEME: &str = "Bearer";

/// The single decision point for access control.
///
/// Cheap to clone; construct once at startup and share.
#[derive(Debug, Clone)]
pub struct AuthzEngine {
    permissions: PermissionTable,
}

impl AuthzEngine {
    pub fn new(permissions: PermissionTable) -> Self {
        Self { permissions }
    }

    /// Engine over the built-in permission table.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PermissionTable::builtin()?))
    }

    pub fn permissions(&self) -> &PermissionTable {
        &self.permissions
    }

    /// Authenticates a request from its raw `Authorization` header value.
    ///
    /// The three failure reasons are kept apart for logging but all map to
    /// the same 401 at the HTTP boundary.
    pub async fn require_authenticated(
        &self,
        authorization: Option<&str>,
        auth: &AuthService,
    ) -> std::result::Result<AuthContext, Denial> {
        let token = bearer_token(authorization).map_err(|reason| {
            debug!("Authentication failed: {}", reason.code());
            Denial::Unauthorized(reason)
        })?;

        auth.resolve(token).await.map_err(|e| {
            warn!("Authentication failed: {} ({})", e.code(), e);
            Denial::Unauthorized(UnauthorizedReason::InvalidToken)
        })
    }

    pub fn require_permission(&self, ctx: &AuthContext, permission: &Permission) -> Decision {
        if self.permissions.has_permission(&ctx.identity, permission) {
            Decision::Allow
        } else {
            deny(ctx, ForbiddenReason::PermissionDenied(permission.clone()))
        }
    }

    /// Instance-level check: the caller owns the resource or is an admin.
    ///
    /// Ownership is per-instance data, so this is not a permission-table
    /// lookup.
    pub fn require_owner_or_admin(&self, ctx: &AuthContext, owner_id: &str) -> Decision {
        if ctx.identity.id == owner_id || ctx.is_admin() {
            Decision::Allow
        } else {
            deny(ctx, ForbiddenReason::NotOwner)
        }
    }

    /// Nobody may delete their own identity, admins included.
    pub fn require_self_delete_allowed(&self, ctx: &AuthContext, target_id: &str) -> Decision {
        if ctx.identity.id == target_id {
            deny(ctx, ForbiddenReason::SelfDeleteDenied)
        } else {
            Decision::Allow
        }
    }

    /// Only admins may change a role, including their own.
    ///
    /// Re-submitting the current role is not a change.
    pub fn require_role_change_allowed(
        &self,
        ctx: &AuthContext,
        current: Role,
        requested: Option<Role>,
    ) -> Decision {
        match requested {
            Some(role) if role != current && !ctx.is_admin() => {
                deny(ctx, ForbiddenReason::RoleChangeDenied)
            }
            _ => Decision::Allow,
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(authorization: Option<&str>) -> std::result::Result<&str, UnauthorizedReason> {
    let value = authorization
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(UnauthorizedReason::MissingHeader)?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(UnauthorizedReason::WrongScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(UnauthorizedReason::InvalidToken);
    }
    Ok(token)
}

fn deny(ctx: &AuthContext, reason: ForbiddenReason) -> Decision {
    warn!(
        "Access DENIED for {} ({}): {}",
        ctx.identity.id,
        ctx.identity.role,
        reason.code()
    );
    Decision::forbid(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Arc;
    use user::{Identity, IdentityDirectory};

    fn ctx(id: &str, role: Role) -> AuthContext {
        AuthContext {
            identity_id: id.to_string(),
            identity: Identity::new(id, format!("{id}@example.com"), id, role),
            session_id: "test".to_string(),
        }
    }

    fn engine() -> AuthzEngine {
        AuthzEngine::builtin().unwrap()
    }

    fn forbidden(reason: ForbiddenReason) -> Decision {
        Decision::Deny(Denial::Forbidden(reason))
    }

    struct OneUser(Identity);

    #[async_trait]
    impl IdentityDirectory for OneUser {
        async fn lookup_by_id(&self, id: &str) -> Option<Identity> {
            (self.0.id == id).then(|| self.0.clone())
        }

        async fn lookup_by_email(&self, email: &str) -> Option<Identity> {
            (self.0.email == email).then(|| self.0.clone())
        }
    }

    fn auth_service() -> AuthService {
        AuthService::new(Arc::new(OneUser(Identity::new(
            "usr_alice",
            "alice@example.com",
            "Alice",
            Role::Member,
        ))))
    }

    #[rstest]
    #[case(None, UnauthorizedReason::MissingHeader)]
    #[case(Some(""), UnauthorizedReason::MissingHeader)]
    #[case(Some("Basic dXNlcjpwYXNz"), UnauthorizedReason::WrongScheme)]
    #[case(Some("session_usr_alice_demo123"), UnauthorizedReason::WrongScheme)]
    #[case(Some("Bearer "), UnauthorizedReason::InvalidToken)]
    #[case(Some("Bearer not_a_token"), UnauthorizedReason::InvalidToken)]
    #[case(Some("Bearer session_"), UnauthorizedReason::InvalidToken)]
    #[case(Some("Bearer session_usr_ghost_demo123"), UnauthorizedReason::InvalidToken)]
    #[tokio::test]
    async fn test_require_authenticated_denials(
        #[case] header: Option<&str>,
        #[case] reason: UnauthorizedReason,
    ) {
        let result = engine()
            .require_authenticated(header, &auth_service())
            .await;
        assert_eq!(result.unwrap_err(), Denial::Unauthorized(reason));
    }

    #[tokio::test]
    async fn test_require_authenticated_success() {
        let ctx = engine()
            .require_authenticated(Some("bearer session_usr_alice_demo123"), &auth_service())
            .await
            .unwrap();
        assert_eq!(ctx.identity_id, "usr_alice");
        assert_eq!(ctx.session_id, "demo123");
    }

    #[test]
    fn test_require_permission() {
        let engine = engine();
        assert_eq!(
            engine.require_permission(&ctx("usr_v", Role::Viewer), &Permission::READ),
            Decision::Allow
        );
        assert_eq!(
            engine.require_permission(&ctx("usr_v", Role::Viewer), &Permission::WRITE),
            forbidden(ForbiddenReason::PermissionDenied(Permission::WRITE))
        );
        assert_eq!(
            engine.require_permission(&ctx("usr_m", Role::Member), &Permission::MANAGE_USERS),
            forbidden(ForbiddenReason::PermissionDenied(Permission::MANAGE_USERS))
        );
    }

    #[rstest]
    #[case("usr_owner", Role::Viewer, true)]
    #[case("usr_owner", Role::Member, true)]
    #[case("usr_owner", Role::Admin, true)]
    #[case("usr_other", Role::Admin, true)]
    #[case("usr_other", Role::Member, false)]
    #[case("usr_other", Role::Viewer, false)]
    fn test_owner_or_admin(#[case] caller: &str, #[case] role: Role, #[case] allowed: bool) {
        let decision = engine().require_owner_or_admin(&ctx(caller, role), "usr_owner");
        if allowed {
            assert_eq!(decision, Decision::Allow);
        } else {
            assert_eq!(decision, forbidden(ForbiddenReason::NotOwner));
        }
    }

    #[rstest]
    #[case(Role::Admin)]
    #[case(Role::Member)]
    #[case(Role::Viewer)]
    fn test_self_delete_always_denied(#[case] role: Role) {
        assert_eq!(
            engine().require_self_delete_allowed(&ctx("usr_me", role), "usr_me"),
            forbidden(ForbiddenReason::SelfDeleteDenied)
        );
    }

    #[test]
    fn test_role_change() {
        let engine = engine();
        let member = ctx("usr_member", Role::Member);
        let admin = ctx("usr_admin", Role::Admin);

        assert_eq!(
            engine.require_role_change_allowed(&member, Role::Member, Some(Role::Admin)),
            forbidden(ForbiddenReason::RoleChangeDenied)
        );
        assert_eq!(
            engine.require_role_change_allowed(&member, Role::Member, Some(Role::Member)),
            Decision::Allow
        );
        assert_eq!(
            engine.require_role_change_allowed(&member, Role::Member, None),
            Decision::Allow
        );
        assert_eq!(
            engine.require_role_change_allowed(&admin, Role::Member, Some(Role::Viewer)),
            Decision::Allow
        );
    }

    /// Deleting users: self-delete rule first, then ownership.
    fn delete_user(engine: &AuthzEngine, ctx: &AuthContext, target: &str) -> Decision {
        let decision = engine.require_self_delete_allowed(ctx, target);
        if !decision.is_allowed() {
            return decision;
        }
        engine.require_owner_or_admin(ctx, target)
    }

    #[test]
    fn test_user_deletion_scenario() {
        let engine = engine();
        let admin = ctx("usr_admin", Role::Admin);
        let member = ctx("usr_member", Role::Member);

        assert_eq!(delete_user(&engine, &admin, "usr_member"), Decision::Allow);
        assert_eq!(
            delete_user(&engine, &admin, "usr_admin"),
            forbidden(ForbiddenReason::SelfDeleteDenied)
        );
        assert_eq!(
            delete_user(&engine, &member, "usr_other"),
            forbidden(ForbiddenReason::NotOwner)
        );
        assert!(!engine
            .require_permission(&member, &Permission::MANAGE_USERS)
            .is_allowed());
    }

    #[test]
    fn test_project_update_scenario() {
        let engine = engine();
        let update = |ctx: &AuthContext| {
            engine
                .require_permission(ctx, &Permission::WRITE)
                .into_result()
                .and_then(|_| engine.require_owner_or_admin(ctx, "usr_owner").into_result())
        };

        assert_eq!(update(&ctx("usr_owner", Role::Member)), Ok(()));
        assert_eq!(
            update(&ctx("usr_other", Role::Member)),
            Err(Denial::Forbidden(ForbiddenReason::NotOwner))
        );
        assert_eq!(update(&ctx("usr_admin", Role::Admin)), Ok(()));
    }
}
