use tracing::info;

use super::{AdminError, AdminService};
use crate::backend::{BackendError, UserFilter};
use crate::listings::domain::{UserId, UserProfile, UserRole};

impl AdminService {
    pub async fn list_users(
        &self,
        caller: UserId,
        filter: &UserFilter,
    ) -> Result<Vec<UserProfile>, AdminError> {
        self.authorize(caller).await?;
        Ok(self.users.list(filter).await?)
    }

    /// Change a user's role. Admins cannot change their own role and the
    /// platform always keeps at least one admin.
    pub async fn set_role(
        &self,
        caller: UserId,
        target: UserId,
        role: UserRole,
    ) -> Result<UserProfile, AdminError> {
        self.authorize(caller).await?;
        if caller == target {
            return Err(AdminError::SelfRoleChange);
        }

        let current = self
            .users
            .fetch(target)
            .await?
            .ok_or(AdminError::UserNotFound(target))?;
        if current.role == role {
            return Ok(current);
        }
        if current.role == UserRole::Admin {
            let admins = self
                .users
                .list(&UserFilter {
                    role: Some(UserRole::Admin),
                    search: None,
                })
                .await?;
            if admins.len() <= 1 {
                return Err(AdminError::LastAdmin);
            }
        }

        let updated = self
            .users
            .update_role(target, role)
            .await
            .map_err(|err| match err {
                BackendError::NotFound => AdminError::UserNotFound(target),
                other => AdminError::Backend(other),
            })?;
        info!(
            admin = %caller,
            user = %target,
            from = current.role.label(),
            to = role.label(),
            "user role changed"
        );
        Ok(updated)
    }
}
