//! Approval authority: whose leave requests an actor may decide
//!
//! Authority is one hop along the reporting links: an actor decides for the
//! users that name them as supervisor or manager. The configured top-level
//! administrative role decides for everyone. Role levels play no part.

use std::collections::BTreeSet;

use common::error::DatabaseResult;

use crate::models::{AuthUser, User};
use crate::repositories::UserDirectory;

/// The set of users an actor has authority over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authority {
    Everyone,
    DirectReports(BTreeSet<String>),
}

impl Authority {
    pub fn covers(&self, user_id: &str) -> bool {
        match self {
            Authority::Everyone => true,
            Authority::DirectReports(ids) => ids.contains(user_id),
        }
    }

    /// True when no request could ever be in scope
    pub fn is_empty(&self) -> bool {
        match self {
            Authority::Everyone => false,
            Authority::DirectReports(ids) => ids.is_empty(),
        }
    }
}

#[derive(Clone)]
pub struct AuthorityResolver<U> {
    users: U,
    admin_role: String,
}

impl<U: UserDirectory> AuthorityResolver<U> {
    pub fn new(users: U, admin_role: impl Into<String>) -> Self {
        Self {
            users,
            admin_role: admin_role.into(),
        }
    }

    pub fn is_admin(&self, actor: &AuthUser) -> bool {
        actor.role == self.admin_role
    }

    /// Users in the actor's scope, as records
    pub async fn members(&self, actor: &AuthUser) -> DatabaseResult<Vec<User>> {
        if self.is_admin(actor) {
            self.users.list_all().await
        } else {
            // Single lookup on the links; cycles and self-links need no special care
            self.users.list_direct_reports(&actor.id).await
        }
    }

    pub async fn resolve(&self, actor: &AuthUser) -> DatabaseResult<Authority> {
        if self.is_admin(actor) {
            return Ok(Authority::Everyone);
        }

        let reports = self.users.list_direct_reports(&actor.id).await?;
        Ok(Authority::DirectReports(
            reports.into_iter().map(|u| u.id).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryUserDirectory, actor, user};

    fn directory() -> MemoryUserDirectory {
        MemoryUserDirectory::with_users(vec![
            user("EMP001", "Employee", Some("SUP001"), Some("MAN001")),
            user("EMP002", "Employee", Some("SUP001"), Some("MAN001")),
            user("SUP001", "Supervisor", None, Some("MAN001")),
            user("EMP003", "Employee", Some("MAN001"), Some("ADMIN01")),
            user("MAN001", "Manager", None, Some("ADMIN01")),
            user("ADMIN01", "Administrator", None, None),
        ])
    }

    #[tokio::test]
    async fn supervisor_covers_direct_reports_only() {
        let resolver = AuthorityResolver::new(directory(), "Administrator");
        let authority = resolver
            .resolve(&actor("SUP001", "Supervisor"))
            .await
            .unwrap();

        assert!(authority.covers("EMP001"));
        assert!(authority.covers("EMP002"));
        assert!(!authority.covers("EMP003"));
        assert!(!authority.covers("SUP001"));
    }

    #[tokio::test]
    async fn authority_is_not_transitive() {
        let resolver = AuthorityResolver::new(directory(), "Administrator");
        let authority = resolver
            .resolve(&actor("ADMIN01", "Manager"))
            .await
            .unwrap();

        // ADMIN01 manages MAN001 and EMP003 but not MAN001's reports
        assert!(authority.covers("MAN001"));
        assert!(authority.covers("EMP003"));
        assert!(!authority.covers("EMP001"));
        assert!(!authority.covers("SUP001"));
    }

    #[tokio::test]
    async fn admin_role_covers_everyone_regardless_of_links() {
        let resolver = AuthorityResolver::new(directory(), "Administrator");
        let admin = actor("ADMIN01", "Administrator");

        assert_eq!(resolver.resolve(&admin).await.unwrap(), Authority::Everyone);
        assert_eq!(resolver.members(&admin).await.unwrap().len(), 6);
        assert!(resolver.is_admin(&admin));
    }

    #[tokio::test]
    async fn level_grants_nothing() {
        let resolver = AuthorityResolver::new(directory(), "Administrator");
        let authority = resolver
            .resolve(&actor("EMP002", "Manager"))
            .await
            .unwrap();
        assert!(authority.is_empty());
    }

    #[tokio::test]
    async fn cycles_and_self_links_resolve_in_one_hop() {
        let users = MemoryUserDirectory::with_users(vec![
            user("A", "Employee", Some("B"), None),
            user("B", "Employee", Some("A"), None),
            user("C", "Employee", Some("C"), Some("C")),
        ]);
        let resolver = AuthorityResolver::new(users, "Administrator");

        let a = resolver.resolve(&actor("A", "Employee")).await.unwrap();
        assert_eq!(
            a,
            Authority::DirectReports(BTreeSet::from(["B".to_string()]))
        );

        let c = resolver.resolve(&actor("C", "Employee")).await.unwrap();
        assert_eq!(
            c,
            Authority::DirectReports(BTreeSet::from(["C".to_string()]))
        );
    }
}
