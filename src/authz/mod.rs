pub mod config;
pub mod hierarchy;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::debug;

use crate::error::Error;
use crate::principal::Principal;

use hierarchy::RoleHierarchy;
use store::{RoleQuery, RoleStore};

/// Required role that lets every request through.
pub const PERMIT_ALL: &str = "permitAll";

/// Required role that lets anonymous requests through.
pub const IS_AUTHENTICATED_ANONYMOUSLY: &str = "IS_AUTHENTICATED_ANONYMOUSLY";

/// Returns true for the reserved roles that bypass role matching.
pub fn is_sentinel(role: &str) -> bool {
    role == PERMIT_ALL || role == IS_AUTHENTICATED_ANONYMOUSLY
}

/// Possible responses from an authorization check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthzResponse {
    /// Access is granted
    Ok,
    /// Access is denied
    Unauthorized,
}

/// Decides whether a principal holds a required role, directly or through
/// the role hierarchy.
///
/// The decision depends only on the principal, the required role and the
/// answers of the store and hierarchy; nothing is remembered between calls.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
    hierarchy: Arc<dyn RoleHierarchy>,
    store_timeout: Option<Duration>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>, hierarchy: Arc<dyn RoleHierarchy>) -> Self {
        Self {
            store,
            hierarchy,
            store_timeout: None,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    /// Authorizes `principal` for `required`.
    ///
    /// Store failures are not turned into a denial: they are returned as
    /// errors so the caller's error handling sees them.
    pub async fn resolve(&self, principal: &Principal, required: &str) -> Result<AuthzResponse> {
        if is_sentinel(required) {
            debug!("Role '{required}' is unrestricted, allow '{}'", principal.name);
            return Ok(AuthzResponse::Ok);
        }

        if principal.authorities.is_empty() {
            debug!("Principal '{}' holds no authorities", principal.name);
            return Ok(AuthzResponse::Unauthorized);
        }

        let query = RoleQuery::from_authorities(&principal.authorities);
        let roles = self.find_roles(&query).await?;
        if roles.is_empty() {
            debug!("No role found for principal '{}': {query:?}", principal.name);
            return Ok(AuthzResponse::Unauthorized);
        }

        for role in roles.iter() {
            if role.authority == required {
                debug!("Principal '{}' holds role '{required}'", principal.name);
                return Ok(AuthzResponse::Ok);
            }

            let lower = self.hierarchy.lower_roles(&role.authority);
            if lower.iter().any(|r| r == required) {
                debug!(
                    "Principal '{}' holds role '{}' which implies '{required}'",
                    principal.name, role.authority
                );
                return Ok(AuthzResponse::Ok);
            }
        }

        debug!("Principal '{}' does not satisfy role '{required}'", principal.name);
        Ok(AuthzResponse::Unauthorized)
    }

    async fn find_roles(&self, query: &RoleQuery) -> Result<Vec<store::RoleDocument>> {
        let timeout = match self.store_timeout {
            Some(timeout) => timeout,
            None => return self.store.find(query).await,
        };

        match tokio::time::timeout(timeout, self.store.find(query)).await {
            Ok(result) => result,
            Err(_) => Err(Error::StoreTimeout(timeout).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;
    use async_trait::async_trait;

    use crate::principal::Authority;

    use super::hierarchy::StaticHierarchy;
    use super::store::{MemoryStore, RoleDocument};
    use super::*;

    /// Store answering every query with the same documents.
    struct FixedStore {
        roles: Vec<RoleDocument>,
        calls: AtomicUsize,
    }

    impl FixedStore {
        fn new(authorities: &[&str]) -> Arc<Self> {
            let roles = authorities
                .iter()
                .enumerate()
                .map(|(i, a)| RoleDocument::new(i.to_string(), *a))
                .collect();
            Arc::new(Self {
                roles,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RoleStore for FixedStore {
        async fn find(&self, _query: &RoleQuery) -> Result<Vec<RoleDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.roles.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RoleStore for BrokenStore {
        async fn find(&self, _query: &RoleQuery) -> Result<Vec<RoleDocument>> {
            bail!("bla")
        }
    }

    struct SlowStore;

    #[async_trait]
    impl RoleStore for SlowStore {
        async fn find(&self, _query: &RoleQuery) -> Result<Vec<RoleDocument>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    /// Hierarchy backed by a plain map, without closure.
    struct MapHierarchy(HashMap<String, Vec<String>>);

    impl MapHierarchy {
        fn new(entries: &[(&str, &str)]) -> Arc<Self> {
            let mut map: HashMap<String, Vec<String>> = HashMap::new();
            for (role, lower) in entries {
                map.entry(role.to_string())
                    .or_default()
                    .push(lower.to_string());
            }
            Arc::new(Self(map))
        }
    }

    impl RoleHierarchy for MapHierarchy {
        fn lower_roles(&self, role: &str) -> Vec<String> {
            self.0.get(role).cloned().unwrap_or_default()
        }
    }

    /// Hierarchy that maps every role to the same lower roles.
    struct FlatHierarchy(Vec<String>);

    impl RoleHierarchy for FlatHierarchy {
        fn lower_roles(&self, _role: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    fn empty_hierarchy() -> Arc<dyn RoleHierarchy> {
        Arc::new(StaticHierarchy::default())
    }

    fn user(authorities: &[&str]) -> Principal {
        Principal::with_roles("user", authorities.iter().copied())
    }

    #[tokio::test]
    async fn test_sentinel() {
        let store = FixedStore::new(&["some_other_role"]);
        let resolver = RoleResolver::new(store.clone(), empty_hierarchy());

        for role in [PERMIT_ALL, IS_AUTHENTICATED_ANONYMOUSLY] {
            let resp = resolver.resolve(&user(&["bla"]), role).await.unwrap();
            assert_eq!(resp, AuthzResponse::Ok);

            let resp = resolver.resolve(&user(&[]), role).await.unwrap();
            assert_eq!(resp, AuthzResponse::Ok);
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_authorities() {
        let store = FixedStore::new(&["SOME_ROLE"]);
        let resolver = RoleResolver::new(store.clone(), empty_hierarchy());

        let resp = resolver.resolve(&user(&[]), "SOME_ROLE").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_error() {
        let resolver = RoleResolver::new(Arc::new(BrokenStore), empty_hierarchy());
        let err = resolver
            .resolve(&user(&["bla", "bla"]), "some_role")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bla");
    }

    #[tokio::test]
    async fn test_store_timeout() {
        let resolver = RoleResolver::new(Arc::new(SlowStore), empty_hierarchy())
            .with_store_timeout(Duration::from_millis(20));
        let err = resolver
            .resolve(&user(&["bla"]), "some_role")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::StoreTimeout(_))
        ));
    }

    #[tokio::test]
    async fn test_no_roles_found() {
        let resolver = RoleResolver::new(FixedStore::new(&[]), empty_hierarchy());
        let resp = resolver.resolve(&user(&["bla"]), "some_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
    }

    #[tokio::test]
    async fn test_direct_match() {
        let resolver = RoleResolver::new(FixedStore::new(&["matching_role"]), empty_hierarchy());
        let resp = resolver
            .resolve(&user(&["bla"]), "matching_role")
            .await
            .unwrap();
        assert_eq!(resp, AuthzResponse::Ok);
    }

    #[tokio::test]
    async fn test_reference_authorities() {
        let store = Arc::new(MemoryStore::with_roles(vec![
            RoleDocument::new("adwawdawd", "matching_role"),
            RoleDocument::new("other", "other_role"),
        ]));
        let resolver = RoleResolver::new(store, empty_hierarchy());

        let principal = Principal::new("user", vec![Authority::reference("adwawdawd")]);
        let resp = resolver.resolve(&principal, "matching_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Ok);

        let principal = Principal::new("user", vec![Authority::reference("other")]);
        let resp = resolver.resolve(&principal, "matching_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);

        // Names and references are resolved in one lookup
        let principal = Principal::new(
            "user",
            vec![Authority::name("other_role"), Authority::reference("adwawdawd")],
        );
        let resp = resolver.resolve(&principal, "matching_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Ok);
    }

    #[tokio::test]
    async fn test_store_is_authoritative() {
        // A name the store does not know grants nothing, even if it equals
        // the required role.
        let store = Arc::new(MemoryStore::with_roles(vec![RoleDocument::new(
            "1", "VIEWER",
        )]));
        let resolver = RoleResolver::new(store, empty_hierarchy());
        let resp = resolver.resolve(&user(&["ADMIN"]), "ADMIN").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
    }

    #[tokio::test]
    async fn test_empty_hierarchy() {
        let hierarchy = Arc::new(FlatHierarchy(vec![]));
        let resolver = RoleResolver::new(FixedStore::new(&["other_role"]), hierarchy);
        let resp = resolver.resolve(&user(&["bla"]), "some_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
    }

    #[tokio::test]
    async fn test_no_matching_hierarchy() {
        let hierarchy = Arc::new(FlatHierarchy(vec![
            "not_matching_child_role".to_string(),
            "another_not_matching_role".to_string(),
        ]));
        let resolver = RoleResolver::new(FixedStore::new(&["other_role"]), hierarchy);
        let resp = resolver.resolve(&user(&["bla"]), "some_role").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
    }

    #[tokio::test]
    async fn test_hierarchy_match() {
        let hierarchy = MapHierarchy::new(&[
            ("x", "not_matching_role"),
            ("y", "not_matching_role"),
            ("z", "matching_role"),
        ]);
        let resolver = RoleResolver::new(FixedStore::new(&["x", "y", "z"]), hierarchy);
        let resp = resolver
            .resolve(&user(&["bla"]), "matching_role")
            .await
            .unwrap();
        assert_eq!(resp, AuthzResponse::Ok);
    }

    #[tokio::test]
    async fn test_static_hierarchy() {
        let hierarchy =
            Arc::new(StaticHierarchy::parse(&["ADMIN > EDITOR", "EDITOR > VIEWER"]).unwrap());
        let store = Arc::new(MemoryStore::with_roles(vec![
            RoleDocument::new("1", "ADMIN"),
            RoleDocument::new("2", "EDITOR"),
            RoleDocument::new("3", "VIEWER"),
        ]));
        let resolver = RoleResolver::new(store, hierarchy);

        let admin = user(&["ADMIN"]);
        let viewer = user(&["VIEWER"]);
        for role in ["ADMIN", "EDITOR", "VIEWER"] {
            let resp = resolver.resolve(&admin, role).await.unwrap();
            assert_eq!(resp, AuthzResponse::Ok, "ADMIN should satisfy {role}");
        }
        let resp = resolver.resolve(&viewer, "EDITOR").await.unwrap();
        assert_eq!(resp, AuthzResponse::Unauthorized);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let hierarchy = MapHierarchy::new(&[("z", "matching_role")]);
        let resolver = RoleResolver::new(FixedStore::new(&["x", "z"]), hierarchy);
        let principal = user(&["bla"]);

        for required in ["matching_role", "missing_role"] {
            let first = resolver.resolve(&principal, required).await.unwrap();
            let second = resolver.resolve(&principal, required).await.unwrap();
            assert_eq!(first, second);
        }
    }
}
