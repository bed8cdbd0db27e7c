use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use crate::error::Error;

/// Answers which roles are implied by a given role.
pub trait RoleHierarchy: Send + Sync {
    /// Returns every role that `role` satisfies, excluding `role` itself.
    /// Unknown roles imply nothing.
    fn lower_roles(&self, role: &str) -> Vec<String>;
}

/// A hierarchy built once from `HIGH > LOW` rules.
///
/// The lookup table holds the transitive closure, so `lower_roles` is a
/// single map access.
#[derive(Debug, Default, Clone)]
pub struct StaticHierarchy {
    reachable: BTreeMap<String, BTreeSet<String>>,
}

impl StaticHierarchy {
    const SEPARATOR: char = '>';

    /// Parses rules such as `"ADMIN > EDITOR"` or `"ADMIN > EDITOR > VIEWER"`.
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let mut direct: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for rule in rules {
            let rule = rule.as_ref();
            let roles: Vec<&str> = rule.split(Self::SEPARATOR).map(str::trim).collect();
            if roles.len() < 2 || roles.iter().any(|r| r.is_empty()) {
                return Err(Error::InvalidHierarchy(rule.to_string()).into());
            }

            for pair in roles.windows(2) {
                if pair[0] == pair[1] {
                    return Err(Error::HierarchyCycle(pair[0].to_string()).into());
                }
                direct
                    .entry(pair[0].to_string())
                    .or_default()
                    .insert(pair[1].to_string());
            }
        }

        let mut reachable = BTreeMap::new();
        for role in direct.keys() {
            let lower = Self::walk(&direct, role)?;
            reachable.insert(role.clone(), lower);
        }

        Ok(Self { reachable })
    }

    fn walk(
        direct: &BTreeMap<String, BTreeSet<String>>,
        role: &str,
    ) -> Result<BTreeSet<String>> {
        let mut lower = BTreeSet::new();
        let mut stack: Vec<&str> = vec![role];
        while let Some(current) = stack.pop() {
            let Some(children) = direct.get(current) else {
                continue;
            };
            for child in children {
                if child == role {
                    return Err(Error::HierarchyCycle(role.to_string()).into());
                }
                if lower.insert(child.clone()) {
                    stack.push(child);
                }
            }
        }
        Ok(lower)
    }

    pub fn is_empty(&self) -> bool {
        self.reachable.is_empty()
    }
}

impl RoleHierarchy for StaticHierarchy {
    fn lower_roles(&self, role: &str) -> Vec<String> {
        match self.reachable.get(role) {
            Some(lower) => lower.iter().cloned().collect(),
            None => vec![],
        }
    }
}
