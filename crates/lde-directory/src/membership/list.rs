//! Set-semantics operations over embedded ID lists.
//!
//! Lists keep their stored order. Appends go to the end in input order,
//! removals keep the survivors in place.

use std::collections::HashSet;

use crate::group::Group;
use crate::role::{Role, RoleSnapshot};
use crate::store::Entity;
use crate::user::User;

/// An element of an embedded list, identified by a string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl Keyed for RoleSnapshot {
    fn key(&self) -> &str {
        &self.id
    }
}

/// An entity owning the list side of a relationship.
pub trait MemberList: Entity {
    type Member: Keyed + Clone + Send + Sync + 'static;

    fn members(&self) -> &[Self::Member];
    fn members_mut(&mut self) -> &mut Vec<Self::Member>;
}

impl MemberList for Group {
    type Member = String;

    fn members(&self) -> &[String] {
        &self.members
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.members
    }
}

impl MemberList for Role {
    type Member = String;

    fn members(&self) -> &[String] {
        &self.groups
    }

    fn members_mut(&mut self) -> &mut Vec<String> {
        &mut self.groups
    }
}

impl MemberList for User {
    type Member = RoleSnapshot;

    fn members(&self) -> &[RoleSnapshot] {
        &self.roles
    }

    fn members_mut(&mut self) -> &mut Vec<RoleSnapshot> {
        &mut self.roles
    }
}

pub fn contains<M: Keyed>(list: &[M], key: &str) -> bool {
    list.iter().any(|m| m.key() == key)
}

/// Key of the first element that appears more than once.
pub fn first_duplicate<M: Keyed>(list: &[M]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(list.len());
    list.iter().map(Keyed::key).find(|key| !seen.insert(*key))
}

/// Keys from `requested` not already in `list`, deduplicated, in input order.
pub fn missing_keys<'a, M: Keyed>(list: &[M], requested: &'a [String]) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = list.iter().map(Keyed::key).collect();
    requested
        .iter()
        .map(String::as_str)
        .filter(|key| seen.insert(*key))
        .collect()
}

/// Append the candidates that are not already present. Returns how many were added.
pub fn append_new<M: Keyed>(list: &mut Vec<M>, candidates: impl IntoIterator<Item = M>) -> usize {
    let mut seen: HashSet<String> = list.iter().map(|m| m.key().to_string()).collect();
    let before = list.len();
    for candidate in candidates {
        if seen.insert(candidate.key().to_string()) {
            list.push(candidate);
        }
    }
    list.len() - before
}

/// Remove the element keyed `key`. Returns whether anything was removed.
pub fn remove_one<M: Keyed>(list: &mut Vec<M>, key: &str) -> bool {
    let before = list.len();
    list.retain(|m| m.key() != key);
    list.len() != before
}

/// Remove every element whose key is in `keys`. Returns how many were removed.
pub fn remove_all<M: Keyed>(list: &mut Vec<M>, keys: &[String]) -> usize {
    let keys: HashSet<&str> = keys.iter().map(String::as_str).collect();
    let before = list.len();
    list.retain(|m| !keys.contains(m.key()));
    before - list.len()
}
