//! The identity → grant-flag mapping carried on every file record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Any entry, whatever its flag, makes the identity a member; members may
/// update the record and its sharing. Reading content needs the flag to be
/// `true`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccessUserList(BTreeMap<String, bool>);

impl AccessUserList {
    /// The conventional seed for a new record: just its owner.
    pub fn only(identity: impl Into<String>) -> Self {
        let mut list = BTreeMap::new();
        list.insert(identity.into(), true);
        Self(list)
    }

    /// Parse the JSON object form used on the wire, e.g. `{"alice":true}`.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.0.contains_key(identity)
    }

    pub fn is_granted(&self, identity: &str) -> bool {
        self.0.get(identity).copied().unwrap_or(false)
    }

    pub fn grant(&mut self, identity: impl Into<String>) {
        self.0.insert(identity.into(), true);
    }

    pub fn revoke(&mut self, identity: &str) {
        if let Some(flag) = self.0.get_mut(identity) {
            *flag = false;
        }
    }

    pub fn granted(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(id, _)| id.as_str())
    }
}

impl FromIterator<(String, bool)> for AccessUserList {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_true_flags_grant() {
        let list = AccessUserList::parse(r#"{"alice":true,"bob":false}"#).unwrap();
        assert!(list.is_granted("alice"));
        assert!(!list.is_granted("bob"));
        assert!(!list.is_granted("carol"));
        assert_eq!(list.granted().collect::<Vec<_>>(), vec!["alice"]);
    }

    #[test]
    fn revoked_entry_is_still_a_member() {
        let list = AccessUserList::parse(r#"{"alice":true,"bob":false}"#).unwrap();
        assert!(list.contains("alice"));
        assert!(list.contains("bob"));
        assert!(!list.contains("carol"));
    }

    #[test]
    fn non_mapping_is_rejected() {
        assert!(AccessUserList::parse(r#"["alice"]"#).is_err());
        assert!(AccessUserList::parse(r#"{"alice":"yes"}"#).is_err());
    }

    #[test]
    fn revoke_keeps_the_entry() {
        let mut list = AccessUserList::only("alice");
        list.grant("bob");
        list.revoke("bob");
        assert!(!list.is_granted("bob"));
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"{"alice":true,"bob":false}"#);
    }
}
