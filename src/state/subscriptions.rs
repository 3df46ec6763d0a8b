//! Per-match subscription index mapping normalized match keys to the set of
//! connections interested in that match.

use std::collections::HashSet;
use std::fmt;

use dashmap::DashMap;

use crate::state::registry::ClientId;

/// Canonical subscription key for a match.
///
/// Clients may send a match identifier as a JSON string or number; both
/// collapse to the same trimmed string key. Any non-empty trimmed string is
/// accepted — the key is deliberately not validated as a well-formed integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(String);

impl MatchKey {
    /// Normalize a raw client-supplied identifier into a key.
    ///
    /// Returns `None` when the value is empty after trimming.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Key for a stored match identifier.
    pub fn from_id(id: i64) -> Self {
        Self(id.to_string())
    }

    /// String form of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Index of live subscriptions keyed by match.
///
/// A key whose subscriber set becomes empty is removed immediately so the
/// index never accumulates stale entries. Mutated only by the per-connection
/// command handler and by registry eviction cleanup.
#[derive(Default)]
pub struct SubscriptionIndex {
    topics: DashMap<MatchKey, HashSet<ClientId>>,
}

impl SubscriptionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `client` to the subscriber set of `key`.
    pub fn subscribe(&self, key: MatchKey, client: ClientId) {
        self.topics.entry(key).or_default().insert(client);
    }

    /// Remove `client` from the subscriber set of `key`.
    ///
    /// Idempotent: unsubscribing an absent client, or from an unknown key,
    /// is a no-op.
    pub fn unsubscribe(&self, key: &MatchKey, client: ClientId) {
        let emptied = match self.topics.get_mut(key) {
            Some(mut subscribers) => {
                subscribers.remove(&client);
                subscribers.is_empty()
            }
            None => return,
        };

        if emptied {
            self.topics.remove_if(key, |_, subscribers| subscribers.is_empty());
        }
    }

    /// Remove `client` from every subscriber set, dropping emptied keys.
    ///
    /// Called when a connection closes or is evicted.
    pub fn cleanup(&self, client: ClientId) {
        let keys: Vec<MatchKey> = self
            .topics
            .iter()
            .filter(|entry| entry.value().contains(&client))
            .map(|entry| entry.key().clone())
            .collect();

        for key in keys {
            self.unsubscribe(&key, client);
        }
    }

    /// Snapshot of the subscribers currently registered for `key`.
    pub fn subscribers_of(&self, key: &MatchKey) -> Vec<ClientId> {
        self.topics
            .get(key)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of match keys currently tracked.
    pub fn tracked_matches(&self) -> usize {
        self.topics.len()
    }

    /// Drop every subscription. Used during process shutdown.
    pub fn clear(&self) {
        self.topics.clear();
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn normalization_trims_and_rejects_empty() {
        assert_eq!(MatchKey::normalize(" 7 "), Some(MatchKey::from_id(7)));
        assert_eq!(MatchKey::normalize("abc").unwrap().as_str(), "abc");
        assert_eq!(MatchKey::normalize("   "), None);
        assert_eq!(MatchKey::normalize(""), None);
    }

    #[test]
    fn numeric_and_string_forms_collide() {
        let index = SubscriptionIndex::new();
        let client = Uuid::new_v4();

        index.subscribe(MatchKey::normalize("7").unwrap(), client);
        assert_eq!(index.subscribers_of(&MatchKey::from_id(7)), vec![client]);
        assert_eq!(index.tracked_matches(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let index = SubscriptionIndex::new();
        let key = MatchKey::from_id(1);
        let client = Uuid::new_v4();

        // Never subscribed: no-op.
        index.unsubscribe(&key, client);

        index.subscribe(key.clone(), client);
        index.unsubscribe(&key, client);
        index.unsubscribe(&key, client);
        assert!(index.subscribers_of(&key).is_empty());
        assert_eq!(index.tracked_matches(), 0);
    }

    #[test]
    fn last_unsubscribe_drops_the_key() {
        let index = SubscriptionIndex::new();
        let key = MatchKey::from_id(42);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        index.subscribe(key.clone(), first);
        index.subscribe(key.clone(), second);
        index.unsubscribe(&key, first);
        assert_eq!(index.tracked_matches(), 1);

        index.unsubscribe(&key, second);
        assert_eq!(index.tracked_matches(), 0);
    }

    #[test]
    fn cleanup_removes_client_from_every_key() {
        let index = SubscriptionIndex::new();
        let leaving = Uuid::new_v4();
        let staying = Uuid::new_v4();

        index.subscribe(MatchKey::from_id(1), leaving);
        index.subscribe(MatchKey::from_id(2), leaving);
        index.subscribe(MatchKey::from_id(2), staying);

        index.cleanup(leaving);

        assert!(index.subscribers_of(&MatchKey::from_id(1)).is_empty());
        assert_eq!(index.subscribers_of(&MatchKey::from_id(2)), vec![staying]);
        // Key 1 lost its last subscriber and must be gone entirely.
        assert_eq!(index.tracked_matches(), 1);
    }

    #[test]
    fn repeated_subscribe_cleanup_cycles_leave_no_residue() {
        let index = SubscriptionIndex::new();

        for round in 0..100 {
            let client = Uuid::new_v4();
            index.subscribe(MatchKey::from_id(round % 5), client);
            index.cleanup(client);
        }

        assert_eq!(index.tracked_matches(), 0);
    }

    #[test]
    fn client_may_subscribe_to_many_matches() {
        let index = SubscriptionIndex::new();
        let client = Uuid::new_v4();

        index.subscribe(MatchKey::from_id(1), client);
        index.subscribe(MatchKey::from_id(2), client);
        index.subscribe(MatchKey::from_id(3), client);

        assert_eq!(index.tracked_matches(), 3);
        for id in 1..=3 {
            assert_eq!(index.subscribers_of(&MatchKey::from_id(id)), vec![client]);
        }
    }
}
