//! C5 — BehaviorStore (spec §4.5): per-user history, preference scores,
//! global popularity, and pairwise sequence counters.
//!
//! No operation here fails the calling request (spec §4.5 preamble); the
//! orchestrator only ever sees `Option`/empty collections, never an error,
//! mirroring the teacher's `parking_lot`-backed in-memory stores
//! (`vector/store/memory.rs`) rather than its fallible, WAL-backed document
//! log.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::data::UserHistoryEntry;

#[derive(Debug, Clone, Default)]
struct UserState {
    history: VecDeque<UserHistoryEntry>,
    last_selection_for: HashMap<String, (String, DateTime<Utc>)>,
    preferred_scores: HashMap<String, u64>,
    sequence: HashMap<String, HashMap<String, u64>>,
    sequence_reverse: HashMap<String, HashMap<String, u64>>,
}

#[derive(Debug, Default)]
struct GlobalState {
    popularity: HashMap<String, HashMap<String, u64>>,
    sequence: HashMap<String, HashMap<String, u64>>,
    sequence_reverse: HashMap<String, HashMap<String, u64>>,
}

/// Forward and reverse sequence edges for a query (spec §4.5:
/// `get_sequences(query, user?) -> {next, previous}`).
#[derive(Debug, Clone, Default)]
pub struct Sequences {
    pub next: Vec<(String, u64)>,
    pub previous: Vec<(String, u64)>,
}

pub struct BehaviorStore {
    users: RwLock<HashMap<String, UserState>>,
    global: RwLock<GlobalState>,
    history_cap: usize,
    preference_ttl: Duration,
    top_preferences: usize,
    sequence_limit: usize,
}

impl BehaviorStore {
    pub fn new(history_cap: usize, preference_ttl: Duration, top_preferences: usize) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            global: RwLock::new(GlobalState::default()),
            history_cap,
            preference_ttl,
            top_preferences,
            sequence_limit: top_preferences.max(10),
        }
    }

    /// Records one selection event. Updates history, preference score,
    /// popularity, and the sequence edge from the user's previous query to
    /// this one, in that order (spec §4.5 steps 1-5).
    pub fn record_selection(&self, user: &str, query: &str, selected: &str, timestamp: DateTime<Utc>) {
        let prev_query = {
            let mut users = self.users.write();
            let state = users.entry(user.to_string()).or_default();

            let prev_query = state.history.front().map(|e| e.query.clone());

            state.history.push_front(UserHistoryEntry {
                query: query.to_string(),
                selected_text: selected.to_string(),
                timestamp,
            });
            while state.history.len() > self.history_cap {
                state.history.pop_back();
            }

            state
                .last_selection_for
                .insert(query.to_string(), (selected.to_string(), timestamp));

            *state.preferred_scores.entry(selected.to_string()).or_insert(0) += 1;

            if let Some(prev) = &prev_query {
                *state
                    .sequence
                    .entry(prev.clone())
                    .or_default()
                    .entry(query.to_string())
                    .or_insert(0) += 1;
                *state
                    .sequence_reverse
                    .entry(query.to_string())
                    .or_default()
                    .entry(prev.clone())
                    .or_insert(0) += 1;
            }

            prev_query
        };

        let mut global = self.global.write();
        *global
            .popularity
            .entry(query.to_string())
            .or_default()
            .entry(selected.to_string())
            .or_insert(0) += 1;

        if let Some(prev) = prev_query {
            *global
                .sequence
                .entry(prev.clone())
                .or_default()
                .entry(query.to_string())
                .or_insert(0) += 1;
            *global
                .sequence_reverse
                .entry(query.to_string())
                .or_default()
                .entry(prev)
                .or_insert(0) += 1;
        }
    }

    /// Top-M preferred selections for `user`, descending by score, ties
    /// broken lexicographically ascending (spec §4.5: "deterministic
    /// tiebreak (lexicographic ascending)").
    pub fn get_user_preferences(&self, user: &str) -> Vec<(String, u64)> {
        let users = self.users.read();
        let Some(state) = users.get(user) else {
            return Vec::new();
        };
        top_k_sorted(&state.preferred_scores, self.top_preferences)
    }

    /// The most recently selected text for `(user, query)`, or `None` if
    /// absent or expired past `preference_ttl`.
    pub fn get_last_selection(&self, user: &str, query: &str) -> Option<String> {
        let users = self.users.read();
        let state = users.get(user)?;
        let (selected, set_at) = state.last_selection_for.get(query)?;
        if self.preference_ttl > Duration::ZERO {
            let age = Utc::now().signed_duration_since(*set_at);
            if age.to_std().unwrap_or(Duration::ZERO) > self.preference_ttl {
                return None;
            }
        }
        Some(selected.clone())
    }

    /// Bounded, newest-first history for `user`.
    pub fn get_history(&self, user: &str) -> Vec<UserHistoryEntry> {
        self.users
            .read()
            .get(user)
            .map(|s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Next/previous sequence edges for `query`. When `user` is given and
    /// has data for `query`, the user-scoped edges are used; otherwise the
    /// global edges are used (spec §4.5, §9 open question: "the spec
    /// requires the capability, not the representation" — implemented here
    /// as a precomputed reverse map rather than a scan).
    pub fn get_sequences(&self, query: &str, user: Option<&str>) -> Sequences {
        if let Some(user) = user {
            let users = self.users.read();
            if let Some(state) = users.get(user) {
                if state.sequence.contains_key(query) || state.sequence_reverse.contains_key(query) {
                    return Sequences {
                        next: state
                            .sequence
                            .get(query)
                            .map(|m| top_k_sorted(m, self.sequence_limit))
                            .unwrap_or_default(),
                        previous: state
                            .sequence_reverse
                            .get(query)
                            .map(|m| top_k_sorted(m, self.sequence_limit))
                            .unwrap_or_default(),
                    };
                }
            }
        }

        let global = self.global.read();
        Sequences {
            next: global
                .sequence
                .get(query)
                .map(|m| top_k_sorted(m, self.sequence_limit))
                .unwrap_or_default(),
            previous: global
                .sequence_reverse
                .get(query)
                .map(|m| top_k_sorted(m, self.sequence_limit))
                .unwrap_or_default(),
        }
    }

    pub fn get_global_popularity(&self, query: &str) -> Vec<(String, u64)> {
        self.global
            .read()
            .popularity
            .get(query)
            .map(|m| top_k_sorted(m, self.top_preferences))
            .unwrap_or_default()
    }
}

/// Descending by score, ties broken lexicographically ascending, capped at
/// `k` (spec §4.5: "all sorted multisets expose top-K in descending-score
/// order with deterministic tiebreak").
fn top_k_sorted(map: &HashMap<String, u64>, k: usize) -> Vec<(String, u64)> {
    let mut items: Vec<(String, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items.truncate(k);
    items
}

pub type SharedBehaviorStore = std::sync::Arc<BehaviorStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_selection_is_increment_additive() {
        let store = BehaviorStore::new(100, Duration::from_secs(3600), 10);
        for _ in 0..3 {
            store.record_selection("u1", "销售", "销售额趋势分析", Utc::now());
        }
        let prefs = store.get_user_preferences("u1");
        assert_eq!(prefs.iter().find(|(t, _)| t == "销售额趋势分析").unwrap().1, 3);
    }

    #[test]
    fn sequence_edges_follow_chronological_history() {
        let store = BehaviorStore::new(100, Duration::from_secs(3600), 10);
        store.record_selection("u", "A", "A", Utc::now());
        store.record_selection("u", "B", "B", Utc::now());
        store.record_selection("u", "C", "C", Utc::now());

        let seq_a = store.get_sequences("A", Some("u"));
        assert!(seq_a.next.iter().any(|(q, _)| q == "B"));

        let seq_b = store.get_sequences("B", Some("u"));
        assert!(seq_b.next.iter().any(|(q, _)| q == "C"));

        let seq_c = store.get_sequences("C", Some("u"));
        assert!(seq_c.previous.iter().any(|(q, _)| q == "B"));
    }

    #[test]
    fn last_selection_expires_past_ttl() {
        let store = BehaviorStore::new(100, Duration::from_millis(1), 10);
        store.record_selection("u", "销售", "销售额", Utc::now() - chrono::Duration::seconds(5));
        assert_eq!(store.get_last_selection("u", "销售"), None);
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let store = BehaviorStore::new(2, Duration::from_secs(3600), 10);
        store.record_selection("u", "A", "A", Utc::now());
        store.record_selection("u", "B", "B", Utc::now());
        store.record_selection("u", "C", "C", Utc::now());
        let history = store.get_history("u");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "C");
    }

    #[test]
    fn unknown_user_returns_empty_not_panic() {
        let store = BehaviorStore::new(100, Duration::from_secs(3600), 10);
        assert!(store.get_user_preferences("ghost").is_empty());
        assert_eq!(store.get_last_selection("ghost", "q"), None);
    }
}
