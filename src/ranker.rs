//! C7 — Ranker (spec §4.7): applies personalization and popularity boosts
//! on top of [`crate::hybrid::HybridSearcher`]'s blended scores.

use crate::behavior::SharedBehaviorStore;
use crate::data::{Source, Suggestion};
use crate::hybrid::HybridHit;

#[derive(Debug, Clone, Copy)]
pub struct RankerWeights {
    pub personalization_alpha: f32,
    pub exact_match_beta: f32,
    pub min_score: f32,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            personalization_alpha: 0.2,
            exact_match_beta: 0.3,
            min_score: 0.0,
        }
    }
}

pub struct Ranker {
    behavior: SharedBehaviorStore,
    weights: RankerWeights,
}

impl Ranker {
    pub fn new(behavior: SharedBehaviorStore, weights: RankerWeights) -> Self {
        Self { behavior, weights }
    }

    /// Ranks `hits` for `query`, optionally personalized for `user`, and
    /// returns at most `limit` suggestions sorted by final score descending
    /// (spec §4.7).
    pub fn rank(&self, query: &str, user: Option<&str>, hits: Vec<HybridHit>, limit: usize) -> Vec<Suggestion> {
        let mut scored: Vec<(f32, Source, HybridHit)> = hits
            .into_iter()
            .map(|hit| {
                let base = hit.score;
                let (personalization_bonus, final_source) = self.personalize(query, user, &hit.text, base);
                let total = base * (1.0 + personalization_bonus.multiplicative) + personalization_bonus.additive;
                (total, final_source.unwrap_or(hit.source), hit)
            })
            .filter(|(score, _, _)| *score >= self.weights.min_score)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.2.raw_lexical.partial_cmp(&a.2.raw_lexical).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| b.2.frequency.cmp(&a.2.frequency))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, source, hit)| Suggestion::new(hit.text, score, source))
            .collect()
    }

    fn personalize(&self, query: &str, user: Option<&str>, text: &str, base: f32) -> (PersonalizationBonus, Option<Source>) {
        let Some(user) = user else {
            return (PersonalizationBonus::default(), None);
        };

        let prefs = self.behavior.get_user_preferences(user);
        let max_pref = prefs.iter().map(|(_, score)| *score).max().unwrap_or(0);
        let pref_boost = if max_pref == 0 {
            0.0
        } else {
            prefs
                .iter()
                .find(|(t, _)| t == text)
                .map(|(_, score)| *score as f32 / max_pref as f32)
                .unwrap_or(0.0)
        };
        let multiplicative = self.weights.personalization_alpha * pref_boost;

        let exact_match = self.behavior.get_last_selection(user, query).as_deref() == Some(text);
        let additive = if exact_match { self.weights.exact_match_beta } else { 0.0 };

        let personalization_contribution = base * multiplicative + additive;
        let final_score = base * (1.0 + multiplicative) + additive;
        let source = if final_score > 0.0 && personalization_contribution / final_score >= 0.5 {
            Some(Source::Personalized)
        } else {
            None
        };

        (PersonalizationBonus { multiplicative, additive }, source)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PersonalizationBonus {
    multiplicative: f32,
    additive: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::BehaviorStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn hit(id: &str, text: &str, score: f32) -> HybridHit {
        HybridHit {
            id: id.to_string(),
            text: text.to_string(),
            score,
            source: Source::Hybrid,
            frequency: 0,
            raw_lexical: score,
        }
    }

    #[test]
    fn scores_are_monotonically_non_increasing() {
        let behavior = Arc::new(BehaviorStore::new(100, Duration::from_secs(3600), 10));
        let ranker = Ranker::new(behavior, RankerWeights::default());
        let hits = vec![hit("1", "a", 0.9), hit("2", "b", 0.5), hit("3", "c", 0.1)];
        let ranked = ranker.rank("q", None, hits, 10);
        for w in ranked.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn min_score_filters_low_candidates() {
        let behavior = Arc::new(BehaviorStore::new(100, Duration::from_secs(3600), 10));
        let ranker = Ranker::new(
            behavior,
            RankerWeights {
                min_score: 0.3,
                ..Default::default()
            },
        );
        let hits = vec![hit("1", "a", 0.9), hit("2", "b", 0.1)];
        let ranked = ranker.rank("q", None, hits, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].text, "a");
    }

    #[test]
    fn personalization_boosts_preferred_text_to_first() {
        let behavior = Arc::new(BehaviorStore::new(100, Duration::from_secs(3600), 10));
        for _ in 0..3 {
            behavior.record_selection("u1", "销售", "销售额趋势分析", chrono::Utc::now());
        }
        let ranker = Ranker::new(behavior, RankerWeights::default());
        let hits = vec![hit("1", "销售额", 0.5), hit("2", "销售额趋势分析", 0.35)];
        let ranked = ranker.rank("销售", Some("u1"), hits, 2);
        assert_eq!(ranked[0].text, "销售额趋势分析");
        assert_eq!(ranked[0].source.as_str(), "personalized");
    }

    #[test]
    fn limit_caps_result_count() {
        let behavior = Arc::new(BehaviorStore::new(100, Duration::from_secs(3600), 10));
        let ranker = Ranker::new(behavior, RankerWeights::default());
        let hits = vec![hit("1", "a", 0.9), hit("2", "b", 0.8), hit("3", "c", 0.7)];
        let ranked = ranker.rank("q", None, hits, 1);
        assert_eq!(ranked.len(), 1);
    }
}
