use std::collections::HashMap;

use crate::key_value_store::normalize_range;

/// Members mapped to scores. Ordering (ascending score, then member name) is
/// computed on demand by every rank and range query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
}

impl SortedSet {
    /// Inserts or overwrites a member. Returns `true` when the member is new.
    pub fn insert(&mut self, member: String, score: f64) -> bool {
        self.scores.insert(member, score).is_none()
    }

    pub fn remove(&mut self, member: &str) -> bool {
        self.scores.remove(member).is_some()
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut members: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(member, score)| (member.as_str(), *score))
            .collect();

        members.sort_by(|(a_member, a_score), (b_member, b_score)| {
            a_score.total_cmp(b_score).then_with(|| a_member.cmp(b_member))
        });

        members
    }

    pub fn rank(&self, member: &str) -> Option<usize> {
        if !self.scores.contains_key(member) {
            return None;
        }

        self.ranked()
            .iter()
            .position(|(candidate, _)| *candidate == member)
    }

    pub fn range(&self, start: i64, end: i64) -> Vec<String> {
        let Some((start, end)) = normalize_range(start, end, self.len()) else {
            return Vec::new();
        };

        self.ranked()[start..=end]
            .iter()
            .map(|(member, _)| member.to_string())
            .collect()
    }
}
