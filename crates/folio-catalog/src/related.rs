use folio_core::ContentRecord;
use std::collections::HashSet;
use typed_builder::TypedBuilder;

/// Number of related records returned when the caller does not say.
pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Score adjustments applied on top of the shared-tag count.
#[derive(Debug, Clone, Copy, PartialEq, TypedBuilder)]
pub struct RankWeights {
    /// Added to featured candidates.
    #[builder(default = 0.5)]
    pub featured_bonus: f64,
    /// Subtracted from archived candidates.
    #[builder(default = 0.5)]
    pub archived_penalty: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Ranks candidates by topical similarity to a focal record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedRanker {
    weights: RankWeights,
}

impl RelatedRanker {
    pub fn new(weights: RankWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RankWeights {
        &self.weights
    }

    /// Returns at most `limit` candidates related to `focal`, best first.
    ///
    /// The focal record itself, drafts, and candidates sharing no tag with
    /// `focal` are left out. The rest are ordered by descending score, then
    /// by most recent `published_at`; remaining ties keep input order.
    /// No match yields an empty list.
    pub fn rank<'a>(
        &self,
        focal: &ContentRecord,
        candidates: impl IntoIterator<Item = &'a ContentRecord>,
        limit: usize,
    ) -> Vec<&'a ContentRecord> {
        let focal_tags: HashSet<&str> = focal.tags.iter().map(String::as_str).collect();

        let mut scored: Vec<(f64, &ContentRecord)> = candidates
            .into_iter()
            .filter(|candidate| candidate.id != focal.id && !candidate.draft)
            .filter_map(|candidate| {
                let shared = candidate
                    .tags
                    .iter()
                    .map(String::as_str)
                    .filter(|tag| focal_tags.contains(tag))
                    .collect::<HashSet<_>>()
                    .len();
                (shared > 0).then(|| (self.score(shared, candidate), candidate))
            })
            .collect();

        // sort_by is stable, so exact ties stay in input order
        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .total_cmp(score_a)
                .then_with(|| b.published_at.cmp(&a.published_at))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record)
            .collect()
    }

    fn score(&self, shared: usize, candidate: &ContentRecord) -> f64 {
        let mut score = shared as f64;
        if candidate.featured {
            score += self.weights.featured_bonus;
        }
        if candidate.archived {
            score -= self.weights.archived_penalty;
        }
        score
    }
}

/// [`RelatedRanker::rank`] with the default weights.
pub fn rank<'a>(
    focal: &ContentRecord,
    candidates: impl IntoIterator<Item = &'a ContentRecord>,
    limit: usize,
) -> Vec<&'a ContentRecord> {
    RelatedRanker::default().rank(focal, candidates, limit)
}
