//! Engagement counters and the score used to rank stories.
//!
//! Real engagement metrics are not available at fetch time, so counters come
//! from an [`EngagementModel`] injected into every fetcher. The default
//! [`RandomEngagement`] draws mock values; [`FixedEngagement`] gives
//! deterministic runs.

use crate::models::Engagement;
use rand::{Rng, rng};

const LIKE_WEIGHT: f64 = 1.0;
const SHARE_WEIGHT: f64 = 1.5;
const COMMENT_WEIGHT: f64 = 2.0;

/// Weighted engagement score: `likes * 1.0 + shares * 1.5 + comments * 2.0`.
pub fn score(engagement: &Engagement) -> f64 {
    f64::from(engagement.likes) * LIKE_WEIGHT
        + f64::from(engagement.shares) * SHARE_WEIGHT
        + f64::from(engagement.comments) * COMMENT_WEIGHT
}

/// Source of engagement counters for freshly fetched stories.
pub trait EngagementModel: Send + Sync {
    fn sample(&self) -> Engagement;
}

/// Mock counters drawn uniformly from fixed inclusive ranges.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomEngagement;

impl EngagementModel for RandomEngagement {
    fn sample(&self) -> Engagement {
        let mut r = rng();
        Engagement {
            likes: r.random_range(50..=500),
            shares: r.random_range(10..=100),
            comments: r.random_range(5..=50),
        }
    }
}

/// Always returns the same counters.
#[derive(Debug, Clone, Copy)]
pub struct FixedEngagement(pub Engagement);

impl EngagementModel for FixedEngagement {
    fn sample(&self) -> Engagement {
        self.0
    }
}
