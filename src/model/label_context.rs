use serde::Serialize;
use thiserror::Error;

use crate::model::category::SkillCategory;
use crate::model::cluster_id::ClusterId;

/// Resolved good/bad cluster ids of one training run.
///
/// Every cluster id that is neither `good` nor `bad` is average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelContext {
    pub good: ClusterId,
    pub bad: ClusterId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextRangeError {
    #[error("{tag} cluster id {id} outside 1..={n_clusters}")]
    OutOfRange {
        tag: &'static str,
        id: ClusterId,
        n_clusters: usize,
    },
    #[error("good and bad both map to cluster {0}")]
    Degenerate(ClusterId),
}

impl LabelContext {
    pub fn new(good: ClusterId, bad: ClusterId) -> Self {
        Self { good, bad }
    }

    pub fn category_of(&self, cluster: ClusterId) -> SkillCategory {
        if cluster == self.bad {
            SkillCategory::Bad
        } else if cluster == self.good {
            SkillCategory::Good
        } else {
            SkillCategory::Average
        }
    }

    pub fn validate(&self, n_clusters: usize) -> Result<(), ContextRangeError> {
        for (tag, id) in [("Good", self.good), ("Bad", self.bad)] {
            if !id.within(n_clusters) {
                return Err(ContextRangeError::OutOfRange {
                    tag,
                    id,
                    n_clusters,
                });
            }
        }
        if self.good == self.bad {
            return Err(ContextRangeError::Degenerate(self.good));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/label_context.rs"]
mod tests;
