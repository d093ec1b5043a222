use std::fmt;

use serde::{Deserialize, Serialize};

/// External cluster id, 1-based.
///
/// Centroid arrays are indexed from 0 while predicted labels and the
/// persisted label context count from 1. All conversions between the two go
/// through [`ClusterId::from_index`] and [`ClusterId::index`].
/// Largest cluster count whose ids all fit a `ClusterId`.
pub const MAX_CLUSTERS: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ClusterId(u32);

impl ClusterId {
    pub fn new(id: u32) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    pub fn try_from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok()?.checked_add(1).map(Self)
    }

    /// Id of a centroid index. Trainers and loaded models reject more than
    /// [`MAX_CLUSTERS`] clusters, so every index they hand out converts; an
    /// index past that bound saturates to the last id.
    pub fn from_index(index: usize) -> Self {
        Self::try_from_index(index).unwrap_or(Self(u32::MAX))
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn within(self, n_clusters: usize) -> bool {
        self.index() < n_clusters
    }
}

impl TryFrom<u32> for ClusterId {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ClusterId::new(value).ok_or_else(|| "cluster ids are 1-based".to_string())
    }
}

impl From<ClusterId> for u32 {
    fn from(value: ClusterId) -> Self {
        value.get()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
