//! Segmentation of a satellite's samples into observation passes.
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::debug;

use crate::Sample;

/// Consecutive samples further apart than this belong to different passes.
pub const MAX_GAP_MILLIS: i64 = 10 * 60 * 1000;

/// A non-empty, time ordered run of samples from a single satellite where no two
/// consecutive samples are more than [MAX_GAP_MILLIS] apart.
///
/// `T` is [Sample] for passes straight from [segment] and
/// [SmoothedSample](crate::SmoothedSample) once smoothed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Pass<T> {
    samples: Vec<T>,
}

impl<T> Pass<T> {
    /// Transform each sample, along with its index, keeping order and length.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Pass<U>
    where
        F: FnMut((usize, T)) -> U,
    {
        Pass {
            samples: self.samples.into_iter().enumerate().map(f).collect(),
        }
    }
}

impl<T: AsRef<Sample>> Pass<T> {
    /// Returns `None` if `samples` is empty.
    #[must_use]
    pub fn new(samples: Vec<T>) -> Option<Self> {
        if samples.is_empty() {
            None
        } else {
            Some(Pass { samples })
        }
    }

    #[must_use]
    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }

    #[allow(clippy::len_without_is_empty)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn first(&self) -> &T {
        // never empty
        self.samples.first().unwrap()
    }

    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn last(&self) -> &T {
        // never empty
        self.samples.last().unwrap()
    }

    /// Hours covered by this pass according to the record hour fields of its first and
    /// last samples.
    ///
    /// The range is empty if the pass crosses midnight, e.g., 23..=0.
    #[must_use]
    pub fn coverage(&self) -> RangeInclusive<u8> {
        self.first().as_ref().record_hour()..=self.last().as_ref().record_hour()
    }
}

/// Sort `samples` by time and split them into passes wherever the gap between
/// consecutive samples exceeds [MAX_GAP_MILLIS].
///
/// Sorting is stable, so samples with equal times keep their input order. Passes are
/// returned oldest first.
#[must_use]
pub fn segment(mut samples: Vec<Sample>) -> Vec<Pass<Sample>> {
    samples.sort_by_key(Sample::timestamp);

    let mut passes = Vec::default();
    let mut current: Vec<Sample> = Vec::default();
    for sample in samples {
        if let Some(prev) = current.last() {
            let gap = (sample.timestamp() - prev.timestamp()).num_milliseconds();
            if gap > MAX_GAP_MILLIS {
                passes.extend(Pass::new(std::mem::take(&mut current)));
            }
        }
        current.push(sample);
    }
    passes.extend(Pass::new(current));

    debug!(passes = passes.len(), "segmented samples");
    passes
}
