//! Sliding window smoothing of pass intensities.
use serde::Serialize;

use crate::{Pass, Sample};

/// Number of samples before a sample that are included in its window.
pub const WINDOW_BEFORE: usize = 10;
/// Number of samples after a sample that are included in its window.
pub const WINDOW_AFTER: usize = 9;

/// A [Sample] together with the values derived from its neighbours in a pass.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SmoothedSample {
    #[serde(flatten)]
    sample: Sample,
    avg_intensity: f64,
    fill_value: f64,
}

impl SmoothedSample {
    #[must_use]
    pub fn new(sample: Sample, avg_intensity: f64) -> Self {
        SmoothedSample {
            sample,
            avg_intensity,
            fill_value: fill_value(avg_intensity),
        }
    }

    #[must_use]
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Windowed mean of the raw intensity.
    #[must_use]
    pub fn avg_intensity(&self) -> f64 {
        self.avg_intensity
    }

    /// `ceil(ln(avg_intensity))`, or NaN when the average is not positive.
    #[must_use]
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// False if the average was not positive and the fill value is NaN.
    #[must_use]
    pub fn has_fill(&self) -> bool {
        !self.fill_value.is_nan()
    }
}

impl AsRef<Sample> for SmoothedSample {
    fn as_ref(&self) -> &Sample {
        &self.sample
    }
}

/// Rendered value for an average intensity.
///
/// The logarithm is not defined for non-positive averages; those, and non-finite
/// averages, produce NaN rather than `-inf` or an error.
#[must_use]
pub fn fill_value(avg_intensity: f64) -> f64 {
    if avg_intensity > 0.0 && avg_intensity.is_finite() {
        avg_intensity.ln().ceil()
    } else {
        f64::NAN
    }
}

/// Smooth a single pass.
///
/// Each sample's average covers the samples from [WINDOW_BEFORE] before it through
/// [WINDOW_AFTER] after it, inclusive, clipped to the pass. Windows never extend into
/// other passes, so samples near either end of a pass average over fewer values.
#[must_use]
pub fn smooth(pass: Pass<Sample>) -> Pass<SmoothedSample> {
    let teds: Vec<f64> = pass.samples().iter().map(Sample::raw_intensity).collect();
    let num = teds.len();

    pass.map(|(i, sample)| {
        let start = i.saturating_sub(WINDOW_BEFORE);
        let end = (i + WINDOW_AFTER + 1).min(num);
        let window = &teds[start..end];
        let avg = window.iter().sum::<f64>() / window.len() as f64;
        SmoothedSample::new(sample, avg)
    })
}
