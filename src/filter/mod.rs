//! Causal filtering and the zero-phase adapter.
//!
//! # Technique
//! A causal filter's output depends only on current and past input, which
//! inherently delays the signal.  [`apply`] cancels that delay by running
//! the filter forward, reversing the trace in place, running the filter
//! again, and reversing back.  The net phase shift is zero in the passband;
//! the cost is a squared magnitude response.
//!
//! # Caveat
//! The double pass has no edge compensation: a strong transient near the
//! tail of a trace pollutes the output near that boundary on the second
//! pass.  Padding the trace would help but is the caller's decision, not
//! this module's.

use std::f32::consts::PI;
use thiserror::Error;

use crate::trace::TraceRecord;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FilterError {
    #[error("filter needs at least one pole, got {0}")]
    InvalidPoles(usize),
    #[error("3 dB cutoff must lie in (0, 0.5) cycles/sample, got {0}")]
    InvalidCutoff(f32),
}

/// Phase behavior of a filter application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPhase {
    /// Single forward pass; keeps the filter's inherent delay.
    Causal,
    /// Forward pass, in-place reversal, second pass, reversal back.
    #[default]
    ZeroPhase,
}

/// The causal filter primitive: stateless across calls, deterministic, and
/// aliasing-safe (each output sample is written after its input sample is
/// read).  Parameters live on the implementor and are validated at
/// construction, before any sample data is touched.
pub trait CausalFilter {
    fn filter_in_place(&self, samples: &mut [f32]);
}

/// Apply `filter` to `samples` with the requested phase behavior.
///
/// Zero phase runs the exact sequence forward-reverse-forward-reverse; the
/// middle element of an odd-length trace is untouched by each reversal.
pub fn apply<F: CausalFilter + ?Sized>(filter: &F, samples: &mut [f32], phase: FilterPhase) {
    filter.filter_in_place(samples);
    if phase == FilterPhase::ZeroPhase {
        samples.reverse();
        filter.filter_in_place(samples);
        samples.reverse();
    }
}

/// [`apply`] on a trace record's payload.
pub fn apply_to_trace<F: CausalFilter + ?Sized>(
    filter: &F,
    trace: &mut TraceRecord,
    phase: FilterPhase,
) {
    apply(filter, &mut trace.data, phase);
}

// ── Butterworth primitive ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    LowPass,
    HighPass,
}

/// Butterworth low/high-pass causal filter.
///
/// `f3db` is the 3 dB cutoff as a fraction of the sampling rate, open
/// interval (0, 0.5).  The recursion is a cascade of one first-order stage
/// (odd pole counts only) and `npoles / 2` second-order pole-pair stages,
/// run in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Butterworth {
    band: Band,
    npoles: usize,
    f3db: f32,
}

impl Butterworth {
    pub fn lowpass(npoles: usize, f3db: f32) -> Result<Self, FilterError> {
        Self::new(Band::LowPass, npoles, f3db)
    }

    pub fn highpass(npoles: usize, f3db: f32) -> Result<Self, FilterError> {
        Self::new(Band::HighPass, npoles, f3db)
    }

    fn new(band: Band, npoles: usize, f3db: f32) -> Result<Self, FilterError> {
        if npoles == 0 {
            return Err(FilterError::InvalidPoles(npoles));
        }
        if !(f3db > 0.0 && f3db < 0.5) {
            return Err(FilterError::InvalidCutoff(f3db));
        }
        Ok(Self { band, npoles, f3db })
    }

    pub fn npoles(&self) -> usize {
        self.npoles
    }

    pub fn f3db(&self) -> f32 {
        self.f3db
    }
}

impl CausalFilter for Butterworth {
    fn filter_in_place(&self, samples: &mut [f32]) {
        // Bilinear-transform warp of the cutoff.
        let r = 2.0 * (PI * self.f3db).tan();
        let sign = match self.band {
            Band::LowPass => 1.0f32,
            Band::HighPass => -1.0f32,
        };

        if self.npoles % 2 != 0 {
            let scale = r + 2.0;
            let a = match self.band {
                Band::LowPass => r / scale,
                Band::HighPass => 2.0 / scale,
            };
            let b1 = (r - 2.0) / scale;
            let mut pjm1 = 0.0f32;
            let mut qjm1 = 0.0f32;
            for v in samples.iter_mut() {
                let pj = *v;
                *v = a * (pj + sign * pjm1) - b1 * qjm1;
                pjm1 = pj;
                qjm1 = *v;
            }
        }

        for jpair in 0..self.npoles / 2 {
            let theta = PI * ((2 * jpair + 1) as f32) / ((2 * self.npoles) as f32);
            let scale = 4.0 + 4.0 * r * theta.sin() + r * r;
            let a = match self.band {
                Band::LowPass => r * r / scale,
                Band::HighPass => 4.0 / scale,
            };
            let b1 = (2.0 * r * r - 8.0) / scale;
            let b2 = (4.0 - 4.0 * r * theta.sin() + r * r) / scale;
            let mut pjm1 = 0.0f32;
            let mut pjm2 = 0.0f32;
            let mut qjm1 = 0.0f32;
            let mut qjm2 = 0.0f32;
            for v in samples.iter_mut() {
                let pj = *v;
                *v = a * (pj + sign * 2.0 * pjm1 + pjm2) - b1 * qjm1 - b2 * qjm2;
                pjm2 = pjm1;
                pjm1 = pj;
                qjm2 = qjm1;
                qjm1 = *v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_poles() {
        assert_eq!(
            Butterworth::lowpass(0, 0.2).unwrap_err(),
            FilterError::InvalidPoles(0)
        );
    }

    #[test]
    fn rejects_out_of_band_cutoff() {
        assert!(matches!(
            Butterworth::lowpass(3, 0.0),
            Err(FilterError::InvalidCutoff(_))
        ));
        assert!(matches!(
            Butterworth::highpass(3, -0.1),
            Err(FilterError::InvalidCutoff(_))
        ));
        assert!(matches!(
            Butterworth::highpass(3, 0.5),
            Err(FilterError::InvalidCutoff(_))
        ));
        assert!(matches!(
            Butterworth::lowpass(3, f32::NAN),
            Err(FilterError::InvalidCutoff(_))
        ));
    }

    #[test]
    fn lowpass_passes_dc() {
        let filter = Butterworth::lowpass(4, 0.25).unwrap();
        let mut samples = vec![1.0f32; 400];
        filter.filter_in_place(&mut samples);
        // Unit gain at zero frequency once the transient settles.
        assert!((samples[399] - 1.0).abs() < 1e-3, "got {}", samples[399]);
    }

    #[test]
    fn highpass_blocks_dc() {
        let filter = Butterworth::highpass(4, 0.1).unwrap();
        let mut samples = vec![1.0f32; 400];
        filter.filter_in_place(&mut samples);
        assert!(samples[399].abs() < 1e-3, "got {}", samples[399]);
    }

    #[test]
    fn empty_trace_is_a_no_op() {
        let filter = Butterworth::lowpass(3, 0.2).unwrap();
        let mut samples: Vec<f32> = Vec::new();
        apply(&filter, &mut samples, FilterPhase::ZeroPhase);
        assert!(samples.is_empty());
    }
}
