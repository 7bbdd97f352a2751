use proptest::prelude::*;
use seistream::filter::{apply, apply_to_trace, Butterworth, CausalFilter, FilterPhase};
use seistream::TraceRecord;

/// Filter that leaves every sample untouched.  The zero-phase path around
/// it reduces to two reversals, so output must equal input exactly.
struct PassThrough;

impl CausalFilter for PassThrough {
    fn filter_in_place(&self, _samples: &mut [f32]) {}
}

/// One-sample delay: y[j] = x[j-1].  Its zero-phase wrapping shifts the
/// delay back out, so an impulse must land where it started.
struct UnitDelay;

impl CausalFilter for UnitDelay {
    fn filter_in_place(&self, samples: &mut [f32]) {
        for j in (1..samples.len()).rev() {
            samples[j] = samples[j - 1];
        }
        if let Some(first) = samples.first_mut() {
            *first = 0.0;
        }
    }
}

fn argmax(samples: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in samples.iter().enumerate() {
        if v.abs() > samples[best].abs() {
            best = i;
        }
    }
    best
}

#[test]
fn test_double_reversal_restores_any_length() {
    for n in [0usize, 1, 2, 3, 100, 101] {
        let original: Vec<f32> = (0..n).map(|i| i as f32 * 1.5 - 7.0).collect();
        let mut out = original.clone();
        apply(&PassThrough, &mut out, FilterPhase::ZeroPhase);
        assert_eq!(out, original, "length {n}");
    }
}

#[test]
fn test_zero_phase_cancels_pure_delay() {
    let n = 101;
    let mid = n / 2;
    let mut impulse = vec![0.0f32; n];
    impulse[mid] = 1.0;

    let mut causal = impulse.clone();
    apply(&UnitDelay, &mut causal, FilterPhase::Causal);
    assert_eq!(argmax(&causal), mid + 1, "causal pass keeps the delay");

    let mut zero = impulse.clone();
    apply(&UnitDelay, &mut zero, FilterPhase::ZeroPhase);
    assert_eq!(argmax(&zero), mid, "zero-phase pass cancels it");
}

#[test]
fn test_butterworth_zero_phase_aligns_on_impulse() {
    let n = 101;
    let mid = n / 2;
    let filter = Butterworth::lowpass(3, 0.1).unwrap();

    let mut causal = vec![0.0f32; n];
    causal[mid] = 1.0;
    apply(&filter, &mut causal, FilterPhase::Causal);

    let mut zero = vec![0.0f32; n];
    zero[mid] = 1.0;
    apply(&filter, &mut zero, FilterPhase::ZeroPhase);

    assert_eq!(argmax(&zero), mid, "zero-phase peak stays on the impulse");
    assert!(argmax(&causal) > mid, "causal peak is delayed past the impulse");
    assert_ne!(causal, zero);

    // The zero-phase response is symmetric around the impulse.
    for j in 1..20 {
        let diff = (zero[mid - j] - zero[mid + j]).abs();
        assert!(diff < 1e-3, "asymmetry {diff} at lag {j}");
    }
}

#[test]
fn test_apply_to_trace_filters_payload() {
    let filter = Butterworth::highpass(4, 0.2).unwrap();
    let mut trace = TraceRecord::new(vec![1.0; 300]);
    apply_to_trace(&filter, &mut trace, FilterPhase::ZeroPhase);
    assert_eq!(trace.ns(), 300);
    // A constant signal has no content above the cut.
    assert!(trace.data[150].abs() < 1e-3);
}

proptest! {
    #[test]
    fn zero_phase_around_pass_through_is_identity(
        v in proptest::collection::vec(-1.0e6f32..1.0e6, 0..256)
    ) {
        let mut out = v.clone();
        apply(&PassThrough, &mut out, FilterPhase::ZeroPhase);
        prop_assert_eq!(out, v);
    }
}
