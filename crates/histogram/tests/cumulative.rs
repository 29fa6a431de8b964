//! Integration tests for cumulative Q distributions

use nscatter_histogram::{build_inverse, prepare_qs, Error, Histogram, InterpolationMethod};
use rstest::{fixture, rstest};

/// Uniform structure factor well beyond any 2k used here
#[fixture]
fn flat_sq() -> Histogram {
    Histogram::new(vec![0.0, 5.0, 50.0], vec![1.0, 1.0, 1.0]).unwrap()
}

/// Structure factor with a single sharp peak near Q=5
#[fixture]
fn peak_sq() -> Histogram {
    let q = (0..=200).map(|i| i as f64 * 0.05).collect::<Vec<f64>>();
    let s = q
        .iter()
        .map(|q| if (4.95..5.05).contains(q) { 1.0 } else { 0.0 })
        .collect();
    Histogram::new(q, s).unwrap()
}

#[rstest]
#[case(1.0, 0.0)] // case 1
#[case(1.0, 0.25)] // case 2
#[case(2.0, 0.5)] // case 3
#[case(3.5, 0.81)] // case 4
#[case(6.2, 0.999)] // case 5
fn flat_sq_samples_sqrt_of_u(flat_sq: Histogram, #[case] k: f64, #[case] u: f64) {
    // P(Q) ∝ Q on [0, 2k] so the inverse is Q = 2k√u exactly
    let qsq = prepare_qs(&flat_sq, 2.0 * k).unwrap();
    let inverse = build_inverse(&qsq, k).unwrap();
    let q = inverse.sample_q(u).unwrap();
    assert!((q - 2.0 * k * u.sqrt()).abs() < 1e-9, "k={k} u={u} Q={q}");
}

#[rstest]
#[case(0.0)] // case 1
#[case(0.3)] // case 2
#[case(0.7)] // case 3
#[case(0.9999)] // case 4
fn peak_sq_samples_inside_peak(peak_sq: Histogram, #[case] u: f64) {
    let k = 2.0 * std::f64::consts::PI;
    let qsq = prepare_qs(&peak_sq, 2.0 * k).unwrap();
    let inverse = build_inverse(&qsq, k).unwrap();
    let q = inverse.sample_q(u).unwrap();
    assert!((4.94..=5.06).contains(&q), "u={u} gave Q={q}");
}

#[rstest]
fn peak_out_of_reach(peak_sq: Histogram) {
    // 2k below the peak leaves nothing to sample
    let qsq = prepare_qs(&peak_sq, 10.0).unwrap();
    assert_eq!(build_inverse(&qsq, 2.0), Err(Error::ZeroIntegral));
}

#[rstest]
fn inverse_probability_is_normalised(peak_sq: Histogram) {
    let qsq = prepare_qs(&peak_sq, 20.0).unwrap();
    let inverse = build_inverse(&qsq, 6.0).unwrap();

    let p = inverse.probability();
    assert_eq!(p[0], 0.0);
    assert!((p[p.len() - 1] - 1.0).abs() < 1e-12);
    assert!(p.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(inverse.q()[inverse.q().len() - 1], 12.0);
}

#[rstest]
#[case(InterpolationMethod::Linear, vec![0.0, 0.5, 1.0, 1.5, 2.0])] // case 1
#[case(InterpolationMethod::Flat, vec![0.0, 0.0, 1.0, 1.0, 2.0])] // case 2
fn fill_between_simulated_points(
    #[case] method: InterpolationMethod,
    #[case] expected: Vec<f64>,
) {
    let mut h = Histogram::zeros(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    h.y[2] = 1.0;
    h.y[4] = 2.0;
    method.fill(&mut h, &[0, 2, 4]).unwrap();
    assert_eq!(h.y, expected);
}
