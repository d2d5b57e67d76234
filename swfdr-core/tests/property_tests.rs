//! Property-based tests using proptest.
//!
//! Invariants that must hold for every valid input:
//!   - π₀ bounds under thresholding
//!   - q-value monotonicity and the cap at 1
//!   - agreement between the two smoothing modes on rough curves
//!   - posterior probabilities in the censored mixture

use proptest::prelude::*;
use rand::{Rng, SeedableRng};

use swfdr_core::censored::{estimate_swfdr, EmConfig, WINDOW};
use swfdr_core::pi0::{estimate_pi0, smooth_pi0, Pi0Config};
use swfdr_core::qvalue::{classical_qvalues, step_up_qvalues};
use swfdr_core::spline::SmoothingMode;
use swfdr_core::util::math::argsort_ascending;
use swfdr_linalg::DenseMatrix;

fn random_pvalues(m: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    (0..m)
        .map(|_| {
            let u: f64 = rng.gen();
            // Half the tests pushed towards zero
            if rng.gen::<bool>() { u } else { u.powi(4) }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Thresholded π₀ lies in [0, 1]
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_pi0_in_unit_interval(
        m in 200usize..400,
        seed in 0u64..1000,
        general in any::<bool>(),
    ) {
        let p = random_pvalues(m, seed);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed + 1);
        let cov: Vec<f64> = (0..m).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();
        let x = DenseMatrix::from_col_major(m, 1, cov);
        let config = Pi0Config {
            smoothing: if general { SmoothingMode::GeneralSpline } else { SmoothingMode::UnitIntervalSpline },
            ..Pi0Config::default()
        };
        let est = estimate_pi0(&p, Some(&x), &config).unwrap();
        prop_assert_eq!(est.pi0.len(), m);
        for &v in &est.pi0 {
            prop_assert!((0.0..=1.0).contains(&v), "pi0 out of range: {}", v);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Q-values are monotone in p and capped at 1
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_qvalues_monotone_and_capped(
        p in prop::collection::vec(0.0f64..=1.0, 1..200),
        pi0_seed in 0u64..1000,
        pfdr in any::<bool>(),
    ) {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(pi0_seed);
        let pi0: Vec<f64> = (0..p.len()).map(|_| rng.gen::<f64>()).collect();
        let q = step_up_qvalues(&p, &pi0, pfdr).unwrap();
        prop_assert_eq!(q.len(), p.len());
        let order = argsort_ascending(&p);
        for w in order.windows(2) {
            prop_assert!(q[w[0]] <= q[w[1]], "not monotone: {} > {}", q[w[0]], q[w[1]]);
        }
        for &v in &q {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn prop_constant_pi0_is_classical(
        p in prop::collection::vec(0.0f64..=1.0, 1..200),
        pi0 in 0.0f64..=1.0,
    ) {
        let q = step_up_qvalues(&p, &vec![pi0; p.len()], false).unwrap();
        prop_assert_eq!(q, classical_qvalues(&p, pi0));
    }
}

// ---------------------------------------------------------------------------
// 3. Smoothing modes agree within 1% on rough curves
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_smoothing_modes_agree(
        a in 0.3f64..1.0,
        b in -0.3f64..0.3,
        noise in prop::collection::vec(-0.15f64..0.15, 19),
        rows in 1usize..6,
    ) {
        let lambda = Pi0Config::default().lambda;
        prop_assert_eq!(lambda.len(), noise.len());
        let curves: Vec<Vec<f64>> = (0..rows)
            .map(|r| {
                lambda
                    .iter()
                    .zip(noise.iter())
                    .enumerate()
                    .map(|(j, (&l, &e))| {
                        let wobble = if (j + r) % 2 == 0 { e } else { -0.5 * e };
                        a + b * l + wobble
                    })
                    .collect()
            })
            .collect();
        let m = DenseMatrix::from_rows(&curves);
        let general = smooth_pi0(&m, &lambda, SmoothingMode::GeneralSpline, 3.0, false).unwrap();
        let unit = smooth_pi0(&m, &lambda, SmoothingMode::UnitIntervalSpline, 3.0, false).unwrap();
        for (g, u) in general.pi0.iter().zip(unit.pi0.iter()) {
            prop_assert!((g - u).abs() <= 0.01, "general {} vs unit {}", g, u);
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Censored EM keeps probabilities in range
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn prop_em_state_is_valid(
        n in 50usize..300,
        seed in 0u64..1000,
    ) {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let p: Vec<f64> = (0..n)
            .map(|_| {
                let u = 1.0 - rng.gen::<f64>();
                if rng.gen::<bool>() { u * WINDOW } else { u.powi(3) * WINDOW }
            })
            .collect();
        let truncated: Vec<bool> = (0..n).map(|_| rng.gen::<f64>() < 0.1).collect();
        let rounded: Vec<bool> = (0..n).map(|_| rng.gen::<f64>() < 0.2).collect();
        let config = EmConfig { iterations: 5, ..EmConfig::default() };

        let est = estimate_swfdr(&p, &truncated, &rounded, &config).unwrap();
        prop_assert!((0.0..=1.0).contains(&est.pi0));
        prop_assert!(est.alpha > 0.0 && est.beta > 0.0);
        for z in est.z.iter().flatten() {
            prop_assert!((0.0..=1.0).contains(z));
        }
        for bin in &est.bins {
            prop_assert!(bin.expected_null <= bin.observed as f64 + 1e-9);
        }
    }
}
