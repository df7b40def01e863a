// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Design centering: searches for a mapping at the center of the largest
//! feasible region it can find, rather than for a single optimal point, so
//! the result tolerates perturbation.
//!
//! The `(p_target, step_width)` schedules are interpolated from a handful of
//! configured support points using a natural cubic spline, standing in for
//! the original's `numpy.polyfit` support-point fit (see DESIGN.md).

use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::Mapping;
use crate::domain::platform::Platform;
use crate::errors::SearchError;
use crate::generators::RandomMapper;
use crate::observability::messages::{engine::{DesignCenteringFallback, SearchStarted}, StructuredLog};
use crate::oracle::SimulationManager;
use crate::representation::Representation;
use rand::rngs::StdRng;
use std::sync::Arc;

/// A natural cubic spline through a small set of `(x, y)` support points,
/// solved by the standard tridiagonal (Thomas algorithm) system for the
/// second derivatives at each knot.
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        if n < 3 {
            return Self { second_derivatives: vec![0.0; n], xs, ys };
        }

        let mut a = vec![0.0; n];
        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];
        b[0] = 1.0;
        b[n - 1] = 1.0;

        for i in 1..n - 1 {
            let h_im1 = xs[i] - xs[i - 1];
            let h_i = xs[i + 1] - xs[i];
            a[i] = h_im1;
            b[i] = 2.0 * (h_im1 + h_i);
            c[i] = h_i;
            d[i] = 6.0 * ((ys[i + 1] - ys[i]) / h_i - (ys[i] - ys[i - 1]) / h_im1);
        }

        // Thomas algorithm for the tridiagonal system.
        let mut cp = vec![0.0; n];
        let mut dp = vec![0.0; n];
        cp[0] = c[0] / b[0];
        dp[0] = d[0] / b[0];
        for i in 1..n {
            let denom = b[i] - a[i] * cp[i - 1];
            cp[i] = if denom.abs() > 1e-12 { c[i] / denom } else { 0.0 };
            dp[i] = if denom.abs() > 1e-12 { (d[i] - a[i] * dp[i - 1]) / denom } else { 0.0 };
        }
        let mut m = vec![0.0; n];
        m[n - 1] = dp[n - 1];
        for i in (0..n - 1).rev() {
            m[i] = dp[i] - cp[i] * m[i + 1];
        }

        Self { xs, ys, second_derivatives: m }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 {
            return self.ys[0];
        }
        let x = x.clamp(self.xs[0], self.xs[n - 1]);
        let segment = (0..n - 1).find(|&i| x <= self.xs[i + 1]).unwrap_or(n - 2);

        let x0 = self.xs[segment];
        let x1 = self.xs[segment + 1];
        let h = x1 - x0;
        let m0 = self.second_derivatives[segment];
        let m1 = self.second_derivatives[segment + 1];
        let t = x - x0;

        self.ys[segment]
            + t * ((self.ys[segment + 1] - self.ys[segment]) / h - h * (2.0 * m0 + m1) / 6.0)
            + t * t * m0 / 2.0
            + t * t * t * (m1 - m0) / (6.0 * h)
    }
}

pub struct Config {
    pub max_samples: usize,
    pub adapt_samples: usize,
    pub p_threshold: f64,
    pub initial_radius: f64,
    pub threshold_exec_time: u64,
    /// Support points for the hitting-probability target, evenly spaced
    /// across `[0, max_samples]`.
    pub p_target_points: Vec<f64>,
    /// Support points for the per-iteration radius step width.
    pub step_width_points: Vec<f64>,
}

pub struct DesignCenteringResult {
    pub mapping: Mapping,
    pub radius: f64,
    pub empirical_p: f64,
}

pub async fn search(
    platform: &Arc<Platform>,
    kpn: &Arc<KpnGraph>,
    representation: &dyn Representation,
    manager: &SimulationManager,
    config: &Config,
    rng: &mut StdRng,
) -> Result<DesignCenteringResult, SearchError> {
    SearchStarted { strategy: "design_centering", process_count: kpn.processes.len(), processor_count: platform.processors.len() }
        .log();

    let knot_xs: Vec<f64> = (0..config.p_target_points.len())
        .map(|i| i as f64 * config.max_samples as f64 / (config.p_target_points.len().max(2) - 1) as f64)
        .collect();
    let p_target_spline = CubicSpline::new(knot_xs.clone(), config.p_target_points.clone());
    let step_width_spline = CubicSpline::new(knot_xs, config.step_width_points.clone());

    let mapper = RandomMapper::new();
    let seed_mapping = mapper.generate(platform, kpn, rng)?;
    let mut center: Vec<f64> = representation.to_vector(&seed_mapping)?.into_iter().map(|v| v as f64).collect();
    let mut radius = config.initial_radius;

    let mut best: Option<(f64, f64, Vec<i64>)> = None;
    let mut last_candidate: Option<(f64, f64, Vec<i64>)> = None;

    for iteration in 0..config.max_samples {
        let p_target = p_target_spline.eval(iteration as f64).clamp(0.0, 1.0);
        let step_width = step_width_spline.eval(iteration as f64).max(0.0);

        let center_lattice = representation.approximate(&center);
        let samples = representation.uniform_from_ball(&center_lattice, radius, config.adapt_samples, rng);
        if samples.is_empty() {
            radius *= 1.0 - step_width.min(0.9);
            continue;
        }

        let results = manager.simulate(representation, &samples).await?;
        let feasible: Vec<&Vec<i64>> = samples
            .iter()
            .zip(results.iter())
            .filter(|(_, r)| r.exec_time <= config.threshold_exec_time)
            .map(|(v, _)| v)
            .collect();

        let empirical_p = feasible.len() as f64 / samples.len() as f64;
        last_candidate = Some((radius, empirical_p, center_lattice.clone()));

        if empirical_p >= config.p_threshold {
            let better = best.as_ref().map(|(r, _, _)| radius > *r).unwrap_or(true);
            if better {
                best = Some((radius, empirical_p, center_lattice.clone()));
            }
        }

        if !feasible.is_empty() {
            let dims = center.len();
            let mut centroid = vec![0.0; dims];
            for sample in &feasible {
                for (i, &v) in sample.iter().enumerate() {
                    centroid[i] += v as f64;
                }
            }
            for value in centroid.iter_mut() {
                *value /= feasible.len() as f64;
            }
            for i in 0..dims {
                center[i] += step_width * (centroid[i] - center[i]);
            }
        }

        if empirical_p >= p_target {
            radius *= 1.0 + step_width;
        } else {
            radius *= (1.0 - step_width).max(0.01);
        }
    }

    let used_fallback = best.is_none();
    let (radius, empirical_p, vector) = match best.or(last_candidate) {
        Some(candidate) => candidate,
        None => return Err(SearchError::NoFeasibleCenter { threshold: config.p_threshold }),
    };

    if used_fallback {
        DesignCenteringFallback { threshold: config.p_threshold, empirical_p }.log();
    }

    let mapping = representation.from_vector(&vector)?;
    Ok(DesignCenteringResult { mapping, radius, empirical_p })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::Process;
    use crate::domain::platform::{FrequencyDomain, PowerModel, Processor, Scheduler};
    use crate::domain::trace::{StaticTraceGenerator, TraceSegment};
    use crate::oracle::TraceGraphBackend;
    use crate::representation::SimpleVector;
    use crate::tracegraph::SlowestPolicy;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[tokio::test]
    async fn falls_back_to_the_last_candidate_when_no_threshold_is_ever_met() {
        let processor = Processor {
            name: "p0".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain { name: "fd".into(), frequency_hz: 1e9 },
            power_model: Some(PowerModel { static_power_w: 0.1, dynamic_energy_per_cycle_j: 1e-9 }),
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let platform = Arc::new(Platform {
            processors: vec![processor],
            processor_groups: HashMap::from([(0, vec!["p0".to_string()])]),
            schedulers: vec![Scheduler { name: "s".into(), policy: "fifo".into(), processors: vec!["p0".into()] }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        });
        let kpn = Arc::new(KpnGraph { name: "k".into(), processes: vec![Process { name: "a".into() }], channels: vec![] });

        let mut scripts = HashMap::new();
        scripts.insert("a".to_string(), vec![TraceSegment::Compute { cycles: 1_000 }]);
        let factory = Box::new(move || -> Box<dyn crate::domain::trace::TraceGenerator + Send> {
            Box::new(StaticTraceGenerator::new(scripts.clone()))
        });
        let backend = Arc::new(TraceGraphBackend::new(kpn.clone(), platform.clone(), factory, SlowestPolicy::MaxGroupId));
        let manager = SimulationManager::new(backend, false, 1, 8);
        let representation = SimpleVector::new(platform.clone(), kpn.clone(), false, 2.0);
        let mut rng = StdRng::seed_from_u64(1);

        // threshold_exec_time of 0 is never met, so every sample is "infeasible" and
        // p_threshold (> 1.0) can never be reached either; the search must still
        // return its last-sampled candidate rather than erroring out.
        let config = Config {
            max_samples: 3,
            adapt_samples: 4,
            p_threshold: 2.0,
            initial_radius: 1.0,
            threshold_exec_time: 0,
            p_target_points: vec![0.5, 0.5],
            step_width_points: vec![0.2, 0.2],
        };

        let outcome = search(&platform, &kpn, &representation, &manager, &config, &mut rng).await.unwrap();
        assert_eq!(outcome.mapping.affinity("a"), Some("p0"));
    }

    #[test]
    fn spline_passes_through_support_points() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 0.0, 1.0]);
        assert!((spline.eval(0.0) - 0.0).abs() < 1e-9);
        assert!((spline.eval(1.0) - 1.0).abs() < 1e-9);
        assert!((spline.eval(2.0) - 0.0).abs() < 1e-9);
        assert!((spline.eval(3.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn spline_clamps_outside_the_knot_range() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        assert_eq!(spline.eval(-5.0), spline.eval(0.0));
        assert_eq!(spline.eval(50.0), spline.eval(2.0));
    }
}
