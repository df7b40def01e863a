// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Helpers shared across search engines: the ball-sample mutation with
//! radius growth used by both the genetic algorithm and simulated
//! annealing.

use crate::errors::SearchError;
use crate::representation::Representation;
use rand::rngs::StdRng;

/// Samples a single distinct neighbor of `vector` within `initial_radius`,
/// growing the radius by 10% on each miss. Fails once the radius exceeds
/// `10000 * initial_radius`.
pub fn mutate_via_ball(
    representation: &dyn Representation,
    vector: &[i64],
    initial_radius: f64,
    rng: &mut StdRng,
) -> Result<Vec<i64>, SearchError> {
    let mut radius = initial_radius;
    loop {
        let candidates = representation.uniform_from_ball(vector, radius, 1, rng);
        if let Some(candidate) = candidates.into_iter().find(|c| c != vector) {
            return Ok(candidate);
        }
        radius *= 1.1;
        if radius > 10_000.0 * initial_radius {
            return Err(SearchError::MutationExhausted { initial: initial_radius, limit: 10_000.0 * initial_radius });
        }
    }
}
