use std::cmp::max;

use rand::SeedableRng;
use rand_distr::{Distribution, LogNormal, NormalError};
use rand_xoshiro::Xoshiro256StarStar;

use crate::event::Event;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkloadParams {
    pub customers: usize,
    pub mean_interarrival: f32,
    pub interarrival_cv: f32,
    pub mean_service: f32,
    pub service_cv: f32,
}

/// Generates a reproducible stream of arrivals.
///
/// The first customer arrives at time 0. Each later arrival follows the
/// previous one by a log-normal gap (which may round to 0, putting two
/// customers at the same instant), and every customer needs at least one
/// tick of service.
pub fn generate(params: &WorkloadParams, seed: u64) -> Result<Vec<Event>, NormalError> {
    let interarrival = LogNormal::from_mean_cv(params.mean_interarrival, params.interarrival_cv)?;
    let service = LogNormal::from_mean_cv(params.mean_service, params.service_cv)?;
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

    let mut time = 0u64;
    let mut events = Vec::with_capacity(params.customers);
    for i in 0..params.customers {
        if i > 0 {
            time += interarrival.sample(&mut rng) as u64;
        }
        let service_duration = max(1, service.sample(&mut rng) as u64);
        events.push(Event::arrival(time, service_duration));
    }
    Ok(events)
}
