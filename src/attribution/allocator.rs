//! Proportional cost allocation.
//!
//! Every row is rounded on its own, so the sum of allocated costs may differ
//! from the line item total by up to half a cent per row. No remainder is
//! redistributed.

use super::types::WeightedResource;

/// Split `total_cost` and `total_usage` across `weighted` (label, weight) pairs.
///
/// Non-finite and non-positive weights are left out of the pool. Returns an
/// empty list when the pool weighs nothing, which callers treat as "no data".
pub fn allocate(
    total_cost: f64,
    total_usage: f64,
    weighted: &[(String, f64)],
) -> Vec<WeightedResource> {
    let pool: Vec<&(String, f64)> = weighted
        .iter()
        .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
        .collect();
    let total_weight: f64 = pool.iter().map(|(_, weight)| weight).sum();

    if total_weight <= 0.0 {
        return Vec::new();
    }

    pool.into_iter()
        .map(|(label, weight)| {
            let share = weight / total_weight;
            WeightedResource {
                label: label.clone(),
                weight: *weight,
                usage_share_pct: round2(share * 100.0),
                usage: round2(total_usage * share),
                cost: round2(total_cost * share),
            }
        })
        .collect()
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sort resources by allocated cost, highest first. Stable.
pub fn sort_by_cost_desc(resources: &mut [WeightedResource]) {
    resources.sort_by(|a, b| {
        b.cost
            .partial_cmp(&a.cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
