//! vCPU and memory shapes of machine types and database tiers.

/// Shape of a machine: (vCPUs, memory GB).
pub type Shape = (f64, f64);

/// Fallback for unparsable Compute Engine machine types.
const DEFAULT_COMPUTE_SHAPE: Shape = (1.0, 4.0);

/// Fallback for unparsable Cloud SQL tiers (1 vCPU, 3840 MB).
const DEFAULT_SQL_SHAPE: Shape = (1.0, 3.75);

/// Baseline for model-serving machine types missing from the table.
pub const DEFAULT_ENDPOINT_SHAPE: Shape = (2.0, 7.5);

/// Shared-core machine types that don't follow `<family>-<class>-<n>`.
const SHARED_CORE: &[(&str, Shape)] = &[
    ("e2-micro", (2.0, 1.0)),
    ("e2-small", (2.0, 2.0)),
    ("e2-medium", (2.0, 4.0)),
    ("f1-micro", (1.0, 0.6)),
    ("g1-small", (1.0, 1.7)),
];

/// N1 machine types offered for model serving.
const N1_SHAPES: &[(&str, Shape)] = &[
    ("n1-standard-1", (1.0, 3.75)),
    ("n1-standard-2", (2.0, 7.5)),
    ("n1-standard-4", (4.0, 15.0)),
    ("n1-standard-8", (8.0, 30.0)),
    ("n1-standard-16", (16.0, 60.0)),
    ("n1-standard-32", (32.0, 120.0)),
    ("n1-standard-64", (64.0, 240.0)),
    ("n1-standard-96", (96.0, 360.0)),
    ("n1-highmem-2", (2.0, 13.0)),
    ("n1-highmem-4", (4.0, 26.0)),
    ("n1-highmem-8", (8.0, 52.0)),
    ("n1-highmem-16", (16.0, 104.0)),
    ("n1-highmem-32", (32.0, 208.0)),
    ("n1-highmem-64", (64.0, 416.0)),
    ("n1-highcpu-2", (2.0, 1.8)),
    ("n1-highcpu-4", (4.0, 3.6)),
    ("n1-highcpu-8", (8.0, 7.2)),
    ("n1-highcpu-16", (16.0, 14.4)),
    ("n1-highcpu-32", (32.0, 28.8)),
    ("n1-highcpu-64", (64.0, 57.6)),
];

/// Shape of a Compute Engine machine type such as `n2-standard-4` or
/// `n2-custom-4-16384`.
pub fn compute_shape(machine_type: &str) -> Shape {
    if let Some((_, shape)) = SHARED_CORE.iter().find(|(name, _)| *name == machine_type) {
        return *shape;
    }
    if let Some(shape) = custom_shape(machine_type) {
        return shape;
    }

    let parts: Vec<&str> = machine_type.split('-').collect();
    if parts.len() < 3 {
        return DEFAULT_COMPUTE_SHAPE;
    }
    let Some(cpus) = parts.last().and_then(|n| n.parse::<f64>().ok()) else {
        return DEFAULT_COMPUTE_SHAPE;
    };

    let gb_per_cpu = if machine_type.contains("highmem") {
        8.0
    } else if machine_type.contains("highcpu") {
        1.0
    } else {
        4.0
    };
    (cpus, cpus * gb_per_cpu)
}

/// `[<family>-]custom-<cpus>-<memory MB>[-ext]`
fn custom_shape(machine_type: &str) -> Option<Shape> {
    let parts: Vec<&str> = machine_type.split('-').collect();
    let at = parts.iter().position(|p| *p == "custom")?;
    let cpus = parts.get(at + 1)?.parse::<f64>().ok()?;
    let memory_mb = parts.get(at + 2)?.parse::<f64>().ok()?;
    Some((cpus, memory_mb / 1024.0))
}

/// Shape of a Cloud SQL tier such as `db-custom-2-7680` or `db-n1-standard-4`.
pub fn sql_tier_shape(tier: &str) -> Shape {
    if let Some(shape) = custom_shape(tier) {
        return shape;
    }

    let Some(machine) = tier.strip_prefix("db-") else {
        return DEFAULT_SQL_SHAPE;
    };
    let parts: Vec<&str> = machine.split('-').collect();
    match (parts.first(), parts.get(1), parts.get(2)) {
        (Some(&"n1"), Some(class), Some(n)) => match n.parse::<f64>() {
            Ok(cpus) => {
                let gb_per_cpu = match *class {
                    "highmem" => 6.5,
                    _ => 3.75,
                };
                (cpus, cpus * gb_per_cpu)
            }
            Err(_) => DEFAULT_SQL_SHAPE,
        },
        _ => DEFAULT_SQL_SHAPE,
    }
}

/// Shape of a model-serving machine type, with the documented baseline for
/// unknown types.
pub fn endpoint_shape(machine_type: &str) -> Shape {
    N1_SHAPES
        .iter()
        .find(|(name, _)| *name == machine_type)
        .map(|(_, shape)| *shape)
        .unwrap_or(DEFAULT_ENDPOINT_SHAPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_standard_classes() {
        assert_eq!(compute_shape("n2-standard-4"), (4.0, 16.0));
        assert_eq!(compute_shape("n2-highmem-8"), (8.0, 64.0));
        assert_eq!(compute_shape("c2-highcpu-16"), (16.0, 16.0));
    }

    #[test]
    fn test_compute_custom_and_shared() {
        assert_eq!(compute_shape("n2-custom-4-16384"), (4.0, 16.0));
        assert_eq!(compute_shape("custom-2-5120"), (2.0, 5.0));
        assert_eq!(compute_shape("e2-micro"), (2.0, 1.0));
    }

    #[test]
    fn test_compute_unparsable_defaults() {
        assert_eq!(compute_shape(""), DEFAULT_COMPUTE_SHAPE);
        assert_eq!(compute_shape("a2-ultragpu-xl"), DEFAULT_COMPUTE_SHAPE);
    }

    #[test]
    fn test_sql_tiers() {
        assert_eq!(sql_tier_shape("db-custom-2-7680"), (2.0, 7.5));
        assert_eq!(sql_tier_shape("db-n1-standard-4"), (4.0, 15.0));
        assert_eq!(sql_tier_shape("db-n1-highmem-2"), (2.0, 13.0));
        assert_eq!(sql_tier_shape("db-f1-micro"), DEFAULT_SQL_SHAPE);
        assert_eq!(sql_tier_shape("unknown"), DEFAULT_SQL_SHAPE);
    }

    #[test]
    fn test_endpoint_table_and_baseline() {
        assert_eq!(endpoint_shape("n1-highmem-4"), (4.0, 26.0));
        assert_eq!(endpoint_shape("g2-standard-12"), (2.0, 7.5));
    }
}
