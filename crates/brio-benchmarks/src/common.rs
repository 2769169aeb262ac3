//! Common utilities for benchmarks

use std::time::Duration;

use criterion::Criterion;
use brio_registry::MemoryRegistry;

/// Criterion settings shared by every bench
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(10))
        .sample_size(100)
}

/// Advertised versions `0.0.0 ..` in ascending order, `count` in total
pub fn version_strings(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}.{}.{}", i / 100, (i / 10) % 10, i % 10))
        .collect()
}

/// Registry holding a layered graph: `width` packages per layer, each
/// depending on every package of the next layer with a caret constraint.
/// Returns the registry and the names of the first layer.
pub fn layered_registry(layers: usize, width: usize, versions: usize) -> (MemoryRegistry, Vec<String>) {
    let registry = MemoryRegistry::new();
    let name = |layer: usize, index: usize| format!("pkg-{}-{}", layer, index);

    for layer in 0..layers {
        let next: Vec<String> = if layer + 1 < layers {
            (0..width).map(|index| name(layer + 1, index)).collect()
        } else {
            Vec::new()
        };
        let dependencies: Vec<(&str, &str)> = next.iter().map(|dep| (dep.as_str(), "^1.0.0")).collect();

        for index in 0..width {
            let package = name(layer, index);
            for minor in 0..versions {
                registry.publish(&package, &format!("1.{}.0", minor), &dependencies);
            }
        }
    }

    let roots = (0..width).map(|index| name(0, index)).collect();
    (registry, roots)
}
