//! Version selection and tree resolution benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use camino::Utf8PathBuf;
use tempfile::tempdir;

use brio_benchmarks::{criterion_config, layered_registry, version_strings};
use brio_config::toml::parse_manifest;
use brio_core::types::{Query, VersionList};
use brio_registry::RegistrySession;
use brio_resolver::Resolver;

/// FindBest over advertised lists of growing size
fn bench_find_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_best");
    let queries: Vec<Query> = ["0.5.5", "<0.9.0", ">=0.1.0", "^0.4.0", "~0.3.2 || ^0.7.1"]
        .iter()
        .map(|text| Query::parse(text).unwrap())
        .collect();

    for count in [10, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        let strings = version_strings(count);
        let list = VersionList::from_strings(strings.iter().map(String::as_str));

        group.bench_with_input(BenchmarkId::new("versions", count), &list, |b, list| {
            b.iter(|| {
                for query in &queries {
                    black_box(query.find_best(list));
                }
            });
        });
    }

    group.finish();
}

/// Full resolution of a layered graph against an in-memory registry
fn bench_tree_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_resolution");
    group.sample_size(20);
    let rt = tokio::runtime::Runtime::new().unwrap();
    let project = tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(project.path().to_path_buf()).unwrap();

    for (layers, width) in [(3, 3), (4, 4), (5, 4)] {
        let (registry, roots) = layered_registry(layers, width, 20);
        let registry = Arc::new(registry);
        let mut manifest = String::from("[package]\nname = \"bench\"\nversion = \"1.0.0\"\nkind = \"app\"\n\n[dependencies]\n");
        for root in &roots {
            manifest.push_str(&format!("{} = \"^1.0.0\"\n", root));
        }
        let manifest = parse_manifest(&manifest).unwrap();

        let nodes = (0..layers).fold((0u64, 1u64), |(total, layer), _| {
            let layer = layer * width as u64;
            (total + layer, layer)
        });
        group.throughput(Throughput::Elements(nodes.0));

        // A fresh session per iteration: the registry is shared, the caches are not
        group.bench_function(BenchmarkId::new("layers", format!("{}x{}", layers, width)), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let session = RegistrySession::new(Arc::clone(&registry), base.clone());
                    let root = Resolver::new(&session).resolve_root(&manifest).await.unwrap();
                    black_box(root.count())
                })
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_find_best, bench_tree_resolution
}
criterion_main!(benches);
