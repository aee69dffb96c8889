//! Performance benchmarks for netvector

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use netvector::network::{expand_target, ProbeResult};
use netvector::{classify, HostResult, DEFAULT_PORTS};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Benchmark OS classification over typical open-port sets
fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");

    let cases: [(&str, &[u16]); 4] = [
        ("windows", &[135, 139, 445, 3389, 5985]),
        ("linux", &[22, 111, 2049, 3306]),
        ("empty", &[]),
        ("all_default", DEFAULT_PORTS),
    ];

    for (name, ports) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), ports, |b, ports| {
            b.iter(|| classify(black_box(ports)))
        });
    }

    group.finish();
}

/// Benchmark CIDR expansion at different prefix lengths
fn bench_target_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_expansion");

    for target in ["192.168.1.10", "192.168.1.0/24", "10.0.0.0/8"] {
        group.bench_with_input(BenchmarkId::from_parameter(target), target, |b, target| {
            b.iter(|| expand_target(black_box(target), 255))
        });
    }

    group.finish();
}

/// Benchmark building a host result from a full port sweep
fn bench_host_aggregation(c: &mut Criterion) {
    let probes: Vec<ProbeResult> = DEFAULT_PORTS
        .iter()
        .map(|port| {
            if port % 7 == 0 {
                ProbeResult::open(*port, Duration::from_micros(u64::from(*port)))
            } else {
                ProbeResult::closed(*port)
            }
        })
        .collect();

    c.bench_function("host_result_from_probes", |b| {
        b.iter(|| {
            HostResult::from_probes(
                Ipv4Addr::new(10, 0, 0, 1),
                None,
                black_box(probes.iter().copied()),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_classifier,
    bench_target_expansion,
    bench_host_aggregation
);
criterion_main!(benches);
