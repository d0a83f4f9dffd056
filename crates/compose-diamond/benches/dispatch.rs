//! # Diamond Benchmarks
//!
//! Loupe reads, cut application and dispatch over a grid of
//! selector/facet counts.
//!
//! | Group | Operation | Expectation |
//! |-------|-----------|-------------|
//! | loupe | `facets()`, `facet_addresses()` | linear in selectors |
//! | cut | one batch adding every selector | linear in selectors |
//! | dispatch | routed call to a trivial facet | independent of table size |

use compose_diamond::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

const DIAMOND: Address = Address::from_low_u8(0xd1);
const OWNER: Address = Address::from_low_u8(0x01);

/// (selectors, facets)
const GRID: [(u32, u32); 6] = [(40, 10), (100, 10), (400, 20), (1000, 40), (4000, 80), (10_000, 200)];

fn facet_address(index: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[16..].copy_from_slice(&(index + 0x1000).to_be_bytes());
    Address::new(bytes)
}

/// Spreads `selectors` evenly over `facets` facets.
fn grid_cuts(selectors: u32, facets: u32) -> Vec<FacetCut> {
    let per_facet = selectors / facets;
    (0..facets)
        .map(|f| {
            let selectors = (0..per_facet)
                .map(|s| Selector::from_u32(0x1000_0000 + f * per_facet + s))
                .collect();
            FacetCut::add(facet_address(f), selectors)
        })
        .collect()
}

fn grid_host(facets: u32) -> Arc<InMemoryFacetHost> {
    let host = Arc::new(InMemoryFacetHost::new());
    for f in 0..facets {
        host.deploy(
            facet_address(f),
            Arc::new(FnFacet::new("bench", vec![], |_| Ok(Bytes::new()))),
        );
    }
    host
}

fn grid_diamond(selectors: u32, facets: u32) -> Diamond {
    let args = DiamondArgs::new(DIAMOND, OWNER).with_cuts(grid_cuts(selectors, facets));
    match Diamond::deploy(args, grid_host(facets), DiamondConfig::default()) {
        Ok((diamond, _)) => diamond,
        Err(err) => panic!("benchmark deployment failed: {err}"),
    }
}

fn bench_loupe(c: &mut Criterion) {
    let mut group = c.benchmark_group("loupe");
    group.measurement_time(Duration::from_secs(5));

    for (selectors, facets) in GRID {
        let diamond = grid_diamond(selectors, facets);
        let label = format!("{selectors}/{facets}");
        group.throughput(Throughput::Elements(u64::from(selectors)));

        group.bench_with_input(BenchmarkId::new("facets", &label), &diamond, |b, d| {
            b.iter(|| black_box(d.facets()))
        });
        group.bench_with_input(BenchmarkId::new("facet_addresses", &label), &diamond, |b, d| {
            b.iter(|| black_box(d.facet_addresses()))
        });
    }
    group.finish();
}

fn bench_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("cut");

    for (selectors, facets) in GRID {
        let cuts = grid_cuts(selectors, facets);
        let host = grid_host(facets);
        group.throughput(Throughput::Elements(u64::from(selectors)));

        group.bench_with_input(
            BenchmarkId::new("apply_cuts", format!("{selectors}/{facets}")),
            &cuts,
            |b, cuts| {
                b.iter(|| {
                    let mut registry = SelectorRegistry::new();
                    let summary = apply_cuts(
                        &mut registry,
                        DIAMOND,
                        limits::MAX_SELECTORS,
                        |address| host.has_code(address),
                        cuts,
                    );
                    black_box(summary.is_ok())
                })
            },
        );
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for (selectors, facets) in GRID {
        let mut diamond = grid_diamond(selectors, facets);
        let target = Selector::from_u32(0x1000_0000 + selectors / 2);

        group.bench_function(BenchmarkId::new("call", format!("{selectors}/{facets}")), |b| {
            b.iter(|| {
                let outcome = diamond.call(Message::new(OWNER, target.0.to_vec()));
                black_box(outcome.is_ok())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_loupe, bench_cut, bench_dispatch);
criterion_main!(benches);
