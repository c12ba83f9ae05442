//! Benchmarks for transformation building and full analysis.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqcircuit_analysis::{build_transformation, AnalysisConfig, BasisCompletion, SymbolicCircuit};
use sqcircuit_core::{BranchDescriptor, CircuitGraph};

/// Josephson ladder: every node is shunted to ground by a junction and
/// coupled to its neighbour by a capacitor and an inductor.
fn ladder(nodes: usize) -> Vec<BranchDescriptor> {
    let mut lines = Vec::new();
    for i in 1..=nodes {
        lines.push(format!("JJ 0 {i} 10 1"));
        if i < nodes {
            lines.push(format!("C {i} {} 0.5", i + 1));
            lines.push(format!("L {i} {} 2", i + 1));
        }
    }
    lines.iter().map(|l| l.parse().unwrap()).collect()
}

fn bench_build_transformation(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_transformation");

    for nodes in [2, 4, 8, 16] {
        let (graph, _) = CircuitGraph::from_descriptors(nodes, &ladder(nodes)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &graph, |bencher, graph| {
            bencher.iter(|| build_transformation(black_box(graph), BasisCompletion::Simple).unwrap());
        });
    }

    group.finish();
}

fn bench_symbolic_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbolic_circuit");

    for nodes in [2, 3, 4] {
        let descriptors = ladder(nodes);
        group.bench_with_input(
            BenchmarkId::from_parameter(nodes),
            &descriptors,
            |bencher, descriptors| {
                bencher.iter(|| {
                    SymbolicCircuit::from_descriptors(
                        nodes,
                        black_box(descriptors),
                        AnalysisConfig::default(),
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_build_transformation, bench_symbolic_circuit);
criterion_main!(benches);
