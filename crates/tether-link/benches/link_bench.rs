// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the callback-routing hot path: handle resolution
// runs once per boundary callback, signature parsing once per façade call.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tether_link::handle::HandleRegistry;
use tether_link::signature::MethodSig;

struct Owner {
    _tag: u64,
}

/// Benchmark handle resolution against a realistically sized table — a
/// handful of live bridges, as an application would hold.
fn bench_handle_resolve(c: &mut Criterion) {
    let registry = HandleRegistry::new();
    let owners: Vec<Arc<Owner>> = (0..16).map(|i| Arc::new(Owner { _tag: i })).collect();
    let handles: Vec<_> = owners.iter().map(|o| registry.register(o)).collect();
    let hot = handles[7];

    c.bench_function("handle_resolve (16 live)", |b| {
        b.iter(|| {
            let resolved = registry.resolve::<Owner>(black_box(hot));
            black_box(resolved);
        });
    });
}

/// Benchmark signature parse+render for the shapes the bridges actually use.
fn bench_signature_parse(c: &mut Criterion) {
    let signatures = [
        "()V",
        "(JI)V",
        "(JDDDFFFJ)V",
        "(Ljava/lang/String;I)Landroid/content/SharedPreferences;",
    ];

    let mut group = c.benchmark_group("signature_parse_render");
    for sig in signatures {
        group.bench_function(sig, |b| {
            b.iter(|| {
                let parsed = MethodSig::parse(black_box(sig)).expect("well-formed");
                black_box(parsed.render());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_handle_resolve, bench_signature_parse);
criterion_main!(benches);
