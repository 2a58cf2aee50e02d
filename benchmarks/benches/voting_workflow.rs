use ballot_registry::{
    Address, BallotRegistry, SharedRegistry, config::RegistryConfig, identity::Identity,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

fn registry_with(candidates: usize, voters: &[Address], owner: &Address) -> BallotRegistry {
    let mut registry = BallotRegistry::create(*owner, "Benchmark");
    for i in 0..candidates {
        registry
            .add_candidate(owner, &format!("Candidate {i}"))
            .unwrap();
    }
    for voter in voters {
        registry.register_voter(owner, voter).unwrap();
    }
    registry.set_voting_phase(owner, true).unwrap();
    registry
}

/// Cost of a single successful vote, including journal hashing
fn bench_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("vote");
    group.warm_up_time(Duration::from_millis(100));

    let owner = Identity::generate().address();

    for retain in [true, false] {
        group.bench_with_input(
            BenchmarkId::new("cast", if retain { "journal" } else { "latest_only" }),
            &retain,
            |b, &retain| {
                b.iter_batched(
                    || {
                        let voter = Identity::generate().address();
                        let config = RegistryConfig {
                            retain_journal: retain,
                            ..RegistryConfig::default()
                        };
                        let mut registry = BallotRegistry::from_config(owner, &config);
                        registry.add_candidate(&owner, "Alice").unwrap();
                        registry.register_voter(&owner, &voter).unwrap();
                        registry.set_voting_phase(&owner, true).unwrap();
                        (registry, voter)
                    },
                    |(mut registry, voter)| {
                        registry.vote(black_box(&voter), black_box(1)).unwrap();
                        registry
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    // Rejections do no hashing and should stay cheap
    let voter = Identity::generate().address();
    let mut registry = registry_with(1, &[voter], &owner);
    registry.vote(&voter, 1).unwrap();
    group.bench_function("rejected_duplicate", |b| {
        b.iter(|| black_box(registry.vote(black_box(&voter), 1).is_err()))
    });

    group.finish();
}

/// The all-candidates projection is linear in the candidate count
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_all_candidates");
    let owner = Identity::generate().address();

    for count in [10usize, 100, 1000] {
        let registry = registry_with(count, &[], &owner);
        group.bench_with_input(BenchmarkId::from_parameter(count), &registry, |b, registry| {
            b.iter(|| black_box(registry.get_all_candidates()))
        });
    }

    group.finish();
}

/// Contended voting through the shared handle
fn bench_shared_votes(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("shared_registry");
    group.warm_up_time(Duration::from_millis(100));
    group.sample_size(20);

    let owner = Identity::generate().address();

    group.bench_function("100_concurrent_votes", |b| {
        b.to_async(&rt).iter_batched(
            || {
                let voters: Vec<Address> =
                    (0..100).map(|_| Identity::generate().address()).collect();
                let shared = SharedRegistry::new(registry_with(4, &voters, &owner), 256);
                (shared, voters)
            },
            |(shared, voters)| async move {
                let mut handles = Vec::with_capacity(voters.len());
                for (i, voter) in voters.into_iter().enumerate() {
                    let shared = shared.clone();
                    handles.push(tokio::spawn(async move {
                        shared.vote(&voter, (i % 4) as u64 + 1)
                    }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
                black_box(shared.get_voting_info().unwrap())
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_vote, bench_projection, bench_shared_votes);
criterion_main!(benches);
