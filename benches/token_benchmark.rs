use criterion::{criterion_group, criterion_main, Criterion};
use game_backend::config::Config;
use game_backend::db::Db;
use game_backend::models::{MatchResult, NewUser};
use game_backend::services::token::{generate_token, is_well_formed};
use game_backend::services::{IdentityService, ScoreService};
use std::hint::black_box;

fn benchmark_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokens");

    group.bench_function("generate", |b| b.iter(generate_token));

    let token = generate_token();
    group.bench_function("shape_check", |b| b.iter(|| is_well_formed(black_box(&token))));

    group.finish();
}

fn benchmark_match_scoring(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");

    let db = Db::memory();
    let identity = IdentityService::new(db.clone(), &Config::test_default());
    let scores = ScoreService::new(db, identity.clone());

    runtime.block_on(async {
        for username in ["alice", "bob"] {
            identity
                .register(NewUser {
                    username: username.to_string(),
                    password: "secret".to_string(),
                    ..Default::default()
                })
                .await
                .expect("Failed to register");
        }
    });

    let result = MatchResult::new(1, 2, 7, 3);

    c.bench_function("points", |b| b.iter(|| black_box(result).points()));

    c.bench_function("apply_match_result_memory", |b| {
        b.iter(|| {
            runtime
                .block_on(scores.apply_match_result(black_box(result)))
                .expect("Failed to apply match")
        })
    });
}

criterion_group!(benches, benchmark_tokens, benchmark_match_scoring);
criterion_main!(benches);
