// Performance benchmarks for candidate reranking
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use shelfmate::{
    Embedding, HashingEncoder, InMemoryCatalog, ProductDescription, RecommendationMode,
    RecommendationRequest, RerankingEngine, SimilarityEntry, SimilarityTable, TextEncoder,
};
use shelfmate_rerank::{cosine_scores, rank_by_score};
use std::sync::Arc;

const WORDS: &[&str] = &[
    "camping", "tent", "stakes", "kettle", "stainless", "steel", "coffee", "grinder", "ceramic",
    "burr", "lantern", "rechargeable", "waterproof", "backpack", "hiking", "boots", "wool",
    "socks", "cast", "iron", "skillet", "chef", "knife", "cutting", "board",
];

fn random_text(rng: &mut impl Rng, words: usize) -> String {
    (0..words)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn random_embedding(rng: &mut impl Rng, dim: usize) -> Embedding {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Embedding::new(data).normalized()
}

fn build_engine(products: usize, pool_size: usize) -> RerankingEngine {
    let mut rng = rand::rng();
    let mut table = SimilarityTable::new();
    let mut catalog = InMemoryCatalog::new();

    for i in 0..products {
        let id = format!("P{}", i);
        catalog.insert(
            id.as_str(),
            ProductDescription::new(random_text(&mut rng, 4), random_text(&mut rng, 30)),
        );

        let mut row = vec![SimilarityEntry::new(id.as_str(), 1.0)];
        for _ in 0..pool_size {
            let candidate = format!("P{}", rng.random_range(0..products));
            row.push(SimilarityEntry::new(candidate, rng.random_range(0.0f32..1.0f32)));
        }
        table.insert_row(id, row);
    }

    RerankingEngine::new(
        Arc::new(table),
        Arc::new(catalog),
        Arc::new(HashingEncoder::default()),
    )
}

fn benchmark_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for pool_size in [10, 50, 100].iter() {
        let engine = build_engine(1_000, *pool_size);
        group.bench_with_input(
            BenchmarkId::new("hashing_encoder", pool_size),
            pool_size,
            |b, &pool_size| {
                let mut i = 0usize;
                b.iter(|| {
                    let request =
                        RecommendationRequest::new(format!("P{}", i % 1_000), RecommendationMode::Complementary)
                            .with_pool_size(pool_size);
                    i += 1;
                    black_box(engine.recommend(black_box(&request)).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn benchmark_hashing_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing_encoder");
    let mut rng = rand::rng();
    let texts: Vec<String> = (0..11).map(|_| random_text(&mut rng, 40)).collect();

    for dim in [128, 256, 768].iter() {
        let encoder = HashingEncoder::new(*dim).unwrap();
        group.bench_with_input(BenchmarkId::new("encode_batch", dim), dim, |b, _| {
            b.iter(|| black_box(encoder.encode(black_box(&texts)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let mut rng = rand::rng();

    for pool_size in [10, 100, 1000].iter() {
        let query = random_embedding(&mut rng, 768);
        let candidates: Vec<Embedding> =
            (0..*pool_size).map(|_| random_embedding(&mut rng, 768)).collect();

        group.bench_with_input(
            BenchmarkId::new("cosine_then_sort", pool_size),
            pool_size,
            |b, _| {
                b.iter(|| {
                    let scores = cosine_scores(black_box(&query), black_box(&candidates));
                    black_box(rank_by_score(&scores));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_recommend,
    benchmark_hashing_encoder,
    benchmark_rank
);
criterion_main!(benches);
