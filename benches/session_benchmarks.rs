//! Session benchmarks for tessera
//!
//! Measures cookie token encoding and the per-request session path over
//! in-memory storage.
//!
//! Run with: cargo bench --bench session_benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::HeaderMap;
use http::header::{COOKIE, HeaderValue};
use std::hint::black_box;
use tessera::prelude::*;
use tessera::{TokenCodec, generate_session_id};

const KEYS: [&str; 3] = [
    "0123456789abcdef",
    "0123456789abcdef01234567",
    "0123456789abcdef0123456789abcdef",
];

// ============================================================================
// Token Codec Benchmarks
// ============================================================================

fn bench_token_codec(c: &mut Criterion) {
    let id = generate_session_id();
    let mut group = c.benchmark_group("token_codec");
    group.throughput(Throughput::Elements(1));

    for key in KEYS {
        let bits = key.len() * 8;
        for format in [TokenFormat::Legacy, TokenFormat::RandomIv] {
            let codec = TokenCodec::new(key, format).unwrap();
            let token = codec.encode(&id).unwrap();
            let label = format!("aes{}/{:?}", bits, format);

            group.bench_with_input(BenchmarkId::new("encode", &label), &id, |b, id| {
                b.iter(|| black_box(codec.encode(black_box(id)).unwrap()))
            });

            group.bench_with_input(BenchmarkId::new("decode", &label), &token, |b, token| {
                b.iter(|| black_box(codec.decode(black_box(token)).unwrap()))
            });
        }
    }

    group.finish();
}

// ============================================================================
// Request Path Benchmarks
// ============================================================================

fn bench_request_path(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = Engine::new(SessionConfig::new(KEYS[0]), MemoryStorage::default()).unwrap();

    // Pre-populate one session
    let request = rt.block_on(async {
        let mut response = HeaderMap::new();
        let mut session = engine.use_session(&HeaderMap::new(), &mut response).unwrap();
        session.put("user", "alice").await.unwrap();

        let mut request = HeaderMap::new();
        request.insert(
            COOKIE,
            HeaderValue::from_str(&format!("sessionid={}", session.token())).unwrap(),
        );
        request
    });

    let mut group = c.benchmark_group("request_path");
    group.throughput(Throughput::Elements(1));

    group.bench_function("use_session/new", |b| {
        b.iter(|| {
            let mut response = HeaderMap::new();
            let session = engine.use_session(&HeaderMap::new(), &mut response).unwrap();
            black_box(session.is_new())
        })
    });

    group.bench_function("use_session/existing", |b| {
        b.iter(|| {
            let mut response = HeaderMap::new();
            let session = engine.use_session(black_box(&request), &mut response).unwrap();
            black_box(session.is_new())
        })
    });

    group.bench_function("get_with_refresh", |b| {
        b.to_async(&rt).iter(|| async {
            let mut response = HeaderMap::new();
            let mut session = engine.use_session(&request, &mut response).unwrap();
            black_box(session.get("user").await.is_ok())
        })
    });

    group.bench_function("put", |b| {
        b.to_async(&rt).iter(|| async {
            let mut response = HeaderMap::new();
            let mut session = engine.use_session(&request, &mut response).unwrap();
            session.put("cart", "book").await.unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_token_codec, bench_request_path);
criterion_main!(benches);
