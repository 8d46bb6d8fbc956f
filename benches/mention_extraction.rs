use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rocketscope_indexer::{fingerprint_of, CandidateVideo, MentionCache, MentionExtractor, Roster, TranscriptEntry};
use chrono::NaiveDate;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Synthetic caption track with a mention every few lines
fn sample_transcript(lines: usize) -> Vec<TranscriptEntry> {
    let phrases = [
        "what a save from the goalie there",
        "Zen takes it up the wall",
        "and the ball rolls out to midfield",
        "Vatira with the flip reset, unreal",
        "kickoff goes left again",
        "Larry is on the stream tonight",
    ];

    (0..lines)
        .map(|i| TranscriptEntry {
            start_seconds: i as f64 * 3.5,
            text: phrases[i % phrases.len()].to_string(),
        })
        .collect()
}

/// Benchmark extraction against the full built-in roster
fn bench_extraction(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (roster, _) = rt.block_on(Roster::load(None));
    let extractor = MentionExtractor::new(&roster);

    let mut group = c.benchmark_group("mention_extraction");
    for lines in [100, 1_000, 5_000] {
        let transcript = sample_transcript(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &transcript, |b, transcript| {
            b.iter(|| extractor.extract(black_box(transcript)))
        });
    }
    group.finish();
}

/// Benchmark compiling the roster into patterns
fn bench_extractor_setup(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (roster, _) = rt.block_on(Roster::load(None));

    c.bench_function("extractor_setup", |b| {
        b.iter(|| MentionExtractor::new(black_box(&roster)))
    });
}

/// Benchmark fingerprint checks for a fully cached channel
fn bench_cache_lookup(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let cache = MentionCache::empty(temp_dir.path().join("video_cache.json"));

    let videos: Vec<CandidateVideo> = (0..500)
        .map(|i| CandidateVideo {
            id: format!("video{:04}", i),
            title: format!("Ranked 2v2 episode {}", i),
            published: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i % 300),
            thumbnail_url: String::new(),
        })
        .collect();

    rt.block_on(async {
        for video in &videos {
            cache.put(&video.id, fingerprint_of(video), Default::default()).await;
        }
    });

    c.bench_function("cache_lookup_500", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut valid = 0;
                for video in black_box(&videos) {
                    if let Some(entry) = cache.lookup(&video.id).await {
                        if entry.is_valid(&fingerprint_of(video)) {
                            valid += 1;
                        }
                    }
                }
                valid
            })
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = bench_extraction, bench_extractor_setup, bench_cache_lookup
}
criterion_main!(benches);
