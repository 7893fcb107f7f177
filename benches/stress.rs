use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, NaiveTime};
use ulid::Ulid;

use lectern::engine::{Engine, EngineError};
use lectern::model::{LectureFilter, NewLecture, Span};

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// The `i`th one-hour slot, ten per day between 08:00 and 18:00.
fn hourly(venue: &str, i: u64) -> NewLecture {
    let date = base_date() + Days::new(i / 10);
    let hour = 8 + (i % 10) as u32;
    NewLecture {
        course: format!("BENCH{i}"),
        venue: venue.to_string(),
        date,
        span: Span::new(
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
        ),
        department: "Benchmarks".to_string(),
        level: "100".to_string(),
    }
}

async fn phase1_sequential(engine: &Engine) {
    engine.create_venue("seq-hall", 100).await.unwrap();

    let n = 2000;
    let mut latencies = Vec::with_capacity(n as usize);
    let start = Instant::now();

    for i in 0..n {
        let t = Instant::now();
        engine.schedule_lecture(hourly("seq-hall", i)).await.unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} lectures in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("schedule latency", &mut latencies);
}

async fn phase2_contention(engine: Arc<Engine>) {
    let n_tasks = 64;
    let rounds = 50;
    engine.create_venue("hot-room", 20).await.unwrap();

    let start = Instant::now();
    let mut violations = 0;

    for round in 0..rounds {
        let accepted = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(n_tasks);
        for _ in 0..n_tasks {
            let engine = engine.clone();
            let accepted = accepted.clone();
            handles.push(tokio::spawn(async move {
                match engine.schedule_lecture(hourly("hot-room", round)).await {
                    Ok(_) => {
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(EngineError::Conflict { .. }) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        if accepted.load(Ordering::Relaxed) != 1 {
            violations += 1;
        }
    }

    let elapsed = start.elapsed();
    let total = n_tasks as u64 * rounds;
    println!(
        "  {rounds} slots x {n_tasks} contenders = {total} requests in {:.2}s = {:.0} ops/sec",
        elapsed.as_secs_f64(),
        total as f64 / elapsed.as_secs_f64()
    );
    println!("  slots with != 1 winner: {violations}");
}

async fn phase3_read_under_load(engine: Arc<Engine>) {
    for i in 0..200 {
        let venue = format!("room-{}", i % 5);
        if i < 5 {
            engine.create_venue(&venue, 50).await.unwrap();
        }
        engine.schedule_lecture(hourly(&venue, i / 5)).await.unwrap();
    }

    let stop = Arc::new(AtomicBool::new(false));
    let mut writer_handles = Vec::new();
    for w in 0..5 {
        let engine = engine.clone();
        let stop = stop.clone();
        writer_handles.push(tokio::spawn(async move {
            let venue = format!("writer-{w}-{}", Ulid::new());
            engine.create_venue(&venue, 10).await.unwrap();
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                let _ = engine.schedule_lecture(hourly(&venue, i)).await;
                i += 1;
            }
        }));
    }

    let n_readers = 10;
    let reads_per_reader = 500;
    let mut reader_handles = Vec::new();
    for r in 0..n_readers {
        let engine = engine.clone();
        reader_handles.push(tokio::spawn(async move {
            let filter = LectureFilter {
                department: Some("Benchmarks".to_string()),
                level: None,
            };
            let venue = format!("room-{}", r % 5);
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for i in 0..reads_per_reader {
                let t = Instant::now();
                if i % 2 == 0 {
                    engine.list_lectures(&filter).await;
                } else {
                    engine.bookings_on(&venue, base_date()).await.unwrap();
                }
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    print_latency("read latency", &mut all_latencies);
}

#[tokio::main]
async fn main() {
    let dir = std::env::temp_dir().join(format!("lectern_bench_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let engine = Arc::new(Engine::open(&dir.join("lectern.wal")).unwrap());

    println!("=== lectern stress benchmark ===");
    println!("wal: {}\n", dir.display());

    println!("[phase 1] sequential scheduling throughput");
    phase1_sequential(&engine).await;

    println!("\n[phase 2] contention on a single slot");
    phase2_contention(engine.clone()).await;

    println!("\n[phase 3] read latency under write load");
    phase3_read_under_load(engine.clone()).await;

    engine.close().await.unwrap();
    let _ = std::fs::remove_dir_all(&dir);
    println!("\n=== benchmark complete ===");
}
