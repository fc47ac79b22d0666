//! Criterion benchmarks for rust_logging

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_logging::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Level Gate Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let manager = Manager::new();
    manager.root().add_handler(Arc::new(Handler::new(NullSink)));
    let deep = manager.get_logger("a.b.c.d.e.f");

    group.bench_function("disabled_cached", |b| {
        b.iter(|| deep.debug(black_box("filtered out"), ()));
    });

    group.bench_function("is_enabled_for", |b| {
        b.iter(|| black_box(deep.is_enabled_for(black_box(Level::INFO))));
    });

    group.bench_function("effective_level_after_set_level", |b| {
        let top = manager.get_logger("a");
        b.iter(|| {
            top.set_level(Level::ERROR);
            black_box(deep.effective_level())
        });
    });

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let manager = Manager::new();
    manager.root().add_handler(Arc::new(Handler::new(NullSink)));
    let logger = manager.get_logger("bench.dispatch");

    group.bench_function("warning_no_args", |b| {
        b.iter(|| logger.warning(black_box("Warning message"), ()));
    });

    group.bench_function("warning_with_args", |b| {
        b.iter(|| logger.warning("user %s did %d things", vec![Value::from("ada"), Value::from(42)]));
    });

    group.finish();
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let record = Record::new("bench.format", Level::INFO, "request %s took %.2f ms")
        .with_args(vec![Value::from("/index"), Value::from(12.345)]);

    let percent = Formatter::new("%(levelname)-8s %(name)s: %(message)s").unwrap();
    group.bench_function("percent", |b| {
        b.iter(|| black_box(percent.format(black_box(&record)).unwrap()));
    });

    let brace = Formatter::builder()
        .format("{levelname:<8} {name}: {message}")
        .style(Style::Brace)
        .build()
        .unwrap();
    group.bench_function("brace", |b| {
        b.iter(|| black_box(brace.format(black_box(&record)).unwrap()));
    });

    let timed = Formatter::new("%(asctime)s %(levelname)s %(message)s").unwrap();
    group.bench_function("with_asctime", |b| {
        b.iter(|| black_box(timed.format(black_box(&record)).unwrap()));
    });

    group.finish();
}

// ============================================================================
// Output Benchmarks
// ============================================================================

fn bench_file_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_output");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let plain = Handler::new(FileSink::new(temp_dir.path().join("plain.log")).unwrap());
    let rotating = Handler::new(
        FileSink::rotating(temp_dir.path().join("rotating.log"), 1024 * 1024, 3).unwrap(),
    );
    let record = Record::new("bench.file", Level::INFO, "a line of reasonable length for a log file");

    group.bench_function("plain", |b| {
        b.iter(|| plain.handle(black_box(&record)));
    });

    group.bench_function("size_rotating", |b| {
        b.iter(|| rotating.handle(black_box(&record)));
    });

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    group.throughput(Throughput::Elements(1));

    let queue = LogQueue::unbounded();
    let listener = QueueListener::new(queue.clone(), vec![Arc::new(Handler::new(NullSink))]);
    listener.start().expect("Failed to start listener");
    let producer = Handler::new(QueueSink::new(queue));
    let record = Record::new("bench.queue", Level::INFO, "queued message");

    group.bench_function("enqueue", |b| {
        b.iter(|| producer.handle(black_box(&record)));
    });

    group.finish();
    listener.stop();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_level_filtering,
    bench_dispatch,
    bench_formatting,
    bench_file_output,
    bench_queue
);

criterion_main!(benches);
