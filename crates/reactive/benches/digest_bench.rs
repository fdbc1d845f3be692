//! Benchmarks for the settle-reactive digest loop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use settle_reactive::{ManualScheduler, Scope, Value, WatchFn};
use std::cell::Cell;
use std::rc::Rc;

fn scope_with_watchers(count: usize, source: &Rc<Cell<i64>>) -> Scope {
    let scope = Scope::new(Rc::new(ManualScheduler::new()));
    for i in 0..count {
        let source = source.clone();
        scope.watch(
            move |_| Ok(Value::Int64(source.get() + i as i64)),
            |_, _, _| Ok(()),
            false,
        );
    }
    scope
}

fn bench_stable_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest/stable");

    for size in [1, 10, 100, 1000] {
        let source = Rc::new(Cell::new(0));
        let scope = scope_with_watchers(size, &source);
        scope.digest().unwrap();

        group.bench_with_input(BenchmarkId::new("watchers", size), &scope, |b, scope| {
            b.iter(|| black_box(scope.digest()))
        });
    }

    group.finish();
}

fn bench_changed_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest/changed");

    for size in [1, 10, 100, 1000] {
        let source = Rc::new(Cell::new(0));
        let scope = scope_with_watchers(size, &source);
        scope.digest().unwrap();

        group.bench_with_input(BenchmarkId::new("watchers", size), &scope, |b, scope| {
            b.iter(|| {
                source.set(source.get() + 1);
                black_box(scope.digest())
            })
        });
    }

    group.finish();
}

fn bench_value_eq_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest/value_eq");

    for len in [10, 100, 1000] {
        let scope = Scope::new(Rc::new(ManualScheduler::new()));
        let list = Value::list((0..len).map(Value::Int64).collect());
        let source = list.clone();
        scope.watch(move |_| Ok(source.clone()), |_, _, _| Ok(()), true);
        scope.digest().unwrap();

        group.bench_with_input(BenchmarkId::new("list_len", len), &scope, |b, scope| {
            b.iter(|| {
                if let Some(mut items) = list.items_mut() {
                    items.push(Value::Int64(0));
                }
                black_box(scope.digest())
            })
        });
    }

    group.finish();
}

fn bench_watch_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest/watch_group");

    for size in [1, 10, 100] {
        let scope = Scope::new(Rc::new(ManualScheduler::new()));
        let source = Rc::new(Cell::new(0));
        let watch_fns: Vec<WatchFn> = (0..size)
            .map(|_| {
                let source = source.clone();
                let watch_fn: WatchFn = Box::new(move |_| Ok(Value::Int64(source.get())));
                watch_fn
            })
            .collect();
        scope.watch_group(watch_fns, |_, _, _| Ok(()));
        scope.digest().unwrap();

        group.bench_with_input(BenchmarkId::new("entries", size), &scope, |b, scope| {
            b.iter(|| {
                source.set(source.get() + 1);
                black_box(scope.digest())
            })
        });
    }

    group.finish();
}

fn bench_eval_async(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval_async");

    for burst in [1, 10, 100] {
        let scheduler = Rc::new(ManualScheduler::new());
        let scope = Scope::new(scheduler.clone());

        group.bench_with_input(BenchmarkId::new("burst", burst), &burst, |b, &burst| {
            b.iter(|| {
                for _ in 0..burst {
                    scope.eval_async(|_| Ok(()));
                }
                black_box(scheduler.run_pending())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stable_digest,
    bench_changed_digest,
    bench_value_eq_digest,
    bench_watch_group,
    bench_eval_async,
);

criterion_main!(benches);
