/*!
 * Scheduling Decision Benchmarks
 *
 * Cost of schedule() and tick-driven rescheduling as the run queue grows
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use srt_scheduler::{Engine, NoopSwitch, SchedulerConfig, Task, TaskHandle};

fn populated_engine(tasks: usize) -> (Engine<NoopSwitch>, Vec<TaskHandle>) {
    let config = SchedulerConfig::default().with_max_tasks(tasks + 1);
    let mut engine = Engine::new(config, NoopSwitch).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let seed = TaskHandle::new(Task::new(0, 1));
    engine.init(&seed).unwrap();

    let mut handles = vec![seed];
    for pid in 1..=tasks as u32 {
        let task = TaskHandle::new(Task::new(pid, rng.gen_range(1..=50)));
        engine.wake_up_new_task(&task).unwrap();
        handles.push(task);
    }
    engine.schedule().unwrap();
    (engine, handles)
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");

    for size in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (mut engine, _handles) = populated_engine(size);
            b.iter(|| black_box(engine.schedule().unwrap()));
        });
    }

    group.finish();
}

fn bench_tick_until_switch(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_until_switch");

    for size in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let (mut engine, _handles) = populated_engine(size);
            b.iter(|| {
                let current = engine.current().cloned().unwrap();
                while !engine.scheduler_tick(&current).unwrap() {}
                black_box(engine.schedule().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_sleep_wake(c: &mut Criterion) {
    let (mut engine, handles) = populated_engine(256);
    let victim = handles[128].clone();

    c.bench_function("sleep_wake", |b| {
        b.iter(|| {
            engine.deactivate_task(&victim).unwrap();
            engine.activate_task(&victim).unwrap();
        });
    });
}

criterion_group!(benches, bench_schedule, bench_tick_until_switch, bench_sleep_wake);
criterion_main!(benches);
