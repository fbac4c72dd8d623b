//! Tests de ciclo de vida del núcleo de tareas
//! tests/lifecycle_test.rs
//!
//! Ejercitan servicio + pool + monitor sin pasar por HTTP.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use task_queue_server::tasks::{
    MonitorConfig, PoolConfig, ReaperConfig, RetentionReaper, StatusMonitor, Task, TaskProcessor,
    TaskService, TaskStatus, WorkerPool,
};

fn pool_config(workers: usize) -> PoolConfig {
    PoolConfig {
        workers,
        poll_interval: Duration::from_millis(10),
    }
}

fn start_pool(service: &TaskService, workers: usize, processor: Arc<dyn TaskProcessor>) -> WorkerPool {
    WorkerPool::start(
        pool_config(workers),
        service.queue().clone(),
        service.registry().clone(),
        service.stats().clone(),
        processor,
    )
    .expect("start pool")
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in {:?}", timeout);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_ten_tasks_on_three_workers() {
    let service = TaskService::new(100);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let processor = {
        let seen = Arc::clone(&seen);
        move |task: &Task| seen.lock().push(task.id.clone())
    };
    let pool = start_pool(&service, 3, Arc::new(processor));

    for i in 0..10 {
        service.submit(&format!("payload-{}", i)).unwrap();
    }

    wait_until(Duration::from_secs(5), || service.get_stats().completed == 10);

    let stats = service.get_stats();
    assert_eq!(stats.submitted, 10);
    assert_eq!(stats.completed, 10);
    assert_eq!(stats.in_progress, 0);

    // Cada tarea se procesó exactamente una vez
    let seen = seen.lock().clone();
    assert_eq!(seen.len(), 10);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 10);

    assert!(service
        .list_tasks()
        .iter()
        .all(|t| t.status == TaskStatus::Done && t.finished_at.is_some()));

    assert!(pool.stop(Duration::from_secs(2)).is_clean());
}

#[test]
fn test_status_progression_is_monotonic() {
    let service = TaskService::new(10);
    let task = service.submit("watch me").unwrap();
    assert_eq!(service.get_task(&task.id).unwrap().status, TaskStatus::Pending);

    let gate = Arc::new(Mutex::new(()));
    let held = gate.lock();
    let processor = {
        let gate = Arc::clone(&gate);
        move |_: &Task| {
            let _open = gate.lock();
        }
    };
    let pool = start_pool(&service, 1, Arc::new(processor));

    wait_until(Duration::from_secs(5), || {
        service.get_task(&task.id).unwrap().status == TaskStatus::InProgress
    });
    let in_progress = service.get_task(&task.id).unwrap();
    assert!(in_progress.started_at.is_some());
    assert!(in_progress.finished_at.is_none());
    assert_eq!(service.get_stats().in_progress, 1);

    drop(held);
    wait_until(Duration::from_secs(5), || {
        service.get_task(&task.id).unwrap().status == TaskStatus::Done
    });

    let done = service.get_task(&task.id).unwrap();
    assert!(done.started_at.unwrap() <= done.finished_at.unwrap());
    assert!(done.created_at <= done.started_at.unwrap());

    pool.stop(Duration::from_secs(2));
}

#[test]
fn test_stop_times_out_on_stuck_worker() {
    let service = TaskService::new(10);
    let processor = |_: &Task| thread::sleep(Duration::from_millis(800));
    let pool = start_pool(&service, 1, Arc::new(processor));

    let task = service.submit("slow").unwrap();
    wait_until(Duration::from_secs(5), || {
        service.get_task(&task.id).unwrap().status == TaskStatus::InProgress
    });

    let report = pool.stop(Duration::from_millis(50));
    assert_eq!(report.exited, 0);
    assert_eq!(report.still_running, 1);
    assert!(!report.is_clean());

    // El worker abandonado termina su tarea por su cuenta
    wait_until(Duration::from_secs(5), || {
        service.get_task(&task.id).unwrap().status == TaskStatus::Done
    });
}

#[test]
fn test_concurrent_submitters_get_unique_increasing_ids() {
    let service = TaskService::new(1000);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                let ids: Vec<u64> = (0..25)
                    .map(|_| service.submit("x").unwrap().id.parse().unwrap())
                    .collect();
                ids
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        let ids = handle.join().unwrap();
        // Dentro de un mismo emisor los IDs crecen
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        all.extend(ids);
    }

    assert_eq!(all.len(), 100);
    assert_eq!(service.get_stats().submitted, 100);
    assert_eq!(service.registry().len(), 100);
}

#[test]
fn test_close_lets_workers_drain_and_exit() {
    let service = TaskService::new(10);
    for _ in 0..5 {
        service.submit("x").unwrap();
    }
    service.close_intake();

    let pool = start_pool(&service, 2, Arc::new(|_: &Task| {}));
    wait_until(Duration::from_secs(5), || pool.running() == 0);

    assert_eq!(service.get_stats().completed, 5);
    assert!(pool.stop(Duration::from_millis(100)).is_clean());
}

#[test]
fn test_monitor_reports_counts_without_touching_tasks() {
    let service = TaskService::new(10);
    let pool = start_pool(&service, 2, Arc::new(|_: &Task| {}));
    for _ in 0..4 {
        service.submit("x").unwrap();
    }
    wait_until(Duration::from_secs(5), || service.get_stats().completed == 4);

    let monitor = StatusMonitor::start(
        MonitorConfig {
            interval: Duration::from_millis(20),
        },
        service.registry().clone(),
    )
    .unwrap();

    wait_until(Duration::from_secs(5), || {
        monitor.last_counts().map(|c| c.done) == Some(4)
    });
    thread::sleep(Duration::from_millis(60));

    // Varios ticks después el registro sigue intacto
    assert_eq!(service.registry().len(), 4);
    assert!(service.list_tasks().iter().all(|t| t.status == TaskStatus::Done));

    monitor.stop();
    pool.stop(Duration::from_secs(1));
}

#[test]
fn test_reaper_evicts_done_tasks_stats_unaffected() {
    let service = TaskService::new(10);
    let pool = start_pool(&service, 2, Arc::new(|_: &Task| {}));
    for _ in 0..4 {
        service.submit("x").unwrap();
    }
    wait_until(Duration::from_secs(5), || service.get_stats().completed == 4);

    let reaper = RetentionReaper::start(
        ReaperConfig {
            interval: Duration::from_millis(20),
            retention: Duration::ZERO,
        },
        service.registry().clone(),
    )
    .unwrap();
    wait_until(Duration::from_secs(5), || service.registry().is_empty());

    // Las estadísticas acumuladas no dependen de la retención
    let stats = service.get_stats();
    assert_eq!(stats.submitted, 4);
    assert_eq!(stats.completed, 4);

    reaper.stop();
    pool.stop(Duration::from_secs(1));
}

#[test]
fn test_completed_never_exceeds_submitted_with_live_pool() {
    const SUBMITTERS: usize = 4;
    const PER_SUBMITTER: u64 = 250;
    let total = SUBMITTERS as u64 * PER_SUBMITTER;

    // Cola chica para que los emisores también se bloqueen
    let service = TaskService::new(8);
    let pool = start_pool(&service, 3, Arc::new(|_: &Task| {}));

    let sampler = {
        let service = service.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            let mut last_submitted = 0;
            let mut samples = 0u64;
            loop {
                let stats = service.get_stats();
                assert!(
                    stats.completed <= stats.submitted,
                    "completed {} > submitted {}",
                    stats.completed,
                    stats.submitted
                );
                assert!(stats.submitted >= last_submitted, "submitted went backwards");
                last_submitted = stats.submitted;
                samples += 1;
                if stats.completed == total {
                    return samples;
                }
                assert!(Instant::now() < deadline, "tasks never drained");
            }
        })
    };

    let submitters: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                for _ in 0..PER_SUBMITTER {
                    service.submit("x").unwrap();
                }
            })
        })
        .collect();
    for submitter in submitters {
        submitter.join().unwrap();
    }

    let samples = sampler.join().unwrap();
    assert!(samples > 0);
    let stats = service.get_stats();
    assert_eq!(stats.submitted, total);
    assert_eq!(stats.completed, total);
    assert!(pool.stop(Duration::from_secs(2)).is_clean());
}

#[test]
fn test_submitted_is_monotonic_across_shutdown() {
    let service = TaskService::new(1);
    // Sin workers: el segundo emisor queda bloqueado con la cola llena
    service.submit("a").unwrap();

    let blocked = {
        let service = service.clone();
        thread::spawn(move || service.submit("b"))
    };
    thread::sleep(Duration::from_millis(50));
    let before = service.get_stats().submitted;

    service.close_intake();
    assert!(blocked.join().unwrap().is_err());

    let after = service.get_stats().submitted;
    assert!(after >= before, "submitted went backwards: {} -> {}", before, after);
}
