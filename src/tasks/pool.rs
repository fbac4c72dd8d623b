//! # Pool de Workers
//! src/tasks/pool.rs
//!
//! N hilos que compiten por la cola de trabajo. Cada worker:
//!
//! 1. Toma un ID de la cola.
//! 2. Pasa la tarea `PENDING -> IN_PROGRESS` en el registro.
//! 3. Ejecuta el procesador.
//! 4. Pasa la tarea `IN_PROGRESS -> DONE` y cuenta una completada.
//!
//! La parada es cooperativa: `stop` activa la señal y espera a los workers
//! hasta el período de gracia. Un worker ocupado en el procesador no se puede
//! interrumpir; si no sale a tiempo se registra un warning y se lo abandona.

use crate::tasks::processor::TaskProcessor;
use crate::tasks::queue::{Dequeued, WorkQueue};
use crate::tasks::registry::Registry;
use crate::tasks::signal::{ExitLatch, StopSignal};
use crate::tasks::stats::Statistics;
use crate::tasks::types::{Task, TaskStatus};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuración del pool
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Número de workers
    pub workers: usize,

    /// Cada cuánto un worker inactivo revisa la señal de parada
    pub poll_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Resultado de `WorkerPool::stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers que salieron dentro del período de gracia
    pub exited: usize,

    /// Workers que seguían corriendo al vencer el plazo
    pub still_running: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.still_running == 0
    }
}

/// Lo que comparte cada worker
struct WorkerContext {
    queue: WorkQueue<String>,
    registry: Registry<String, Task>,
    stats: Statistics,
    processor: Arc<dyn TaskProcessor>,
    stop: StopSignal,
    poll_interval: Duration,
}

/// Pool de tamaño fijo
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    stop: StopSignal,
    latch: ExitLatch,
}

impl WorkerPool {
    /// Lanza los workers
    pub fn start(
        config: PoolConfig,
        queue: WorkQueue<String>,
        registry: Registry<String, Task>,
        stats: Statistics,
        processor: Arc<dyn TaskProcessor>,
    ) -> std::io::Result<Self> {
        let stop = StopSignal::new();
        let latch = ExitLatch::new(config.workers);
        let context = Arc::new(WorkerContext {
            queue,
            registry,
            stats,
            processor,
            stop: stop.clone(),
            poll_interval: config.poll_interval,
        });

        let mut handles = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let context = Arc::clone(&context);
            let guard = latch.guard();
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    let _guard = guard;
                    worker_loop(id, &context);
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Parar los que ya arrancaron antes de reportar el error
                    stop.trigger();
                    return Err(e);
                }
            }
        }

        info!(workers = config.workers, "Started worker pool");
        Ok(Self {
            handles,
            stop,
            latch,
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Workers que aún no salieron
    pub fn running(&self) -> usize {
        self.latch.remaining()
    }

    /// Detiene el pool esperando como máximo `grace`
    ///
    /// Los workers dejan de tomar trabajo nuevo aunque queden elementos en la
    /// cola. Si alguno no sale a tiempo se lo deja corriendo (no hay
    /// cancelación forzada) y el reporte lo indica.
    pub fn stop(self, grace: Duration) -> ShutdownReport {
        info!("Stopping worker pool...");
        self.stop.trigger();

        let total = self.handles.len();
        let still_running = self.latch.wait_timeout(grace);

        if still_running == 0 {
            for handle in self.handles {
                let _ = handle.join();
            }
            info!(workers = total, "All workers stopped");
        } else {
            warn!(
                still_running,
                grace_ms = grace.as_millis() as u64,
                "Worker shutdown timeout, some workers may not have finished"
            );
            // Los handles se sueltan: los hilos quedan desacoplados
        }

        ShutdownReport {
            exited: total - still_running,
            still_running,
        }
    }
}

fn worker_loop(id: usize, context: &WorkerContext) {
    debug!(worker = id, "🔧 Worker started");

    loop {
        if context.stop.is_triggered() {
            info!(worker = id, "Stop signal received, exiting");
            return;
        }

        match context.queue.dequeue_timeout(context.poll_interval) {
            Dequeued::Item(task_id) => process_task(id, context, &task_id),
            Dequeued::TimedOut => continue,
            Dequeued::Closed => {
                info!(worker = id, "Queue closed, exiting");
                return;
            }
        }
    }
}

fn process_task(worker: usize, context: &WorkerContext, task_id: &String) {
    let claimed = context
        .registry
        .update(task_id, |task| task.advance(TaskStatus::InProgress));

    let task = match context.registry.get(task_id) {
        Some(task) if claimed && task.status == TaskStatus::InProgress => task,
        _ => {
            warn!(worker, task_id = %task_id, "Dequeued task is not claimable, skipping");
            return;
        }
    };

    debug!(worker, task_id = %task_id, "🔨 Processing task");
    let start = Instant::now();
    context.processor.process(&task);

    context
        .registry
        .update(task_id, |task| task.advance(TaskStatus::Done));
    context.stats.increment_completed();

    info!(
        worker,
        task_id = %task_id,
        duration_ms = start.elapsed().as_millis() as u64,
        "✅ Completed task"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    struct Fixture {
        queue: WorkQueue<String>,
        registry: Registry<String, Task>,
        stats: Statistics,
    }

    impl Fixture {
        fn new(capacity: usize) -> Self {
            Self {
                queue: WorkQueue::new(capacity),
                registry: Registry::new(),
                stats: Statistics::new(),
            }
        }

        fn submit(&self, id: &str, payload: &str) {
            self.registry.set(id.to_string(), Task::new(id, payload));
            self.stats.increment_submitted();
            self.queue.enqueue(id.to_string()).unwrap();
        }

        fn start(&self, workers: usize, processor: Arc<dyn TaskProcessor>) -> WorkerPool {
            WorkerPool::start(
                PoolConfig {
                    workers,
                    poll_interval: Duration::from_millis(10),
                },
                self.queue.clone(),
                self.registry.clone(),
                self.stats.clone(),
                processor,
            )
            .unwrap()
        }

        fn wait_for_completed(&self, n: u64) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.stats.snapshot().completed < n {
                assert!(Instant::now() < deadline, "timed out waiting for {} completions", n);
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    fn instant() -> Arc<dyn TaskProcessor> {
        Arc::new(|_: &Task| {})
    }

    #[test]
    fn test_pool_processes_all_tasks() {
        let fx = Fixture::new(16);
        let pool = fx.start(3, instant());
        for i in 1..=10 {
            fx.submit(&i.to_string(), "payload");
        }

        fx.wait_for_completed(10);
        assert!(fx.registry.get_all().iter().all(|t| t.status == TaskStatus::Done));

        let report = pool.stop(Duration::from_secs(2));
        assert!(report.is_clean());
        assert_eq!(report.exited, 3);
    }

    #[test]
    fn test_processor_sees_in_progress_task() {
        let fx = Fixture::new(4);
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let pool = fx.start(
            1,
            Arc::new(move |task: &Task| {
                let _ = tx.lock().send(task.status);
            }),
        );

        fx.submit("1", "abc");
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            TaskStatus::InProgress
        );
        fx.wait_for_completed(1);
        let task = fx.registry.get(&"1".to_string()).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.started_at.unwrap() <= task.finished_at.unwrap());
        pool.stop(Duration::from_secs(1));
    }

    #[test]
    fn test_workers_exit_when_queue_closes() {
        let fx = Fixture::new(4);
        let pool = fx.start(2, instant());
        fx.queue.close();

        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.running() > 0 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        assert!(pool.stop(Duration::from_millis(100)).is_clean());
    }

    #[test]
    fn test_stop_leaves_queued_work_untouched() {
        let fx = Fixture::new(8);
        let pool = fx.start(2, instant());
        assert!(pool.stop(Duration::from_secs(1)).is_clean());

        fx.submit("1", "late");
        thread::sleep(Duration::from_millis(50));
        assert_eq!(
            fx.registry.get(&"1".to_string()).unwrap().status,
            TaskStatus::Pending
        );
        assert_eq!(fx.queue.len(), 1);
    }

    #[test]
    fn test_stop_times_out_on_stuck_workers() {
        let fx = Fixture::new(8);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = parking_lot::Mutex::new(release_rx);
        let started = Arc::new(AtomicUsize::new(0));

        let pool = {
            let started = Arc::clone(&started);
            fx.start(
                2,
                Arc::new(move |_: &Task| {
                    started.fetch_add(1, Ordering::SeqCst);
                    // Bloquea hasta que el test libere (o se cierre el canal)
                    let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
                }),
            )
        };

        fx.submit("1", "a");
        fx.submit("2", "b");
        let deadline = Instant::now() + Duration::from_secs(2);
        while started.load(Ordering::SeqCst) < 1 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }

        let report = pool.stop(Duration::from_millis(50));
        assert!(!report.is_clean());
        assert!(report.still_running >= 1);
        assert!(fx
            .registry
            .get_all()
            .iter()
            .any(|t| t.status == TaskStatus::InProgress));
        assert_eq!(fx.stats.snapshot().completed, 0);

        drop(release_tx);
    }

    #[test]
    fn test_unknown_task_id_is_skipped() {
        let fx = Fixture::new(4);
        let pool = fx.start(1, instant());
        fx.queue.enqueue("ghost".to_string()).unwrap();
        fx.submit("1", "real");

        fx.wait_for_completed(1);
        assert!(fx.registry.get(&"ghost".to_string()).is_none());
        assert_eq!(fx.stats.snapshot().completed, 1);
        pool.stop(Duration::from_secs(1));
    }
}
