//! Worker dispatch for blocking request processing.
//!
//! The service handler never runs user handlers on the reactor thread; it
//! submits them to an [`Executor`]. [`WorkerPool`] is the bundled
//! implementation: a fixed set of named threads draining a task channel.
//! Anything else that can run a boxed closure, an inline
//! thread-per-task spawner in tests for instance, can implement the trait
//! too.

use std::sync::Mutex;
use std::thread;

use crossbeam_channel::{unbounded, Sender};
use tracing::{trace, warn};

/// A unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executes worker tasks off the reactor thread.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Wraps a dispatch closure as an [`Executor`].
pub struct ExecutorFn<F> {
    f: F,
}

impl<F> Executor for ExecutorFn<F>
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        (self.f)(task)
    }
}

/// Builds an [`Executor`] from a plain dispatch function.
pub fn make_executor<F>(f: F) -> ExecutorFn<F>
where
    F: Fn(Task) + Send + Sync,
{
    ExecutorFn { f }
}

/// A fixed-size pool of worker threads fed through an unbounded channel.
pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads. `size` must be non-zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "worker pool needs at least one thread");
        let (sender, receiver) = unbounded::<Task>();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("http-worker-{id}"))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        task();
                    }
                    trace!("worker {} drained, exiting", id);
                })
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        Self { sender: Some(sender), workers: Mutex::new(workers) }
    }
}

impl Executor for WorkerPool {
    fn execute(&self, task: Task) {
        if let Some(sender) = &self.sender {
            if sender.send(task).is_err() {
                warn!("worker pool already shut down, dropping task");
            }
        }
    }
}

/// Dropping the pool closes the channel and joins the workers; queued
/// tasks still run to completion.
impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(std::sync::PoisonError::into_inner));
        for handle in workers {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_queued_tasks_on_worker_threads() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = counter.clone();
            pool.execute(Box::new(move || {
                assert!(thread::current().name().unwrap_or("").starts_with("http-worker-"));
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn closures_are_executors() {
        let executor = make_executor(|task: Task| task());
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        executor.execute(Box::new(move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
