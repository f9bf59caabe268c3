//! Fixed-size worker pool and the frame completion barrier.
//!
//! Each worker owns one piece of state `S`, built on the worker thread by the
//! pool's factory, and hands it to every task it runs. The renderer uses this
//! to give every worker its own [`Sampler`](crate::Sampler).

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::RenderError;

/// A unit of work run on a pool worker.
pub trait Task<S>: Send {
    fn run(self: Box<Self>, state: &mut S);
}

impl<S, F> Task<S> for F
where
    F: FnOnce(&mut S) + Send,
{
    fn run(self: Box<Self>, state: &mut S) {
        (*self)(state)
    }
}

struct Queue<S> {
    tasks: VecDeque<Box<dyn Task<S>>>,
    running: bool,
}

struct Shared<S> {
    queue: Mutex<Queue<S>>,
    available: Condvar,
    panicked: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ThreadPool<S> {
    shared: Arc<Shared<S>>,
    workers: Vec<JoinHandle<()>>,
}

impl<S: 'static> ThreadPool<S> {
    /// Spawns `threads` workers (at least one). `init` builds each worker's
    /// state from its index.
    pub fn new<F>(threads: usize, init: F) -> Result<Self, RenderError>
    where
        F: Fn(usize) -> S + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                running: true,
            }),
            available: Condvar::new(),
            panicked: AtomicUsize::new(0),
        });
        let init = Arc::new(init);

        let mut pool = Self {
            shared,
            workers: Vec::new(),
        };
        for index in 0..threads.max(1) {
            let shared = Arc::clone(&pool.shared);
            let init = Arc::clone(&init);
            let handle = thread::Builder::new()
                .name(format!("lumen-worker-{index}"))
                .spawn(move || worker_loop(index, &shared, (*init)(index)))
                .map_err(RenderError::WorkerSpawn)?;
            pool.workers.push(handle);
        }
        log::debug!("Started {} render worker(s)", pool.workers.len());
        Ok(pool)
    }

    /// Queues a task. Fails once the pool has been shut down.
    pub fn execute<T>(&self, task: T) -> Result<(), RenderError>
    where
        T: Task<S> + 'static,
    {
        let mut queue = lock(&self.shared.queue);
        if !queue.running {
            return Err(RenderError::PoolShutDown);
        }
        queue.tasks.push_back(Box::new(task));
        drop(queue);
        self.shared.available.notify_one();
        Ok(())
    }
}

impl<S> ThreadPool<S> {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks that panicked since the pool started.
    pub fn panicked(&self) -> usize {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    /// Stops accepting tasks, lets workers drain the queue, then joins them.
    pub fn shutdown(&mut self) {
        lock(&self.shared.queue).running = false;
        self.shared.available.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Render worker exited abnormally");
            }
        }
    }
}

impl<S> Drop for ThreadPool<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<S>(index: usize, shared: &Shared<S>, mut state: S) {
    loop {
        let task = {
            let mut queue = lock(&shared.queue);
            loop {
                if let Some(task) = queue.tasks.pop_front() {
                    break Some(task);
                }
                if !queue.running {
                    break None;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        let Some(task) = task else {
            break;
        };
        if catch_unwind(AssertUnwindSafe(|| task.run(&mut state))).is_err() {
            shared.panicked.fetch_add(1, Ordering::Relaxed);
            log::error!("Render task panicked on worker {index}");
        }
    }
    log::trace!("Render worker {index} exiting");
}

/// Counts finished units of work and releases waiters once all are done.
#[derive(Debug)]
pub struct Completion {
    total: usize,
    notify_every: usize,
    done: Mutex<usize>,
    finished: Condvar,
}

impl Completion {
    /// Waiters are woken when the count reaches `total` and every time it
    /// crosses a multiple of `notify_every`.
    pub fn new(total: usize, notify_every: usize) -> Self {
        Self {
            total,
            notify_every: notify_every.max(1),
            done: Mutex::new(0),
            finished: Condvar::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        *lock(&self.done)
    }

    /// Records `count` more finished units.
    pub fn complete(&self, count: usize) {
        let mut done = lock(&self.done);
        let before = *done;
        *done += count;
        let crossed = before / self.notify_every != *done / self.notify_every;
        if *done >= self.total || crossed {
            self.finished.notify_all();
        }
    }

    /// Blocks until every unit is done, calling `progress` with the count at
    /// each wake-up.
    pub fn wait(&self, mut progress: impl FnMut(usize)) {
        let mut done = lock(&self.done);
        while *done < self.total {
            done = self
                .finished
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
            progress(*done);
        }
    }
}

/// Reports `count` units to a [`Completion`] when dropped, including during
/// a panic unwind, so the barrier always releases.
pub struct CompletionGuard {
    completion: Arc<Completion>,
    count: usize,
}

impl CompletionGuard {
    pub fn new(completion: Arc<Completion>, count: usize) -> Self {
        Self { completion, count }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.completion.complete(self.count);
    }
}
