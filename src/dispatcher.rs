use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

type Task = Box<dyn FnOnce() + Send>;

/// FIFO task queue guarded by a mutex/condvar pair, the way
/// `BlockingQueue<T>` backs the worker pool: a bounded capacity clamped to
/// at least 128 slots, `push` notifying one waiter, `stop` waking everyone
/// so they can observe the queue is closed and exit.
struct Queue {
    tasks: VecDeque<Task>,
    capacity: usize,
    stopped: bool,
}

struct Shared {
    state: Mutex<Queue>,
    ready: Condvar,
}

/// A fixed-size worker pool executing enqueued closures in submission
/// order, modeled on `ThreadPool`/`BlockingQueue`. Dropping or calling
/// `join` stops the queue and waits for every worker to finish its current
/// task; tasks enqueued after that point are silently dropped rather than
/// run.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(threads: usize, capacity: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(Queue { tasks: VecDeque::new(), capacity: capacity.max(128), stopped: false }),
            ready: Condvar::new(),
        });

        let workers = (0..threads.max(1))
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || worker_loop(shared))
            })
            .collect();

        Self { shared, workers }
    }

    /// Enqueues a task. Silently dropped if the pool has already been
    /// joined, matching `ThreadPool::Enqueue`'s `if (exit_) return;` guard.
    pub fn enqueue<F: FnOnce() + Send + 'static>(&self, task: F) {
        let mut queue = self.shared.state.lock().unwrap();
        if queue.stopped {
            return;
        }
        queue.tasks.push_back(Box::new(task));
        drop(queue);
        self.shared.ready.notify_one();
    }

    /// Stops accepting new work and blocks until every worker drains the
    /// remaining queue and exits.
    pub fn join(mut self) {
        self.join_mut();
    }

    fn join_mut(&mut self) {
        {
            let mut queue = self.shared.state.lock().unwrap();
            if queue.stopped {
                return;
            }
            queue.stopped = true;
        }
        self.shared.ready.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.join_mut();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let mut queue = shared.state.lock().unwrap();
        while queue.tasks.is_empty() && !queue.stopped {
            queue = shared.ready.wait(queue).unwrap();
        }
        let task = match queue.tasks.pop_front() {
            Some(task) => task,
            None => return,
        };
        drop(queue);
        task();
    }
}

/// A contiguous run of flat pixel indices `[start, end)` handed to one
/// worker as a single render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

/// Partitions `width * height` flat pixel indices into spans of `span`
/// pixels (the final span may be shorter), mirroring `Renderer::Render`'s
/// job-vector construction.
pub fn partition_spans(width: u32, height: u32, span: u32) -> Vec<Span> {
    let total = width * height;
    let span = span.max(1);
    let mut spans = Vec::with_capacity((total / span + 1) as usize);
    let mut start = 0;
    while start < total {
        let end = (start + span).min(total);
        spans.push(Span { start, end });
        start = end;
    }
    spans
}

/// Hands out spans from a shared queue to `threads` workers running
/// `render_span`, blocking until every span has been rendered. This is the
/// dispatcher half of `Renderer::Render`: job partitioning plus a pool
/// that pops spans off a shared list under a mutex until it's empty.
pub fn dispatch<F>(width: u32, height: u32, span: u32, threads: usize, render_span: F)
where
    F: Fn(Span) + Send + Sync + 'static,
{
    let spans = Arc::new(Mutex::new(partition_spans(width, height, span)));
    let render_span = Arc::new(render_span);
    let pool = ThreadPool::new(threads, 128);

    for _ in 0..threads.max(1) {
        let spans = spans.clone();
        let render_span = render_span.clone();
        pool.enqueue(move || loop {
            let next = spans.lock().unwrap().pop();
            match next {
                Some(job) => render_span(job),
                None => return,
            }
        });
    }

    pool.join();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn partition_spans_covers_every_pixel_exactly_once() {
        let spans = partition_spans(17, 3, 10);
        let total: u32 = spans.iter().map(|s| s.end - s.start).sum();
        assert_eq!(total, 17 * 3);
        for window in spans.windows(2) {
            assert_eq!(window[0].end, window[1].start);
        }
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, 17 * 3);
    }

    #[test]
    fn partition_spans_handles_span_larger_than_image() {
        let spans = partition_spans(4, 4, 256);
        assert_eq!(spans, vec![Span { start: 0, end: 16 }]);
    }

    #[test]
    fn thread_pool_runs_every_enqueued_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = ThreadPool::new(4, 128);
        for _ in 0..50 {
            let counter = counter.clone();
            pool.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.join();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn dispatch_renders_every_span_exactly_once() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let hits_for_closure = hits.clone();
        dispatch(8, 8, 5, 3, move |job| {
            hits_for_closure.lock().unwrap().push(job);
        });
        let mut jobs = hits.lock().unwrap().clone();
        jobs.sort_by_key(|s| s.start);
        let total: u32 = jobs.iter().map(|s| s.end - s.start).sum();
        assert_eq!(total, 64);
    }
}
