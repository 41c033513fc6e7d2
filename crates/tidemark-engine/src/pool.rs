use std::collections::VecDeque;
use std::sync::Mutex;

/// Run `work` over `items` on a bounded pool of OS threads, respecting
/// the configured cap on concurrent outstanding remote requests.
/// Results come back in input order.
pub fn run_batches<T, R, F>(workers: usize, items: Vec<T>, work: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let workers = workers.max(1);
    if items.is_empty() {
        return Vec::new();
    }

    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let results: Mutex<Vec<(usize, R)>> = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let next = queue.lock().expect("pool queue poisoned").pop_front();
                    let Some((idx, item)) = next else { break };
                    let result = work(item);
                    results
                        .lock()
                        .expect("pool results poisoned")
                        .push((idx, result));
                }
            });
        }
    });

    let mut collected = results.into_inner().expect("pool results poisoned");
    collected.sort_by_key(|(idx, _)| *idx);
    collected.into_iter().map(|(_, r)| r).collect()
}
