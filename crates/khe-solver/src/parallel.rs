//! Best-of-N solving on worker threads.
//!
//! Each worker claims the next attempt index, builds a fresh solution with
//! diversifier `diversifier + index`, solves it, and offers it to a shared
//! list of the best solutions found so far.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use khe_config::ThreadCount;
use khe_model::{Instance, Soln};
use tracing::{debug, info};

/// Solutions kept in increasing order of cost, at most `keep` of them.
struct BestList {
    keep: usize,
    solns: Vec<Soln>,
}

impl BestList {
    fn new(keep: usize) -> Self {
        Self {
            keep,
            solns: Vec::with_capacity(keep),
        }
    }

    /// Inserts `soln` after every solution no worse than it, dropping the
    /// worst when over capacity.
    fn offer(&mut self, soln: Soln) {
        let pos = self.solns.partition_point(|s| s.cost() <= soln.cost());
        if pos >= self.keep {
            return;
        }
        self.solns.insert(pos, soln);
        self.solns.truncate(self.keep);
    }
}

/// Makes `attempts` solutions of `instance` on up to `thread_count`
/// threads and returns the best `keep` of them, cheapest first.
///
/// Attempt `i` starts from `Soln::new(instance, diversifier + i)`, wrapping
/// past `u32::MAX`, and is handed to `solve_fn`. Equal-cost solutions keep the order in which
/// they finished.
///
/// # Example
///
/// ```
/// use khe_config::ThreadCount;
/// use khe_solver::parallel_solve;
/// use khe_test::school;
///
/// let instance = school(4, 1, &[(1, Some(0))]);
/// let best = parallel_solve(&instance, 0, 3, ThreadCount::Specific(2), 2, |soln| {
///     soln.make_event_meets();
/// });
/// assert_eq!(best.len(), 2);
/// ```
pub fn parallel_solve<F>(
    instance: &Arc<Instance>,
    diversifier: u32,
    attempts: usize,
    thread_count: ThreadCount,
    keep: usize,
    solve_fn: F,
) -> Vec<Soln>
where
    F: Fn(&mut Soln) + Sync,
{
    let threads = thread_count.resolve(attempts);
    let next = Mutex::new(0usize);
    let best = Mutex::new(BestList::new(keep));
    info!(
        instance = instance.name(),
        attempts,
        threads,
        keep,
        "parallel solve"
    );

    thread::scope(|scope| {
        for worker in 0..threads {
            let (next, best, solve_fn) = (&next, &best, &solve_fn);
            scope.spawn(move || loop {
                let index = {
                    let mut next = next.lock().unwrap_or_else(PoisonError::into_inner);
                    if *next >= attempts {
                        break;
                    }
                    *next += 1;
                    *next - 1
                };
                let diversifier = diversifier.wrapping_add(index as u32);
                let mut soln = Soln::new(Arc::clone(instance), diversifier);
                solve_fn(&mut soln);
                debug!(worker, attempt = index, cost = %soln.cost(), "attempt finished");
                best.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .offer(soln);
            });
        }
    });

    best.into_inner().unwrap_or_else(PoisonError::into_inner).solns
}

#[cfg(test)]
#[path = "parallel_tests.rs"]
mod tests;
