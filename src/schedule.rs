use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Identifies a cancellation scope. Copyable so callbacks can schedule
/// follow-up work into the scope they run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

type TaskId = u64;

enum TaskKind {
    Once(Box<dyn FnOnce(&Scheduler, f64)>),
    Repeating {
        period: f64,
        callback: Box<dyn FnMut(&Scheduler, f64)>,
    },
}

struct Task {
    scope: ScopeId,
    kind: TaskKind,
}

/// Queue entry ordered by (due time, registration sequence). Tasks scheduled
/// for the same instant fire in registration order.
struct QueueEntry {
    due: f64,
    seq: u64,
    task: TaskId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted: BinaryHeap is a max-heap, we pop the earliest entry.
        other
            .due
            .total_cmp(&self.due)
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Inner {
    now: f64,
    next_seq: u64,
    next_scope: u64,
    queue: BinaryHeap<QueueEntry>,
    tasks: HashMap<TaskId, Task>,
    dead_scopes: HashSet<ScopeId>,
}

/// Single-threaded cooperative scheduler for timers and delayed callbacks.
///
/// The scheduler does not fire on its own: the host advances it with
/// [`Scheduler::advance_to`], typically once per frame with the UI frame
/// time. Tests drive it the same way, which makes the clock trivially
/// mockable.
///
/// Every task belongs to a [`Scope`]; dropping the scope guard cancels all
/// of its tasks, including ones scheduled later by callbacks running inside
/// the scope.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

/// Cancellation guard returned by [`Scheduler::scope`]. Dropping it cancels
/// every task registered under the scope; no callback of a dropped scope
/// ever fires again.
pub struct Scope {
    inner: Weak<RefCell<Inner>>,
    id: ScopeId,
}

impl Scope {
    pub fn id(&self) -> ScopeId {
        self.id
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let removed: Vec<Task> = {
            let mut inner = inner.borrow_mut();
            inner.dead_scopes.insert(self.id);
            let ids: Vec<TaskId> = inner
                .tasks
                .iter()
                .filter(|(_, task)| task.scope == self.id)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| inner.tasks.remove(id)).collect()
        };
        // Task closures may themselves own scope guards: drop them only
        // after the borrow above is released.
        drop(removed);
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                now: 0.0,
                next_seq: 0,
                next_scope: 0,
                queue: BinaryHeap::new(),
                tasks: HashMap::new(),
                dead_scopes: HashSet::new(),
            })),
        }
    }

    /// Current scheduler time, in seconds.
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Open a new cancellation scope.
    pub fn scope(&self) -> Scope {
        let mut inner = self.inner.borrow_mut();
        let id = ScopeId(inner.next_scope);
        inner.next_scope += 1;
        Scope {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Schedule a one-shot callback `delay` seconds from now.
    pub fn after(
        &self,
        scope: ScopeId,
        delay: f64,
        callback: impl FnOnce(&Scheduler, f64) + 'static,
    ) {
        self.schedule(scope, delay.max(0.0), TaskKind::Once(Box::new(callback)));
    }

    /// Schedule a repeating callback with the given period. The first fire
    /// happens one full period from now.
    pub fn every(
        &self,
        scope: ScopeId,
        period: f64,
        callback: impl FnMut(&Scheduler, f64) + 'static,
    ) {
        assert!(period > 0.0, "repeating timer period must be positive");
        self.schedule(
            scope,
            period,
            TaskKind::Repeating {
                period,
                callback: Box::new(callback),
            },
        );
    }

    fn schedule(&self, scope: ScopeId, offset: f64, kind: TaskKind) {
        let mut inner = self.inner.borrow_mut();
        if inner.dead_scopes.contains(&scope) {
            return;
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now + offset;
        inner.queue.push(QueueEntry {
            due,
            seq,
            task: seq,
        });
        inner.tasks.insert(seq, Task { scope, kind });
    }

    /// Fire all tasks due at or before `t`, in (due time, registration)
    /// order. While a task runs, scheduler time equals its due time, so
    /// callbacks that schedule follow-ups measure delays from their own
    /// fire time. Advancing to a time in the past is a no-op.
    pub fn advance_to(&self, t: f64) {
        loop {
            let entry = {
                let mut inner = self.inner.borrow_mut();
                let due = inner.queue.peek().is_some_and(|next| next.due <= t);
                if due {
                    inner.queue.pop()
                } else {
                    None
                }
            };
            let Some(entry) = entry else {
                break;
            };

            // A missing task means the entry was cancelled; skip the stale
            // queue entry.
            let Some(task) = self.inner.borrow_mut().tasks.remove(&entry.task) else {
                continue;
            };

            {
                let mut inner = self.inner.borrow_mut();
                inner.now = inner.now.max(entry.due);
            }

            let Task { scope, kind } = task;
            match kind {
                TaskKind::Once(callback) => callback(self, entry.due),
                TaskKind::Repeating {
                    period,
                    mut callback,
                } => {
                    callback(self, entry.due);
                    let mut inner = self.inner.borrow_mut();
                    // The callback may have dropped its own scope guard.
                    if !inner.dead_scopes.contains(&scope) {
                        let seq = inner.next_seq;
                        inner.next_seq += 1;
                        inner.queue.push(QueueEntry {
                            due: entry.due + period,
                            seq,
                            task: entry.task,
                        });
                        inner.tasks.insert(
                            entry.task,
                            Task {
                                scope,
                                kind: TaskKind::Repeating { period, callback },
                            },
                        );
                    }
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(t);
    }

    /// Number of live (non-cancelled) scheduled tasks.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// True if no tasks are scheduled.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
