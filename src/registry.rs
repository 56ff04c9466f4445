//! The pairing registry: two FIFO queues of pending halves under one lock.
//!
//! Invariant (a consequence of the pairing rule, not separately enforced
//! here): at any instant at most one of the two queues is non-empty. If the
//! [`Acceptor`](crate::listener) ever observed both non-empty, that would be
//! a bug upstream of this module.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::io::BufReader;
use tokio::net::UnixStream;

use crate::direction::Direction;

/// One connection waiting for an opposite-direction peer.
pub struct PendingHalf {
    pub conn: BufReader<UnixStream>,
    pub direction: Direction,
    pub arrived_at: Instant,
}

impl PendingHalf {
    pub fn new(conn: BufReader<UnixStream>, direction: Direction) -> Self {
        Self {
            conn,
            direction,
            arrived_at: Instant::now(),
        }
    }
}

impl fmt::Debug for PendingHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingHalf")
            .field("direction", &self.direction)
            .field("age", &self.arrived_at.elapsed())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct State {
    upstream: VecDeque<PendingHalf>,
    downstream: VecDeque<PendingHalf>,
}

impl State {
    fn queue_mut(&mut self, direction: Direction) -> &mut VecDeque<PendingHalf> {
        match direction {
            Direction::Upstream => &mut self.upstream,
            Direction::Downstream => &mut self.downstream,
            Direction::Unknown => unreachable!("registry never stores Unknown-direction halves"),
        }
    }
}

/// The shared pairing state for one relay instance.
///
/// Both operations it exposes complete under a single [`std::sync::Mutex`]
/// held for their entirety; the lock is never held across I/O (spec.md §5).
#[derive(Default)]
pub struct Registry {
    state: std::sync::Mutex<State>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Either pairs `half` with a waiting peer of the opposite direction
    /// (FIFO: the oldest waiter goes first) and hands both back as
    /// `Ok((half, peer))`, or enqueues `half` and returns
    /// `Err(resulting_queue_length)` for logging.
    pub fn offer_or_take(&self, half: PendingHalf) -> Result<(PendingHalf, PendingHalf), usize> {
        let mut state = self.state.lock().unwrap();
        let opposite = half.direction.opposite();
        if let Some(peer) = state.queue_mut(opposite).pop_front() {
            return Ok((half, peer));
        }
        let own_direction = half.direction;
        let queue = state.queue_mut(own_direction);
        queue.push_back(half);
        Err(queue.len())
    }

    /// Removes and returns every pending half whose wait has exceeded
    /// `budget` as of `now`. Queues are rebuilt in arrival order, preserving
    /// FIFO for survivors.
    pub fn evict_expired(&self, now: Instant, budget: Duration) -> Vec<PendingHalf> {
        let mut state = self.state.lock().unwrap();
        let mut evicted = Vec::new();
        for direction in [Direction::Upstream, Direction::Downstream] {
            let queue = state.queue_mut(direction);
            let mut survivors = VecDeque::with_capacity(queue.len());
            for half in queue.drain(..) {
                if now.saturating_duration_since(half.arrived_at) > budget {
                    evicted.push(half);
                } else {
                    survivors.push_back(half);
                }
            }
            *queue = survivors;
        }
        evicted
    }
}
