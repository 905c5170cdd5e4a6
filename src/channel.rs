//! A lockless single-producer / single-consumer channel of search nodes.
//!
//! The ring carries [`SearchNode`]s by value in a fixed buffer sized so the
//! whole structure spans 1 KiB including one dedicated cache line per
//! counter. Occupancy is `push_pointer − poll_pointer` in wrapping counter
//! arithmetic; the producer owns the push pointer, the consumer the poll
//! pointer, and each publishes its side with a release store after touching
//! the buffer.
//!
//! The SPSC contract is enforced by the API: [`channel`] hands out exactly
//! one [`Producer`] and one [`Consumer`], neither of which is cloneable.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use crate::search::node::SearchNode;

/// Cache line size the counter padding assumes.
pub const CACHE_LINE_SIZE: usize = 64;

/// Ring capacity: the payload share of a 1 KiB channel after giving each
/// counter its own cache line.
pub const CHANNEL_BUFFER_LENGTH: usize =
    (1024 - 2 * CACHE_LINE_SIZE) / std::mem::size_of::<SearchNode>();

// Wrapping u16 subtraction is only an unambiguous occupancy below 2^15.
const _: () = assert!(CHANNEL_BUFFER_LENGTH < (1 << 15));
const _: () = assert!(CHANNEL_BUFFER_LENGTH > 0);

/// Counters wrap at the largest multiple of the ring size a u16 can hold,
/// so `pointer % CHANNEL_BUFFER_LENGTH` stays continuous across the wrap.
/// Wrapping at the raw counter width would tear the slot sequence whenever
/// the ring size does not divide 2^16.
const COUNTER_WRAP: u16 = ((1usize << 16) / CHANNEL_BUFFER_LENGTH * CHANNEL_BUFFER_LENGTH) as u16;

fn advance(counter: u16) -> u16 {
    let next = counter.wrapping_add(1);
    if next == COUNTER_WRAP {
        0
    } else {
        next
    }
}

fn distance(push: u16, poll: u16) -> usize {
    (push as usize + COUNTER_WRAP as usize - poll as usize) % COUNTER_WRAP as usize
}

/// A 16-bit counter alone on its cache line.
#[derive(Debug, Default)]
#[repr(align(64))]
struct PaddedCounter(AtomicU16);

struct Ring {
    push_pointer: PaddedCounter,
    buffer: [UnsafeCell<SearchNode>; CHANNEL_BUFFER_LENGTH],
    poll_pointer: PaddedCounter,
}

// One side writes a slot strictly before publishing it through its counter;
// the other side reads the counter with acquire before touching the slot.
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

impl Ring {
    fn new() -> Self {
        Ring {
            push_pointer: PaddedCounter::default(),
            buffer: std::array::from_fn(|_| UnsafeCell::new(SearchNode::default())),
            poll_pointer: PaddedCounter::default(),
        }
    }

    fn occupancy(&self) -> usize {
        let push = self.push_pointer.0.load(Ordering::Acquire);
        let poll = self.poll_pointer.0.load(Ordering::Acquire);
        distance(push, poll)
    }
}

/// The writing half of a channel.
pub struct Producer {
    ring: Arc<Ring>,
}

/// The reading half of a channel.
pub struct Consumer {
    ring: Arc<Ring>,
}

/// Create a channel, returning its two halves.
pub fn channel() -> (Producer, Consumer) {
    let ring = Arc::new(Ring::new());
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    )
}

impl Producer {
    /// Push a node onto the channel. Returns `false` when the ring is full.
    pub fn push(&mut self, node: SearchNode) -> bool {
        let push = self.ring.push_pointer.0.load(Ordering::Relaxed);
        let poll = self.ring.poll_pointer.0.load(Ordering::Acquire);
        if distance(push, poll) >= CHANNEL_BUFFER_LENGTH {
            return false;
        }
        let slot = push as usize % CHANNEL_BUFFER_LENGTH;
        // Sole producer: this slot is outside the consumer's published range.
        unsafe {
            *self.ring.buffer[slot].get() = node;
        }
        self.ring
            .push_pointer
            .0
            .store(advance(push), Ordering::Release);
        true
    }

    /// Number of nodes currently buffered.
    pub fn len(&self) -> usize {
        self.ring.occupancy()
    }

    /// Whether the ring holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Consumer {
    /// Poll a node from the channel. Returns `None` when the ring is empty.
    pub fn poll(&mut self) -> Option<SearchNode> {
        let poll = self.ring.poll_pointer.0.load(Ordering::Relaxed);
        let push = self.ring.push_pointer.0.load(Ordering::Acquire);
        if push == poll {
            return None;
        }
        let slot = poll as usize % CHANNEL_BUFFER_LENGTH;
        // Sole consumer: the producer published this slot before advancing.
        let node = unsafe { *self.ring.buffer[slot].get() };
        self.ring
            .poll_pointer
            .0
            .store(advance(poll), Ordering::Release);
        Some(node)
    }

    /// Number of nodes currently buffered.
    pub fn len(&self) -> usize {
        self.ring.occupancy()
    }

    /// Whether the ring holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
