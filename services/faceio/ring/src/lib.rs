//! Bounded single-producer/single-consumer packet ring.
//!
//! This crate provides the receive-side buffer that bridges a transport's
//! interrupt-like producer context (a radio status callback, a wireless-stack
//! write callback) to the cooperative main loop. Each ring holds up to
//! `capacity` length-prefixed byte records of at most `max_record` bytes.
//!
//! The ring is split into a [`Producer`] and a [`Consumer`] handle so the
//! one-producer/one-consumer discipline is enforced by the type system
//! rather than by convention: neither handle is `Clone`, and both `push`
//! and `pop` take `&mut self`, so a second producer or consumer cannot be
//! created in safe code. Neither side ever blocks: publication is a
//! Release store of the write index, observation an Acquire load, so the
//! consumer can never see a record before its bytes are fully written.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Ring errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RingError {
    /// The ring already holds `capacity` records; the record was dropped.
    #[error("ring full")]
    Full,

    /// The record exceeds the ring's fixed record size.
    #[error("record too large: {len} > {max}")]
    Oversize {
        /// Offered record length
        len: usize,
        /// Maximum record length for this ring
        max: usize,
    },
}

struct Slot {
    len: usize,
    data: Box<[u8]>,
}

struct Shared {
    slots: Box<[UnsafeCell<Slot>]>,
    capacity: usize,
    max_record: usize,
    /// Next slot the consumer will read. Written by the consumer only.
    head: AtomicUsize,
    /// Next slot the producer will write. Written by the producer only.
    tail: AtomicUsize,
}

// Head is mutated only through the Consumer, tail only through the
// Producer, and both require `&mut` on a non-Clone handle, so each index
// has exactly one writing context. A slot is touched by at most one side
// at a time (producer before publishing it, consumer after).
unsafe impl Sync for Shared {}
unsafe impl Send for Shared {}

impl Shared {
    fn len(&self) -> usize {
        self.tail
            .load(Ordering::Acquire)
            .wrapping_sub(self.head.load(Ordering::Acquire))
    }
}

/// SPSC ring buffer constructor.
pub struct RingBuffer;

impl RingBuffer {
    /// Allocate a ring with room for `capacity` records of up to
    /// `max_record` bytes each and split it into its two handles.
    ///
    /// # Panics
    /// Panics if `capacity` or `max_record` is zero.
    pub fn with_capacity(capacity: usize, max_record: usize) -> (Producer, Consumer) {
        assert!(capacity > 0, "ring capacity must be non-zero");
        assert!(max_record > 0, "ring record size must be non-zero");

        let slots = (0..capacity)
            .map(|_| {
                UnsafeCell::new(Slot {
                    len: 0,
                    data: vec![0u8; max_record].into_boxed_slice(),
                })
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let shared = Arc::new(Shared {
            slots,
            capacity,
            max_record,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        });

        (
            Producer {
                shared: Arc::clone(&shared),
            },
            Consumer { shared },
        )
    }
}

/// Write half of the ring. Safe to drive from an interrupt-like callback
/// context: `push` completes in bounded time and never blocks.
///
/// Pushing requires exclusive access to the handle, so a second producer
/// cannot be conjured by sharing it:
///
/// ```compile_fail
/// let (tx, _rx) = faceio_ring::RingBuffer::with_capacity(4, 8);
/// let tx = std::sync::Arc::new(tx);
/// let tx2 = std::sync::Arc::clone(&tx);
/// std::thread::spawn(move || { let _ = tx2.push(b"a"); });
/// let _ = tx.push(b"b");
/// ```
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Enqueue one record. On a full ring the record is dropped and the
    /// ring is left untouched.
    pub fn push(&mut self, data: &[u8]) -> Result<(), RingError> {
        let shared = &self.shared;
        if data.len() > shared.max_record {
            return Err(RingError::Oversize {
                len: data.len(),
                max: shared.max_record,
            });
        }

        let tail = shared.tail.load(Ordering::Relaxed);
        let head = shared.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) == shared.capacity {
            return Err(RingError::Full);
        }

        // The slot at `tail` is unpublished, so the producer owns it.
        unsafe {
            let slot = &mut *shared.slots[tail % shared.capacity].get();
            slot.data[..data.len()].copy_from_slice(data);
            slot.len = data.len();
        }

        // Publish; the consumer may only observe the record after this.
        shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the ring is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() == self.shared.capacity
    }

    /// Whether the ring holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read half of the ring, owned by the main loop.
pub struct Consumer {
    shared: Arc<Shared>,
}

impl Consumer {
    /// Dequeue the oldest record into `dst`, returning its length, or
    /// `None` when the ring is empty.
    ///
    /// `dst` must be at least `max_record` bytes long.
    pub fn pop(&mut self, dst: &mut [u8]) -> Option<usize> {
        let shared = &self.shared;
        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        // Published and not yet released, so the consumer owns this slot.
        let len = unsafe {
            let slot = &*shared.slots[head % shared.capacity].get();
            dst[..slot.len].copy_from_slice(&slot.data[..slot.len]);
            slot.len
        };

        shared.head.store(head.wrapping_add(1), Ordering::Release);
        Some(len)
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Whether the ring holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the ring is at capacity.
    pub fn is_full(&self) -> bool {
        self.len() == self.shared.capacity
    }

    /// Maximum record size this ring was allocated with.
    pub fn max_record(&self) -> usize {
        self.shared.max_record
    }
}
