//! Bounded segment queue between command ingest and the render callback.
//!
//! A `ringbuf` SPSC ring carries segments from the producer (ingest side) to
//! the consumer (render side). The consumer keeps the segment it is currently
//! playing in a local head slot so it can be decremented in place. A shared
//! depth counter covers queued plus in-flight segments and is what the
//! capacity bound is enforced against.

use crate::MAX_ACTUATORS;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-actuator amplitudes. Always inline: actuator counts are capped at
/// [`MAX_ACTUATORS`], so dropping a segment never frees heap memory.
pub type Amplitudes = SmallVec<[f32; MAX_ACTUATORS]>;

/// A queued unit of work: a duration in samples plus one amplitude per
/// logical actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub remaining_samples: u64,
    pub amplitudes: Amplitudes,
}

impl Segment {
    pub fn new(remaining_samples: u64, amplitudes: &[f32]) -> Self {
        Self {
            remaining_samples,
            amplitudes: SmallVec::from_slice(amplitudes),
        }
    }
}

#[derive(Debug)]
struct QueueDepth {
    depth: AtomicUsize,
    capacity: usize,
}

/// Ingest side of the queue.
pub struct SegmentProducer {
    producer: HeapProd<Segment>,
    depth: Arc<QueueDepth>,
}

impl SegmentProducer {
    /// Append at the tail.
    ///
    /// Drop-newest: when the queue is at capacity the incoming segment is
    /// handed back in `Err` and the queue is left untouched.
    pub fn push(&mut self, segment: Segment) -> Result<(), Segment> {
        if self.depth.depth.load(Ordering::Acquire) >= self.depth.capacity {
            return Err(segment);
        }
        // Count before publishing so the consumer can never decrement first.
        self.depth.depth.fetch_add(1, Ordering::AcqRel);
        match self.producer.try_push(segment) {
            Ok(()) => Ok(()),
            Err(segment) => {
                self.depth.depth.fetch_sub(1, Ordering::AcqRel);
                Err(segment)
            }
        }
    }

    /// Queued plus in-flight segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.depth.depth.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.depth.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.depth.capacity
    }
}

/// Render side of the queue. Never blocks and never allocates.
pub struct SegmentConsumer {
    consumer: HeapCons<Segment>,
    head: Option<Segment>,
    depth: Arc<QueueDepth>,
}

impl SegmentConsumer {
    /// The segment at the head of the queue, if any.
    #[inline]
    pub fn head_mut(&mut self) -> Option<&mut Segment> {
        if self.head.is_none() {
            self.head = self.consumer.try_pop();
        }
        self.head.as_mut()
    }

    /// Remove the head segment.
    #[inline]
    pub fn pop_head(&mut self) -> Option<Segment> {
        if self.head.is_none() {
            self.head = self.consumer.try_pop();
        }
        let segment = self.head.take();
        if segment.is_some() {
            self.depth.depth.fetch_sub(1, Ordering::AcqRel);
        }
        segment
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.depth.depth.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.depth.capacity
    }
}

/// Create a segment queue holding at most `capacity` segments.
pub fn segment_queue(capacity: usize) -> (SegmentProducer, SegmentConsumer) {
    let capacity = capacity.max(1);
    let (producer, consumer) = HeapRb::<Segment>::new(capacity).split();
    let depth = Arc::new(QueueDepth {
        depth: AtomicUsize::new(0),
        capacity,
    });
    (
        SegmentProducer {
            producer,
            depth: depth.clone(),
        },
        SegmentConsumer {
            consumer,
            head: None,
            depth,
        },
    )
}
