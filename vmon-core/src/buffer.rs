use crate::config::MAX_CAPACITY;
use crate::sample::{Sample, CHANNELS};
use arc_swap::ArcSwap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fixed-capacity rolling window of vector samples.
///
/// Not synchronized: the owner serializes access. Shared use goes through
/// [`SharedBuffer`], which replaces whole buffers instead of resizing them.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Creates an empty buffer with `capacity` clamped to `1..=MAX_CAPACITY`.
    /// Storage grows with the contents, not with the capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.clamp(1, MAX_CAPACITY),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn append(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples.back().copied()
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Returns a new buffer holding the most recent `min(new_capacity, len)` samples.
    pub fn resize(&self, new_capacity: usize) -> Self {
        let mut resized = Self::new(new_capacity);
        let keep = resized.capacity.min(self.samples.len());
        let skip = self.samples.len() - keep;
        resized.samples.extend(self.samples.iter().skip(skip).copied());
        resized
    }
}

/// Immutable point-in-time copy of a published buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    samples: Arc<[Sample]>,
    capacity: usize,
    generation: u64,
}

impl Snapshot {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Identifies the buffer this snapshot was taken from; bumps on every swap.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples.last().copied()
    }

    pub fn channel(&self, channel: usize) -> Vec<f64> {
        if channel >= CHANNELS {
            return Vec::new();
        }
        self.samples.iter().map(|s| s.0[channel]).collect()
    }
}

struct Published {
    generation: u64,
    buffer: Mutex<SampleBuffer>,
}

/// The shared window: an atomically swappable reference to the current buffer.
///
/// Appends always land in whichever buffer is published at that moment.
/// Swaps publish a fully built replacement, so a snapshot observes either the
/// old buffer or the new one.
pub struct SharedBuffer {
    slot: ArcSwap<Published>,
    next_generation: AtomicU64,
}

impl SharedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slot: ArcSwap::from_pointee(Published {
                generation: 0,
                buffer: Mutex::new(SampleBuffer::new(capacity)),
            }),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn append(&self, sample: Sample) {
        let published = self.slot.load();
        lock(&published.buffer).append(sample);
    }

    pub fn extend<I>(&self, samples: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        let published = self.slot.load();
        let mut buffer = lock(&published.buffer);
        let mut count = 0;
        for sample in samples {
            buffer.append(sample);
            count += 1;
        }
        count
    }

    pub fn snapshot(&self) -> Snapshot {
        let published = self.slot.load();
        let buffer = lock(&published.buffer);
        Snapshot {
            samples: buffer.samples.iter().copied().collect(),
            capacity: buffer.capacity,
            generation: published.generation,
        }
    }

    pub fn capacity(&self) -> usize {
        lock(&self.slot.load().buffer).capacity()
    }

    pub fn len(&self) -> usize {
        lock(&self.slot.load().buffer).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<Sample> {
        lock(&self.slot.load().buffer).latest()
    }

    pub fn generation(&self) -> u64 {
        self.slot.load().generation
    }

    pub fn swap(&self, buffer: SampleBuffer) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.slot.store(Arc::new(Published {
            generation,
            buffer: Mutex::new(buffer),
        }));
        generation
    }

    /// Replaces the current buffer with a resized copy that keeps the most
    /// recent history.
    pub fn resize(&self, new_capacity: usize) -> u64 {
        let current = self.slot.load_full();
        let resized = lock(&current.buffer).resize(new_capacity);
        self.swap(resized)
    }

    pub fn reset(&self, capacity: usize) -> u64 {
        self.swap(SampleBuffer::new(capacity))
    }
}

fn lock(buffer: &Mutex<SampleBuffer>) -> MutexGuard<'_, SampleBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
