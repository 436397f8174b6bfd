//! Chunked indexed container with stable handles.
//!
//! [`SlotMap`] stores values in fixed-size chunks of 64 slots and hands out
//! plain integer indices that stay valid from `insert` until the matching
//! `erase`, no matter how many other insertions or erasures happen in
//! between. Each chunk carries a 64-bit free mask; once every slot of the
//! leading chunks has been erased, those chunks are recycled in bulk and a
//! map-wide offset shifts the visible index space instead of renumbering
//! the survivors. Indices are therefore monotone: a reclaimed index is
//! never reissued.
//!
//! The container is move-only. Cloning would mean copying every live chunk,
//! which callers are better off doing explicitly if they really want it.

use std::ops::{Index, IndexMut};

/// Number of slots addressed by a single free mask.
const CHUNK_SIZE: usize = 64;

/// Per-chunk occupancy mask. Bit `k` set means slot `k` is logically erased.
type ChunkMask = u64;

const FULLY_FREE: ChunkMask = ChunkMask::MAX;

type Chunk<T> = [Option<T>; CHUNK_SIZE];

/// Owning handle to one chunk plus its free mask.
///
/// Kept as a `(Box, u64)` pair so that the holder vector can be rotated
/// during reclamation as a plain memmove of thin values.
struct ChunkHolder<T> {
    chunk: Box<Chunk<T>>,
    free_mask: ChunkMask,
}

impl<T> ChunkHolder<T> {
    /// A fresh, fully occupied (mask zero) holder with every slot vacant.
    fn fresh() -> Self {
        Self {
            chunk: Box::new(std::array::from_fn(|_| None)),
            free_mask: 0,
        }
    }
}

/// A chunked map from stable `usize` indices to values of `T`.
///
/// `insert`, `erase` and indexing are all O(1) (insert amortized over chunk
/// allocation). Erasure is logical: the slot's value is dropped immediately
/// and its mask bit set, but the chunk's storage is only recycled once an
/// entire leading run of chunks has drained.
///
/// # Examples
///
/// ```
/// use workgraph::SlotMap;
///
/// let mut map = SlotMap::new();
/// let a = map.insert("alpha");
/// let b = map.insert("beta");
/// map.erase(a);
/// assert_eq!(map[b], "beta");
/// ```
pub struct SlotMap<T> {
    holders: Vec<ChunkHolder<T>>,
    /// Holders `0..chunks_in_use` hold live data; the rest are recycled
    /// holders rotated to the tail, masks reset to zero.
    chunks_in_use: usize,
    /// Added to every externally visible index; grows by 64 per reclaimed
    /// chunk and never shrinks.
    first_chunk_offset: usize,
    /// Holder currently being filled by `insert`.
    insert_chunk: usize,
    /// In-chunk insertion cursor. Starts saturated so the first insert
    /// acquires a chunk.
    insert_index: usize,
}

impl<T> SlotMap<T> {
    /// Creates an empty map. No chunks are allocated until the first insert.
    #[must_use]
    pub fn new() -> Self {
        Self {
            holders: Vec::new(),
            chunks_in_use: 0,
            first_chunk_offset: 0,
            insert_chunk: 0,
            insert_index: CHUNK_SIZE,
        }
    }

    /// Inserts a value and returns the index it will live at until erased.
    pub fn insert(&mut self, value: T) -> usize {
        self.insert_index += 1;
        if self.insert_index >= CHUNK_SIZE {
            self.insert_chunk = self.acquire_chunk();
            self.insert_index = 0;
        }
        self.holders[self.insert_chunk].chunk[self.insert_index] = Some(value);
        self.insert_chunk * CHUNK_SIZE + self.insert_index + self.first_chunk_offset
    }

    /// Erases the value at `index`, dropping it immediately.
    ///
    /// The index must not be used again. If the erase drains the leading
    /// chunk(s), they are recycled and the visible index space advances.
    ///
    /// # Panics
    ///
    /// Panics if `index` was never issued by this map.
    pub fn erase(&mut self, index: usize) {
        let (chunk_index, slot_index) = self
            .split_index(index)
            .expect("slot map index predates the reclaimed range");
        let holder = &mut self.holders[chunk_index];
        holder.free_mask |= 1 << slot_index;
        holder.chunk[slot_index] = None;
        self.reclaim_free_prefix();
    }

    /// Returns the value at `index`, or `None` if the slot is not live.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        let (chunk_index, slot_index) = self.split_index(index)?;
        self.holders.get(chunk_index)?.chunk[slot_index].as_ref()
    }

    /// Mutable variant of [`SlotMap::get`].
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (chunk_index, slot_index) = self.split_index(index)?;
        self.holders.get_mut(chunk_index)?.chunk[slot_index].as_mut()
    }

    /// Total slots across all allocated chunks, recycled holders included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.holders.len() * CHUNK_SIZE
    }

    /// The offset added to every visible index. Non-decreasing; grows by 64
    /// for each reclaimed leading chunk.
    #[must_use]
    pub fn first_chunk_offset(&self) -> usize {
        self.first_chunk_offset
    }

    fn split_index(&self, index: usize) -> Option<(usize, usize)> {
        let adjusted = index.checked_sub(self.first_chunk_offset)?;
        Some((adjusted / CHUNK_SIZE, adjusted % CHUNK_SIZE))
    }

    /// Hands out the next holder to fill, allocating only when every holder
    /// (including recycled ones at the tail) is already in use.
    fn acquire_chunk(&mut self) -> usize {
        let next = self.chunks_in_use;
        if next == self.holders.len() {
            self.holders.push(ChunkHolder::fresh());
        }
        self.chunks_in_use += 1;
        next
    }

    /// Recycles the leading run of fully-erased chunks, if any.
    ///
    /// Reclaimed holders get their masks reset and are rotated past the
    /// surviving in-use holders so a later `acquire_chunk` can refill them.
    /// Only a prefix is ever reclaimed; interior gaps wait until they reach
    /// the front.
    fn reclaim_free_prefix(&mut self) {
        let reclaimed = self
            .holders
            .iter()
            .take_while(|holder| holder.free_mask == FULLY_FREE)
            .count();
        if reclaimed == 0 {
            return;
        }
        for holder in &mut self.holders[..reclaimed] {
            holder.free_mask = 0;
        }
        self.holders.rotate_left(reclaimed);
        self.chunks_in_use -= reclaimed;
        self.first_chunk_offset += CHUNK_SIZE * reclaimed;
        // The insertion holder either shifted down with the survivors or was
        // itself rotated to the tail.
        self.insert_chunk = if self.insert_chunk >= reclaimed {
            self.insert_chunk - reclaimed
        } else {
            self.holders.len() - reclaimed + self.insert_chunk
        };
    }
}

impl<T> Default for SlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for SlotMap<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).expect("no live value at slot map index")
    }
}

impl<T> IndexMut<usize> for SlotMap<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index).expect("no live value at slot map index")
    }
}
