use ftree::FenwickTree;
use log::{debug, trace};
use std::fmt;
use std::iter::FusedIterator;

use crate::arena::{NodeArena, NodeId};
use crate::error::{Error, Result};
use crate::{BLOCK_CAPACITY, INITIAL_BLOCKS, MIN_BLOCK_CAPACITY};

/// A run of consecutive chain nodes, cached for positional access.
///
/// The block only references nodes; the arena and the chain own them.
#[derive(Debug)]
struct Block {
    items: Vec<NodeId>,
}

impl Block {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut items = Vec::new();
        items.try_reserve_exact(capacity)?;
        Ok(Block { items })
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn first(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    fn last(&self) -> Option<NodeId> {
        self.items.last().copied()
    }
}

impl Clone for Block {
    // keeps the reserved capacity so inserts into a cloned block stay allocation-free
    fn clone(&self) -> Self {
        let mut items = Vec::with_capacity(self.items.capacity());
        items.extend_from_slice(&self.items);
        Block { items }
    }
}

/// Points every node of `block` at its in-block successor and the last one at
/// `after`, the first node of the following block.
fn relink(nodes: &mut NodeArena, block: &Block, after: Option<NodeId>) {
    for pair in block.items.windows(2) {
        nodes.set_next(pair[0], Some(pair[1]));
    }
    if let Some(last) = block.last() {
        nodes.set_next(last, after);
    }
}

/// A singly-linked list of `i64` overlaid with an index of fixed-capacity blocks.
///
/// The chain of nodes defines list order. Each block caches up to
/// `block_capacity` consecutive nodes, and a Fenwick tree over the block
/// lengths maps a position to its block in `O(log² n)` without walking the
/// chain.
///
/// ```
/// use blocklist::BlockedList;
///
/// let mut list = BlockedList::new();
/// list.insert(0, 10)?;
/// list.insert(1, 20)?;
/// list.insert(1, 15)?;
/// assert_eq!(list.iter().collect::<Vec<_>>(), [10, 15, 20]);
/// assert_eq!(list.remove_at(0)?, 10);
/// assert_eq!(list.get(0)?, 15);
/// # Ok::<(), blocklist::Error>(())
/// ```
pub struct BlockedList {
    head: Option<NodeId>,
    len: usize,
    blocks: Vec<Block>,
    fenwick: FenwickTree<usize>,
    nodes: NodeArena,
    block_capacity: usize,
}

/// Forward traversal along the chain, yielding copies of the stored values.
pub struct Iter<'a> {
    nodes: &'a NodeArena,
    next: Option<NodeId>,
    len: usize,
}

impl BlockedList {
    // --- Auxiliary Functions ---

    fn rebuild_fenwick(&mut self) {
        let sizes = self.blocks.iter().map(Block::len);
        self.fenwick = FenwickTree::from_iter(sizes);
    }

    fn first_of_block(&self, idx: usize) -> Option<NodeId> {
        self.blocks.get(idx).and_then(Block::first)
    }

    /// The node that precedes slot `off` of block `idx`, crossing into the
    /// previous block when `off` is the block start.
    fn predecessor(&self, idx: usize, off: usize) -> Option<NodeId> {
        if off > 0 {
            Some(self.blocks[idx].items[off - 1])
        } else if idx > 0 {
            self.blocks[idx - 1].last()
        } else {
            None
        }
    }

    fn relink_block(&mut self, idx: usize) {
        let after = self.first_of_block(idx + 1);
        trace!("relink block {idx} ({} nodes) -> {:?}", self.blocks[idx].len(), after.map(NodeId::index));
        relink(&mut self.nodes, &self.blocks[idx], after);
    }

    /// Maps `pos` to `(block, offset)`. `pos == len` maps one past the end of
    /// the last block; the caller must ensure the list is not empty.
    fn locate(&self, pos: usize) -> (usize, usize) {
        debug_assert!(!self.blocks.is_empty());
        debug_assert!(pos <= self.len);

        if pos == self.len {
            let last = self.blocks.len() - 1;
            return (last, self.blocks[last].len());
        }

        let mut low = 0;
        let mut high = self.blocks.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.fenwick.prefix_sum(mid, 0) <= pos {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        let block_idx = low - 1;
        let offset = pos - self.fenwick.prefix_sum(block_idx, 0);
        debug_assert!(offset < self.blocks[block_idx].len());
        (block_idx, offset)
    }

    /// Moves the upper half of block `idx` into a new block right after it.
    ///
    /// Both allocations happen before anything is moved, so on error the list
    /// is untouched.
    fn split(&mut self, idx: usize) -> Result<()> {
        let mut upper = Block::with_capacity(self.block_capacity)?;
        self.blocks.try_reserve(1)?;

        let block = &mut self.blocks[idx];
        let keep = block.len() - block.len() / 2;
        upper.items.extend(block.items.drain(keep..));
        debug!("split block {idx}: {} + {}", keep, upper.len());

        self.blocks.insert(idx + 1, upper);
        self.rebuild_fenwick();
        self.relink_block(idx);
        self.relink_block(idx + 1);
        Ok(())
    }

    /// Folds block `idx + 1` into block `idx` when both fit in one block.
    /// Returns whether the merge happened.
    fn merge(&mut self, idx: usize) -> bool {
        if idx + 1 >= self.blocks.len() {
            return false;
        }
        let combined = self.blocks[idx].len() + self.blocks[idx + 1].len();
        if combined > self.block_capacity {
            return false;
        }

        let right = self.blocks.remove(idx + 1);
        self.blocks[idx].items.extend_from_slice(&right.items);
        debug!("merged block {} into {idx}: {combined} nodes", idx + 1);

        self.rebuild_fenwick();
        self.relink_block(idx);
        true
    }

    fn remove_block(&mut self, idx: usize) {
        debug_assert!(self.blocks[idx].is_empty());
        self.blocks.remove(idx);
        self.rebuild_fenwick();
        debug!("dropped empty block {idx}, {} blocks left", self.blocks.len());
    }

    fn insert_first(&mut self, value: i64) -> Result<()> {
        let mut block = Block::with_capacity(self.block_capacity)?;
        self.blocks.try_reserve(1)?;

        let id = self.nodes.alloc(value);
        block.items.push(id);
        self.blocks.push(block);
        self.head = Some(id);
        self.len = 1;
        self.rebuild_fenwick();
        Ok(())
    }

    // --- Public API ---

    /// Creates an empty list with the default block capacity.
    pub fn new() -> Self {
        BlockedList {
            head: None,
            len: 0,
            blocks: Vec::with_capacity(INITIAL_BLOCKS),
            fenwick: FenwickTree::new(),
            nodes: NodeArena::new(),
            block_capacity: BLOCK_CAPACITY,
        }
    }

    /// Creates an empty list whose blocks hold up to `capacity` nodes.
    ///
    /// Fails with [`Error::InvalidBlockCapacity`] below [`MIN_BLOCK_CAPACITY`].
    pub fn with_block_capacity(capacity: usize) -> Result<Self> {
        if capacity < MIN_BLOCK_CAPACITY {
            return Err(Error::InvalidBlockCapacity { capacity, min: MIN_BLOCK_CAPACITY });
        }
        Ok(BlockedList { block_capacity: capacity, ..BlockedList::new() })
    }

    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of blocks currently in the index.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Occupancy of each block, in list order.
    pub fn block_lens(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().map(Block::len)
    }

    /// Returns the value at `pos`.
    pub fn get(&self, pos: usize) -> Result<i64> {
        if pos >= self.len {
            return Err(Error::OutOfRange { pos, len: self.len });
        }
        let (block_idx, offset) = self.locate(pos);
        Ok(self.nodes.value(self.blocks[block_idx].items[offset]))
    }

    pub fn first(&self) -> Option<i64> {
        self.head.map(|id| self.nodes.value(id))
    }

    pub fn last(&self) -> Option<i64> {
        self.blocks.last().and_then(Block::last).map(|id| self.nodes.value(id))
    }

    /// Inserts `value` so that it ends up at `pos`; `pos == len()` appends.
    ///
    /// On error (bad position or failed allocation) the list is unchanged.
    pub fn insert(&mut self, pos: usize, value: i64) -> Result<()> {
        if pos > self.len {
            return Err(Error::OutOfRange { pos, len: self.len });
        }
        self.nodes.reserve_one()?;

        if self.blocks.is_empty() {
            return self.insert_first(value);
        }

        let (mut block_idx, mut offset) = self.locate(pos);
        if self.blocks[block_idx].len() >= self.block_capacity {
            self.split(block_idx)?;
            (block_idx, offset) = self.locate(pos);
        }
        self.blocks[block_idx].items.try_reserve(1)?;
        trace!("insert {value} at {pos} -> block {block_idx} offset {offset}");

        let block = &self.blocks[block_idx];
        let succ = match block.items.get(offset) {
            Some(&id) => Some(id),
            None => self.first_of_block(block_idx + 1),
        };
        let pred = self.predecessor(block_idx, offset);
        debug_assert_eq!(pred.is_none(), pos == 0);

        let id = self.nodes.alloc(value);
        self.nodes.set_next(id, succ);
        match pred {
            Some(pred) => self.nodes.set_next(pred, Some(id)),
            None => self.head = Some(id),
        }

        self.blocks[block_idx].items.insert(offset, id);
        self.fenwick.add_at(block_idx, 1);
        self.len += 1;
        self.relink_block(block_idx);
        Ok(())
    }

    pub fn push_back(&mut self, value: i64) -> Result<()> {
        self.insert(self.len, value)
    }

    pub fn push_front(&mut self, value: i64) -> Result<()> {
        self.insert(0, value)
    }

    /// Removes and returns the value at `pos`.
    ///
    /// A block left empty is dropped from the index; otherwise the block is
    /// merged with its left and then its right neighbour when they fit.
    pub fn remove_at(&mut self, pos: usize) -> Result<i64> {
        if pos >= self.len {
            return Err(Error::OutOfRange { pos, len: self.len });
        }

        let (block_idx, offset) = self.locate(pos);
        trace!("remove at {pos} -> block {block_idx} offset {offset}");

        let block = &self.blocks[block_idx];
        let id = block.items[offset];
        let succ = match block.items.get(offset + 1) {
            Some(&next) => Some(next),
            None => self.first_of_block(block_idx + 1),
        };
        let pred = self.predecessor(block_idx, offset);
        debug_assert_eq!(pred.is_none(), pos == 0);

        match pred {
            Some(pred) => self.nodes.set_next(pred, succ),
            None => self.head = succ,
        }

        self.blocks[block_idx].items.remove(offset);
        self.fenwick.sub_at(block_idx, 1);
        self.len -= 1;
        let node = self.nodes.free(id);
        self.relink_block(block_idx);

        if self.blocks[block_idx].is_empty() {
            self.remove_block(block_idx);
        } else {
            let mut idx = block_idx;
            if idx > 0 && self.merge(idx - 1) {
                idx -= 1;
            }
            self.merge(idx);
        }
        Ok(node.value)
    }

    /// Frees every node by walking the chain from the head, then empties the
    /// block index. The index keeps its allocation.
    pub fn clear(&mut self) {
        let mut cur = self.head.take();
        let mut freed = 0usize;
        while let Some(id) = cur {
            cur = self.nodes.free(id).next;
            freed += 1;
        }
        debug_assert_eq!(freed, self.len);
        debug!("cleared {freed} nodes in {} blocks", self.blocks.len());

        self.nodes.reset();
        self.blocks.clear();
        self.fenwick = FenwickTree::new();
        self.len = 0;
    }

    /// Traverses the chain from the head.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            next: self.head,
            len: self.len,
        }
    }

    /// Checks every structural invariant and panics with a description of the
    /// first one that does not hold.
    pub fn validate_blocks(&self) {
        let counted: usize = self.blocks.iter().map(Block::len).sum();
        assert_eq!(counted, self.len, "block counts do not add up to len");
        assert_eq!(self.nodes.live(), self.len, "live node count differs from len");
        assert_eq!(self.blocks.is_empty(), self.head.is_none(), "head and block index disagree on emptiness");

        let mut prefix = 0;
        for (i, block) in self.blocks.iter().enumerate() {
            assert!(!block.is_empty(), "block {i} is empty");
            assert!(block.len() <= self.block_capacity, "block {i} holds {} > {}", block.len(), self.block_capacity);
            assert_eq!(self.fenwick.prefix_sum(i, 0), prefix, "fenwick prefix before block {i} is stale");
            prefix += block.len();
        }

        let mut cur = self.head;
        for (i, block) in self.blocks.iter().enumerate() {
            for (j, &id) in block.items.iter().enumerate() {
                assert_eq!(cur, Some(id), "chain diverges from block {i} at slot {j}");
                cur = self.nodes.next(id);
            }
        }
        assert_eq!(cur, None, "chain continues past the last block");
    }
}

impl Default for BlockedList {
    fn default() -> Self {
        BlockedList::new()
    }
}

impl Clone for BlockedList {
    fn clone(&self) -> Self {
        BlockedList {
            head: self.head,
            len: self.len,
            blocks: self.blocks.clone(),
            fenwick: self.fenwick.clone(),
            nodes: self.nodes.clone(),
            block_capacity: self.block_capacity,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.head = source.head;
        self.len = source.len;
        self.blocks.clone_from(&source.blocks);
        self.fenwick.clone_from(&source.fenwick);
        self.nodes.clone_from(&source.nodes);
        self.block_capacity = source.block_capacity;
    }
}

impl fmt::Debug for BlockedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for BlockedList {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for BlockedList {}

/// # Panics
///
/// Panics if memory for a node or block cannot be reserved.
impl Extend<i64> for BlockedList {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push_back(value) {
                panic!("BlockedList::extend: {err}");
            }
        }
    }
}

impl FromIterator<i64> for BlockedList {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut list = BlockedList::new();
        list.extend(iter);
        list
    }
}

impl<const N: usize> From<[i64; N]> for BlockedList {
    fn from(arr: [i64; N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a BlockedList {
    type Item = i64;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

// --- Iterator Implementations ---

impl Iterator for Iter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        self.len = self.len.checked_sub(1)?;    // return if == 0

        let id = self.next?;
        self.next = self.nodes.next(id);
        Some(self.nodes.value(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
