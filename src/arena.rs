//! Slot arena holding the nodes of the singly-linked chain.
//!
//! Nodes are addressed by [`NodeId`] instead of by pointer, so freeing a node
//! can never leave a dangling reference in a block: a stale id simply names a
//! vacant slot, which [`NodeArena::node`] treats as a bug.

use crate::error::Result;

/// Stable handle to a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// One stored value plus its successor in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) value: i64,
    pub(crate) next: Option<NodeId>,
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied(Node),
    Vacant { next_free: Option<NodeId> },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Slot>,
    free_head: Option<NodeId>,
    live: usize,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        NodeArena {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Makes sure the next [`alloc`](Self::alloc) will not need to grow the slot vector.
    pub(crate) fn reserve_one(&mut self) -> Result<()> {
        if self.free_head.is_none() {
            self.slots.try_reserve(1)?;
        }
        Ok(())
    }

    /// Stores a detached node and returns its id, reusing a freed slot when one exists.
    pub(crate) fn alloc(&mut self, value: i64) -> NodeId {
        let node = Node { value, next: None };
        self.live += 1;
        match self.free_head {
            Some(id) => {
                let slot = &mut self.slots[id.0];
                let Slot::Vacant { next_free } = *slot else {
                    unreachable!("free list points at an occupied slot {}", id.0);
                };
                self.free_head = next_free;
                *slot = Slot::Occupied(node);
                id
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Releases the slot and returns the node it held.
    pub(crate) fn free(&mut self, id: NodeId) -> Node {
        let vacant = Slot::Vacant { next_free: self.free_head };
        match std::mem::replace(&mut self.slots[id.0], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(id);
                self.live -= 1;
                node
            }
            Slot::Vacant { .. } => panic!("double free of node slot {}", id.0),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("access to freed node slot {}", id.0),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("access to freed node slot {}", id.0),
        }
    }

    #[inline]
    pub(crate) fn value(&self, id: NodeId) -> i64 {
        self.node(id).value
    }

    #[inline]
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, id: NodeId, next: Option<NodeId>) {
        self.node_mut(id).next = next;
    }

    /// Drops every slot. Ids handed out earlier become invalid.
    pub(crate) fn reset(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused_lifo() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        let c = arena.alloc(3);
        assert_eq!(arena.live(), 3);

        assert_eq!(arena.free(a).value, 1);
        assert_eq!(arena.free(c).value, 3);
        assert_eq!(arena.live(), 1);

        assert_eq!(arena.alloc(30), c);
        assert_eq!(arena.alloc(10), a);
        assert_eq!(arena.value(b), 2);
        assert_eq!(arena.value(a), 10);
        assert_eq!(arena.value(c), 30);
        assert_eq!(arena.live(), 3);
    }

    #[test]
    fn links_follow_set_next() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert_eq!(arena.next(a), None);
        arena.set_next(a, Some(b));
        assert_eq!(arena.next(a), Some(b));
        assert_eq!(arena.next(b), None);
    }

    #[test]
    fn freed_node_keeps_its_value() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(-7);
        arena.set_next(a, Some(a));
        let node = arena.free(a);
        assert_eq!(node, Node { value: -7, next: Some(a) });
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_panics() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        arena.free(a);
        arena.free(a);
    }

    #[test]
    #[should_panic(expected = "freed node")]
    fn reading_freed_slot_panics() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        arena.free(a);
        arena.value(a);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        arena.alloc(2);
        arena.free(a);
        arena.reset();
        assert_eq!(arena.live(), 0);
        assert_eq!(arena.alloc(5).index(), 0);
    }
}
