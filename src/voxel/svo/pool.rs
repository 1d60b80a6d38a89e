//! Append-only node/brick pools and their free lists.
//!
//! Both pools grow under a short mutex; indices handed out are stable for
//! the lifetime of the octree. Free lists are plain `Mutex<Vec<u32>>` stacks
//! — low contention across a depth/phase barrier makes a lock-free stack
//! unnecessary (see SPEC_FULL §9).

use std::sync::Mutex;

use super::node::Node;

/// Number of `Node` words per child block. Only `NodePool::append_child_block`
/// grows the pool beyond the initial root, so every block boundary after
/// index 0 is 8-aligned.
pub const CHILD_BLOCK_LEN: usize = 8;

/// Grow-only pool of packed nodes; index 0 is always the root.
#[derive(Debug)]
pub struct NodePool {
    words: Mutex<Vec<Node>>,
}

impl NodePool {
    /// A fresh pool containing the root at index 0, padded out to a full
    /// 8-word block so every later `append_child_block` index (including
    /// the first) lands on an 8-aligned boundary per the Internal-node
    /// invariant (SPEC_FULL §8: `payload(i)` a multiple of 8).
    pub fn new() -> Self {
        Self { words: Mutex::new(vec![Node::INTERNAL_LEAF; CHILD_BLOCK_LEN]) }
    }

    /// Append 8 fresh `InternalLeaf` children, returning the index of the
    /// first one. The returned index is always a multiple of 8.
    pub fn append_child_block(&self) -> u32 {
        let mut words = self.words.lock().unwrap();
        let index = words.len() as u32;
        words.extend_from_slice(&[Node::INTERNAL_LEAF; CHILD_BLOCK_LEN]);
        index
    }

    pub fn get(&self, index: u32) -> Node {
        self.words.lock().unwrap()[index as usize]
    }

    pub fn set(&self, index: u32, node: Node) {
        self.words.lock().unwrap()[index as usize] = node;
    }

    pub fn len(&self) -> usize {
        self.words.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all node words, in `Node` form.
    pub fn snapshot(&self) -> Vec<Node> {
        self.words.lock().unwrap().clone()
    }

    /// Snapshot of all node words as raw `u32`s, for GPU upload or the codec.
    pub fn snapshot_raw(&self) -> Vec<u32> {
        self.words.lock().unwrap().iter().map(|n| n.raw()).collect()
    }

    /// Replace the entire pool contents (used by the codec reader).
    pub fn replace_with(&self, words: Vec<Node>) {
        *self.words.lock().unwrap() = words;
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Grow-only pool of fixed-stride bricks, stored as flat `u32` words.
#[derive(Debug)]
pub struct BrickPool {
    stride: usize,
    words: Mutex<Vec<u32>>,
}

impl BrickPool {
    /// `stride` is `BRICK_ELEMENT_COUNT`: words per brick.
    pub fn new(stride: usize) -> Self {
        Self { stride, words: Mutex::new(Vec::new()) }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Append a brick's words, returning its brick index. `brick.len()` must
    /// equal `stride`.
    pub fn append(&self, brick: &[u32]) -> u32 {
        debug_assert_eq!(brick.len(), self.stride);
        let mut words = self.words.lock().unwrap();
        let index = (words.len() / self.stride) as u32;
        words.extend_from_slice(brick);
        index
    }

    /// Overwrite an existing brick slot. Used only after `FreeList::try_pop`
    /// returned `index`.
    pub fn write_at(&self, index: u32, brick: &[u32]) {
        debug_assert_eq!(brick.len(), self.stride);
        let mut words = self.words.lock().unwrap();
        let start = index as usize * self.stride;
        words[start..start + self.stride].copy_from_slice(brick);
    }

    pub fn read_at(&self, index: u32) -> Vec<u32> {
        let words = self.words.lock().unwrap();
        let start = index as usize * self.stride;
        words[start..start + self.stride].to_vec()
    }

    /// Number of bricks stored (not words).
    pub fn brick_count(&self) -> usize {
        self.words.lock().unwrap().len() / self.stride
    }

    pub fn snapshot_raw(&self) -> Vec<u32> {
        self.words.lock().unwrap().clone()
    }

    pub fn replace_with(&self, words: Vec<u32>) {
        *self.words.lock().unwrap() = words;
    }
}

/// A stack of reclaimed pool indices awaiting reuse. Order is unspecified.
#[derive(Debug, Default)]
pub struct FreeList {
    indices: Mutex<Vec<u32>>,
}

impl FreeList {
    pub fn new() -> Self {
        Self { indices: Mutex::new(Vec::new()) }
    }

    /// Never fails.
    pub fn push(&self, index: u32) {
        self.indices.lock().unwrap().push(index);
    }

    pub fn try_pop(&self) -> Option<u32> {
        self.indices.lock().unwrap().pop()
    }

    pub fn len(&self) -> usize {
        self.indices.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
