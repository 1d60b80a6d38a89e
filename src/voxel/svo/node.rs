//! Packed sparse-octree node and the fixed child-direction table.

use bytemuck::{Pod, Zeroable};
use glam::IVec3;

/// Discriminant stored in a node's top two bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// No children, no brick; payload is zero. Placeholder for known-empty
    /// regions and for freshly subdivided children.
    InternalLeaf = 0,
    /// Payload is the index of a contiguous, 8-aligned child block.
    Internal = 1,
    /// Payload is a constant color; the region is resolved at this scale.
    Leaf = 2,
    /// Payload is a brick index; the brick holds the resolved content.
    LeafWithBrick = 3,
}

impl NodeKind {
    fn from_bits(bits: u32) -> Self {
        match bits {
            0 => NodeKind::InternalLeaf,
            1 => NodeKind::Internal,
            2 => NodeKind::Leaf,
            3 => NodeKind::LeafWithBrick,
            _ => unreachable!("kind is masked to 2 bits"),
        }
    }
}

const KIND_SHIFT: u32 = 30;
const PAYLOAD_MASK: u32 = (1 << KIND_SHIFT) - 1;

/// A single octree node packed into 32 bits: bits 31..30 are the kind,
/// bits 29..0 are the payload. This layout is the wire format (§4.7 codec)
/// and must never be changed independently of the codec.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Node(u32);

impl Node {
    /// The placeholder node written for fresh children and known-empty regions.
    pub const INTERNAL_LEAF: Node = Node(0);

    /// Construct a node from its raw packed word (used by the codec).
    pub const fn from_raw(word: u32) -> Self {
        Node(word)
    }

    /// The raw packed word (used by the codec and GPU upload).
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Build an `Internal` node pointing at `child_block`, the index of its
    /// first child. `child_block` must be a multiple of 8.
    pub fn internal(child_block: u32) -> Self {
        debug_assert!(child_block & PAYLOAD_MASK == child_block, "child block overflows payload");
        debug_assert!(child_block % 8 == 0, "child block must be 8-aligned");
        Self::pack(NodeKind::Internal, child_block)
    }

    /// Build a `Leaf` node carrying a constant 24-bit color.
    pub fn leaf(color: u32) -> Self {
        debug_assert!(color & PAYLOAD_MASK == color, "color overflows payload");
        Self::pack(NodeKind::Leaf, color)
    }

    /// Build a `LeafWithBrick` node pointing at `brick_index`.
    pub fn leaf_with_brick(brick_index: u32) -> Self {
        debug_assert!(brick_index & PAYLOAD_MASK == brick_index, "brick index overflows payload");
        Self::pack(NodeKind::LeafWithBrick, brick_index)
    }

    fn pack(kind: NodeKind, payload: u32) -> Self {
        Node(((kind as u32) << KIND_SHIFT) | (payload & PAYLOAD_MASK))
    }

    /// The node's kind (top two bits).
    pub fn kind(self) -> NodeKind {
        NodeKind::from_bits(self.0 >> KIND_SHIFT)
    }

    /// The node's payload (low 30 bits), meaning depends on `kind()`.
    pub fn payload(self) -> u32 {
        self.0 & PAYLOAD_MASK
    }

    pub fn is_internal_leaf(self) -> bool {
        self.kind() == NodeKind::InternalLeaf
    }

    pub fn is_internal(self) -> bool {
        self.kind() == NodeKind::Internal
    }

    pub fn is_leaf(self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    pub fn is_leaf_with_brick(self) -> bool {
        self.kind() == NodeKind::LeafWithBrick
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::INTERNAL_LEAF
    }
}

/// Fixed Morton-style child-offset table: bit 0 = x, bit 1 = y, bit 2 = z,
/// components in `{-1, +1}`. Child index `i` under a parent is always the
/// sub-cube centered at `parent.center + DIRECTIONS[i] * half_extent`.
pub const DIRECTIONS: [IVec3; 8] = [
    IVec3::new(-1, -1, -1),
    IVec3::new(1, -1, -1),
    IVec3::new(-1, 1, -1),
    IVec3::new(1, 1, -1),
    IVec3::new(-1, -1, 1),
    IVec3::new(1, -1, 1),
    IVec3::new(-1, 1, 1),
    IVec3::new(1, 1, 1),
];
