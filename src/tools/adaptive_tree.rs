//! Adaptive coding tree.
//!
//! The tree starts as a single NYT ("not yet transmitted") leaf and grows by
//! splitting the NYT leaf whenever a new symbol shows up.  The node table is kept
//! in sibling order: slot 0 is the root, siblings occupy slots `2k-1` and `2k`,
//! and weights never increase with slot number.  A node's code is read off the
//! parity of the slots on the way up to the root (odd slot = 1).
//!
//! When a weight is incremented, the node first trades places with the lowest
//! slot holding the same weight, so the ordering survives the increment.  Only the
//! payload (kind and weight) moves during a trade; slot numbers stay put, and the
//! parent links are patched so that subtrees follow their payload.
//!
//! Lookups and child searches are linear scans over the table.  The table is at
//! most a couple thousand slots, and any index kept on the side would have to be
//! patched on every trade.

use crate::Error;
use super::bit_stream::BitStream;

/// Payload of one slot in the node table.
#[derive(Clone,Debug,PartialEq,Eq)]
pub enum NodeKind {
    /// weight is the sum of the two children
    Internal { weight: usize },
    /// a symbol that has been transmitted, weight is its count
    Leaf { weight: usize, symbol: Vec<u8> },
    /// the escape leaf for symbols not yet seen, always weight 0
    Nyt
}

impl NodeKind {
    pub fn weight(&self) -> usize {
        match self {
            NodeKind::Internal { weight } => *weight,
            NodeKind::Leaf { weight, .. } => *weight,
            NodeKind::Nyt => 0
        }
    }
    fn bump(&mut self) {
        match self {
            NodeKind::Internal { weight } => *weight += 1,
            NodeKind::Leaf { weight, .. } => *weight += 1,
            // never on an update path, its weight stays 0 until it is split
            NodeKind::Nyt => {}
        }
    }
}

#[derive(Clone,Debug)]
struct Node {
    /// slot of the parent, the root is its own parent
    parent: usize,
    kind: NodeKind
}

/// Copy of the node table, used to compare the models of two codecs.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct TreeSnapshot {
    /// `(parent,kind)` for every slot, starting with the root
    pub nodes: Vec<(usize,NodeKind)>,
    /// slot of the NYT leaf
    pub nyt: usize
}

impl TreeSnapshot {
    /// true if weights never increase going from slot 1 to the last slot
    pub fn is_sibling_ordered(&self) -> bool {
        self.nodes.iter().skip(1)
            .zip(self.nodes.iter().skip(2))
            .all(|((_,a),(_,b))| a.weight() >= b.weight())
    }
}

/// The adaptive model shared by the encoding and decoding sides.
pub struct AdaptiveTree {
    nodes: Vec<Node>,
    /// slot of the NYT leaf, always the last slot
    nyt: usize,
    /// capacity of the table, not counting the root
    max_nodes: usize,
    /// insertions refused because the table was full
    dropped: usize
}

impl AdaptiveTree {
    /// `max_nodes` is rounded down to an even number, since nodes are added in pairs
    pub fn create(max_nodes: usize) -> Self {
        let mut ans = Self {
            nodes: Vec::new(),
            nyt: 0,
            max_nodes: max_nodes & !1,
            dropped: 0
        };
        ans.reset();
        ans
    }
    /// discard the model, leaving only the NYT root
    pub fn reset(&mut self) {
        self.nodes = vec![Node { parent: 0, kind: NodeKind::Nyt }];
        self.nyt = 0;
        self.dropped = 0;
    }
    pub fn nyt(&self) -> usize {
        self.nyt
    }
    /// number of slots in use, not counting the root
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
    pub fn symbol_count(&self) -> usize {
        self.node_count() / 2
    }
    pub fn is_saturated(&self) -> bool {
        self.node_count() >= self.max_nodes
    }
    pub fn dropped(&self) -> usize {
        self.dropped
    }
    /// symbol held by the leaf in `slot`, `None` for NYT or internal nodes
    pub fn symbol(&self,slot: usize) -> Option<&[u8]> {
        match &self.nodes[slot].kind {
            NodeKind::Leaf { symbol, .. } => Some(symbol),
            _ => None
        }
    }
    fn weight(&self,slot: usize) -> usize {
        self.nodes[slot].kind.weight()
    }
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            nodes: self.nodes.iter().map(|n| (n.parent,n.kind.clone())).collect(),
            nyt: self.nyt
        }
    }
    /// find the leaf holding `token`, scanning from the last slot down
    pub fn lookup(&self,token: &[u8]) -> Option<usize> {
        (1..self.nodes.len()).rev().find(|&i| match &self.nodes[i].kind {
            NodeKind::Leaf { symbol, .. } => symbol.as_slice() == token,
            _ => false
        })
    }
    /// Split the NYT leaf into a leaf for `token` and a new NYT leaf, then update
    /// weights up to the root.  Returns the slot of the new leaf, or `None` if the
    /// table is full, in which case the tree is not touched.
    pub fn insert(&mut self,token: &[u8]) -> Option<usize> {
        if self.is_saturated() {
            if self.dropped == 0 {
                log::warn!("node table is full with {} symbols, new symbols will always be sent as literals",self.symbol_count());
            }
            self.dropped += 1;
            return None;
        }
        let old_nyt = self.nyt;
        let leaf = self.nodes.len();
        self.nodes.push(Node { parent: old_nyt, kind: NodeKind::Leaf { weight: 1, symbol: token.to_vec() } });
        self.nodes.push(Node { parent: old_nyt, kind: NodeKind::Nyt });
        self.nodes[old_nyt].kind = NodeKind::Internal { weight: 1 };
        self.nyt = leaf + 1;
        log::trace!("insert {:?} at slot {}",token,leaf);
        let parent = self.nodes[old_nyt].parent;
        if parent != old_nyt {
            self.rebalance(parent);
        }
        Some(leaf)
    }
    /// Trade payloads between two slots, parent links follow the payload.
    fn swap(&mut self,a: usize,b: usize) {
        let (pa,pb) = (self.nodes[a].parent,self.nodes[b].parent);
        self.nodes.swap(a,b);
        self.nodes[a].parent = pa;
        self.nodes[b].parent = pb;
        for n in (1..self.nodes.len()).rev() {
            if self.nodes[n].parent == a {
                self.nodes[n].parent = b;
            } else if self.nodes[n].parent == b {
                self.nodes[n].parent = a;
            }
        }
    }
    /// Increment the weight of `slot` and all its ancestors, keeping sibling order.
    pub fn rebalance(&mut self,mut slot: usize) {
        loop {
            // find the start of the run of equal weights ending at this slot
            let weight = self.weight(slot);
            let mut lowest = slot;
            while lowest > 1 && self.weight(lowest-1) == weight {
                lowest -= 1;
            }
            if lowest != slot && lowest != self.nodes[slot].parent {
                self.swap(lowest,slot);
                slot = lowest;
            }
            self.nodes[slot].kind.bump();
            if self.nodes[slot].parent == slot {
                return; // root was reached
            }
            slot = self.nodes[slot].parent;
        }
    }
    /// code for `slot`, root to leaf
    pub fn path(&self,mut slot: usize) -> Vec<bool> {
        let mut ans = Vec::new();
        while slot != 0 {
            ans.push(slot % 2 == 1);
            slot = self.nodes[slot].parent;
        }
        ans.reverse();
        ans
    }
    pub fn emit_path(&self,slot: usize,bits: &mut BitStream) {
        for bit in self.path(slot) {
            bits.emit_bit(bit);
        }
    }
    /// Walk from the root reading one bit per level, until a symbol leaf or
    /// the NYT leaf is reached.  Returns the slot.
    /// Finding a child is a scan of the table, so each bit costs O(n).
    pub fn read_path(&self,bits: &mut BitStream) -> Result<usize,Error> {
        let mut slot = 0;
        while let NodeKind::Internal { .. } = self.nodes[slot].kind {
            let bit = bits.read_bit()?;
            slot = (1..self.nodes.len())
                .find(|&m| self.nodes[m].parent == slot && (m % 2 == 1) == bit)
                .ok_or(Error::MissingChild(slot))?;
        }
        Ok(slot)
    }
}

#[cfg(test)]
fn leaf(weight: usize,symbol: &str) -> NodeKind {
    NodeKind::Leaf { weight, symbol: symbol.as_bytes().to_vec() }
}

#[test]
fn split_nyt() {
    let mut tree = AdaptiveTree::create(2046);
    assert_eq!(tree.insert(b"a"),Some(1));
    assert_eq!(tree.nyt(),2);
    assert_eq!(tree.snapshot().nodes,vec![
        (0,NodeKind::Internal { weight: 1 }),
        (0,leaf(1,"a")),
        (0,NodeKind::Nyt)
    ]);
    assert_eq!(tree.path(1),vec![true]);
    assert_eq!(tree.path(2),vec![false]);
    assert_eq!(tree.path(0),Vec::<bool>::new());
}

#[test]
fn promote_on_repeat() {
    let mut tree = AdaptiveTree::create(2046);
    tree.insert(b"a");
    assert_eq!(tree.insert(b"b"),Some(3));
    // b is seen again and trades places with a, which sits at the top of the run
    let b = tree.lookup(b"b").expect("b is missing");
    assert_eq!(b,3);
    tree.rebalance(b);
    let snap = tree.snapshot();
    assert_eq!(snap.nodes,vec![
        (0,NodeKind::Internal { weight: 3 }),
        (0,leaf(2,"b")),
        (0,NodeKind::Internal { weight: 1 }),
        (2,leaf(1,"a")),
        (2,NodeKind::Nyt)
    ]);
    assert!(snap.is_sibling_ordered());
    assert_eq!(tree.lookup(b"b"),Some(1));
    assert_eq!(tree.path(3),vec![false,true]);
    assert_eq!(tree.path(tree.nyt()),vec![false,false]);
}

#[test]
fn subtree_follows_swap() {
    let mut tree = AdaptiveTree::create(2046);
    for tok in ["a","b","c"] {
        tree.insert(tok.as_bytes());
    }
    for _i in 0..3 {
        let c = tree.lookup(b"c").expect("c is missing");
        tree.rebalance(c);
    }
    let snap = tree.snapshot();
    assert!(snap.is_sibling_ordered());
    // every internal node has exactly two children, a sibling pair
    for (slot,(_,kind)) in snap.nodes.iter().enumerate() {
        let kids: Vec<usize> = (1..snap.nodes.len()).filter(|&m| snap.nodes[m].0 == slot).collect();
        match kind {
            NodeKind::Internal { weight } => {
                assert_eq!(kids.len(),2);
                assert_eq!(kids[0] % 2,1);
                assert_eq!(kids[0] + 1,kids[1]);
                assert_eq!(*weight,snap.nodes[kids[0]].1.weight() + snap.nodes[kids[1]].1.weight());
            },
            _ => assert!(kids.is_empty())
        }
    }
}

#[test]
fn read_back_paths() {
    let mut tree = AdaptiveTree::create(2046);
    for tok in ["x","y","z","y"] {
        match tree.lookup(tok.as_bytes()) {
            Some(slot) => tree.rebalance(slot),
            None => { tree.insert(tok.as_bytes()); }
        }
    }
    let mut out = BitStream::new();
    let targets: Vec<usize> = (1..=tree.node_count())
        .filter(|&s| tree.symbol(s).is_some() || s == tree.nyt())
        .collect();
    for &slot in &targets {
        tree.emit_path(slot,&mut out);
    }
    // pad so that the last code is not lost with the partial byte
    out.emit_byte(0);
    let mut inp = BitStream::from_bytes(&out.into_bytes());
    for &slot in &targets {
        assert_eq!(tree.read_path(&mut inp),Ok(slot));
    }
}

#[test]
fn root_is_nyt_reads_nothing() {
    let tree = AdaptiveTree::create(2046);
    let mut inp = BitStream::from_bytes(&[]);
    assert_eq!(tree.read_path(&mut inp),Ok(0));
}

#[test]
fn capacity_boundary() {
    let mut tree = AdaptiveTree::create(7);
    assert_eq!(tree.insert(b"a"),Some(1));
    assert_eq!(tree.insert(b"b"),Some(3));
    assert_eq!(tree.insert(b"c"),Some(5));
    assert!(tree.is_saturated());
    let before = tree.snapshot();
    assert_eq!(tree.insert(b"d"),None);
    assert_eq!(tree.insert(b"e"),None);
    assert_eq!(tree.snapshot(),before);
    assert_eq!(tree.dropped(),2);
    assert_eq!(tree.symbol_count(),3);
    tree.reset();
    assert_eq!(tree.dropped(),0);
    assert_eq!(tree.node_count(),0);
}

#[test]
fn full_table_of_distinct_symbols() {
    let mut tree = AdaptiveTree::create(2046);
    for i in 0..1024u32 {
        let tok = i.to_be_bytes();
        let ans = tree.insert(&tok);
        if i < 1023 {
            assert!(ans.is_some());
        } else {
            assert_eq!(ans,None);
        }
    }
    assert_eq!(tree.symbol_count(),1023);
    assert_eq!(tree.node_count(),2046);
    assert!(tree.snapshot().is_sibling_ordered());
    assert_eq!(tree.lookup(&1023u32.to_be_bytes()),None);
}
