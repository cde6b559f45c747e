//! Splitting one trie into two at a key-count boundary.
//!
//! A single depth-first walk of the source turns it into a stream of
//! structural events. Events before the cut go to the left builder, events
//! after it go to the right one. At the cut, the branch nodes still open
//! above the last left leaf are replayed to the right builder so that the
//! remainder of the walk lands under the right ancestors. Each builder then
//! holds a trie in which the nodes along the cut have lost a child; one pass
//! down the cut side elides them again.
//!
//! The builders can run in-line ([`Critbit::split_at`]) or on their own
//! threads behind rendezvous channels ([`Critbit::split_at_concurrent`]).
//! Both produce the same pair of tries.

use std::panic;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use smallvec::SmallVec;
use tracing::debug;

use crate::arena::{Child, Leaf, Node};
use crate::config::Config;
use crate::search::Link;
use crate::tree::Critbit;

/// Side of the left half that faces the cut.
const LEFT_CUT: usize = 1;
/// Side of the right half that faces the cut.
const RIGHT_CUT: usize = 0;

/// One step of the split walk. `direction` is the slot the item occupies in
/// the innermost open node.
#[derive(Debug)]
pub(crate) enum SplitEvent<V> {
    Node {
        offset: u32,
        bit: u8,
        direction: usize,
    },
    Leaf {
        key: Box<[u8]>,
        value: V,
        direction: usize,
    },
    /// Closes the innermost open node.
    Pop,
}

/// Receives the events of one side of a split.
pub(crate) trait EventSink<V> {
    fn accept(&mut self, event: SplitEvent<V>);
}

impl<V> EventSink<V> for Sender<SplitEvent<V>> {
    fn accept(&mut self, event: SplitEvent<V>) {
        // A closed channel means the builder panicked; the join reports it.
        let _ = self.send(event);
    }
}

/// Rebuilds a trie from a stream of [`SplitEvent`]s.
pub(crate) struct TrieBuilder<V> {
    tree: Critbit<V>,
    open: SmallVec<[u32; 32]>,
}

impl<V> TrieBuilder<V> {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            tree: Critbit::with_config(config),
            open: SmallVec::new(),
        }
    }

    fn attach(&mut self, item: Child, direction: usize) {
        match self.open.last() {
            Some(&parent) => self.tree.arena.node_mut(parent).child[direction] = item,
            None => {
                debug_assert_eq!(self.tree.root, Child::Nil, "second root in split stream");
                self.tree.root = item;
            }
        }
    }

    pub(crate) fn drain(mut self, events: Receiver<SplitEvent<V>>) -> Self {
        for event in events {
            self.accept(event);
        }
        self
    }

    /// Elides the nodes the cut left with a single child.
    pub(crate) fn finish(mut self, cut: usize) -> Critbit<V> {
        self.tree.elide_root_if_needed(cut);
        self.tree.zip_side(cut);
        debug_assert_eq!(
            self.tree.node_count(),
            self.tree.len().saturating_sub(1),
            "split half is not minimal"
        );
        self.tree
    }
}

impl<V> EventSink<V> for TrieBuilder<V> {
    fn accept(&mut self, event: SplitEvent<V>) {
        match event {
            SplitEvent::Node {
                offset,
                bit,
                direction,
            } => {
                let idx = self
                    .tree
                    .arena
                    .alloc_node(Node::new(offset, bit))
                    .expect("split half cannot outgrow its source");
                self.attach(Child::Node(idx), direction);
                self.open.push(idx);
            }
            SplitEvent::Leaf {
                key,
                value,
                direction,
            } => {
                let idx = self
                    .tree
                    .arena
                    .alloc_leaf(key, value)
                    .expect("split half cannot outgrow its source");
                self.attach(Child::Leaf(idx), direction);
            }
            SplitEvent::Pop => {
                self.open.pop();
            }
        }
    }
}

enum Step {
    Visit(Child, usize),
    Close,
}

impl<V> Critbit<V> {
    /// Splits off the first `n` keys into the left trie; the rest form the
    /// right trie. `n` is clamped to [`len`](Self::len).
    ///
    /// Both halves are minimal tries with the configuration of `self`.
    pub fn split_at(self, n: usize) -> (Self, Self) {
        let n = n.min(self.len());
        let this = match self.split_trivial(n) {
            Ok(halves) => return halves,
            Err(this) => this,
        };
        let (left_config, right_config) = this.split_halves_config(n);

        let mut left = TrieBuilder::new(left_config);
        let mut right = TrieBuilder::new(right_config);
        this.emit_split(n, &mut left, &mut right);
        Self::log_done(left.finish(LEFT_CUT), right.finish(RIGHT_CUT))
    }

    /// Splits into two halves; with an odd count the right half gets the
    /// extra key. A single key stays in the left half.
    pub fn split(self) -> (Self, Self) {
        let n = match self.len() {
            1 => 1,
            len => len / 2,
        };
        self.split_at(n)
    }

    /// [`split_at`](Self::split_at) with each half rebuilt on its own thread.
    ///
    /// The calling thread walks the source and hands events over through
    /// zero-capacity channels, so the walk never runs ahead of the builders.
    /// Both builder threads are joined before this returns.
    pub fn split_at_concurrent(self, n: usize) -> (Self, Self)
    where
        V: Send,
    {
        let n = n.min(self.len());
        let this = match self.split_trivial(n) {
            Ok(halves) => return halves,
            Err(this) => this,
        };
        let (left_config, right_config) = this.split_halves_config(n);

        let (mut left_tx, left_rx) = bounded(0);
        let (mut right_tx, right_rx) = bounded(0);
        thread::scope(|scope| {
            let left = scope.spawn(move || {
                TrieBuilder::new(left_config)
                    .drain(left_rx)
                    .finish(LEFT_CUT)
            });
            let right = scope.spawn(move || {
                TrieBuilder::new(right_config)
                    .drain(right_rx)
                    .finish(RIGHT_CUT)
            });

            this.emit_split(n, &mut left_tx, &mut right_tx);
            drop(left_tx);
            drop(right_tx);

            let left = left.join().unwrap_or_else(|err| panic::resume_unwind(err));
            let right = right.join().unwrap_or_else(|err| panic::resume_unwind(err));
            Self::log_done(left, right)
        })
    }

    /// Handles the splits that need no walk, handing `self` back otherwise.
    fn split_trivial(self, n: usize) -> Result<(Self, Self), Self> {
        let len = self.len();
        debug!(target: "critbit::split", len, n, "splitting trie");
        if n == 0 {
            let empty = Self::with_config(self.config.sized_for(0));
            return Ok((empty, self));
        }
        if n == len {
            let empty = Self::with_config(self.config.sized_for(0));
            return Ok((self, empty));
        }
        if len == 2 {
            return Ok(self.split_pair());
        }
        Err(self)
    }

    fn split_halves_config(&self, n: usize) -> (Config, Config) {
        (
            self.config.sized_for(n),
            self.config.sized_for(self.len() - n),
        )
    }

    fn log_done(left: Self, right: Self) -> (Self, Self) {
        debug!(
            target: "critbit::split",
            left = left.len(),
            right = right.len(),
            "split finished"
        );
        (left, right)
    }

    /// Two keys hang directly off the root node; each becomes a one-key trie.
    fn split_pair(mut self) -> (Self, Self) {
        let Child::Node(root) = self.root else {
            panic!("corrupt trie: two keys without a root node");
        };
        let [left, right] = self.arena.node(root).child;
        (self.detach_leaf(left), self.detach_leaf(right))
    }

    fn detach_leaf(&mut self, item: Child) -> Self {
        let Child::Leaf(idx) = item else {
            panic!("corrupt trie: expected a leaf below the root, found {item:?}");
        };
        let Leaf { key, value } = self.arena.free_leaf(idx);
        let mut half = Self::with_config(self.config.sized_for(1));
        let leaf = half
            .arena
            .alloc_leaf(key, value)
            .expect("split half cannot outgrow its source");
        half.root = Child::Leaf(leaf);
        half
    }

    /// Walks the trie in key order, moving every key and value into the
    /// event streams. After the `n`-th leaf the walk switches to `right`.
    fn emit_split(
        mut self,
        n: usize,
        left: &mut impl EventSink<V>,
        right: &mut impl EventSink<V>,
    ) {
        debug_assert!(0 < n && n < self.len());
        let mut remaining = n;
        let mut feeding_right = false;
        let mut path: SmallVec<[(u32, usize); 32]> = SmallVec::new();
        let mut steps = vec![Step::Visit(self.root, 0)];

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(Child::Node(idx), direction) => {
                    let node = self.arena.node(idx);
                    let event = SplitEvent::Node {
                        offset: node.offset,
                        bit: node.bit,
                        direction,
                    };
                    if feeding_right {
                        right.accept(event);
                    } else {
                        left.accept(event);
                    }
                    path.push((idx, direction));
                    steps.push(Step::Close);
                    steps.push(Step::Visit(self.arena.child(idx, 1), 1));
                    steps.push(Step::Visit(self.arena.child(idx, 0), 0));
                }
                Step::Visit(Child::Leaf(idx), direction) => {
                    let Leaf { key, value } = self.arena.free_leaf(idx);
                    let event = SplitEvent::Leaf {
                        key,
                        value,
                        direction,
                    };
                    if feeding_right {
                        right.accept(event);
                        continue;
                    }
                    left.accept(event);
                    remaining -= 1;
                    if remaining == 0 {
                        feeding_right = true;
                        for &(node, direction) in &path {
                            let node = self.arena.node(node);
                            right.accept(SplitEvent::Node {
                                offset: node.offset,
                                bit: node.bit,
                                direction,
                            });
                        }
                    }
                }
                Step::Visit(Child::Nil, _) => unreachable!("nil child on split walk"),
                Step::Close => {
                    path.pop();
                    if feeding_right {
                        right.accept(SplitEvent::Pop);
                    } else {
                        left.accept(SplitEvent::Pop);
                    }
                }
            }
        }
    }

    /// Drops root nodes that have nothing on the `cut` side.
    fn elide_root_if_needed(&mut self, cut: usize) {
        while let Child::Node(idx) = self.root {
            let node = self.arena.node(idx);
            if node.child[cut] != Child::Nil {
                break;
            }
            self.root = node.child[1 - cut];
            self.arena.free_node(idx);
        }
    }

    /// Walks down the `cut` side eliding every node that lost its child on
    /// that side, until a leaf is reached.
    ///
    /// Subtrees hanging off the other side are complete and left alone. If
    /// the walk runs into a missing child, the last node it kept has nothing
    /// on the cut side either and gives way to its other child.
    fn zip_side(&mut self, cut: usize) {
        let mut link = Link::Root;
        let mut kept: Option<(u32, Link)> = None;
        let mut current = self.root;
        loop {
            match current {
                Child::Node(idx) => {
                    let node = *self.arena.node(idx);
                    if node.child[cut] == Child::Nil {
                        self.arena.free_node(idx);
                        current = node.child[1 - cut];
                        continue;
                    }
                    self.set_link(link, current);
                    kept = Some((idx, link));
                    link = Link::Child(idx, cut);
                    current = node.child[cut];
                }
                Child::Leaf(_) => {
                    self.set_link(link, current);
                    return;
                }
                Child::Nil => {
                    match kept {
                        Some((idx, kept_link)) => {
                            let other = self.arena.node(idx).child[1 - cut];
                            self.set_link(kept_link, other);
                            self.arena.free_node(idx);
                        }
                        None => self.root = Child::Nil,
                    }
                    return;
                }
            }
        }
    }
}
