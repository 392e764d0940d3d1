//! Compact finite-state automata for dictionary storage.
//!
//! This crate provides loading, traversal and analysis of immutable binary
//! automata holding sets of byte sequences. An automaton is addressed through
//! opaque integer node and arc handles behind the [`Fsa`] trait, so every
//! algorithm here runs unchanged on any supported binary version.
//!
//! # Architecture
//!
//! - [`format`] -- Binary header parsing and validation
//! - [`flags`] -- Capability flags carried by automaton images
//! - [`dispatch`] -- Version-byte dispatch to a concrete decoder
//! - [`fsa5`] -- Version 5 decoder (byte-addressed automata)
//! - [`cfsa2`] -- Version 0xC6 decoder (compressed automata)
//! - [`iter`] -- Iteration over accepted byte sequences
//! - [`dot`] -- GraphViz export
//! - [`info`] -- Right-language and fan-out analyses

use hashbrown::HashSet;

use crate::flags::FsaFlags;

pub mod cfsa2;
pub mod dispatch;
pub mod dot;
pub mod flags;
pub mod format;
pub mod fsa5;
pub mod info;
pub mod iter;

/// Error type for automaton parsing and loading.
#[derive(Debug, thiserror::Error)]
pub enum FsaError {
    #[error("invalid magic bytes in automaton header")]
    InvalidMagic,
    #[error("unsupported automaton version: {version}")]
    UnsupportedVersion { version: u8 },
    #[error("unrecognized automaton flags: {flags:#06x}")]
    UnrecognizedFlags { flags: u16 },
    #[error("file too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("i/o error reading automaton")]
    Io(#[from] std::io::Error),
}

/// Read-only contract over a compact automaton.
///
/// Nodes and arcs are opaque `u32` handles, valid only for the automaton
/// that produced them. An arc handle of `0` means "no arc" everywhere an arc
/// handle is returned. A terminal arc has no target node; callers check
/// [`Fsa::is_arc_terminal`] before calling [`Fsa::end_node`]. Handles
/// fabricated or taken from another automaton index into unrelated bytes,
/// so traversal results for them are unspecified.
pub trait Fsa {
    /// Capability flags of this automaton.
    fn flags(&self) -> FsaFlags;

    /// Handle of the root node.
    fn root_node(&self) -> u32;

    /// First outgoing arc of `node`, or 0 if the node has none.
    fn first_arc(&self, node: u32) -> u32;

    /// Arc following `arc` within the same node, or 0 if `arc` is the last
    /// one.
    fn next_arc(&self, arc: u32) -> u32;

    /// Label byte of `arc`.
    fn arc_label(&self, arc: u32) -> u8;

    /// True if the path up to and including `arc` spells a sequence of the
    /// automaton's language.
    fn is_arc_final(&self, arc: u32) -> bool;

    /// True if `arc` has no target node.
    fn is_arc_terminal(&self, arc: u32) -> bool;

    /// Target node of a non-terminal `arc`.
    fn end_node(&self, arc: u32) -> u32;

    /// Number of sequences accepted from `node`.
    ///
    /// Meaningful only when [`FsaFlags::NUMBERS`] is set; automata without
    /// stored counts return 0. [`info::right_language_for_all_states`]
    /// computes the counts on demand instead.
    fn right_language_count(&self, node: u32) -> u32;

    /// Arc of `node` carrying `label`, or 0 if there is none.
    fn arc(&self, node: u32, label: u8) -> u32 {
        let mut arc = self.first_arc(node);
        while arc != 0 {
            if self.arc_label(arc) == label {
                return arc;
            }
            arc = self.next_arc(arc);
        }
        0
    }

    /// Visit every node reachable from the root in pre-order.
    ///
    /// Each node is visited exactly once. A `false` return from the visitor
    /// skips descent below that node; its siblings are still visited.
    fn visit_in_pre_order<V>(&self, visitor: &mut V)
    where
        Self: Sized,
        V: FnMut(u32) -> bool,
    {
        self.visit_in_pre_order_from(self.root_node(), visitor);
    }

    /// Visit every node reachable from `node` in pre-order.
    fn visit_in_pre_order_from<V>(&self, node: u32, visitor: &mut V)
    where
        Self: Sized,
        V: FnMut(u32) -> bool,
    {
        pre_order(self, node, visitor, &mut HashSet::new());
    }

    /// Visit every node reachable from the root in post-order, children
    /// before their parent.
    ///
    /// Each node is visited exactly once. A `false` return from the visitor
    /// aborts the traversal; the result is `false` iff that happened.
    fn visit_in_post_order<V>(&self, visitor: &mut V) -> bool
    where
        Self: Sized,
        V: FnMut(u32) -> bool,
    {
        self.visit_in_post_order_from(self.root_node(), visitor)
    }

    /// Visit every node reachable from `node` in post-order.
    fn visit_in_post_order_from<V>(&self, node: u32, visitor: &mut V) -> bool
    where
        Self: Sized,
        V: FnMut(u32) -> bool,
    {
        post_order(self, node, visitor, &mut HashSet::new())
    }

    /// Iterator over every byte sequence accepted from the root.
    fn sequences(&self) -> iter::Sequences<'_, Self>
    where
        Self: Sized,
    {
        self.sequences_from(self.root_node())
    }

    /// Iterator over every byte sequence accepted from `node`.
    ///
    /// A `node` of 0 yields nothing.
    fn sequences_from(&self, node: u32) -> iter::Sequences<'_, Self>
    where
        Self: Sized,
    {
        iter::Sequences::new(self, node)
    }
}

fn pre_order<F, V>(fsa: &F, node: u32, visitor: &mut V, visited: &mut HashSet<u32>)
where
    F: Fsa,
    V: FnMut(u32) -> bool,
{
    if !visited.insert(node) {
        return;
    }
    if !visitor(node) {
        return;
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        if !fsa.is_arc_terminal(arc) {
            pre_order(fsa, fsa.end_node(arc), visitor, visited);
        }
        arc = fsa.next_arc(arc);
    }
}

fn post_order<F, V>(fsa: &F, node: u32, visitor: &mut V, visited: &mut HashSet<u32>) -> bool
where
    F: Fsa,
    V: FnMut(u32) -> bool,
{
    if !visited.insert(node) {
        return true;
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        if !fsa.is_arc_terminal(arc) && !post_order(fsa, fsa.end_node(arc), visitor, visited) {
            return false;
        }
        arc = fsa.next_arc(arc);
    }
    visitor(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DEFAULT_ANNOTATION, DEFAULT_FILLER, FSA_MAGIC};
    use crate::fsa5::Fsa5;

    // {a, ab, b}: root at offset 4 with arcs to node 8 ('a', final) and to
    // the stop state ('b', final), node 8 with one final terminal arc.
    fn simple_fsa() -> Fsa5 {
        let mut data = FSA_MAGIC.to_vec();
        data.extend_from_slice(&[fsa5::VERSION, DEFAULT_FILLER, DEFAULT_ANNOTATION, 0x01]);
        data.extend_from_slice(&[
            0x00, 0x02, // dummy node
            b'^', 0x22, // epsilon node, root at offset 4
            b'a', 0x41, // root: final, target 8
            b'b', 0x03, // root: final, terminal, last
            b'b', 0x03, // node 8: final, terminal, last
        ]);
        Fsa5::from_bytes(&data).unwrap()
    }

    #[test]
    fn arc_lookup_scans_labels() {
        let fsa = simple_fsa();
        let root = fsa.root_node();
        assert_eq!(fsa.arc_label(fsa.arc(root, b'a')), b'a');
        assert_eq!(fsa.arc_label(fsa.arc(root, b'b')), b'b');
        assert_eq!(fsa.arc(root, b'z'), 0);
    }

    #[test]
    fn pre_order_parent_before_children() {
        let fsa = simple_fsa();
        let mut order = Vec::new();
        fsa.visit_in_pre_order(&mut |node| {
            order.push(node);
            true
        });
        assert_eq!(order, vec![4, 8]);
    }

    #[test]
    fn post_order_children_before_parent() {
        let fsa = simple_fsa();
        let mut order = Vec::new();
        let completed = fsa.visit_in_post_order(&mut |node| {
            order.push(node);
            true
        });
        assert!(completed);
        assert_eq!(order, vec![8, 4]);
    }

    #[test]
    fn pre_order_false_prunes_descent() {
        let fsa = simple_fsa();
        let mut order = Vec::new();
        fsa.visit_in_pre_order(&mut |node| {
            order.push(node);
            false
        });
        assert_eq!(order, vec![4]);
    }

    #[test]
    fn post_order_false_aborts() {
        let fsa = simple_fsa();
        let mut visits = 0;
        let completed = fsa.visit_in_post_order(&mut |_| {
            visits += 1;
            false
        });
        assert!(!completed);
        assert_eq!(visits, 1);
    }
}
