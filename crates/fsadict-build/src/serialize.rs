// Serializer contract and shared node ordering.

use std::io;

use fsadict::Fsa;
use fsadict::flags::FsaFlags;
use hashbrown::HashSet;

use crate::SerializeError;

/// Contract shared by the binary serializers.
///
/// A serializer walks any [`Fsa`] and writes a loadable image of its
/// language. The builder-style setters configure the header bytes and
/// whether right-language counts are stored with each node; they return the
/// serializer so calls chain.
pub trait FsaSerializer {
    /// Use `filler` as the header filler byte.
    fn with_filler(self, filler: u8) -> Self;

    /// Use `annotation` as the header annotation separator byte.
    fn with_annotation_separator(self, annotation: u8) -> Self;

    /// Store the right-language count of every node in the image.
    fn with_right_language_counts(self) -> Self;

    /// Flags the produced image will advertise.
    fn flags(&self) -> FsaFlags;

    /// Write `fsa` as a binary image into `out`.
    fn serialize<F: Fsa, W: io::Write>(&self, fsa: &F, out: &mut W) -> Result<(), SerializeError>;
}

/// Arc-bearing nodes reachable from the root, in the depth-first order the
/// writers lay them out in. Nodes reached only through terminal arcs carry
/// no arcs and are skipped. The order is deterministic for a given
/// automaton.
pub(crate) fn linearize<F: Fsa>(fsa: &F) -> Vec<u32> {
    let root = fsa.root_node();
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    seen.insert(root);
    while let Some(node) = stack.pop() {
        order.push(node);
        let mut targets = Vec::new();
        let mut arc = fsa.first_arc(node);
        while arc != 0 {
            if !fsa.is_arc_terminal(arc) {
                let end = fsa.end_node(arc);
                if seen.insert(end) {
                    targets.push(end);
                }
            }
            arc = fsa.next_arc(arc);
        }
        // reversed, so the first arc's target is laid out next
        while let Some(target) = targets.pop() {
            stack.push(target);
        }
    }
    order
}
