// Iteration over the byte sequences an automaton accepts.

use crate::Fsa;

/// Iterator over the right language of a node, in arc order.
///
/// Created by [`Fsa::sequences`] / [`Fsa::sequences_from`]. Each item is one
/// accepted byte sequence. Traversal state lives in an explicit arc stack,
/// one slot per depth holding the next arc to take there, so enumeration
/// depth is bounded by the longest sequence rather than the call stack.
pub struct Sequences<'a, F: Fsa> {
    fsa: &'a F,
    arcs: Vec<u32>,
    buffer: Vec<u8>,
}

impl<'a, F: Fsa> Sequences<'a, F> {
    pub(crate) fn new(fsa: &'a F, node: u32) -> Sequences<'a, F> {
        let mut arcs = Vec::new();
        if node != 0 {
            let first = fsa.first_arc(node);
            if first != 0 {
                arcs.push(first);
            }
        }
        Sequences {
            fsa,
            arcs,
            buffer: Vec::new(),
        }
    }
}

impl<F: Fsa> Iterator for Sequences<'_, F> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        while let Some(slot) = self.arcs.last_mut() {
            let arc = *slot;
            if arc == 0 {
                self.arcs.pop();
                continue;
            }
            // advance the slot before descending so the depth stays accurate
            *slot = self.fsa.next_arc(arc);
            let depth = self.arcs.len() - 1;
            if self.buffer.len() <= depth {
                self.buffer.resize(depth + 1, 0);
            }
            self.buffer[depth] = self.fsa.arc_label(arc);
            if !self.fsa.is_arc_terminal(arc) {
                self.arcs.push(self.fsa.first_arc(self.fsa.end_node(arc)));
            }
            if self.fsa.is_arc_final(arc) {
                return Some(self.buffer[..=depth].to_vec());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DEFAULT_ANNOTATION, DEFAULT_FILLER, FSA_MAGIC};
    use crate::fsa5::{self, Fsa5};

    // {a, ab, b}; see the decoder tests for the byte layout.
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
    fn yields_sequences_in_arc_order() {
        let fsa = simple_fsa();
        let words: Vec<Vec<u8>> = fsa.sequences().collect();
        assert_eq!(words, vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn enumerates_a_subtree() {
        let fsa = simple_fsa();
        let words: Vec<Vec<u8>> = fsa.sequences_from(8).collect();
        assert_eq!(words, vec![b"b".to_vec()]);
    }

    #[test]
    fn node_zero_yields_nothing() {
        let fsa = simple_fsa();
        assert_eq!(fsa.sequences_from(0).count(), 0);
    }
}
