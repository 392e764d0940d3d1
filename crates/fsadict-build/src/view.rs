// Read-only automaton view over a builder.

use fsadict::Fsa;
use fsadict::flags::FsaFlags;

use crate::automaton::{Automaton, StateId};

struct ViewArc {
    label: u8,
    target: StateId,
    last: bool,
}

/// Adapter exposing a byte-labelled [`Automaton`] through the [`Fsa`]
/// contract, so the analyses and serializers run on it unchanged.
///
/// Node handles are state ids shifted by one and arc handles index a
/// flattened arc table, keeping 0 free as "no arc". Finality lives on arcs:
/// an arc is final iff its target state is accepting. A payload stored at
/// the root (the empty sequence) has no arc leading to it and is therefore
/// not visible through this view, nor through anything serialized from it.
pub struct FsaView<'a, E> {
    automaton: &'a Automaton<u8, E>,
    arcs: Vec<ViewArc>,
    first_arcs: Vec<u32>,
}

impl<'a, E> FsaView<'a, E> {
    /// Flatten `automaton` into an arc table, keeping transition order.
    pub fn new(automaton: &'a Automaton<u8, E>) -> Self {
        let mut arcs = Vec::new();
        let mut first_arcs = vec![0u32; automaton.state_count()];
        for state in 0..automaton.state_count() {
            let transitions = automaton.transitions(state);
            if transitions.is_empty() {
                continue;
            }
            first_arcs[state] = arcs.len() as u32 + 1;
            for (index, (label, target)) in transitions.iter().enumerate() {
                arcs.push(ViewArc {
                    label: *label,
                    target: *target,
                    last: index == transitions.len() - 1,
                });
            }
        }
        FsaView {
            automaton,
            arcs,
            first_arcs,
        }
    }

    #[inline]
    fn record(&self, arc: u32) -> &ViewArc {
        &self.arcs[arc as usize - 1]
    }
}

impl<E> Fsa for FsaView<'_, E> {
    fn flags(&self) -> FsaFlags {
        FsaFlags::empty()
    }

    fn root_node(&self) -> u32 {
        self.automaton.root() as u32 + 1
    }

    fn first_arc(&self, node: u32) -> u32 {
        self.first_arcs[node as usize - 1]
    }

    fn next_arc(&self, arc: u32) -> u32 {
        if self.record(arc).last { 0 } else { arc + 1 }
    }

    fn arc_label(&self, arc: u32) -> u8 {
        self.record(arc).label
    }

    fn is_arc_final(&self, arc: u32) -> bool {
        self.automaton.is_accepting(self.record(arc).target)
    }

    fn is_arc_terminal(&self, arc: u32) -> bool {
        self.automaton.transitions(self.record(arc).target).is_empty()
    }

    fn end_node(&self, arc: u32) -> u32 {
        self.record(arc).target as u32 + 1
    }

    fn right_language_count(&self, _node: u32) -> u32 {
        0
    }
}
