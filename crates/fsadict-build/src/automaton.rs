// Mutable prefix-sharing automaton builder.

use std::collections::VecDeque;
use std::fmt::{self, Display, Write};

/// Index of a state inside an [`Automaton`].
pub type StateId = usize;

/// Mutable automaton holding a set of sequences over symbols `S`, with a
/// payload `E` stored at each accepting state.
///
/// States live in an arena and are addressed by [`StateId`]; the root is
/// created up front with id 0. Sequences sharing a prefix share the states
/// spelling it, so the structure is a trie over `S`. Ids are valid only for
/// the automaton that produced them.
pub struct Automaton<S, E> {
    states: Vec<State<S, E>>,
}

struct State<S, E> {
    transitions: Vec<(S, StateId)>,
    payload: Option<E>,
}

impl<S, E> Automaton<S, E> {
    /// Create an automaton accepting nothing, with just the root state.
    pub fn new() -> Self {
        Automaton {
            states: vec![State {
                transitions: Vec::new(),
                payload: None,
            }],
        }
    }

    /// Id of the root state.
    #[inline]
    pub fn root(&self) -> StateId {
        0
    }

    /// Number of states, the root included.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Outgoing transitions of `state`, in insertion order.
    #[inline]
    pub fn transitions(&self, state: StateId) -> &[(S, StateId)] {
        &self.states[state].transitions
    }

    /// Payload stored at `state`, if it is accepting.
    #[inline]
    pub fn payload(&self, state: StateId) -> Option<&E> {
        self.states[state].payload.as_ref()
    }

    /// True if some inserted sequence ends at `state`.
    #[inline]
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.states[state].payload.is_some()
    }

    /// All states reachable from the root, breadth-first.
    pub fn states(&self) -> Vec<StateId> {
        let mut visited = vec![false; self.states.len()];
        let mut queue = VecDeque::new();
        let mut order = Vec::with_capacity(self.states.len());
        visited[self.root()] = true;
        queue.push_back(self.root());
        while let Some(state) = queue.pop_front() {
            order.push(state);
            for (_, target) in &self.states[state].transitions {
                if !visited[*target] {
                    visited[*target] = true;
                    queue.push_back(*target);
                }
            }
        }
        order
    }

    fn push_state(&mut self) -> StateId {
        self.states.push(State {
            transitions: Vec::new(),
            payload: None,
        });
        self.states.len() - 1
    }
}

impl<S, E> Default for Automaton<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Clone, E> Automaton<S, E> {
    /// Insert `sequence`, storing `payload` at its accepting state.
    ///
    /// States spelling an already present prefix are reused, so repeated
    /// insertion of the same sequence creates no new states and overwrites
    /// the payload.
    pub fn add(&mut self, sequence: &[S], payload: E) {
        let mut state = self.root();
        for symbol in sequence {
            state = match self.next_state(state, symbol) {
                Some(next) => next,
                None => {
                    let next = self.push_state();
                    self.states[state].transitions.push((symbol.clone(), next));
                    next
                }
            };
        }
        self.states[state].payload = Some(payload);
    }

    /// Target of the transition leaving `state` on `symbol`, if present.
    pub fn next_state(&self, state: StateId, symbol: &S) -> Option<StateId> {
        self.states[state]
            .transitions
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, target)| *target)
    }
}

impl<S: Display, E> Automaton<S, E> {
    /// Render the automaton as a GraphViz digraph.
    ///
    /// Accepting states are drawn as double circles, edges are labeled with
    /// their symbol's `Display` form, and a plaintext `initial` pseudo-node
    /// marks the root. States appear in breadth-first order, so the output
    /// is deterministic.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_dot(&mut out);
        out
    }

    /// Write the digraph to any [`fmt::Write`] sink.
    pub fn write_dot<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "digraph Automaton {{")?;
        writeln!(out, "  rankdir = LR;")?;
        writeln!(out, "  initial [shape=plaintext,label=\"\"];")?;
        writeln!(out, "  initial -> {}", self.root())?;
        writeln!(out)?;
        for state in self.states() {
            let shape = if self.is_accepting(state) {
                "doublecircle"
            } else {
                "circle"
            };
            writeln!(out, "  {state} [shape={shape},label=\"\"];")?;
            for (symbol, target) in self.transitions(state) {
                writeln!(out, "  {state} -> {target} [label=\"{symbol}\"];")?;
            }
        }
        writeln!(out, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Automaton<u8, u32> {
        let mut automaton = Automaton::new();
        automaton.add(b"cat", 1);
        automaton.add(b"car", 2);
        automaton.add(b"dog", 3);
        automaton
    }

    fn walk(automaton: &Automaton<u8, u32>, word: &[u8]) -> StateId {
        let mut state = automaton.root();
        for symbol in word {
            state = automaton.next_state(state, symbol).unwrap();
        }
        state
    }

    #[test]
    fn shares_prefixes() {
        // root, c-a-t-r, d-o-g
        let automaton = words();
        assert_eq!(automaton.state_count(), 8);
        let accepting = automaton
            .states()
            .into_iter()
            .filter(|&state| automaton.is_accepting(state))
            .count();
        assert_eq!(accepting, 3);
    }

    #[test]
    fn payload_last_write_wins() {
        let mut automaton = Automaton::new();
        automaton.add(b"ab", 7u32);
        automaton.add(b"ab", 9);
        assert_eq!(automaton.payload(walk(&automaton, b"ab")), Some(&9));
        assert_eq!(automaton.state_count(), 3);
    }

    #[test]
    fn idempotent_insertion() {
        let mut automaton = words();
        automaton.add(b"cat", 4);
        automaton.add(b"dog", 5);
        assert_eq!(automaton.state_count(), 8);
        assert_eq!(automaton.transitions(automaton.root()).len(), 2);
    }

    #[test]
    fn prefix_of_existing_sequence() {
        let mut automaton = Automaton::new();
        automaton.add(b"ab", 1u32);
        automaton.add(b"a", 2);
        assert_eq!(automaton.state_count(), 3);
        assert!(automaton.is_accepting(walk(&automaton, b"a")));
        assert_eq!(automaton.payload(walk(&automaton, b"a")), Some(&2));
    }

    #[test]
    fn empty_sequence_marks_root() {
        let mut automaton: Automaton<u8, u32> = Automaton::new();
        automaton.add(&[], 1);
        assert!(automaton.is_accepting(automaton.root()));
        assert_eq!(automaton.state_count(), 1);
    }

    #[test]
    fn next_state_requires_existing_transition() {
        let automaton = words();
        assert_eq!(automaton.next_state(automaton.root(), &b'c'), Some(1));
        assert_eq!(automaton.next_state(automaton.root(), &b'z'), None);
    }

    #[test]
    fn states_breadth_first_from_root() {
        assert_eq!(words().states(), vec![0, 1, 5, 2, 6, 3, 4, 7]);
    }

    #[test]
    fn fresh_builder_has_only_root() {
        let automaton: Automaton<char, ()> = Automaton::new();
        assert_eq!(automaton.state_count(), 1);
        assert_eq!(automaton.states(), vec![0]);
        assert!(!automaton.is_accepting(automaton.root()));
        assert!(automaton.transitions(automaton.root()).is_empty());
    }

    #[test]
    fn dot_marks_accepting_states() {
        let dot = words().to_dot();
        assert!(dot.starts_with("digraph Automaton {\n"));
        assert!(dot.contains("  initial -> 0"));
        // u8 symbols render through Display, so labels are decimal
        assert!(dot.contains("  0 -> 1 [label=\"99\"];"));
        assert_eq!(dot.matches("shape=doublecircle").count(), 3);
        assert_eq!(dot.matches("shape=circle").count(), 5);
    }

    #[test]
    fn dot_with_char_symbols() {
        let mut automaton: Automaton<char, ()> = Automaton::new();
        automaton.add(&['h', 'i'], ());
        let dot = automaton.to_dot();
        assert!(dot.contains("  0 -> 1 [label=\"h\"];"));
        assert!(dot.contains("  2 [shape=doublecircle,label=\"\"];"));
    }
}
