// GraphViz export of compact automata.

use std::fmt::{self, Write};

use hashbrown::HashSet;

use crate::Fsa;
use crate::flags::FsaFlags;

/// Render the part of `fsa` reachable from the root as a GraphViz digraph.
///
/// Terminal arcs point at a shared `stop` pseudo-node drawn as a double
/// circle; a plaintext `initial` pseudo-node marks the root. Arc labels are
/// written as the literal character when ASCII-alphanumeric and as hex
/// otherwise; final arcs get a tee arrowhead. With stored counts, each node
/// is labeled with the size of its right language. Output is deterministic
/// for a given automaton.
pub fn to_dot<F: Fsa>(fsa: &F) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_dot(fsa, &mut out);
    out
}

/// Write the digraph to any [`fmt::Write`] sink.
pub fn write_dot<F: Fsa, W: Write>(fsa: &F, out: &mut W) -> fmt::Result {
    writeln!(out, "digraph Automaton {{")?;
    writeln!(out, "  rankdir = LR;")?;
    writeln!(out, "  stop [shape=doublecircle,label=\"\"];")?;
    writeln!(out, "  initial [shape=plaintext,label=\"\"];")?;
    writeln!(out, "  initial -> {}", fsa.root_node())?;
    writeln!(out)?;
    visit_node(out, fsa, fsa.root_node(), &mut HashSet::new())?;
    writeln!(out, "}}")
}

fn visit_node<F: Fsa, W: Write>(
    out: &mut W,
    fsa: &F,
    node: u32,
    visited: &mut HashSet<u32>,
) -> fmt::Result {
    visited.insert(node);
    if fsa.flags().contains(FsaFlags::NUMBERS) {
        writeln!(
            out,
            "  {} [shape=circle,label=\"{}\"];",
            node,
            fsa.right_language_count(node)
        )?;
    } else {
        writeln!(out, "  {node} [shape=circle,label=\"\"];")?;
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        write!(out, "  {node} -> ")?;
        if fsa.is_arc_terminal(arc) {
            write!(out, "stop")?;
        } else {
            write!(out, "{}", fsa.end_node(arc))?;
        }
        let label = fsa.arc_label(arc);
        if label.is_ascii_alphanumeric() {
            write!(out, " [label=\"{}\"", label as char)?;
        } else {
            write!(out, " [label=\"0x{label:x}\"")?;
        }
        if fsa.is_arc_final(arc) {
            write!(out, " arrowhead=\"tee\"")?;
        }
        writeln!(out, "];")?;
        arc = fsa.next_arc(arc);
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        if !fsa.is_arc_terminal(arc) {
            let end = fsa.end_node(arc);
            if !visited.contains(&end) {
                visit_node(out, fsa, end, visited)?;
            }
        }
        arc = fsa.next_arc(arc);
    }
    Ok(())
}
