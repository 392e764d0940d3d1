// Right-language and fan-out analyses over any automaton.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::Fsa;

/// Every byte sequence accepted from `node`, in arc order.
///
/// A single growable buffer is threaded through the recursion; each final
/// arc snapshots the prefix written so far.
pub fn right_language<F: Fsa>(fsa: &F, node: u32) -> Vec<Vec<u8>> {
    let mut sequences = Vec::new();
    let mut buffer = Vec::new();
    descend(fsa, node, &mut buffer, 0, &mut sequences);
    sequences
}

fn descend<F: Fsa>(
    fsa: &F,
    node: u32,
    buffer: &mut Vec<u8>,
    depth: usize,
    sequences: &mut Vec<Vec<u8>>,
) {
    if buffer.len() <= depth {
        buffer.resize(depth + 1, 0);
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        buffer[depth] = fsa.arc_label(arc);
        if fsa.is_arc_final(arc) {
            sequences.push(buffer[..=depth].to_vec());
        }
        if !fsa.is_arc_terminal(arc) {
            descend(fsa, fsa.end_node(arc), buffer, depth + 1, sequences);
        }
        arc = fsa.next_arc(arc);
    }
}

/// Histogram of node out-degrees over the graph reachable from the root.
///
/// Keys run from the lowest populated fan-out to the highest one, keeping
/// interior zero entries so the result reads as a table. Fan-out 0 is
/// omitted by construction: the binary layouts reserve a single arcless
/// dummy node per image, and that is the only zero-degree node one
/// contains.
pub fn fan_outs<F: Fsa>(fsa: &F) -> BTreeMap<usize, u32> {
    // one bucket per possible out-degree; a byte-labelled node has at most
    // 256 arcs
    let mut buckets = [0u32; 257];
    fsa.visit_in_pre_order(&mut |node| {
        let mut degree = 0;
        let mut arc = fsa.first_arc(node);
        while arc != 0 {
            degree += 1;
            arc = fsa.next_arc(arc);
        }
        buckets[degree] += 1;
        true
    });

    let mut low = 1;
    while low < buckets.len() && buckets[low] == 0 {
        low += 1;
    }
    let mut high = buckets.len() - 1;
    while high > 0 && buckets[high] == 0 {
        high -= 1;
    }
    let mut histogram = BTreeMap::new();
    for fan_out in low..=high {
        histogram.insert(fan_out, buckets[fan_out]);
    }
    histogram
}

/// Size of the right language of every node reachable from the root.
///
/// Computed bottom-up in one post-order sweep: a node's count is the sum
/// over its arcs of one per final arc plus the target's count for
/// non-terminal arcs. Nodes shared between paths are computed once, keyed
/// by handle.
pub fn right_language_for_all_states<F: Fsa>(fsa: &F) -> HashMap<u32, u32> {
    let mut numbers: HashMap<u32, u32> = HashMap::new();
    fsa.visit_in_post_order(&mut |node| {
        let mut count = 0;
        let mut arc = fsa.first_arc(node);
        while arc != 0 {
            if fsa.is_arc_final(arc) {
                count += 1;
            }
            if !fsa.is_arc_terminal(arc) {
                count += numbers.get(&fsa.end_node(arc)).copied().unwrap_or(0);
            }
            arc = fsa.next_arc(arc);
        }
        numbers.insert(node, count);
        true
    });
    numbers
}

/// Aggregate statistics for the graph reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsaInfo {
    /// Nodes reachable from the root.
    pub node_count: u32,
    /// Arcs leaving those nodes.
    pub arc_count: u32,
    /// Arcs marked final.
    pub final_arc_count: u32,
}

/// Gather [`FsaInfo`] in a single pre-order sweep.
pub fn fsa_info<F: Fsa>(fsa: &F) -> FsaInfo {
    let mut info = FsaInfo {
        node_count: 0,
        arc_count: 0,
        final_arc_count: 0,
    };
    fsa.visit_in_pre_order(&mut |node| {
        info.node_count += 1;
        let mut arc = fsa.first_arc(node);
        while arc != 0 {
            info.arc_count += 1;
            if fsa.is_arc_final(arc) {
                info.final_arc_count += 1;
            }
            arc = fsa.next_arc(arc);
        }
        true
    });
    info
}
