// Version 5 serializer: fixed-width goto fields sized by a smallest-fit
// search.

use std::io::Write;

use fsadict::Fsa;
use fsadict::flags::FsaFlags;
use fsadict::format::{self, DEFAULT_ANNOTATION, DEFAULT_FILLER, Header};
use fsadict::fsa5::{ADDRESS_OFFSET, BIT_FINAL_ARC, BIT_LAST_ARC, VERSION};
use fsadict::info;
use hashbrown::HashMap;

use crate::SerializeError;
use crate::serialize::{self, FsaSerializer};

// upper bound of the goto-width nibble
const MAX_GOTO_LENGTH: usize = 15;

/// Serializer producing version 5 images.
///
/// Every arc is written with an explicit address; the goto-field width is
/// the smallest one whose address space holds every node offset. Arcs keep
/// the order the source automaton reports them in, and a node's first-arc
/// target is laid out right after the node.
pub struct Fsa5Serializer {
    filler: u8,
    annotation: u8,
    with_numbers: bool,
}

impl Fsa5Serializer {
    pub fn new() -> Self {
        Fsa5Serializer {
            filler: DEFAULT_FILLER,
            annotation: DEFAULT_ANNOTATION,
            with_numbers: false,
        }
    }
}

impl Default for Fsa5Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FsaSerializer for Fsa5Serializer {
    fn with_filler(mut self, filler: u8) -> Self {
        self.filler = filler;
        self
    }

    fn with_annotation_separator(mut self, annotation: u8) -> Self {
        self.annotation = annotation;
        self
    }

    fn with_right_language_counts(mut self) -> Self {
        self.with_numbers = true;
        self
    }

    fn flags(&self) -> FsaFlags {
        let mut flags =
            FsaFlags::FLEXIBLE | FsaFlags::STOPBIT | FsaFlags::NEXTBIT | FsaFlags::SEPARATORS;
        if self.with_numbers {
            flags |= FsaFlags::NUMBERS;
        }
        flags
    }

    fn serialize<F: Fsa, W: Write>(&self, fsa: &F, out: &mut W) -> Result<(), SerializeError> {
        let root = fsa.root_node();
        // node 0 is the empty-language root of a decoded image; its
        // first-arc offset is meaningless there
        let empty = root == 0 || fsa.first_arc(root) == 0;
        let order = if empty {
            Vec::new()
        } else {
            serialize::linearize(fsa)
        };

        let counts = if self.with_numbers {
            info::right_language_for_all_states(fsa)
        } else {
            HashMap::new()
        };
        let node_data_length = if self.with_numbers {
            byte_length(counts.values().copied().max().unwrap_or(0))
        } else {
            0
        };

        let arcs_per_node: Vec<usize> = order
            .iter()
            .map(|&node| {
                let mut n = 0;
                let mut arc = fsa.first_arc(node);
                while arc != 0 {
                    n += 1;
                    arc = fsa.next_arc(arc);
                }
                n
            })
            .collect();

        let mut layout = None;
        for gtl in 1..=MAX_GOTO_LENGTH {
            if let Some(offsets) = try_layout(&order, &arcs_per_node, node_data_length, gtl) {
                layout = Some((gtl, offsets));
                break;
            }
        }
        let Some((gtl, offsets)) = layout else {
            return Err(SerializeError::AddressOverflow);
        };

        let mut image = Vec::new();
        format::write_header(
            &Header {
                version: VERSION,
                filler: self.filler,
                annotation: self.annotation,
                gtl: ((node_data_length as u8) << 4) | gtl as u8,
            },
            &mut image,
        )?;

        // dummy and epsilon nodes; an empty automaton keeps the epsilon
        // target at 0
        push_count(&mut image, 0, node_data_length);
        push_arc(&mut image, 0, BIT_LAST_ARC, 0, gtl);
        push_count(&mut image, 0, node_data_length);
        let root_offset = offsets.get(&root).copied().unwrap_or(0);
        push_arc(&mut image, b'^', BIT_LAST_ARC, root_offset, gtl);

        for &node in &order {
            let count = counts.get(&node).copied().unwrap_or(0);
            push_count(&mut image, count, node_data_length);
            let mut arc = fsa.first_arc(node);
            while arc != 0 {
                let next = fsa.next_arc(arc);
                let mut bits = 0;
                if next == 0 {
                    bits |= BIT_LAST_ARC;
                }
                if fsa.is_arc_final(arc) {
                    bits |= BIT_FINAL_ARC;
                }
                let target = if fsa.is_arc_terminal(arc) {
                    0
                } else {
                    offsets[&fsa.end_node(arc)]
                };
                push_arc(&mut image, fsa.arc_label(arc), bits, target, gtl);
                arc = next;
            }
        }

        out.write_all(&image)?;
        Ok(())
    }
}

/// Offsets every arc-bearing node would get with `gtl`-byte goto fields, or
/// `None` if some stored address would not fit.
fn try_layout(
    order: &[u32],
    arcs_per_node: &[usize],
    node_data_length: usize,
    gtl: usize,
) -> Option<HashMap<u32, u64>> {
    let limit = address_limit(gtl);
    let mut offsets = HashMap::with_capacity(order.len());
    // the dummy and epsilon nodes open the region
    let mut offset = (2 * (node_data_length + 1 + gtl)) as u64;
    for (&node, &n_arcs) in order.iter().zip(arcs_per_node) {
        if offset >= limit {
            return None;
        }
        offsets.insert(node, offset);
        offset += (node_data_length + n_arcs * (1 + gtl)) as u64;
    }
    Some(offsets)
}

fn address_limit(gtl: usize) -> u64 {
    let bits = 8 * gtl - ADDRESS_OFFSET as usize;
    if bits >= 63 { u64::MAX } else { 1 << bits }
}

fn byte_length(value: u32) -> usize {
    let mut length = 1;
    let mut rest = value >> 8;
    while rest != 0 {
        length += 1;
        rest >>= 8;
    }
    length
}

fn push_count(image: &mut Vec<u8>, count: u32, node_data_length: usize) {
    for i in 0..node_data_length {
        image.push((count >> (8 * i)) as u8);
    }
}

fn push_arc(image: &mut Vec<u8>, label: u8, flag_bits: u8, target: u64, gtl: usize) {
    image.push(label);
    let field = (target << ADDRESS_OFFSET) | u64::from(flag_bits);
    let bytes = field.to_le_bytes();
    for i in 0..gtl {
        image.push(bytes.get(i).copied().unwrap_or(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::view::FsaView;
    use fsadict::format::parse_header;
    use fsadict::fsa5::Fsa5;

    fn byte_automaton(words: &[&[u8]]) -> Automaton<u8, u32> {
        let mut automaton = Automaton::new();
        for (i, word) in words.iter().enumerate() {
            automaton.add(word, i as u32 + 1);
        }
        automaton
    }

    fn language<F: Fsa>(fsa: &F) -> Vec<Vec<u8>> {
        let mut sequences: Vec<Vec<u8>> = fsa.sequences().collect();
        sequences.sort();
        sequences
    }

    #[test]
    fn writes_loadable_image() {
        let automaton = byte_automaton(&[b"a", b"ab", b"b"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Fsa5Serializer::new().serialize(&view, &mut image).unwrap();
        let fsa = Fsa5::from_bytes(&image).unwrap();
        assert_eq!(
            language(&fsa),
            vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]
        );
        assert!(!fsa.flags().contains(FsaFlags::NUMBERS));
    }

    #[test]
    fn picks_smallest_goto_width() {
        let automaton = byte_automaton(&[b"a", b"ab", b"b"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Fsa5Serializer::new().serialize(&view, &mut image).unwrap();
        let header = parse_header(&image).unwrap();
        assert_eq!(header.gtl, 0x01);
    }

    #[test]
    fn stores_right_language_counts() {
        let automaton = byte_automaton(&[b"a", b"ab", b"b"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Fsa5Serializer::new()
            .with_right_language_counts()
            .serialize(&view, &mut image)
            .unwrap();
        let header = parse_header(&image).unwrap();
        assert_eq!(header.gtl, 0x11);
        let fsa = Fsa5::from_bytes(&image).unwrap();
        assert!(fsa.flags().contains(FsaFlags::NUMBERS));
        assert_eq!(fsa.right_language_count(fsa.root_node()), 3);
        assert_eq!(
            language(&fsa),
            vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn writes_empty_automaton() {
        let automaton: Automaton<u8, u32> = Automaton::new();
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Fsa5Serializer::new().serialize(&view, &mut image).unwrap();
        let fsa = Fsa5::from_bytes(&image).unwrap();
        assert_eq!(fsa.root_node(), 0);
        assert_eq!(fsa.sequences().count(), 0);
    }

    #[test]
    fn reserializes_empty_image_with_stored_counts() {
        let automaton: Automaton<u8, u32> = Automaton::new();
        let view = FsaView::new(&automaton);
        let mut first = Vec::new();
        Fsa5Serializer::new()
            .with_right_language_counts()
            .serialize(&view, &mut first)
            .unwrap();
        // the decoded image reports node 0 as its root
        let fsa = Fsa5::from_bytes(&first).unwrap();
        assert_eq!(fsa.root_node(), 0);
        let mut second = Vec::new();
        Fsa5Serializer::new()
            .with_right_language_counts()
            .serialize(&fsa, &mut second)
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(Fsa5::from_bytes(&second).unwrap().sequences().count(), 0);
    }

    #[test]
    fn custom_header_bytes() {
        let automaton = byte_automaton(&[b"a"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Fsa5Serializer::new()
            .with_filler(b'!')
            .with_annotation_separator(b'@')
            .serialize(&view, &mut image)
            .unwrap();
        let header = parse_header(&image).unwrap();
        assert_eq!(header.filler, b'!');
        assert_eq!(header.annotation, b'@');
        let fsa = Fsa5::from_bytes(&image).unwrap();
        assert_eq!(fsa.filler(), b'!');
        assert_eq!(fsa.annotation(), b'@');
    }

    #[test]
    fn output_is_deterministic() {
        let automaton = byte_automaton(&[b"mare", b"marek", b"mars", b"m"]);
        let view = FsaView::new(&automaton);
        let mut first = Vec::new();
        let mut second = Vec::new();
        Fsa5Serializer::new().serialize(&view, &mut first).unwrap();
        Fsa5Serializer::new().serialize(&view, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
