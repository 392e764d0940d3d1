// Version 0xC6 serializer: frequency-ranked label mapping and v-int
// addresses sized by a fixed-point sweep.

use std::cmp::Reverse;
use std::io::Write;

use fsadict::Fsa;
use fsadict::cfsa2::{
    BIT_FINAL_ARC, BIT_LAST_ARC, LABEL_INDEX_SIZE, VERSION, vint_length, write_vint,
};
use fsadict::flags::FsaFlags;
use fsadict::format::{self, DEFAULT_ANNOTATION, DEFAULT_FILLER, Header};
use fsadict::info;
use hashbrown::HashMap;

use crate::SerializeError;
use crate::serialize::{self, FsaSerializer};

/// Serializer producing version 0xC6 images.
///
/// The most frequent arc labels are ranked into the label mapping, so their
/// arcs need no label byte. Every arc stores its target as a v-int; node
/// offsets and v-int widths depend on each other, so the layout is iterated
/// until it stops moving. Arcs keep the order the source automaton reports
/// them in.
pub struct Cfsa2Serializer {
    filler: u8,
    annotation: u8,
    with_numbers: bool,
}

impl Cfsa2Serializer {
    pub fn new() -> Self {
        Cfsa2Serializer {
            filler: DEFAULT_FILLER,
            annotation: DEFAULT_ANNOTATION,
            with_numbers: false,
        }
    }
}

impl Default for Cfsa2Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FsaSerializer for Cfsa2Serializer {
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

        let mut frequencies = [0u64; 256];
        for &node in &order {
            let mut arc = fsa.first_arc(node);
            while arc != 0 {
                frequencies[usize::from(fsa.arc_label(arc))] += 1;
                arc = fsa.next_arc(arc);
            }
        }
        let mut ranked: Vec<u8> = Vec::new();
        for label in 0..=255u8 {
            if frequencies[usize::from(label)] > 0 {
                ranked.push(label);
            }
        }
        ranked.sort_by_key(|&label| (Reverse(frequencies[usize::from(label)]), label));
        ranked.truncate(LABEL_INDEX_SIZE);
        let mut label_index = [0u8; 256];
        for (slot, &label) in ranked.iter().enumerate() {
            label_index[usize::from(label)] = slot as u8 + 1;
        }
        let mut label_mapping = vec![0u8];
        label_mapping.extend_from_slice(&ranked);

        let offsets = layout(fsa, &order, &counts, &label_index, self.with_numbers)?;

        let mut image = Vec::new();
        format::write_header(
            &Header {
                version: VERSION,
                filler: self.filler,
                annotation: self.annotation,
                gtl: 0,
            },
            &mut image,
        )?;
        image.extend_from_slice(&self.flags().bits().to_be_bytes());
        image.push(label_mapping.len() as u8);
        image.extend_from_slice(&label_mapping);

        // epsilon node; an empty automaton keeps its target at 0
        if self.with_numbers {
            write_vint(&mut image, 0);
        }
        let root_offset = offsets.get(&root).copied().unwrap_or(0);
        emit_arc(&mut image, b'^', BIT_LAST_ARC, root_offset, &label_index);

        for &node in &order {
            if self.with_numbers {
                write_vint(&mut image, counts.get(&node).copied().unwrap_or(0));
            }
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
                emit_arc(&mut image, fsa.arc_label(arc), bits, target, &label_index);
                arc = next;
            }
        }

        out.write_all(&image)?;
        Ok(())
    }
}

/// Assign every arc-bearing node its offset in the arcs region.
///
/// A node's size depends on the v-int widths of its targets, which depend
/// on the offsets being assigned. Offsets never shrink between sweeps, so
/// the sizes are monotone and the iteration reaches a fixed point.
fn layout<F: Fsa>(
    fsa: &F,
    order: &[u32],
    counts: &HashMap<u32, u32>,
    label_index: &[u8; 256],
    with_numbers: bool,
) -> Result<HashMap<u32, u32>, SerializeError> {
    let mut offsets: HashMap<u32, u32> = HashMap::with_capacity(order.len());
    loop {
        let mut changed = false;
        let root_offset = offsets.get(&fsa.root_node()).copied().unwrap_or(0);
        let mut cursor = u64::from(epsilon_size(label_index, root_offset, with_numbers));
        for &node in order {
            if cursor > u64::from(u32::MAX) {
                return Err(SerializeError::AddressOverflow);
            }
            let offset = cursor as u32;
            if offsets.insert(node, offset) != Some(offset) {
                changed = true;
            }
            cursor += u64::from(node_size(fsa, node, counts, label_index, &offsets, with_numbers));
        }
        if !changed {
            return Ok(offsets);
        }
    }
}

fn epsilon_size(label_index: &[u8; 256], root_offset: u32, with_numbers: bool) -> u32 {
    let mut size = if with_numbers { vint_length(0) } else { 0 };
    size += 1;
    if label_index[usize::from(b'^')] == 0 {
        size += 1;
    }
    size += vint_length(root_offset);
    size as u32
}

fn node_size<F: Fsa>(
    fsa: &F,
    node: u32,
    counts: &HashMap<u32, u32>,
    label_index: &[u8; 256],
    offsets: &HashMap<u32, u32>,
    with_numbers: bool,
) -> u32 {
    let mut size = 0;
    if with_numbers {
        size += vint_length(counts.get(&node).copied().unwrap_or(0));
    }
    let mut arc = fsa.first_arc(node);
    while arc != 0 {
        size += 1;
        if label_index[usize::from(fsa.arc_label(arc))] == 0 {
            size += 1;
        }
        let target = if fsa.is_arc_terminal(arc) {
            0
        } else {
            offsets.get(&fsa.end_node(arc)).copied().unwrap_or(0)
        };
        size += vint_length(target);
        arc = fsa.next_arc(arc);
    }
    size as u32
}

fn emit_arc(image: &mut Vec<u8>, label: u8, flag_bits: u8, target: u32, label_index: &[u8; 256]) {
    let index = label_index[usize::from(label)];
    image.push(flag_bits | index);
    if index == 0 {
        image.push(label);
    }
    write_vint(image, target);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::view::FsaView;
    use fsadict::cfsa2::Cfsa2;
    use fsadict::format::parse_header;

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
        Cfsa2Serializer::new().serialize(&view, &mut image).unwrap();
        let fsa = Cfsa2::from_bytes(&image).unwrap();
        assert_eq!(
            language(&fsa),
            vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]
        );
        assert!(!fsa.flags().contains(FsaFlags::NUMBERS));
    }

    #[test]
    fn most_frequent_label_fills_first_slot() {
        let automaton = byte_automaton(&[b"aa", b"ab", b"ac"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Cfsa2Serializer::new().serialize(&view, &mut image).unwrap();
        // preamble and flags take ten bytes; the mapping length follows
        assert_eq!(image[10], 4);
        assert_eq!(image[11], 0);
        assert_eq!(image[12], b'a');
        let fsa = Cfsa2::from_bytes(&image).unwrap();
        assert_eq!(
            language(&fsa),
            vec![b"aa".to_vec(), b"ab".to_vec(), b"ac".to_vec()]
        );
    }

    #[test]
    fn mapping_is_capped_with_explicit_overflow_labels() {
        let words: Vec<Vec<u8>> = (0x20u8..0x48).map(|label| vec![label]).collect();
        let mut automaton = Automaton::new();
        for (i, word) in words.iter().enumerate() {
            automaton.add(word, i as u32);
        }
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Cfsa2Serializer::new().serialize(&view, &mut image).unwrap();
        assert_eq!(usize::from(image[10]), LABEL_INDEX_SIZE + 1);
        let fsa = Cfsa2::from_bytes(&image).unwrap();
        assert_eq!(language(&fsa), words);
    }

    #[test]
    fn stores_right_language_counts() {
        let automaton = byte_automaton(&[b"a", b"ab", b"b"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Cfsa2Serializer::new()
            .with_right_language_counts()
            .serialize(&view, &mut image)
            .unwrap();
        let fsa = Cfsa2::from_bytes(&image).unwrap();
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
        Cfsa2Serializer::new().serialize(&view, &mut image).unwrap();
        let fsa = Cfsa2::from_bytes(&image).unwrap();
        assert_eq!(fsa.root_node(), 0);
        assert_eq!(fsa.sequences().count(), 0);
    }

    #[test]
    fn reserializes_empty_image_with_stored_counts() {
        let automaton: Automaton<u8, u32> = Automaton::new();
        let view = FsaView::new(&automaton);
        let mut first = Vec::new();
        Cfsa2Serializer::new()
            .with_right_language_counts()
            .serialize(&view, &mut first)
            .unwrap();
        // the decoded image reports node 0 as its root
        let fsa = Cfsa2::from_bytes(&first).unwrap();
        assert_eq!(fsa.root_node(), 0);
        let mut second = Vec::new();
        Cfsa2Serializer::new()
            .with_right_language_counts()
            .serialize(&fsa, &mut second)
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(Cfsa2::from_bytes(&second).unwrap().sequences().count(), 0);
    }

    #[test]
    fn custom_header_bytes() {
        let automaton = byte_automaton(&[b"a"]);
        let view = FsaView::new(&automaton);
        let mut image = Vec::new();
        Cfsa2Serializer::new()
            .with_filler(b'!')
            .with_annotation_separator(b'@')
            .serialize(&view, &mut image)
            .unwrap();
        let header = parse_header(&image).unwrap();
        assert_eq!(header.filler, b'!');
        assert_eq!(header.annotation, b'@');
        assert_eq!(header.gtl, 0);
        let fsa = Cfsa2::from_bytes(&image).unwrap();
        assert_eq!(fsa.filler(), b'!');
        assert_eq!(fsa.annotation(), b'@');
    }

    #[test]
    fn output_is_deterministic() {
        let automaton = byte_automaton(&[b"mare", b"marek", b"mars", b"m"]);
        let view = FsaView::new(&automaton);
        let mut first = Vec::new();
        let mut second = Vec::new();
        Cfsa2Serializer::new().serialize(&view, &mut first).unwrap();
        Cfsa2Serializer::new().serialize(&view, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
