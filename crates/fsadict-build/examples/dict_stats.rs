// Build an automaton from words given on the command line, serialize it into
// both binary versions and print statistics about the loaded results.
use fsadict::dispatch::AnyFsa;
use fsadict::{Fsa, info};
use fsadict_build::automaton::Automaton;
use fsadict_build::cfsa2_writer::Cfsa2Serializer;
use fsadict_build::fsa5_writer::Fsa5Serializer;
use fsadict_build::serialize::FsaSerializer;
use fsadict_build::view::FsaView;

fn main() {
    let mut words: Vec<String> = std::env::args().skip(1).collect();
    if words.is_empty() {
        words = ["mare", "marek", "mars", "do", "dog", "cat"]
            .iter()
            .map(|word| word.to_string())
            .collect();
    }

    let mut automaton = Automaton::new();
    for (i, word) in words.iter().enumerate() {
        automaton.add(word.as_bytes(), i as u32 + 1);
    }
    println!(
        "Built automaton: {} words, {} states",
        words.len(),
        automaton.state_count()
    );
    println!("\n{}", automaton.to_dot());

    let view = FsaView::new(&automaton);
    let mut fsa5 = Vec::new();
    Fsa5Serializer::new()
        .with_right_language_counts()
        .serialize(&view, &mut fsa5)
        .expect("Failed to serialize as version 5");
    let mut cfsa2 = Vec::new();
    Cfsa2Serializer::new()
        .serialize(&view, &mut cfsa2)
        .expect("Failed to serialize as version 0xC6");
    println!("Version 5 image: {} bytes", fsa5.len());
    println!("Version 0xC6 image: {} bytes", cfsa2.len());

    let fsa = AnyFsa::from_bytes(&fsa5).expect("Failed to load the version 5 image");
    let stats = info::fsa_info(&fsa);
    println!(
        "\nLoaded version {:#04x}: {} nodes, {} arcs ({} final)",
        fsa.version(),
        stats.node_count,
        stats.arc_count,
        stats.final_arc_count
    );
    println!(
        "Sequences from the root: {}",
        fsa.right_language_count(fsa.root_node())
    );

    println!("\nFan-outs:");
    for (fan_out, count) in info::fan_outs(&fsa) {
        println!("  {:3} arcs: {} nodes", fan_out, count);
    }

    println!("\nLanguage:");
    for sequence in fsa.sequences() {
        println!("  {}", String::from_utf8_lossy(&sequence));
    }
}
