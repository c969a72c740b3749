use std::path::Path;
use std::process;

use hanzi_core::evaluate::read_test_words;
use hanzi_core::store::{MemoryStore, ProbabilityStore};

use super::ModelOptions;

/// How test words are picked for `accuracy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampling {
    pub size: Option<usize>,
    /// Random rounds; `None` scores the first `size` words once.
    pub rounds: Option<usize>,
    pub seed: u64,
}

pub fn accuracy(
    store: &str,
    test_file: &str,
    sampling: Sampling,
    json: bool,
    opts: &ModelOptions,
) {
    let engine = opts.open_engine(store);
    let words = die!(
        read_test_words(Path::new(test_file)),
        "Error reading {test_file}: {}"
    );
    if let Some(n) = sampling.size {
        if n > words.len() {
            eprintln!(
                "Error: --size {n} exceeds the {} words in {test_file}",
                words.len()
            );
            process::exit(1);
        }
    }
    let report = match sampling.rounds {
        Some(rounds) => {
            let size = sampling.size.unwrap_or(words.len());
            die!(
                engine.evaluate_rounds(&words, size, rounds, sampling.seed),
                "Error: {}"
            )
        }
        None => die!(engine.evaluate(&words, sampling.size), "Error: {}"),
    };

    if json {
        let out = die!(serde_json::to_string_pretty(&report), "Error: {}");
        println!("{out}");
        return;
    }
    println!("Words:     {} ({} skipped)", report.words, report.skipped);
    println!("Exact:     {} ({:.2}%)", report.exact, report.exact_rate() * 100.0);
    println!("Accuracy:  {:.2}%", report.accuracy() * 100.0);
}

pub fn stats(store: &str, json: bool) {
    let opened = die!(
        MemoryStore::open(Path::new(store)),
        "Error opening store {store}: {}"
    );
    let stats = die!(opened.stats(), "Error: {}");
    if json {
        let out = die!(serde_json::to_string_pretty(&stats), "Error: {}");
        println!("{out}");
        return;
    }
    println!("Store:       {store}");
    println!("Initial:     {}", stats.initial);
    println!("Emission:    {}", stats.emission);
    println!("Transition:  {}", stats.transition);
}
