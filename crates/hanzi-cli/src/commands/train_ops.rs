use std::path::Path;
use std::process;
use std::time::Instant;

use hanzi_engine::Engine;

use super::ModelOptions;

pub fn train(corpus: &str, store: &str, opts: &ModelOptions) {
    let settings = opts.settings();
    let segmenter = opts.segmenter(&settings, true);
    let mut engine =
        Engine::new(segmenter, opts.transliterator()).with_settings(settings.clone());

    let start = Instant::now();
    let summary = die!(
        engine.train(Path::new(corpus)),
        "Error training from {corpus}: {}"
    );
    die!(engine.save(Path::new(store)), "Error writing {store}: {}");

    eprintln!(
        "Trained {} lines ({} skipped) in {:.1}s [mode={:?}, max_word_len={}]",
        summary.lines,
        summary.skipped,
        start.elapsed().as_secs_f64(),
        settings.model.mode,
        settings.max_unit_len(),
    );
    println!(
        "initial={} emission={} transition={} -> {store}",
        summary.initial, summary.emission, summary.transition
    );
}
