use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::process;

use hanzi_engine::{DecodeError, Engine, EngineError};

use super::ModelOptions;

/// One output line for `pinyin`: the decoded text, or the units joined by
/// `/` with the path score when `segments` is set.
pub fn render(engine: &Engine, pinyin: &str, segments: bool) -> Result<String, EngineError> {
    if !segments {
        return engine.decode(pinyin);
    }
    match engine.decode_segments(pinyin) {
        Ok(path) => Ok(format!("{}\t{:.4}", path.segmented("/"), path.score)),
        Err(EngineError::Decode(DecodeError::EmptyInput))
        | Err(EngineError::Decode(DecodeError::NoViableSegmentation)) => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// Decode the given syllables, or every stdin line when none are given.
pub fn decode(store: &str, pinyin: &[String], segments: bool, opts: &ModelOptions) {
    let engine = opts.open_engine(store);

    if !pinyin.is_empty() {
        let line = die!(
            render(&engine, &pinyin.join(" "), segments),
            "Error: {}"
        );
        println!("{line}");
        return;
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        eprintln!("Enter pinyin, one sentence per line (Ctrl-D to quit).");
        prompt();
    }
    for line in stdin.lock().lines() {
        let line = die!(line, "Error reading stdin: {}");
        let out = die!(render(&engine, &line, segments), "Error: {}");
        println!("{out}");
        if interactive {
            prompt();
        }
    }
}

fn prompt() {
    eprint!("> ");
    let _ = io::stderr().flush();
}

/// Decode `input` line by line into `output` (stdout when absent). Line
/// count and order are preserved; undecodable lines become empty.
pub fn translate(
    store: &str,
    input: &str,
    output: Option<&str>,
    segments: bool,
    opts: &ModelOptions,
) {
    let engine = opts.open_engine(store);
    let reader = BufReader::new(die!(File::open(input), "Error opening {input}: {}"));
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(die!(
            File::create(path),
            "Error creating {path}: {}"
        ))),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut count = 0usize;
    let mut empty = 0usize;
    for line in reader.lines() {
        let line = die!(line, "Error reading {input}: {}");
        let out = die!(render(&engine, &line, segments), "Error: {}");
        if out.is_empty() && !line.trim().is_empty() {
            empty += 1;
        }
        die!(writeln!(writer, "{out}"), "Error writing output: {}");
        count += 1;
    }
    die!(writer.flush(), "Error writing output: {}");
    eprintln!("Translated {count} lines ({empty} undecodable)");
}

#[cfg(test)]
mod tests {
    use hanzi_engine::{CorpusLine, DataKind, TableTransliterator};

    use super::*;

    fn engine() -> Engine {
        let readings = TableTransliterator::from_pairs([
            ('中', vec!["zhong"]),
            ('国', vec!["guo"]),
            ('人', vec!["ren"]),
        ]);
        let mut engine = Engine::new(Box::new(hanzi_engine::CharSegmenter), Box::new(readings));
        engine
            .train_lines(&[
                CorpusLine::new("中国", DataKind::Word),
                CorpusLine::new("中国人", DataKind::Word),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn render_plain_and_segmented() {
        let engine = engine();
        assert_eq!(render(&engine, "zhong guo", false).unwrap(), "中国");
        let seg = render(&engine, "zhong guo", true).unwrap();
        assert!(seg.starts_with("中国\t"), "{seg}");
    }

    #[test]
    fn render_failures_are_empty_lines() {
        let engine = engine();
        assert_eq!(render(&engine, "", true).unwrap(), "");
        assert_eq!(render(&engine, "xyz", true).unwrap(), "");
        assert_eq!(render(&engine, "xyz", false).unwrap(), "");
    }
}
