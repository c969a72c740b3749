use std::fs;
use std::process;

pub fn settings_export() {
    print!("{}", hanzi_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        hanzi_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: model.mode={:?}, model.max_word_len={}, decoder.initial_candidates={}, decoder.deadline_ms={}",
        s.model.mode, s.model.max_word_len, s.decoder.initial_candidates, s.decoder.deadline_ms
    );
}

pub fn readings_validate(file: &str) {
    let table = die!(
        hanzi_core::text::TableTransliterator::from_file(std::path::Path::new(file)),
        "Error: {}"
    );
    println!("OK: {} characters", table.len());
}
