use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use hanzi_cli::commands::{config_ops, decode_ops, eval_ops, train_ops, ModelOptions};
use hanzi_core::settings::ModelMode;

#[derive(Parser)]
#[command(name = "hanzitool", about = "Pinyin to hanzi model tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Segmented words of up to --word-len characters
    Word,
    /// Single characters
    Char,
}

impl From<Mode> for ModelMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Word => ModelMode::Word,
            Mode::Char => ModelMode::Char,
        }
    }
}

#[derive(clap::Args)]
struct ModelArgs {
    /// Settings TOML (defaults built in)
    #[arg(long)]
    config: Option<String>,
    /// Character readings TOML used instead of the pinyin dictionary
    #[arg(long)]
    readings: Option<String>,
    /// Model granularity (overrides the settings file)
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Longest word unit in characters (overrides the settings file)
    #[arg(short = 'w', long)]
    word_len: Option<usize>,
}

impl From<ModelArgs> for ModelOptions {
    fn from(a: ModelArgs) -> Self {
        Self {
            config: a.config,
            readings: a.readings,
            mode: a.mode.map(Into::into),
            word_len: a.word_len,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a model from a tagged corpus (`<text> W|S` per line)
    Train {
        /// Corpus file
        corpus: String,
        /// Output store file
        #[arg(long)]
        store: String,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Decode pinyin (reads stdin line by line when no syllables are given)
    Decode {
        /// Store file
        #[arg(long)]
        store: String,
        /// Show units separated by `/` with the path score
        #[arg(long)]
        segments: bool,
        #[command(flatten)]
        model: ModelArgs,
        /// Pinyin syllables
        pinyin: Vec<String>,
    },
    /// Decode a file of pinyin lines
    Translate {
        /// Store file
        #[arg(long)]
        store: String,
        /// Input file, one pinyin sentence per line
        input: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Show units separated by `/` with the path score
        #[arg(long)]
        segments: bool,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Measure per-character accuracy on a word list
    Accuracy {
        /// Store file
        #[arg(long)]
        store: String,
        /// Test file; the first column of each line is the word
        test_file: String,
        /// Number of words to score: the first N usable words, or N random
        /// words per round with --rounds
        #[arg(long)]
        size: Option<usize>,
        /// Score this many random samples and sum them
        #[arg(long)]
        rounds: Option<usize>,
        /// Seed for --rounds sampling
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Show table sizes of a store
    Stats {
        /// Store file
        #[arg(long)]
        store: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Validate a character readings TOML file
    ReadingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            corpus,
            store,
            model,
        } => train_ops::train(&corpus, &store, &model.into()),
        Command::Decode {
            store,
            segments,
            model,
            pinyin,
        } => decode_ops::decode(&store, &pinyin, segments, &model.into()),
        Command::Translate {
            store,
            input,
            output,
            segments,
            model,
        } => decode_ops::translate(&store, &input, output.as_deref(), segments, &model.into()),
        Command::Accuracy {
            store,
            test_file,
            size,
            rounds,
            seed,
            json,
            model,
        } => eval_ops::accuracy(
            &store,
            &test_file,
            eval_ops::Sampling { size, rounds, seed },
            json,
            &model.into(),
        ),
        Command::Stats { store, json } => eval_ops::stats(&store, json),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::ReadingsValidate { file } => config_ops::readings_validate(&file),
    }
}
