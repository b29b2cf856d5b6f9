use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;
use nextchar_core::{BOUNDARY_CHAR, Predictor, PredictorSettings};
use nextchar_core::model::corpus::CorpusTable;

#[derive(Parser)]
#[command(name = "nextchar-exemple", about = "Type one character per line and watch the ranking adapt")]
struct Args {
    /// Corpus file of `word|count` lines
    #[arg(short, long, default_value = "./data/freqs.dat")]
    corpus: PathBuf,

    /// Also reinforce the longest ranking context when learning
    #[arg(long)]
    symmetric: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Load the corpus (a "freqs.bin" cache is written next to it on first load)
    let corpus = CorpusTable::open(&args.corpus)?;
    info!("Corpus holds {} contexts", corpus.len());

    // The symmetric variant also learns contexts of the full lookback length
    let mut settings = PredictorSettings::default();
    settings.symmetric_learning = args.symmetric;

    // The history starts with a single boundary character
    let mut predictor = Predictor::with_settings(corpus.into(), settings);

    println!("Type a character and press Enter (empty line = space, ':q' to quit)");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        // Best candidates first; '_' stands for space / punctuation
        let ranking: String = predictor.predictions().into_iter().collect();
        println!("[{}] {}", predictor.history().trim_start(), ranking);
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line == ":q" {
            break;
        }

        // Only the first character counts, '_' is typed as a space
        let typed = match line.chars().next() {
            None | Some(BOUNDARY_CHAR) => ' ',
            Some(c) => c,
        };
        predictor.accept(typed);
    }

    Ok(())
}
