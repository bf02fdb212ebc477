mod config;
mod logging;
mod output;

use clap::Parser;
use pairlabel_core::constants::{DEFAULT_DATASET_PATH, DEFAULT_PAIRS_PATH, ITEM_A_WINS, ITEM_B_WINS, TIE};
use pairlabel_core::{
    exposure_counts, CsvItemStore, CsvPairsFile, PairsStore, Submission, TrainingView,
};
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "pairlabel", version, about = "Collect pairwise preference judgments between simulation outputs")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GlobalArgs {
    /// Pairs file (default: out/pairs.csv)
    #[arg(long, global = true)]
    pairs_path: Option<PathBuf>,

    /// Dataset file mapping item hashes to output files (default: out/dataset.csv)
    #[arg(long, global = true)]
    dataset_path: Option<PathBuf>,

    /// Seed for tie-breaking when pending pairs are reordered
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Path to config file (default: ~/.config/pairlabel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add pairs (optionally already judged) and reorder pending pairs
    Add(AddArgs),
    /// Record a judgment: OUTCOME is 0..1, or "first", "second", "tie"
    Judge {
        item_a: String,
        item_b: String,
        #[arg(value_parser = parse_outcome, allow_hyphen_values = true)]
        outcome: f64,
    },
    /// Print the next pair waiting for a judgment
    Next,
    /// Print the most recently judged pair
    Last,
    /// Show pair counts and per-item pending exposure
    Stats {
        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
        /// How many items to list at each end of the exposure table
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Reorder pending pairs without adding anything
    Resort,
    /// Mark every pair as pending again
    ResetRankings,
    /// Delete every pair
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write judged pairs as (output_a, output_b, outcome) JSON lines
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create a default config file at ~/.config/pairlabel/config.toml
    Init,
}

#[derive(clap::Args)]
struct AddArgs {
    /// File with one `item_a,item_b[,outcome]` per line
    #[arg(long)]
    pairs: Option<PathBuf>,

    /// Inline pair `item_a,item_b[,outcome]` (repeatable)
    #[arg(long = "pair")]
    inline_pairs: Vec<String>,
}

/// Settings after merging config file and CLI args (CLI wins).
struct Settings {
    pairs_path: PathBuf,
    dataset_path: PathBuf,
    seed: Option<u64>,
}

/// Parse an outcome: a number in [0, 1] or one of the named verdicts.
fn parse_outcome(value: &str) -> Result<f64, String> {
    let outcome = match value.trim().to_ascii_lowercase().as_str() {
        "first" | "a" => ITEM_A_WINS,
        "second" | "b" => ITEM_B_WINS,
        "tie" | "draw" => TIE,
        other => other
            .parse::<f64>()
            .map_err(|_| format!("\"{value}\" is not a number or one of first/second/tie"))?,
    };
    if !(0.0..=1.0).contains(&outcome) {
        return Err(format!("outcome {outcome} must be in [0, 1]"));
    }
    Ok(outcome)
}

/// Parse one `item_a,item_b[,outcome]` line. An empty outcome field means pending.
fn parse_submission(line: &str) -> Result<Submission, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    match fields.as_slice() {
        [a, b] | [a, b, ""] if !a.is_empty() && !b.is_empty() => Ok(Submission::pending(*a, *b)),
        [a, b, w] if !a.is_empty() && !b.is_empty() => {
            Ok(Submission::new(*a, *b, Some(parse_outcome(w)?)))
        }
        _ => Err(format!("expected item_a,item_b[,outcome], got \"{line}\"")),
    }
}

/// Parse a pairs listing, skipping blank lines and `#` comments.
fn parse_submissions(content: &str) -> Result<Vec<Submission>, String> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .map(|(i, l)| parse_submission(l).map_err(|e| format!("line {}: {e}", i + 1)))
        .collect()
}

/// Load submissions from all sources: --pairs file, --pair inline args, or stdin.
fn load_submissions(args: &AddArgs) -> Vec<Submission> {
    let mut submissions = Vec::new();

    if let Some(ref path) = args.pairs {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read pairs file {}: {e}", path.display())));
        submissions = parse_submissions(&content)
            .unwrap_or_else(|e| bail(format!("{}: {e}", path.display())));
    }

    for pair in &args.inline_pairs {
        submissions.push(parse_submission(pair).unwrap_or_else(|e| bail(format!("--pair: {e}"))));
    }

    // From stdin (only if no file and no inline pairs)
    if args.pairs.is_none() && args.inline_pairs.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail("No pairs provided. Use --pairs <file>, --pair <a,b[,outcome]>, or pipe pairs via stdin.");
        }
        let content: String = stdin
            .lock()
            .lines()
            .map(|l| l.unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}"))))
            .collect::<Vec<_>>()
            .join("\n");
        submissions = parse_submissions(&content).unwrap_or_else(|e| bail(format!("stdin: {e}")));
    }

    submissions
}

fn open_pairs(settings: &Settings) -> PairsStore<CsvPairsFile> {
    let store = PairsStore::open_csv(&settings.pairs_path).unwrap_or_else(|e| bail(e));
    match settings.seed {
        Some(seed) => store.with_seed(seed),
        None => store,
    }
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.global.config.clone().unwrap_or_else(config::config_path);

    if let Commands::Init = cli.command {
        config::create_default_config(&config_path);
        println!("Created config at {}", config_path.display());
        println!("Edit it to set your default pairs and dataset paths.");
        return;
    }

    let cfg = config::load_config(&config_path);
    logging::init_tracing(cfg.log_level.as_deref(), cli.global.verbose);

    let settings = Settings {
        pairs_path: cli.global.pairs_path
            .or(cfg.pairs_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PAIRS_PATH)),
        dataset_path: cli.global.dataset_path
            .or(cfg.dataset_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH)),
        seed: cli.global.seed.or(cfg.seed),
    };
    tracing::debug!(pairs = %settings.pairs_path.display(), "Using pairs file");

    run(cli.command, &settings);
}

fn run(command: Commands, settings: &Settings) {
    match command {
        Commands::Add(args) => {
            let submissions = load_submissions(&args);
            let mut store = open_pairs(settings);
            let before = store.total_count();
            store.upsert_pairs(&submissions).unwrap_or_else(|e| bail(e));
            println!(
                "Submitted {} pairs ({} new). {} pending, {} ranked.",
                submissions.len(),
                store.total_count() - before,
                store.pending_count(),
                store.ranked_count(),
            );
        }
        Commands::Judge { item_a, item_b, outcome } => {
            let mut store = open_pairs(settings);
            store.set_winner(&item_a, &item_b, outcome).unwrap_or_else(|e| bail(e));
            println!("{} pending, {} ranked.", store.pending_count(), store.ranked_count());
        }
        Commands::Next => {
            let store = open_pairs(settings);
            println!("{}", output::format_pair(store.next_pending()));
        }
        Commands::Last => {
            let store = open_pairs(settings);
            println!("{}", output::format_pair(store.last_ranked()));
        }
        Commands::Stats { json, top } => {
            let store = open_pairs(settings);
            let stats = output::Stats {
                total: store.total_count(),
                pending: store.pending_count(),
                ranked: store.ranked_count(),
                next_pending: store.next_pending(),
                last_ranked: store.last_ranked(),
                exposure: exposure_counts(store.records()),
            };
            if json {
                output::print_stats_json(&stats, top);
            } else {
                output::print_stats_table(&stats, top);
            }
        }
        Commands::Resort => {
            let mut store = open_pairs(settings);
            store.resort().unwrap_or_else(|e| bail(e));
            println!("Reordered {} pending pairs.", store.pending_count());
        }
        Commands::ResetRankings => {
            let mut store = open_pairs(settings);
            store.reset_rankings().unwrap_or_else(|e| bail(e));
            println!("All {} pairs are pending again.", store.total_count());
        }
        Commands::Reset { yes } => {
            if !yes {
                bail("Refusing to delete all pairs without --yes.");
            }
            let mut store = open_pairs(settings);
            let removed = store.total_count();
            store.reset().unwrap_or_else(|e| bail(e));
            println!("Deleted {removed} pairs.");
        }
        Commands::Export { out } => {
            let store = open_pairs(settings);
            let items = CsvItemStore::open(&settings.dataset_path).unwrap_or_else(|e| bail(e));
            let view = TrainingView::build(&store, &items).unwrap_or_else(|e| bail(e));

            let result = match out {
                Some(ref path) => std::fs::File::create(path)
                    .and_then(|file| output::write_triplets_jsonl(&view, &mut io::BufWriter::new(file))),
                None => output::write_triplets_jsonl(&view, &mut io::stdout().lock()),
            };
            result.unwrap_or_else(|e| bail(format!("Failed to write training triplets: {e}")));

            if let Some(path) = out {
                eprintln!(
                    "Wrote {} triplets over {} items to {}",
                    view.len(),
                    view.item_count(),
                    path.display()
                );
            }
        }
        Commands::Init => unreachable!("handled before settings are loaded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcome_named_and_numeric() {
        assert_eq!(parse_outcome("first"), Ok(0.0));
        assert_eq!(parse_outcome("Second"), Ok(1.0));
        assert_eq!(parse_outcome("tie"), Ok(0.5));
        assert_eq!(parse_outcome("0.3"), Ok(0.3));
        assert!(parse_outcome("1.5").is_err());
        assert!(parse_outcome("-1").is_err());
        assert!(parse_outcome("maybe").is_err());
    }

    #[test]
    fn test_parse_submission_forms() {
        assert_eq!(parse_submission("a,b"), Ok(Submission::pending("a", "b")));
        assert_eq!(parse_submission(" a , b , "), Ok(Submission::pending("a", "b")));
        assert_eq!(parse_submission("b,a,1"), Ok(Submission::new("b", "a", Some(1.0))));
        assert_eq!(parse_submission("b,a,tie"), Ok(Submission::new("b", "a", Some(0.5))));
        assert!(parse_submission("a").is_err());
        assert!(parse_submission(",b").is_err());
        assert!(parse_submission("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_submissions_skips_comments_and_reports_line() {
        let parsed = parse_submissions("# header\n\na,b\nc,d,0\n").unwrap();
        assert_eq!(parsed.len(), 2);

        let err = parse_submissions("a,b\n\nbad\n").unwrap_err();
        assert!(err.starts_with("line 3:"), "{err}");
    }

    #[test]
    fn test_cli_parses_judge_with_named_outcome() {
        let cli = Cli::try_parse_from(["pairlabel", "judge", "h1", "h2", "second"]).unwrap();
        match cli.command {
            Commands::Judge { item_a, item_b, outcome } => {
                assert_eq!((item_a.as_str(), item_b.as_str(), outcome), ("h1", "h2", 1.0));
            }
            _ => panic!("expected judge"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pairlabel", "stats", "--json", "--pairs-path", "p.csv", "--seed", "3"])
            .unwrap();
        assert_eq!(cli.global.pairs_path, Some(PathBuf::from("p.csv")));
        assert_eq!(cli.global.seed, Some(3));
        assert!(matches!(cli.command, Commands::Stats { json: true, top: 5 }));
    }
}
