/// Outcome meaning the first item of the pair is strictly preferred.
pub const ITEM_A_WINS: f64 = 0.0;

/// Outcome recorded for a draw.
pub const TIE: f64 = 0.5;

/// Outcome meaning the second item of the pair is strictly preferred.
pub const ITEM_B_WINS: f64 = 1.0;

/// Column headers of the pairs file, in on-disk order.
pub const PAIRS_COLUMNS: [&str; 3] = ["hash1", "hash2", "winner"];

/// Column headers of the dataset file, in on-disk order.
pub const DATASET_COLUMNS: [&str; 4] = ["hash", "param_path", "output_path", "video_path"];

/// Default location of the pairs file, relative to the working directory.
pub const DEFAULT_PAIRS_PATH: &str = "out/pairs.csv";

/// Default location of the dataset file, relative to the working directory.
pub const DEFAULT_DATASET_PATH: &str = "out/dataset.csv";
