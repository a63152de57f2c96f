
// imports
use crate::normalize::{CorpusWeighting, Weighting};
use crate::relations::{PairFormat, RelatumOrder, SimColumn, Symmetry};

use serde_json::Value;
use std::error::Error;
use std::fmt::Display;
use std::fs;

/// The normalization pass applied by one pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    None,
    MinMax,
    Prob,
    EfreqRfreq,
    EfreqRnum,
    EfreqCfreq,
    EfreqCfreqRnum,
    Pnum,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::None => "none",
            Mode::MinMax => "minmax",
            Mode::Prob => "prob",
            Mode::EfreqRfreq => "efreq-rfreq",
            Mode::EfreqRnum => "efreq-rnum",
            Mode::EfreqCfreq => "efreq-cfreq",
            Mode::EfreqCfreqRnum => "efreq-cfreq-rnum",
            Mode::Pnum => "pnum",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug)]
pub struct Params {
    pub relations_file: String,
    pub output_file: String,
    pub mode: Mode,
    pub freq_file: Option<String>,
    pub patterns_file: Option<String>,
    pub sim_file: Option<String>,
    pub alpha: f64,
    pub min_freq: f64,
    pub corpus_weighting: CorpusWeighting,
    pub weighting: Weighting,
    pub symmetry: Symmetry,
    pub pair_format: PairFormat,
    pub relatum_order: RelatumOrder,
    pub sim_column: SimColumn,
    pub distractors_for: Option<String>,
    pub seed: Option<u64>,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "using parameters:
        relations_file: {}
        output_file: {}
        mode: {}
        freq_file: {:?}
        patterns_file: {:?}
        sim_file: {:?}
        alpha: {}
        min_freq: {}
        corpus_weighting: {:?}
        weighting: {:?}
        symmetry: {:?}
        pair_format: {:?}
        relatum_order: {:?}
        sim_column: {:?}
        seed: {:?}",
            self.relations_file,
            self.output_file,
            self.mode,
            self.freq_file,
            self.patterns_file,
            self.sim_file,
            self.alpha,
            self.min_freq,
            self.corpus_weighting,
            self.weighting,
            self.symmetry,
            self.pair_format,
            self.relatum_order,
            self.sim_column,
            self.seed
        )
    }
}

pub struct Config {
    params: Params,
}

impl Config {
    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    /// Builds the run configuration from the command line: a single argument
    /// naming a json file with the run parameters. Missing optional keys get
    /// defaults; a wrong mode or corpus weighting is an error.
    pub fn new(args: &[String]) -> Result<Config, Box<dyn Error>> {
        if args.len() != 2 {
            return Err("input should be a path to a json file only".into());
        }

        let f = fs::File::open(&args[1])?;
        let json: Value = serde_json::from_reader(f)?;

        let relations_file = json
            .get("relations_file")
            .and_then(|v| v.as_str())
            .ok_or("relations_file was not supplied through json")?
            .to_owned();
        let output_file = json
            .get("output_file")
            .and_then(|v| v.as_str())
            .ok_or("output_file was not supplied through json")?
            .to_owned();

        let mode = match json.get("mode").and_then(|v| v.as_str()).unwrap_or("none") {
            "none" => Mode::None,
            "minmax" => Mode::MinMax,
            "prob" => Mode::Prob,
            "efreq-rfreq" => Mode::EfreqRfreq,
            "efreq-rnum" => Mode::EfreqRnum,
            "efreq-cfreq" => Mode::EfreqCfreq,
            "efreq-cfreq-rnum" => Mode::EfreqCfreqRnum,
            "pnum" => Mode::Pnum,
            other => return Err(format!("unrecognized mode '{}'", other).into()),
        };

        let corpus_weighting = match json.get("cfreq_type").and_then(|v| v.as_i64()).unwrap_or(1) {
            1 => CorpusWeighting::Freq,
            2 => CorpusWeighting::Prob,
            3 => CorpusWeighting::LogProb,
            other => return Err(format!("wrong type of normalization '{}'", other).into()),
        };

        let opt_str = |key: &str| json.get(key).and_then(|v| v.as_str()).map(|s| s.to_owned());
        let flag = |key: &str| json.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

        let params = Params {
            relations_file,
            output_file,
            mode,
            freq_file: opt_str("freq_file"),
            patterns_file: opt_str("patterns_file"),
            sim_file: opt_str("sim_file"),
            alpha: json.get("alpha").and_then(|v| v.as_f64()).unwrap_or(10.0),
            min_freq: json.get("min_freq").and_then(|v| v.as_f64()).unwrap_or(1.0),
            corpus_weighting,
            weighting: if flag("sqrt_weighting") { Weighting::Sqrt } else { Weighting::Linear },
            symmetry: if flag("add_symmetric") { Symmetry::AddReverse } else { Symmetry::AsGiven },
            pair_format: if flag("bless") { PairFormat::Bless } else { PairFormat::Plain },
            relatum_order: if flag("sort_by_sim") { RelatumOrder::SimDescending } else { RelatumOrder::Insertion },
            sim_column: if flag("no_sim") { SimColumn::Omit } else { SimColumn::Write },
            distractors_for: opt_str("distractors_for"),
            seed: json.get("seed").and_then(|v| v.as_u64()),
        };

        Ok(Config { params })
    }
}
