
// imports
use crate::config::{Config, Mode, Params};
use crate::normalize::NormalizeOutcome;
use crate::relations::RelationsCollection;
use crate::sampling::DistractorSampler;
use crate::vocabulary::{VocabFormat, Vocabulary};

use core::panic;
use rand::rngs::StdRng;
use rand::{thread_rng, SeedableRng};
use std::env;
use std::error::Error;
use std::time::Instant;

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> loading the relation collection (plus optional similarity merge)
    // -> one normalization pass and saving

    pub fn run() {

        println!("entering program...");
        let args: Vec<String> = env::args().collect();

        println!("building parameters...");
        let params = match Config::new(&args) {
            Ok(config) => config.get_params(),
            Err(e) => panic!("{}", e)
        };

        let timer = Instant::now();
        println!("{}", params);

        if let Err(e) = Pipeline::rerank(&params) {
            panic!("{}", e)
        }

        println!("finished reranking, saved relations. Took {} seconds ...", timer.elapsed().as_secs());
    }

    fn rerank(params: &Params) -> Result<(), Box<dyn Error>> {

        println!("loading relations...");
        let (mut relations, load_report) = RelationsCollection::from_file(&params.relations_file, params.symmetry)?;
        println!("{}", load_report);

        // external similarity scores replace the raw counts before reranking
        if let Some(sim_file) = &params.sim_file {
            let report = relations.merge_similarity(sim_file, params.pair_format)?;
            println!("{}", report);
        }

        println!("reranking with mode '{}'...", params.mode);
        let outcome = match params.mode {
            Mode::None => None,
            Mode::MinMax => Some(relations.rescale_min_max()),
            Mode::Prob => Some(relations.normalize_prob()),
            Mode::EfreqRfreq => Some(relations.rescale_branching_weight(params.alpha)),
            Mode::EfreqRnum => Some(relations.rescale_branching_count(params.min_freq)),
            Mode::EfreqCfreq => {
                let corpus = Pipeline::load_corpus(params)?;
                Some(relations.rescale_corpus_freq(&corpus, params.corpus_weighting))
            }
            Mode::EfreqCfreqRnum => {
                let corpus = Pipeline::load_corpus(params)?;
                Some(relations.rescale_corpus_freq_branching(&corpus, params.min_freq))
            }
            Mode::Pnum => {
                let patterns_file = params
                    .patterns_file
                    .as_ref()
                    .ok_or("mode 'pnum' needs a patterns_file")?;
                Some(relations.weight_by_patterns(patterns_file, params.pair_format, params.weighting)?)
            }
        };
        match outcome {
            Some(NormalizeOutcome::Applied(report)) => println!("{}", report),
            Some(NormalizeOutcome::AlreadyNormalized) => println!("skipped: already normalized"),
            None => println!("keeping raw scores"),
        }

        // side channel for inspection runs: distractors for one target word
        if let Some(target) = &params.distractors_for {
            let distractors = match params.seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let sampler = DistractorSampler::new(&relations, &mut rng);
                    sampler.sample(&relations, target, &mut rng)
                }
                None => {
                    let mut rng = thread_rng();
                    let sampler = DistractorSampler::new(&relations, &mut rng);
                    sampler.sample(&relations, target, &mut rng)
                }
            };
            println!("distractors for '{}': {}", target, distractors.join(", "));
        }

        relations.save(&params.output_file, params.sim_column, params.relatum_order)?;
        Ok(())
    }

    fn load_corpus(params: &Params) -> Result<Vocabulary, Box<dyn Error>> {
        let freq_file = params
            .freq_file
            .as_ref()
            .ok_or("this mode needs a freq_file with corpus frequencies")?;
        // a missing file is tolerated here, the load reports it and the
        // normalizer falls back to mean statistics
        let (corpus, report) = Vocabulary::load(freq_file, VocabFormat::Plain)?;
        println!("{}", report);
        Ok(corpus)
    }
}
