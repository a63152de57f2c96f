
// imports
use crate::relations::{PairFormat, PatternMergeReport, RelationsCollection};
use crate::vocabulary::Vocabulary;

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// Which corpus statistic drives the frequency rescale.
/// Freq divides by summed raw frequencies, Prob by summed term probabilities
/// after probability-normalizing the relation scores, LogProb additionally
/// takes -ln of the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorpusWeighting {
    Freq,
    Prob,
    LogProb,
}

/// Multiplier applied in the pattern-count weighting pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weighting {
    Linear,
    Sqrt,
}

/// Counters collected by a normalization pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizeReport {
    /// pairs with at least one endpoint missing from the corpus vocabulary
    pub missing_words: usize,
    /// relatums whose own branching value was unavailable (asymmetric input)
    pub asymmetric_terms: usize,
    /// pairs where neither endpoint had a branching value
    pub unresolved_terms: usize,
    /// min-max rescale hit max == min
    pub degenerate: bool,
    pub patterns: Option<PatternMergeReport>,
}

impl Display for NormalizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing words={}, asymmetric terms={}, unresolved terms={}, degenerate={}",
            self.missing_words, self.asymmetric_terms, self.unresolved_terms, self.degenerate
        )
    }
}

/// Result of a normalization pass. A collection is normalized by exactly one
/// pass; any further attempt is rejected without touching the scores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NormalizeOutcome {
    Applied(NormalizeReport),
    AlreadyNormalized,
}

impl NormalizeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, NormalizeOutcome::Applied(_))
    }
}

// every pass rescales each stored sim in place, flips the normalized flag,
// and refuses to run a second time
impl RelationsCollection {
    fn refuse_if_normalized(&self) -> bool {
        if self.is_normalized() {
            println!("the similarity scores of this relation collection are already normalized");
            return true;
        }
        false
    }

    /// Rescales all similarities to [0;1]: sim' = (sim - min) / (max - min).
    /// When every similarity is equal the range collapses; all scores become
    /// 0 and the report is flagged degenerate.
    pub fn rescale_min_max(&mut self) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        let mut report = NormalizeReport::default();

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (_, pairs) in self.iter() {
            for (_, info) in pairs {
                min = min.min(info.sim);
                max = max.max(info.sim);
            }
        }

        if min < max {
            self.for_each_pair_mut(|_, _, info| info.sim = (info.sim - min) / (max - min));
        } else {
            // all-equal (or empty) input carries no ranking information
            report.degenerate = true;
            self.for_each_pair_mut(|_, _, info| info.sim = 0.0);
        }

        self.set_normalized();
        NormalizeOutcome::Applied(report)
    }

    /// Rescales raw relation frequencies into a probability distribution over
    /// pairs: P(w_i,w_j) = r_ij / sum_ij(r_ij).
    pub fn normalize_prob(&mut self) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        self.prob_in_place();
        self.set_normalized();
        NormalizeOutcome::Applied(NormalizeReport::default())
    }

    // shared with the corpus-frequency passes, which probability-normalize
    // first without consuming the one-shot flag
    fn prob_in_place(&mut self) {
        let mut extractions = 0.0;
        for (_, pairs) in self.iter() {
            for (_, info) in pairs {
                extractions += info.sim;
            }
        }
        if extractions != 0.0 {
            self.for_each_pair_mut(|_, _, info| info.sim /= extractions);
        }
    }

    /// Summed outgoing similarity per target word, the weighted branching
    /// factor R used as a normalization denominator.
    pub fn relation_weights(&self) -> HashMap<String, f64> {
        let mut weights = HashMap::new();
        for (target, pairs) in self.iter() {
            let sum: f64 = pairs.iter().map(|(_, info)| info.sim).sum();
            weights.insert(target.to_owned(), sum);
        }
        weights
    }

    /// Number of outgoing pairs with sim of at least min_freq per target word,
    /// the counted branching factor B.
    pub fn branching_counts(&self, min_freq: f64) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for (target, pairs) in self.iter() {
            let n = pairs.iter().filter(|(_, info)| info.sim >= min_freq).count();
            counts.insert(target.to_owned(), n);
        }
        counts
    }

    /// Normalizes by the summed branching factor:
    /// sim' = 2*alpha*sim / (R(target) + R(relatum)).
    /// A relatum without its own R falls back to R(target) with a warning; a
    /// pair where neither is known reuses the previous iteration's value.
    pub fn rescale_branching_weight(&mut self, alpha: f64) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        let weights = self.relation_weights();
        let mut report = NormalizeReport::default();
        let mut prev = 1.0;

        self.for_each_pair_mut(|target, relatum, info| {
            let (target_w, relatum_w) = match (weights.get(target), weights.get(relatum)) {
                (Some(t), Some(r)) => (*t, *r),
                (Some(t), None) => {
                    println!(
                        "warning: input is not symmetric for word '{}', reranking may be wrong",
                        relatum
                    );
                    report.asymmetric_terms += 1;
                    (*t, *t)
                }
                _ => {
                    println!(
                        "error: can not compute relation frequency for '{}' and '{}', reranking may be wrong",
                        target, relatum
                    );
                    report.unresolved_terms += 1;
                    (prev, prev)
                }
            };
            info.sim = 2.0 * alpha * info.sim / (target_w + relatum_w);
            prev = target_w;
        });

        self.set_normalized();
        NormalizeOutcome::Applied(report)
    }

    /// Normalizes by the counted branching factor:
    /// sim' = 2*mean(B)*sim / (B(target) + B(relatum)), with B counting pairs
    /// of at least min_freq extractions. The 2*mean(B) factor only keeps the
    /// output readable and does not change the ranking. Same fallback chain as
    /// the weighted variant.
    pub fn rescale_branching_count(&mut self, min_freq: f64) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        let counts = self.branching_counts(min_freq);
        let mean_b = mean_count(&counts);
        let mut report = NormalizeReport::default();
        let mut prev = 1.0;

        self.for_each_pair_mut(|target, relatum, info| {
            let (target_b, relatum_b) = branching_pair(&counts, target, relatum, prev, &mut report);
            info.sim = 2.0 * mean_b * info.sim / (target_b + relatum_b);
            prev = target_b;
        });

        self.set_normalized();
        NormalizeOutcome::Applied(report)
    }

    /// Normalizes by word frequencies derived from a corpus.
    /// Freq:    sim' = sim / (f(target) + f(relatum))
    /// Prob:    sim' = P(sim) / (P(target) + P(relatum))
    /// LogProb: sim' = -ln(P(sim) / (P(target) + P(relatum)))
    /// where P(sim) comes from probability-normalizing the collection first.
    /// Out-of-vocabulary terms fall back to the corpus mean and are counted.
    pub fn rescale_corpus_freq(&mut self, corpus: &Vocabulary, weighting: CorpusWeighting) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        let mean_freq = corpus.mean_freq();
        println!("mean frequency={}", mean_freq);
        let mut report = NormalizeReport::default();

        match weighting {
            CorpusWeighting::Freq => {
                self.for_each_pair_mut(|target, relatum, info| {
                    let target_freq = corpus.freq(target).map(|f| f as f64);
                    let relatum_freq = corpus.freq(relatum).map(|f| f as f64);
                    if target_freq.is_none() || relatum_freq.is_none() {
                        report.missing_words += 1;
                    }
                    info.sim /= target_freq.unwrap_or(mean_freq) + relatum_freq.unwrap_or(mean_freq);
                });
            }
            CorpusWeighting::Prob | CorpusWeighting::LogProb => {
                let tokens = corpus.token_count();
                let mean_prob = if tokens > 0.0 { mean_freq / tokens } else { 0.0 };
                let probs = corpus.probabilities();
                self.prob_in_place();

                self.for_each_pair_mut(|target, relatum, info| {
                    let target_prob = probs.get(target).copied();
                    let relatum_prob = probs.get(relatum).copied();
                    if target_prob.is_none() || relatum_prob.is_none() {
                        report.missing_words += 1;
                    }
                    info.sim /= target_prob.unwrap_or(mean_prob) + relatum_prob.unwrap_or(mean_prob);
                    if weighting == CorpusWeighting::LogProb {
                        info.sim = -info.sim.ln();
                    }
                });
            }
        }

        println!("missing words={}", report.missing_words);
        self.set_normalized();
        NormalizeOutcome::Applied(report)
    }

    /// Composes the corpus-probability and counted-branching rescales in one
    /// pass: sim' = (2*mean(B)/(B(target)+B(relatum))) * (P(sim)/(P(target)+P(relatum))).
    pub fn rescale_corpus_freq_branching(&mut self, corpus: &Vocabulary, min_freq: f64) -> NormalizeOutcome {
        if self.refuse_if_normalized() {
            return NormalizeOutcome::AlreadyNormalized;
        }
        let counts = self.branching_counts(min_freq);
        let mean_b = mean_count(&counts);

        let tokens = corpus.token_count();
        let mean_prob = if tokens > 0.0 { corpus.mean_freq() / tokens } else { 0.0 };
        let probs = corpus.probabilities();
        self.prob_in_place();

        let mut report = NormalizeReport::default();
        let mut prev = 1.0;

        self.for_each_pair_mut(|target, relatum, info| {
            let target_prob = probs.get(target).copied();
            let relatum_prob = probs.get(relatum).copied();
            if target_prob.is_none() || relatum_prob.is_none() {
                report.missing_words += 1;
            }
            let (target_b, relatum_b) = branching_pair(&counts, target, relatum, prev, &mut report);
            info.sim = (2.0 * mean_b / (target_b + relatum_b))
                * (info.sim / (target_prob.unwrap_or(mean_prob) + relatum_prob.unwrap_or(mean_prob)));
            prev = target_b;
        });

        self.set_normalized();
        NormalizeOutcome::Applied(report)
    }

    /// Loads pattern counts from an external file and multiplies each sim by
    /// its patterns_num (Sqrt: by its square root) when positive.
    pub fn weight_by_patterns(
        &mut self,
        patterns_file: &str,
        format: PairFormat,
        weighting: Weighting,
    ) -> Result<NormalizeOutcome, Box<dyn Error>> {
        if self.refuse_if_normalized() {
            return Ok(NormalizeOutcome::AlreadyNormalized);
        }
        let merge = self.merge_pattern_counts(patterns_file, format)?;

        self.for_each_pair_mut(|_, _, info| {
            if info.patterns_num > 0 {
                let coeff = match weighting {
                    Weighting::Linear => info.patterns_num as f64,
                    Weighting::Sqrt => (info.patterns_num as f64).sqrt(),
                };
                info.sim *= coeff;
            }
        });

        self.set_normalized();
        Ok(NormalizeOutcome::Applied(NormalizeReport {
            patterns: Some(merge),
            ..Default::default()
        }))
    }
}

fn mean_count(counts: &HashMap<String, usize>) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    counts.values().sum::<usize>() as f64 / counts.len() as f64
}

// resolves the branching denominators for one pair with the degraded fallback
// chain: relatum missing -> reuse target, both missing -> previous value
fn branching_pair(
    counts: &HashMap<String, usize>,
    target: &str,
    relatum: &str,
    prev: f64,
    report: &mut NormalizeReport,
) -> (f64, f64) {
    match (counts.get(target), counts.get(relatum)) {
        (Some(t), Some(r)) => (*t as f64, *r as f64),
        (Some(t), None) => {
            println!(
                "warning: input is not symmetric for word '{}', reranking may be wrong",
                relatum
            );
            report.asymmetric_terms += 1;
            (*t as f64, *t as f64)
        }
        _ => {
            println!(
                "error: can not compute relation frequency for '{}' and '{}', reranking may be wrong",
                target, relatum
            );
            report.unresolved_terms += 1;
            (prev, prev)
        }
    }
}
