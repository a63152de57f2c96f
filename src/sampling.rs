
// imports
use crate::relations::RelationsCollection;

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Draws distractor terms for a target: words from the relation vocabulary
/// that are neither the target, nor one of its relatums, nor a surface
/// variant of the target. The vocabulary snapshot is shuffled once at
/// construction; the rng is supplied by the caller so sampling stays
/// reproducible under a fixed seed.
pub struct DistractorSampler {
    snapshot: Vec<String>,
}

impl DistractorSampler {
    pub fn new<R: Rng>(relations: &RelationsCollection, rng: &mut R) -> DistractorSampler {
        let mut snapshot = relations.vocabulary();
        snapshot.shuffle(rng);
        DistractorSampler { snapshot }
    }

    /// Returns up to as many distractors as the target has relatums,
    /// re-drawing on surface overlap or repeats. An unknown target yields an
    /// empty result with a warning.
    pub fn sample<R: Rng>(&self, relations: &RelationsCollection, target: &str, rng: &mut R) -> Vec<String> {
        let relatums = match relations.relatums(target) {
            Some(r) => r,
            None => {
                println!("warning: the target '{}' was not found", target);
                return Vec::new();
            }
        };

        // candidates: the snapshot minus the target and everything related to it
        let mut excluded: HashSet<&str> = relatums.iter().map(|(r, _)| r.as_str()).collect();
        excluded.insert(target);
        let candidates: Vec<&String> = self
            .snapshot
            .iter()
            .filter(|w| !excluded.contains(w.as_str()))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut distractors: Vec<String> = Vec::new();
        for _ in 0..relatums.len() {
            // bounded re-draws: a vocabulary of near-variants of the target
            // yields a short result instead of spinning
            let mut attempts = 0;
            while attempts < candidates.len() * 10 + 10 {
                let candidate = candidates[rng.gen_range(0..candidates.len())];
                if !surface_match(target, candidate) && !distractors.contains(candidate) {
                    distractors.push(candidate.to_owned());
                    break;
                }
                attempts += 1;
            }
        }

        distractors
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.len()
    }
}

// at least surface dissimilarity: neither word contains the other
fn surface_match(target: &str, candidate: &str) -> bool {
    candidate.contains(target) || target.contains(candidate)
}

#[cfg(test)]
mod tests {

    use super::{surface_match, DistractorSampler};
    use crate::relations::RelationsCollection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn collection() -> RelationsCollection {
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 0);
        relations.add("cat", "mouse", 2.0, 0);
        relations.add("horse", "cow", 1.0, 0);
        relations.add("bird", "fish", 1.0, 0);
        relations.add("catfish", "shark", 1.0, 0);
        relations
    }

    #[test]
    fn surface_match_is_substring_overlap_both_ways() {
        assert!(surface_match("cat", "catfish"));
        assert!(surface_match("catfish", "cat"));
        assert!(!surface_match("cat", "dog"));
    }

    #[test]
    fn sampling_excludes_target_relatums_and_surface_variants() {
        let relations = collection();
        let mut rng = StdRng::seed_from_u64(17);
        let sampler = DistractorSampler::new(&relations, &mut rng);

        let distractors = sampler.sample(&relations, "cat", &mut rng);

        assert!(distractors.len() <= 2); // cat has two relatums
        for word in &distractors {
            assert_ne!(word, "cat");
            assert_ne!(word, "dog");
            assert_ne!(word, "mouse");
            assert_ne!(word, "catfish"); // surface overlap with the target
        }
        // no repeats
        let mut unique = distractors.clone();
        unique.dedup();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), distractors.len());
    }

    #[test]
    fn sampling_is_deterministic_under_a_fixed_seed() {
        let relations = collection();

        let mut rng1 = StdRng::seed_from_u64(42);
        let sampler1 = DistractorSampler::new(&relations, &mut rng1);
        let first = sampler1.sample(&relations, "cat", &mut rng1);

        let mut rng2 = StdRng::seed_from_u64(42);
        let sampler2 = DistractorSampler::new(&relations, &mut rng2);
        let second = sampler2.sample(&relations, "cat", &mut rng2);

        assert_eq!(first, second);
    }

    #[test]
    fn unknown_target_yields_empty_result() {
        let relations = collection();
        let mut rng = StdRng::seed_from_u64(1);
        let sampler = DistractorSampler::new(&relations, &mut rng);

        assert!(sampler.sample(&relations, "unicorn", &mut rng).is_empty());
    }

    #[test]
    fn snapshot_covers_the_relation_vocabulary() {
        let relations = collection();
        let mut rng = StdRng::seed_from_u64(1);
        let sampler = DistractorSampler::new(&relations, &mut rng);

        // targets and relatums, deduplicated
        assert_eq!(sampler.snapshot_len(), relations.vocabulary().len());
    }
}
