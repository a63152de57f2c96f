
// imports
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// fixed layout of the relations input:
// "target;relatum;syno;cohypo;hyper_hypo;hyper;hypo;sum;pattern1;...;patternN"
const TARGET_FIELD: usize = 0;
const RELATUM_FIELD: usize = 1;
const SUM_FIELD: usize = 7;
const PATTERN_FIRST_FIELD: usize = 8;

/// One stored relation: the similarity score (starts as a raw extraction
/// frequency) and the number of distinct patterns that produced the pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairInfo {
    pub sim: f64,
    pub patterns_num: usize,
}

/// Whether to mirror every loaded pair as relatum->target as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symmetry {
    AsGiven,
    AddReverse,
}

/// Layout of the external similarity / pattern-count files. Bless carries an
/// extra relation-type field before the score and pattern columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairFormat {
    Plain,
    Bless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimColumn {
    Write,
    Omit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelatumOrder {
    Insertion,
    SimDescending,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelationsLoadReport {
    pub rows: usize,
    pub added: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl Display for RelationsLoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rows={}; relations added={}; duplicates={}; errors={}",
            self.rows, self.added, self.duplicates, self.errors
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimilarityMergeReport {
    pub relations: usize,
    pub updated: usize,
    pub inconsistent: usize,
}

impl Display for SimilarityMergeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pairs={}; pairs found={}; inconsistent pairs={}",
            self.relations, self.updated, self.inconsistent
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternMergeReport {
    pub rows: usize,
    pub without_patterns: usize,
    pub updated: usize,
}

impl Display for PatternMergeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "input relations={}, input relations without patterns={}, relations updated={}",
            self.rows, self.without_patterns, self.updated
        )
    }
}

/// A collection of binary semantic relations between words, stored as sparse
/// adjacency target -> relatum -> PairInfo. Relatum lists keep insertion
/// order; at most one entry exists per ordered pair.
pub struct RelationsCollection {
    targets: HashMap<String, Vec<(String, PairInfo)>>,
    order: Vec<String>,
    relations_count: usize,
    normalized: bool,
}

impl RelationsCollection {
    pub fn new() -> RelationsCollection {
        RelationsCollection {
            targets: HashMap::new(),
            order: Vec::new(),
            relations_count: 0,
            normalized: false,
        }
    }

    /// Loads relations from a ";"-delimited file in the fixed 25-field layout.
    /// Field 7 is the raw similarity (0 on parse failure), fields 8.. are
    /// per-pattern counts; the pair's pattern count is the number of positive
    /// ones. A missing file is fatal to this call.
    pub fn from_file(file_path: &str, symmetry: Symmetry) -> Result<(RelationsCollection, RelationsLoadReport), Box<dyn Error>> {
        if !Path::new(file_path).exists() {
            return Err(format!("relations file '{}' does not exist", file_path).into());
        }

        let mut relations = RelationsCollection::new();
        let mut report = RelationsLoadReport::default();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(file_path)?;

        for record in reader.records() {
            report.rows += 1;
            let record = match record {
                Ok(r) => r,
                Err(_) => {
                    report.errors += 1;
                    continue;
                }
            };
            if record.len() <= PATTERN_FIRST_FIELD {
                println!(
                    "skipping malformed row '{};{}'",
                    record.get(TARGET_FIELD).unwrap_or(""),
                    record.get(RELATUM_FIELD).unwrap_or("")
                );
                report.errors += 1;
                continue;
            }

            let target = record[TARGET_FIELD].trim().to_lowercase();
            let relatum = record[RELATUM_FIELD].trim().to_lowercase();
            let sim = record[SUM_FIELD].trim().parse::<f64>().unwrap_or(0.0);

            let mut patterns = 0;
            for i in PATTERN_FIRST_FIELD..record.len() {
                let pattern_n = record[i].trim().parse::<i64>().unwrap_or(0);
                if pattern_n > 0 {
                    patterns += 1;
                }
            }

            if relations.add(&target, &relatum, sim, patterns) {
                report.added += 1;
            } else {
                report.duplicates += 1;
            }
            if symmetry == Symmetry::AddReverse {
                if relations.add(&relatum, &target, sim, patterns) {
                    report.added += 1;
                } else {
                    report.duplicates += 1;
                }
            }
        }

        Ok((relations, report))
    }

    /// Adds the ordered pair (target, relatum). Re-adding an existing pair is
    /// a no-op; returns whether the pair was stored.
    pub fn add(&mut self, target: &str, relatum: &str, sim: f64, patterns_num: usize) -> bool {
        if !self.targets.contains_key(target) {
            self.targets.insert(target.to_owned(), Vec::new());
            self.order.push(target.to_owned());
        }
        let pairs = self.targets.get_mut(target).unwrap(); // just inserted
        if pairs.iter().any(|(r, _)| r == relatum) {
            return false;
        }
        pairs.push((relatum.to_owned(), PairInfo { sim, patterns_num }));
        self.relations_count += 1;
        true
    }

    pub fn get(&self, target: &str, relatum: &str) -> Option<&PairInfo> {
        self.targets
            .get(target)
            .and_then(|pairs| pairs.iter().find(|(r, _)| r == relatum).map(|(_, info)| info))
    }

    pub fn get_mut(&mut self, target: &str, relatum: &str) -> Option<&mut PairInfo> {
        self.targets
            .get_mut(target)
            .and_then(|pairs| pairs.iter_mut().find(|(r, _)| r == relatum).map(|(_, info)| info))
    }

    pub fn contains(&self, target: &str, relatum: &str) -> bool {
        self.get(target, relatum).is_some()
    }

    pub fn relatums(&self, target: &str) -> Option<&[(String, PairInfo)]> {
        self.targets.get(target).map(|pairs| pairs.as_slice())
    }

    pub fn relations_count(&self) -> usize {
        self.relations_count
    }

    pub fn is_empty(&self) -> bool {
        self.relations_count == 0
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) fn set_normalized(&mut self) {
        self.normalized = true;
    }

    /// Iterates targets in insertion order with their relatum lists.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[(String, PairInfo)])> + '_ {
        self.order
            .iter()
            .map(move |t| (t.as_str(), self.targets[t].as_slice()))
    }

    // visits every stored pair in insertion order, allowing sim mutation
    pub(crate) fn for_each_pair_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &str, &mut PairInfo),
    {
        for target in &self.order {
            let pairs = self.targets.get_mut(target).unwrap(); // order mirrors the key set
            for (relatum, info) in pairs.iter_mut() {
                f(target, relatum, info);
            }
        }
    }

    /// The distinct terms appearing as a target or a relatum, in
    /// reverse-lexicographic order.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut voc: HashSet<&str> = self.order.iter().map(|t| t.as_str()).collect();
        for pairs in self.targets.values() {
            for (relatum, _) in pairs {
                voc.insert(relatum);
            }
        }
        let mut list: Vec<String> = voc.into_iter().map(|t| t.to_owned()).collect();
        list.sort();
        list.reverse();
        list
    }

    /// Saves as "target;relatum[;sim]" lines grouped by target. Similarity of
    /// at least 1 is written compactly (up to 10 significant digits), smaller
    /// values with fixed 10 decimals.
    pub fn save(&self, file_path: &str, sim_column: SimColumn, order: RelatumOrder) -> Result<(), Box<dyn Error>> {
        let mut out = BufWriter::new(File::create(file_path)?);
        for target in &self.order {
            let pairs = &self.targets[target];
            let sorted;
            let pairs: &[(String, PairInfo)] = match order {
                RelatumOrder::Insertion => pairs,
                RelatumOrder::SimDescending => {
                    let mut copy = pairs.clone();
                    copy.sort_by(|(_, a), (_, b)| b.sim.total_cmp(&a.sim));
                    sorted = copy;
                    &sorted
                }
            };
            for (relatum, info) in pairs {
                match sim_column {
                    SimColumn::Omit => writeln!(out, "{};{}", target, relatum)?,
                    SimColumn::Write => writeln!(out, "{};{};{}", target, relatum, format_sim(info.sim))?,
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Dumps all relations with their pattern counts to stdout, save formatting.
    pub fn print(&self) {
        for (target, pairs) in self.iter() {
            for (relatum, info) in pairs {
                println!("{};{};{};{}", target, relatum, format_sim(info.sim), info.patterns_num);
            }
        }
    }

    /// Overwrites the similarity of existing pairs (and their mirrored pairs)
    /// with scores from an external "target;relatum;score" file (bless:
    /// "target;relatum;type;score"). Pairs absent from the collection are
    /// ignored; a differing non-zero stored score is counted as inconsistent,
    /// and the incoming value still wins.
    pub fn merge_similarity(&mut self, file_path: &str, format: PairFormat) -> Result<SimilarityMergeReport, Box<dyn Error>> {
        let (sim_field, min_len) = match format {
            PairFormat::Plain => (2, 3),
            PairFormat::Bless => (3, 4),
        };
        let mut report = SimilarityMergeReport {
            relations: self.relations_count,
            ..Default::default()
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(file_path)?;

        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(_) => continue,
            };
            if record.len() < min_len {
                continue;
            }
            let target = record[TARGET_FIELD].trim().to_lowercase();
            let relatum = record[RELATUM_FIELD].trim().to_lowercase();
            let sim = record[sim_field].trim().parse::<f64>().unwrap_or(0.0);

            self.try_set_sim(&target, &relatum, sim, &mut report);
            self.try_set_sim(&relatum, &target, sim, &mut report);
        }

        Ok(report)
    }

    fn try_set_sim(&mut self, target: &str, relatum: &str, sim: f64, report: &mut SimilarityMergeReport) {
        if let Some(info) = self.get_mut(target, relatum) {
            if info.sim != 0.0 && info.sim != sim {
                println!("inconsistent pair: ({},{},{}!={})", target, relatum, info.sim, sim);
                report.inconsistent += 1;
            }
            info.sim = sim;
            report.updated += 1;
        }
    }

    /// Loads pattern counts from "target;relatum;type[;score];p1;...;pn". The
    /// derived count is the number of trailing pattern fields; a positive
    /// count on an existing pair raises its patterns_num to the maximum of
    /// both values. Never decreases a stored count.
    pub fn merge_pattern_counts(&mut self, file_path: &str, format: PairFormat) -> Result<PatternMergeReport, Box<dyn Error>> {
        let prefix_len = match format {
            PairFormat::Plain => 3,
            PairFormat::Bless => 4,
        };
        let mut report = PatternMergeReport::default();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(file_path)?;

        for record in reader.records() {
            report.rows += 1;
            let record = match record {
                Ok(r) => r,
                Err(_) => {
                    report.without_patterns += 1;
                    continue;
                }
            };
            if record.len() <= prefix_len {
                report.without_patterns += 1;
                continue;
            }
            let target = record[TARGET_FIELD].trim().to_lowercase();
            let relatum = record[RELATUM_FIELD].trim().to_lowercase();
            let patterns = record.len() - prefix_len;

            if let Some(info) = self.get_mut(&target, &relatum) {
                info.patterns_num = info.patterns_num.max(patterns);
                report.updated += 1;
            }
            // pairs absent from the collection are skipped
        }

        Ok(report)
    }
}

impl Default for RelationsCollection {
    fn default() -> Self {
        RelationsCollection::new()
    }
}

// similarity rendering: compact general format with up to 10 significant
// digits for values of at least 1, fixed 10 decimals below that
pub(crate) fn format_sim(sim: f64) -> String {
    if sim >= 1.0 {
        let magnitude = sim.log10().floor() as i32;
        let decimals = (9 - magnitude).max(0) as usize;
        let mut s = format!("{:.*}", decimals, sim);
        if s.contains('.') {
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
        }
        s
    } else {
        format!("{:.10}", sim)
    }
}

#[cfg(test)]
mod tests {

    use super::{
        format_sim, PairFormat, RelationsCollection, RelatumOrder, SimColumn, Symmetry,
    };
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn small_collection() -> RelationsCollection {
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 2);
        relations.add("cat", "mouse", 2.0, 0);
        relations
    }

    #[test]
    fn load_parses_similarity_and_pattern_counts() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "relations.csv",
            "cat;dog;0;0;0;0;0;5;1;0;1\ncat;mouse;0;0;0;0;0;2;0;0;0\n",
        );

        let (relations, report) = RelationsCollection::from_file(&path, Symmetry::AsGiven).unwrap();

        let dog = relations.get("cat", "dog").unwrap();
        assert_eq!(dog.sim, 5.0);
        assert_eq!(dog.patterns_num, 2); // two of the three pattern fields are positive
        let mouse = relations.get("cat", "mouse").unwrap();
        assert_eq!(mouse.sim, 2.0);
        assert_eq!(mouse.patterns_num, 0);
        assert_eq!(report.added, 2);
        assert_eq!(report.errors, 0);
        assert!(!relations.contains("dog", "cat"));
    }

    #[test]
    fn load_with_reverse_adds_mirrored_pairs() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "relations.csv", "cat;dog;0;0;0;0;0;5;1;0;1\n");

        let (relations, report) = RelationsCollection::from_file(&path, Symmetry::AddReverse).unwrap();

        assert_eq!(relations.relations_count(), 2);
        assert_eq!(relations.get("dog", "cat").unwrap().sim, 5.0);
        assert_eq!(report.added, 2);
    }

    #[test]
    fn load_skips_short_and_unparseable_rows() {
        let dir = tempdir().unwrap();
        let path = write_file(
            &dir,
            "relations.csv",
            "cat;dog;0\ncat;dog;0;0;0;0;0;bad;x;y;z\ncat;mouse;0;0;0;0;0;2;0;0;0\n",
        );

        let (relations, report) = RelationsCollection::from_file(&path, Symmetry::AsGiven).unwrap();

        // a short row is an error; unparseable numeric fields default to zero
        assert_eq!(report.errors, 1);
        assert_eq!(relations.get("cat", "dog").unwrap().sim, 0.0);
        assert_eq!(relations.get("cat", "dog").unwrap().patterns_num, 0);
        assert_eq!(relations.get("cat", "mouse").unwrap().sim, 2.0);
    }

    #[test]
    fn duplicate_add_is_a_no_op() {
        let mut relations = RelationsCollection::new();
        assert!(relations.add("cat", "dog", 5.0, 2));
        assert!(!relations.add("cat", "dog", 9.0, 7));

        let info = relations.get("cat", "dog").unwrap();
        assert_eq!(info.sim, 5.0);
        assert_eq!(info.patterns_num, 2);
        assert_eq!(relations.relations_count(), 1);
    }

    #[test]
    fn vocabulary_is_reverse_lexicographic() {
        let relations = small_collection();
        assert_eq!(relations.vocabulary(), vec!["mouse", "dog", "cat"]);
    }

    #[test]
    fn save_formats_by_magnitude() {
        let dir = tempdir().unwrap();
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 0);
        relations.add("cat", "mouse", 0.125, 0);

        let out = dir.path().join("out.csv");
        relations.save(out.to_str().unwrap(), SimColumn::Write, RelatumOrder::Insertion).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert_eq!(written, "cat;dog;5\ncat;mouse;0.1250000000\n");

        // diagnostic dump shares the formatting rules
        relations.print();
    }

    #[test]
    fn save_can_omit_similarity_and_sort_by_it() {
        let dir = tempdir().unwrap();
        let relations = small_collection();

        let plain = dir.path().join("plain.csv");
        relations.save(plain.to_str().unwrap(), SimColumn::Omit, RelatumOrder::Insertion).unwrap();
        assert_eq!(fs::read_to_string(&plain).unwrap(), "cat;dog\ncat;mouse\n");

        let mut reordered = RelationsCollection::new();
        reordered.add("cat", "mouse", 2.0, 0);
        reordered.add("cat", "dog", 5.0, 0);
        let sorted = dir.path().join("sorted.csv");
        reordered.save(sorted.to_str().unwrap(), SimColumn::Write, RelatumOrder::SimDescending).unwrap();
        assert_eq!(fs::read_to_string(&sorted).unwrap(), "cat;dog;5\ncat;mouse;2.0000000000\n");
    }

    #[test]
    fn format_sim_limits_significant_digits() {
        assert_eq!(format_sim(5.0), "5");
        assert_eq!(format_sim(1234.56789), "1234.56789");
        assert_eq!(format_sim(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_sim(12345678901.5), "12345678902"); // 11 digits round to 10 significant
        assert_eq!(format_sim(0.0), "0.0000000000");
    }

    #[test]
    fn merge_similarity_updates_both_directions() {
        let dir = tempdir().unwrap();
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 0.0, 0);
        relations.add("dog", "cat", 0.0, 0);

        let path = write_file(&dir, "sim.csv", "cat;dog;0.75\n");
        let report = relations.merge_similarity(&path, PairFormat::Plain).unwrap();

        assert_eq!(relations.get("cat", "dog").unwrap().sim, 0.75);
        assert_eq!(relations.get("dog", "cat").unwrap().sim, 0.75);
        assert_eq!(report.updated, 2);
        assert_eq!(report.inconsistent, 0);
    }

    #[test]
    fn merge_similarity_flags_inconsistencies_and_incoming_wins() {
        let dir = tempdir().unwrap();
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 0);

        let path = write_file(&dir, "sim.csv", "cat;dog;?;7\n");
        let report = relations.merge_similarity(&path, PairFormat::Bless).unwrap();

        assert_eq!(relations.get("cat", "dog").unwrap().sim, 7.0);
        assert_eq!(report.inconsistent, 1);
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn merge_similarity_ignores_unknown_pairs() {
        let dir = tempdir().unwrap();
        let mut relations = small_collection();

        let path = write_file(&dir, "sim.csv", "horse;cow;3.5\n");
        let report = relations.merge_similarity(&path, PairFormat::Plain).unwrap();

        assert_eq!(report.updated, 0);
        assert!(!relations.contains("horse", "cow"));
    }

    #[test]
    fn saved_similarities_survive_a_merge_reload() {
        let dir = tempdir().unwrap();
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 0);
        relations.add("cat", "mouse", 1.0 / 3.0, 0);

        let out = dir.path().join("out.csv");
        relations.save(out.to_str().unwrap(), SimColumn::Write, RelatumOrder::Insertion).unwrap();

        // reload the scores into a zeroed copy of the same pairs
        let mut reloaded = RelationsCollection::new();
        reloaded.add("cat", "dog", 0.0, 0);
        reloaded.add("cat", "mouse", 0.0, 0);
        reloaded.merge_similarity(out.to_str().unwrap(), PairFormat::Plain).unwrap();

        assert_eq!(reloaded.get("cat", "dog").unwrap().sim, 5.0);
        let diff = (reloaded.get("cat", "mouse").unwrap().sim - 1.0 / 3.0).abs();
        assert!(diff < 1e-10); // formatting keeps 10 decimals
    }

    #[test]
    fn merge_pattern_counts_takes_the_maximum() {
        let dir = tempdir().unwrap();
        let mut relations = RelationsCollection::new();
        relations.add("cat", "dog", 5.0, 1);

        let first = write_file(&dir, "p1.csv", "cat;dog;?;1;1;1;1\n");
        let second = write_file(&dir, "p2.csv", "cat;dog;?;1;1\n");

        let report = relations.merge_pattern_counts(&first, PairFormat::Plain).unwrap();
        assert_eq!(relations.get("cat", "dog").unwrap().patterns_num, 4);
        assert_eq!(report.updated, 1);

        // a smaller count later never decreases the stored value
        relations.merge_pattern_counts(&second, PairFormat::Plain).unwrap();
        assert_eq!(relations.get("cat", "dog").unwrap().patterns_num, 4);
    }

    #[test]
    fn merge_pattern_counts_tracks_rows_without_patterns() {
        let dir = tempdir().unwrap();
        let mut relations = small_collection();

        let path = write_file(&dir, "p.csv", "cat;dog;?;3;1;1;1;1\ncat;mouse;?\nhorse;cow;?;1;1\n");
        let report = relations.merge_pattern_counts(&path, PairFormat::Bless).unwrap();

        assert_eq!(report.rows, 3);
        assert_eq!(report.without_patterns, 1); // the bare "cat;mouse;?" row
        assert_eq!(report.updated, 1);
        assert_eq!(relations.get("cat", "dog").unwrap().patterns_num, 4);
        assert_eq!(relations.get("cat", "mouse").unwrap().patterns_num, 0);
    }
}
