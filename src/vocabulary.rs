
// imports
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File layout of a vocabulary: "id;term;freq" (WithIds) or "term;freq" (Plain).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VocabFormat {
    WithIds,
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VocabEntry {
    pub id: usize,
    pub freq: u64,
}

/// Counters of a vocabulary load. A missing file leaves the vocabulary empty
/// and only flips `missing_file` - callers may supply the frequency list as an
/// optional resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VocabLoadReport {
    pub loaded: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub missing_file: bool,
}

impl Display for VocabLoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} words were loaded, {} errors, {} duplicates",
            self.loaded, self.errors, self.duplicates
        )
    }
}

/// Indexed vocabulary, where every term has one id and a frequency.
pub struct Vocabulary {
    entries: HashMap<String, VocabEntry>,
    next_id: usize,
}

impl Vocabulary {
    pub fn new() -> Vocabulary {
        Vocabulary {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Loads a vocabulary from a ";"-delimited file in the given layout.
    /// Malformed lines are skipped and counted. With explicit ids the first
    /// occurrence of a term wins; without them duplicate frequencies are summed.
    pub fn load(file_path: &str, format: VocabFormat) -> Result<(Vocabulary, VocabLoadReport), Box<dyn Error>> {
        let mut voc = Vocabulary::new();
        let mut report = VocabLoadReport::default();

        if !Path::new(file_path).exists() {
            println!("vocabulary file '{}' not found", file_path);
            report.missing_file = true;
            return Ok((voc, report));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(file_path)?;

        for record in reader.records() {
            let record = match record {
                Ok(r) => r,
                Err(_) => {
                    report.errors += 1;
                    continue;
                }
            };
            match format {
                VocabFormat::WithIds => {
                    // "id;term;freq"
                    let parsed = match (record.get(0), record.get(1), record.get(2)) {
                        (Some(id), Some(term), Some(freq)) => {
                            match (id.trim().parse::<usize>(), freq.trim().parse::<u64>()) {
                                (Ok(id), Ok(freq)) => Some((id, term.trim().to_lowercase(), freq)),
                                _ => None,
                            }
                        }
                        _ => None,
                    };
                    match parsed {
                        Some((id, term, freq)) => {
                            if voc.entries.contains_key(&term) {
                                report.duplicates += 1;
                            } else {
                                voc.entries.insert(term, VocabEntry { id, freq });
                                voc.next_id = voc.next_id.max(id + 1);
                                report.loaded += 1;
                            }
                        }
                        None => report.errors += 1,
                    }
                }
                VocabFormat::Plain => {
                    // "term;freq", ids assigned in file order
                    let parsed = match (record.get(0), record.get(1)) {
                        (Some(term), Some(freq)) => match freq.trim().parse::<u64>() {
                            Ok(freq) => Some((term.trim().to_lowercase(), freq)),
                            Err(_) => None,
                        },
                        _ => None,
                    };
                    match parsed {
                        Some((term, freq)) => {
                            if let Some(entry) = voc.entries.get_mut(&term) {
                                entry.freq += freq;
                                report.duplicates += 1;
                            } else {
                                let id = voc.next_id;
                                voc.next_id += 1;
                                voc.entries.insert(term, VocabEntry { id, freq });
                                report.loaded += 1;
                            }
                        }
                        None => report.errors += 1,
                    }
                }
            }
        }

        // a trailing blank term can sneak in from trimming, drop it
        voc.entries.remove("");

        Ok((voc, report))
    }

    /// Returns the term id, registering the term with the next free id if
    /// absent, and counts the occurrence. The only mutating lookup.
    pub fn get_or_create_id(&mut self, term: &str) -> usize {
        if !self.entries.contains_key(term) {
            let id = self.next_id;
            self.next_id += 1;
            self.entries.insert(term.to_owned(), VocabEntry { id, freq: 0 });
        }
        let entry = self.entries.get_mut(term).unwrap(); // just inserted
        entry.freq += 1;
        entry.id
    }

    /// Saves as "id;term;freq" sorted by ascending id, or "term;freq" ranked
    /// by descending frequency.
    pub fn save(&self, file_path: &str, format: VocabFormat) -> Result<(), Box<dyn Error>> {
        let mut list: Vec<(&String, &VocabEntry)> = self.entries.iter().collect();
        match format {
            VocabFormat::WithIds => list.sort_by_key(|(_, e)| e.id),
            VocabFormat::Plain => list.sort_by(|(t1, e1), (t2, e2)| e2.freq.cmp(&e1.freq).then(t1.cmp(t2))),
        }

        let mut out = BufWriter::new(File::create(file_path)?);
        for (term, entry) in list {
            match format {
                VocabFormat::WithIds => writeln!(out, "{};{};{}", entry.id, term, entry.freq)?,
                VocabFormat::Plain => writeln!(out, "{};{}", term, entry.freq)?,
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    pub fn freq(&self, term: &str) -> Option<u64> {
        self.entries.get(term).map(|e| e.freq)
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.entries.get(term).map(|e| e.id)
    }

    /// Total number of tokens in the corpus the vocabulary was counted from.
    pub fn token_count(&self) -> f64 {
        self.entries.values().map(|e| e.freq as f64).sum()
    }

    pub fn mean_freq(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.token_count() / self.entries.len() as f64
    }

    /// P(w_i) = f_i / sum_i(f_i). Sums to one over all terms.
    pub fn probabilities(&self) -> HashMap<String, f64> {
        let tokens = self.token_count();
        if tokens == 0.0 {
            return HashMap::new();
        }
        self.entries
            .iter()
            .map(|(term, entry)| (term.to_owned(), entry.freq as f64 / tokens))
            .collect()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary::new()
    }
}
