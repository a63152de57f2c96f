
mod config;
mod normalize;
mod pipeline;
mod relations;
mod sampling;
mod vocabulary;

pub use config::{Config, Mode, Params};
pub use normalize::{CorpusWeighting, NormalizeOutcome, NormalizeReport, Weighting};
pub use pipeline::Pipeline;
pub use relations::{
    PairFormat, PairInfo, PatternMergeReport, RelationsCollection, RelationsLoadReport,
    RelatumOrder, SimColumn, SimilarityMergeReport, Symmetry,
};
pub use sampling::DistractorSampler;
pub use vocabulary::{VocabEntry, VocabFormat, VocabLoadReport, Vocabulary};
