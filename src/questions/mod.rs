//! From normalized document text to question records.

pub mod alternatives;
pub mod assemble;
pub mod matcher;
pub mod normalize;
pub mod segment;

pub use alternatives::{parse_alternatives, ParsedQuestion};
pub use assemble::{OutputMode, RecordAssembler};
pub use matcher::RegionQuestionMatcher;
pub use normalize::normalize_text;
pub use segment::{QuestionSegmenter, Segment, DEFAULT_MAX_QUESTIONS};
