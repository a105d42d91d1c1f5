/// Title date extraction
///
/// Titles are free text, so dates are recovered with an ordered chain:
/// strict whole-title patterns first, then an optional fuzzy scan.

pub mod extractor;
pub mod fuzzy;

pub use extractor::{extract, DateExtractor, DateStrategy, Extraction};
pub use fuzzy::{FuzzyMatch, FuzzyScanner};
