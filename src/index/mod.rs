pub mod accumulator;
pub mod postings;
pub mod stats;
pub mod vocabulary;
