pub mod edge_ngram;
pub mod lowercase;
pub mod stem;
pub mod stopword;
pub mod tokenize;
