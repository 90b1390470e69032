pub mod chabura;
pub mod graph;
pub mod library;
pub mod search;
pub mod suggest;
