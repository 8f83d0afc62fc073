pub mod evaluation;
pub mod pairs;
