//! Rule-based swing-trading screener: evaluates raw metrics against four criteria and
//! orders collections by score.

pub mod evaluator;
pub mod ranking;

pub use evaluator::evaluate;
pub use ranking::{rank, rank_stocks, rerank, top_performers, Scored, STRONG_MATCH_SCORE};
