//! Winner selection: random draw for raffles, ranking for everything else

mod ranking;
mod selector;

pub use ranking::{rank, RankBy};
pub use selector::{select, select_with};
