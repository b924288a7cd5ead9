pub mod executor;
pub mod parser;
pub mod planner;
pub mod scorer;

pub use executor::{Matches, QueryExecutor, execute};
pub use parser::{QueryNode, compile};
pub use planner::QueryPlan;
