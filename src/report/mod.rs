//! Per-author duplicate reports and pair comparisons

mod builder;
mod comparison;
pub mod grouping;
mod render;

pub use builder::{ordered_pair, AuthorReportBuilder, IdPair};
pub use comparison::comparison_table;
pub use grouping::{connected_components, union_find_groups, DisjointSet};
pub use render::{reference_block, truncate};
