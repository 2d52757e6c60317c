//! Built-in tools.
//!
//! - [`WebSearchTool`]: DuckDuckGo instant-answer search, the research tool given to every
//!   agent of the [academic crew](crate::presets::academic_crew).

pub mod web_search;

pub use web_search::WebSearchTool;
