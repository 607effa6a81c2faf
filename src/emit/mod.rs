pub mod listing;
pub mod run_result;
pub mod show_plan;
pub(crate) mod util;
