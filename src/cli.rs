//! CLI domain: parse, route, help, output, and presentation only.
//! No workflow orchestration here; the route table calls into `WorkflowApi`
//! and the stores.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{map_error, CommandOutput};
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_posts_json, format_posts_text, format_run_json, format_run_text, format_summary_json,
    format_summary_text, format_validation_json, format_validation_text,
};
pub use route::RunContext;
