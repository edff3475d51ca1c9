// AI Gateway: one inbound endpoint in front of the generation capability.
// Dispatcher orchestrates; scope bounds the reads; prompts render; rate_limit admits.

pub mod dispatcher;
pub mod envelope;
pub mod handlers;
pub mod mode;
pub mod prompts;
pub mod rate_limit;
pub mod scope;

pub use dispatcher::Gateway;
