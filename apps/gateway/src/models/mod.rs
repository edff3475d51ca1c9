pub mod caller;
pub mod context;
