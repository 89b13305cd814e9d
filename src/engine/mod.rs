//! Engine: operations, request protocol, CLI parsing and handlers.

pub mod arg_parser;
pub mod handlers;
pub mod operations;
pub mod protocol;

// Re-export commonly used items
pub use arg_parser::{Cli, ServiceSpec, parse_service_spec};
pub use handlers::{build_opts, handle_run};
pub use operations::OperationType;
pub use protocol::{END_OF_INPUT, LineSource, parse_request};
