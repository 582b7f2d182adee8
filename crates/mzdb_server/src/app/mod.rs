mod bootstrap;
mod loop_runner;
mod protocol;
mod tools;

pub(crate) use bootstrap::{build_server, init_tracing, usage_text, ConfigOutcome, ServerConfig};
pub(crate) use loop_runner::run_request_loop;
