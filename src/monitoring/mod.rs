/*!
 * Monitoring
 * Structured tracing setup and run spans
 */

mod tracer;

pub use tracer::{init_tracing, span_run, try_init_tracing, RunSpan};
