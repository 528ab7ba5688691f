//! Metrics hooks.
//!
//! Per-step numbers go out as trace events; the binary decides whether a
//! subscriber records them.

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::trace_span!("csvq", event);
    let _enter = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%event, %k, %v, "metric");
    }
}
