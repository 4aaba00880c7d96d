use tracing::trace;

use crate::pipeline::{ProcessorContext, ProcessorResult, StanzaProcessor};
use crate::stanza::Stanza;

/// Logs every stanza in both directions at `trace` level.
#[derive(Debug, Default)]
pub struct DebugProcessor;

impl DebugProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl StanzaProcessor for DebugProcessor {
    fn name(&self) -> &str {
        "debug"
    }

    fn process_inbound(&self, stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
        trace!(
            direction = "inbound",
            stanza_type = stanza.name(),
            xml = %stanza_to_string(stanza),
            "raw stanza"
        );
        ProcessorResult::Continue
    }

    fn process_outbound(&self, stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
        trace!(
            direction = "outbound",
            stanza_type = stanza.name(),
            xml = %stanza_to_string(stanza),
            "raw stanza"
        );
        ProcessorResult::Continue
    }

    fn priority(&self) -> i32 {
        100
    }
}

fn stanza_to_string(stanza: &Stanza) -> String {
    stanza
        .to_bytes()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_else(|_| format!("<{} [serialization failed]/>", stanza.name()))
}
