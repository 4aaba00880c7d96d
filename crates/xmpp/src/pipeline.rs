use std::sync::Arc;

use tracing::{debug, trace};

use crate::{error::PipelineError, stanza::Stanza};

#[derive(Debug)]
pub enum ProcessorResult {
    Continue,
    Drop,
    Replace(Box<Stanza>),
}

pub struct ProcessorContext {
    pub direction: StanzaDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanzaDirection {
    Inbound,
    Outbound,
}

pub trait StanzaProcessor: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn process_inbound(&self, stanza: &mut Stanza, ctx: &ProcessorContext) -> ProcessorResult;

    fn process_outbound(&self, stanza: &mut Stanza, ctx: &ProcessorContext) -> ProcessorResult;

    /// Lower values run first.
    fn priority(&self) -> i32;
}

/// Ordered chain of processors every stanza passes through.
pub struct StanzaPipeline {
    processors: Vec<Arc<dyn StanzaProcessor>>,
}

impl StanzaPipeline {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn register(&mut self, processor: Arc<dyn StanzaProcessor>) {
        self.processors.push(processor);
        self.processors.sort_by_key(|p| p.priority());
    }

    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Parse raw bytes and run them through the inbound chain.
    ///
    /// Returns the stanza if no processor consumed it.
    pub fn process_inbound(&self, raw: &[u8]) -> Result<Option<Stanza>, PipelineError> {
        let stanza = Stanza::parse(raw)?;
        Ok(self.run(stanza, StanzaDirection::Inbound))
    }

    /// Run the outbound chain and serialize whatever survives it.
    pub fn process_outbound(&self, stanza: Stanza) -> Result<Option<Vec<u8>>, PipelineError> {
        match self.run(stanza, StanzaDirection::Outbound) {
            Some(stanza) => stanza.to_bytes().map(Some),
            None => Ok(None),
        }
    }

    fn run(&self, mut stanza: Stanza, direction: StanzaDirection) -> Option<Stanza> {
        let ctx = ProcessorContext { direction };
        for processor in &self.processors {
            let result = match direction {
                StanzaDirection::Inbound => processor.process_inbound(&mut stanza, &ctx),
                StanzaDirection::Outbound => processor.process_outbound(&mut stanza, &ctx),
            };
            match result {
                ProcessorResult::Continue => {}
                ProcessorResult::Drop => {
                    debug!(
                        processor = processor.name(),
                        ?direction,
                        stanza_type = stanza.name(),
                        id = stanza.id().unwrap_or_default(),
                        "stanza consumed"
                    );
                    return None;
                }
                ProcessorResult::Replace(replacement) => {
                    trace!(processor = processor.name(), ?direction, "stanza replaced");
                    stanza = *replacement;
                }
            }
        }
        Some(stanza)
    }
}

impl Default for StanzaPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::stanza::IqType;

    struct Recorder {
        name: &'static str,
        priority: i32,
        seen: Arc<Mutex<Vec<&'static str>>>,
        result: fn(&Stanza) -> ProcessorResult,
    }

    impl StanzaProcessor for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn process_inbound(&self, stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
            self.seen.lock().unwrap().push(self.name);
            (self.result)(stanza)
        }

        fn process_outbound(&self, stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
            self.seen.lock().unwrap().push(self.name);
            (self.result)(stanza)
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn recorder(
        name: &'static str,
        priority: i32,
        seen: &Arc<Mutex<Vec<&'static str>>>,
        result: fn(&Stanza) -> ProcessorResult,
    ) -> Arc<dyn StanzaProcessor> {
        Arc::new(Recorder {
            name,
            priority,
            seen: Arc::clone(seen),
            result,
        })
    }

    const PING: &[u8] =
        b"<iq xmlns='jabber:client' type='get' id='p1'><ping xmlns='urn:xmpp:ping'/></iq>";

    #[test]
    fn processors_run_in_priority_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = StanzaPipeline::new();
        pipeline.register(recorder("late", 50, &seen, |_| ProcessorResult::Continue));
        pipeline.register(recorder("early", -10, &seen, |_| ProcessorResult::Continue));

        let stanza = pipeline.process_inbound(PING).unwrap();
        assert!(stanza.is_some());
        assert_eq!(*seen.lock().unwrap(), ["early", "late"]);
        assert_eq!(pipeline.processor_names(), ["early", "late"]);
    }

    #[test]
    fn drop_stops_the_chain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = StanzaPipeline::new();
        pipeline.register(recorder("consumer", 0, &seen, |_| ProcessorResult::Drop));
        pipeline.register(recorder("never", 10, &seen, |_| ProcessorResult::Continue));

        assert!(pipeline.process_inbound(PING).unwrap().is_none());
        assert_eq!(*seen.lock().unwrap(), ["consumer"]);
    }

    #[test]
    fn replace_hands_new_stanza_downstream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = StanzaPipeline::new();
        pipeline.register(recorder("rewrite", 0, &seen, |_| {
            ProcessorResult::Replace(Box::new(Stanza::iq(IqType::Result).with_id("p1")))
        }));

        let stanza = pipeline.process_inbound(PING).unwrap().unwrap();
        assert_eq!(stanza.iq_type(), Some(IqType::Result));
        assert!(stanza.payload().is_empty());
    }

    #[test]
    fn outbound_serializes_surviving_stanza() {
        let pipeline = StanzaPipeline::default();
        let bytes = pipeline
            .process_outbound(Stanza::iq(IqType::Get).with_id("o1"))
            .unwrap()
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("id=\"o1\"") || text.contains("id='o1'"));
    }

    #[test]
    fn inbound_parse_errors_surface() {
        let pipeline = StanzaPipeline::new();
        let err = pipeline.process_inbound(b"<not-closed").unwrap_err();
        assert!(matches!(err, PipelineError::ParseFailed(_)));
    }
}
