pub mod classify;
pub mod correlation;
pub mod error;
pub mod iq;
pub mod node;
pub mod ns;
pub mod outbound;
pub mod pipeline;
pub mod processors;
pub mod stanza;

pub use classify::{
    ErrorKind, ErrorType, RequestContext, StanzaError, StanzaErrorCondition, classify,
};
pub use correlation::{
    CorrelationEngine, IdAllocator, InboundDisposition, IqOutcome, ResponseHandle, Submitted,
};
pub use error::{BuildError, DispatchError, PipelineError};
pub use iq::StanzaExtension;
pub use node::Node;
pub use outbound::{IqDispatcher, StanzaReceiver, StanzaSender, stanza_channel};
pub use pipeline::{
    ProcessorContext, ProcessorResult, StanzaDirection, StanzaPipeline, StanzaProcessor,
};
pub use processors::DebugProcessor;
pub use stanza::{IqType, Stanza, StanzaKind};
