use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tern_core::Config;

use crate::correlation::{CorrelationEngine, IqOutcome, ResponseHandle, Submitted};
use crate::error::DispatchError;
use crate::pipeline::StanzaPipeline;
use crate::processors::DebugProcessor;
use crate::stanza::Stanza;

pub type StanzaSender = mpsc::Sender<Vec<u8>>;

pub type StanzaReceiver = mpsc::Receiver<Vec<u8>>;

/// Byte channel between the dispatcher and the transport task.
pub fn stanza_channel(buffer: usize) -> (StanzaSender, StanzaReceiver) {
    mpsc::channel(buffer)
}

/// Sends stanzas to the transport and routes responses back to callers.
pub struct IqDispatcher {
    engine: Arc<CorrelationEngine>,
    pipeline: Arc<StanzaPipeline>,
    wire_sender: StanzaSender,
    sweeper: Option<JoinHandle<()>>,
}

impl IqDispatcher {
    /// The engine is registered into `pipeline` so it sees inbound responses.
    pub fn new(
        engine: Arc<CorrelationEngine>,
        mut pipeline: StanzaPipeline,
        wire_sender: StanzaSender,
    ) -> Self {
        pipeline.register(engine.clone());
        Self {
            engine,
            pipeline: Arc::new(pipeline),
            wire_sender,
            sweeper: None,
        }
    }

    /// Dispatcher for the configured account, with the timeout sweeper
    /// already running at `correlation.sweep_interval_ms`.
    ///
    /// Must be called from within a Tokio runtime. The sweeper stops when
    /// the dispatcher is dropped.
    pub fn from_config(
        config: &Config,
        wire_sender: StanzaSender,
    ) -> Result<Self, DispatchError> {
        let engine = CorrelationEngine::from_config(&config.correlation)
            .with_account(&config.account.jid)?;
        let mut pipeline = StanzaPipeline::new();
        pipeline.register(Arc::new(DebugProcessor::new()));

        let mut dispatcher = Self::new(Arc::new(engine), pipeline, wire_sender);
        let sweep_interval = config.correlation.sweep_interval();
        debug!(
            timeout_ms = config.correlation.timeout().as_millis() as u64,
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            "starting iq timeout sweeper"
        );
        dispatcher.sweeper = Some(dispatcher.engine.spawn_sweeper(sweep_interval));
        Ok(dispatcher)
    }

    pub fn engine(&self) -> &Arc<CorrelationEngine> {
        &self.engine
    }

    pub fn pipeline(&self) -> &Arc<StanzaPipeline> {
        &self.pipeline
    }

    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        self.engine.spawn_sweeper(period)
    }

    /// Submit a `get`/`set` IQ and write it to the transport.
    ///
    /// If the stanza never reaches the transport its pending entry is
    /// cancelled before returning.
    pub async fn send_iq(&self, stanza: Stanza) -> Result<ResponseHandle, DispatchError> {
        let Submitted { stanza, response } = self.engine.submit(stanza)?;
        match self.write(stanza).await {
            Ok(true) => Ok(response),
            Ok(false) => {
                debug!(id = response.id(), "outbound pipeline dropped iq request");
                self.engine.cancel(response.id());
                Ok(response)
            }
            Err(error) => {
                self.engine.cancel(response.id());
                Err(error)
            }
        }
    }

    /// Send a request and wait for it to settle.
    pub async fn request(&self, stanza: Stanza) -> Result<IqOutcome, DispatchError> {
        let response = self.send_iq(stanza).await?;
        Ok(response.outcome().await)
    }

    /// Send a stanza that expects no response: a message, presence, or an
    /// IQ `result`/`error` answering someone else.
    pub async fn send(&self, stanza: Stanza) -> Result<(), DispatchError> {
        self.write(stanza).await.map(|_| ())
    }

    async fn write(&self, stanza: Stanza) -> Result<bool, DispatchError> {
        let Some(bytes) = self.pipeline.process_outbound(stanza)? else {
            return Ok(false);
        };
        self.wire_sender
            .send(bytes)
            .await
            .map_err(|_| DispatchError::WireSendFailed)?;
        Ok(true)
    }

    /// Feed bytes received from the transport through the inbound pipeline.
    ///
    /// Responses to our requests are consumed; anything else is returned for
    /// the application to handle.
    pub fn handle_inbound(&self, raw: &[u8]) -> Result<Option<Stanza>, DispatchError> {
        self.pipeline.process_inbound(raw).map_err(|error| {
            warn!(error = %error, "dropping unparseable inbound stanza");
            DispatchError::from(error)
        })
    }

    /// Fail every outstanding request; the new session will never answer
    /// the old ids.
    pub fn on_reconnect(&self) -> usize {
        self.engine.reset()
    }
}

impl Drop for IqDispatcher {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}
