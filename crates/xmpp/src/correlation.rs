//! Matches inbound `result`/`error` IQs to the request that caused them.
//!
//! Every `get`/`set` IQ handed to [`CorrelationEngine::submit`] gets an id
//! and a pending entry. The entry is settled exactly once: by a response,
//! by [`CorrelationEngine::cancel`], by the timeout sweep, or by
//! [`CorrelationEngine::reset`] when the connection is re-established. A
//! response that arrives after its entry is gone is stale and discarded.
//!
//! A response must come from the entity the request was addressed to. A
//! request without `to` goes to the account itself, so its response may
//! carry no `from`, the account's JID or the account's domain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jid::{BareJid, Jid};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tern_core::CorrelationConfig;

use crate::classify::{ErrorKind, RequestContext, StanzaError, classify};
use crate::error::BuildError;
use crate::pipeline::{ProcessorContext, ProcessorResult, StanzaProcessor};
use crate::stanza::{IqType, Stanza};

/// How a request ended: the `result` stanza or why there is none.
pub type IqOutcome = Result<Stanza, StanzaError>;

/// Mints ids that are unique for the lifetime of one engine.
#[derive(Debug)]
pub struct IdAllocator {
    prefix: String,
    counter: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        let mut prefix = Uuid::new_v4().simple().to_string();
        prefix.truncate(8);
        Self {
            prefix,
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingRequest {
    created_at: DateTime<Utc>,
    deadline: Instant,
    to: Option<String>,
    context: Option<RequestContext>,
    responder: oneshot::Sender<IqOutcome>,
}

impl PendingRequest {
    fn fail(self, id: &str, kind: ErrorKind) {
        let error = StanzaError::new(kind).with_context(self.context);
        if self.responder.send(Err(error)).is_err() {
            debug!(id, "response handle already dropped");
        }
    }
}

/// What [`CorrelationEngine::on_inbound`] did with a stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDisposition {
    /// A `result` settled its pending request.
    Resolved,
    /// An `error` settled its pending request.
    Failed,
    /// A response with no outstanding request; discarded.
    Stale,
    /// A response whose sender is not the request's recipient; discarded
    /// and the request stays pending.
    UnexpectedSender,
    /// Not an IQ response; left for other processors.
    NotAResponse,
}

/// The submitted stanza, id stamped, plus the handle its response arrives on.
#[derive(Debug)]
pub struct Submitted {
    pub stanza: Stanza,
    pub response: ResponseHandle,
}

#[derive(Debug)]
pub struct ResponseHandle {
    id: String,
    receiver: oneshot::Receiver<IqOutcome>,
}

impl ResponseHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the request to settle. A dropped engine counts as a reset.
    pub async fn outcome(self) -> IqOutcome {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(StanzaError::new(ErrorKind::ConnectionReset)))
    }
}

pub struct CorrelationEngine {
    ids: IdAllocator,
    timeout: Duration,
    account: Option<BareJid>,
    pending: Mutex<HashMap<String, PendingRequest>>,
}

impl CorrelationEngine {
    pub fn new(timeout: Duration) -> Self {
        Self {
            ids: IdAllocator::new(),
            timeout,
            account: None,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(config.timeout())
    }

    /// Accept responses from `account` to requests sent without `to`.
    ///
    /// Without an account any sender is accepted for those requests.
    pub fn with_account(mut self, account: &str) -> Result<Self, BuildError> {
        let jid: Jid = account
            .parse()
            .map_err(|_| BuildError::InvalidJid(account.to_string()))?;
        self.account = Some(jid.to_bare());
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an outgoing `get`/`set` IQ.
    ///
    /// Mints an id when the stanza has none. A caller-chosen id must not
    /// collide with an outstanding request.
    pub fn submit(&self, mut stanza: Stanza) -> Result<Submitted, BuildError> {
        if !stanza.iq_type().is_some_and(|t| t.is_request()) {
            return Err(BuildError::invalid(
                "type",
                format!(
                    "only iq get/set expect a response, got <{} type={:?}/>",
                    stanza.name(),
                    stanza.stanza_type().unwrap_or_default()
                ),
            ));
        }

        let context = RequestContext::of(&stanza);
        let (responder, receiver) = oneshot::channel();

        let mut pending = self.pending();
        let id = match stanza.id().filter(|id| !id.is_empty()) {
            Some(id) if pending.contains_key(id) => {
                return Err(BuildError::DuplicateId(id.to_string()));
            }
            Some(id) => id.to_string(),
            None => {
                let mut id = self.ids.next_id();
                while pending.contains_key(&id) {
                    id = self.ids.next_id();
                }
                stanza.set_id(id.clone());
                id
            }
        };

        debug!(
            id = %id,
            to = stanza.to().unwrap_or_default(),
            context = context.as_ref().map(ToString::to_string).unwrap_or_default(),
            "iq submitted"
        );
        pending.insert(
            id.clone(),
            PendingRequest {
                created_at: Utc::now(),
                deadline: Instant::now() + self.timeout,
                to: stanza.to().map(String::from),
                context,
                responder,
            },
        );

        Ok(Submitted {
            stanza,
            response: ResponseHandle { id, receiver },
        })
    }

    /// Settle the pending request an inbound `result`/`error` answers.
    pub fn on_inbound(&self, stanza: &Stanza) -> InboundDisposition {
        let iq_type = match stanza.iq_type() {
            Some(t @ (IqType::Result | IqType::Error)) => t,
            _ => return InboundDisposition::NotAResponse,
        };

        let Some(id) = stanza.id() else {
            warn!(from = stanza.from().unwrap_or_default(), "discarding iq response without id");
            return InboundDisposition::Stale;
        };

        let request = {
            let mut pending = self.pending();
            let Some(request) = pending.get(id) else {
                warn!(
                    id,
                    from = stanza.from().unwrap_or_default(),
                    "discarding iq response with no outstanding request"
                );
                return InboundDisposition::Stale;
            };
            if !self.is_expected_sender(request.to.as_deref(), stanza.from()) {
                warn!(
                    id,
                    from = stanza.from().unwrap_or_default(),
                    to = request.to.as_deref().unwrap_or_default(),
                    "discarding iq response from unexpected sender"
                );
                return InboundDisposition::UnexpectedSender;
            }
            match pending.remove(id) {
                Some(request) => request,
                None => return InboundDisposition::Stale,
            }
        };

        let elapsed_ms = (Utc::now() - request.created_at).num_milliseconds();
        let (outcome, disposition) = match iq_type {
            IqType::Result => (Ok(stanza.clone()), InboundDisposition::Resolved),
            _ => {
                let mut error = classify(stanza)
                    .unwrap_or_else(|| StanzaError::new(ErrorKind::UnknownError(None)));
                if request.context.is_some() {
                    error.context = request.context;
                }
                debug!(id, elapsed_ms, error = %error, "iq failed");
                (Err(error), InboundDisposition::Failed)
            }
        };
        if disposition == InboundDisposition::Resolved {
            debug!(id, elapsed_ms, "iq resolved");
        }

        if request.responder.send(outcome).is_err() {
            debug!(id, "response handle already dropped");
        }
        disposition
    }

    fn is_expected_sender(&self, to: Option<&str>, from: Option<&str>) -> bool {
        match (to, from) {
            (Some(to), Some(from)) => same_jid(to, from),
            (Some(to), None) => self.is_own_account(to),
            (None, None) => true,
            (None, Some(from)) => self.account.is_none() || self.is_own_account(from),
        }
    }

    /// The account's bare or full JID, or its server's domain.
    fn is_own_account(&self, jid: &str) -> bool {
        let (Some(account), Ok(jid)) = (&self.account, jid.parse::<Jid>()) else {
            return false;
        };
        jid.to_bare() == *account
            || (jid.node().is_none()
                && jid.resource().is_none()
                && jid.domain().as_str() == account.domain().as_str())
    }

    /// Fail an outstanding request with `Cancelled`. Returns whether it was
    /// still pending.
    pub fn cancel(&self, id: &str) -> bool {
        let Some(request) = self.pending().remove(id) else {
            return false;
        };
        debug!(id, "iq cancelled");
        request.fail(id, ErrorKind::Cancelled);
        true
    }

    /// Fail every request whose deadline has passed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(String, PendingRequest)> = {
            let mut pending = self.pending();
            let ids: Vec<String> = pending
                .iter()
                .filter(|(_, request)| request.deadline <= now)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove_entry(&id))
                .collect()
        };

        let count = expired.len();
        for (id, request) in expired {
            debug!(id = %id, timeout_ms = self.timeout.as_millis() as u64, "iq timed out");
            request.fail(&id, ErrorKind::Timeout);
        }
        count
    }

    /// Periodically sweep expired requests until the engine is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let engine = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(engine) = engine.upgrade() else {
                    debug!("correlation engine dropped, sweeper stopping");
                    break;
                };
                engine.sweep_expired();
            }
        })
    }

    /// Fail every outstanding request with `ConnectionReset`.
    ///
    /// Call when the session is re-established; responses to the old
    /// session's ids will never arrive.
    pub fn reset(&self) -> usize {
        let drained: Vec<(String, PendingRequest)> = self.pending().drain().collect();
        let count = drained.len();
        if count > 0 {
            info!(count, "failing outstanding iq requests after reconnect");
        }
        for (id, request) in drained {
            request.fail(&id, ErrorKind::ConnectionReset);
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending().contains_key(id)
    }
}

impl StanzaProcessor for CorrelationEngine {
    fn name(&self) -> &str {
        "correlation"
    }

    fn process_inbound(&self, stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
        match self.on_inbound(stanza) {
            InboundDisposition::NotAResponse => ProcessorResult::Continue,
            InboundDisposition::Resolved
            | InboundDisposition::Failed
            | InboundDisposition::Stale
            | InboundDisposition::UnexpectedSender => ProcessorResult::Drop,
        }
    }

    fn process_outbound(&self, _stanza: &mut Stanza, _ctx: &ProcessorContext) -> ProcessorResult {
        ProcessorResult::Continue
    }

    fn priority(&self) -> i32 {
        0
    }
}

fn same_jid(a: &str, b: &str) -> bool {
    match (a.parse::<Jid>(), b.parse::<Jid>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
