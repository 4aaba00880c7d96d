//! Normalises inbound `type='error'` stanzas into [`StanzaError`].
//!
//! ```xml
//! <iq type='error' id='q1' from='example.com'>
//!   <query xmlns='urn:xmpp:mam:2' queryid='f27'/>
//!   <error type='cancel'>
//!     <item-not-found xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>
//!     <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>No such archive</text>
//!   </error>
//! </iq>
//! ```
//!
//! The correlation engine reuses [`ErrorKind`] for failures that never reach
//! the wire (timeout, reconnect, cancellation).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::node::Node;
use crate::ns;
use crate::stanza::Stanza;

/// XMPP stanza error conditions (RFC 6120 Section 8.3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanzaErrorCondition {
    BadRequest,
    Conflict,
    FeatureNotImplemented,
    Forbidden,
    Gone,
    InternalServerError,
    ItemNotFound,
    JidMalformed,
    NotAcceptable,
    NotAllowed,
    NotAuthorized,
    PolicyViolation,
    RecipientUnavailable,
    Redirect,
    RegistrationRequired,
    RemoteServerNotFound,
    RemoteServerTimeout,
    ResourceConstraint,
    ServiceUnavailable,
    SubscriptionRequired,
    UndefinedCondition,
    UnexpectedRequest,
}

impl StanzaErrorCondition {
    pub const ALL: [StanzaErrorCondition; 22] = [
        Self::BadRequest,
        Self::Conflict,
        Self::FeatureNotImplemented,
        Self::Forbidden,
        Self::Gone,
        Self::InternalServerError,
        Self::ItemNotFound,
        Self::JidMalformed,
        Self::NotAcceptable,
        Self::NotAllowed,
        Self::NotAuthorized,
        Self::PolicyViolation,
        Self::RecipientUnavailable,
        Self::Redirect,
        Self::RegistrationRequired,
        Self::RemoteServerNotFound,
        Self::RemoteServerTimeout,
        Self::ResourceConstraint,
        Self::ServiceUnavailable,
        Self::SubscriptionRequired,
        Self::UndefinedCondition,
        Self::UnexpectedRequest,
    ];

    /// Get the element name for this condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad-request",
            Self::Conflict => "conflict",
            Self::FeatureNotImplemented => "feature-not-implemented",
            Self::Forbidden => "forbidden",
            Self::Gone => "gone",
            Self::InternalServerError => "internal-server-error",
            Self::ItemNotFound => "item-not-found",
            Self::JidMalformed => "jid-malformed",
            Self::NotAcceptable => "not-acceptable",
            Self::NotAllowed => "not-allowed",
            Self::NotAuthorized => "not-authorized",
            Self::PolicyViolation => "policy-violation",
            Self::RecipientUnavailable => "recipient-unavailable",
            Self::Redirect => "redirect",
            Self::RegistrationRequired => "registration-required",
            Self::RemoteServerNotFound => "remote-server-not-found",
            Self::RemoteServerTimeout => "remote-server-timeout",
            Self::ResourceConstraint => "resource-constraint",
            Self::ServiceUnavailable => "service-unavailable",
            Self::SubscriptionRequired => "subscription-required",
            Self::UndefinedCondition => "undefined-condition",
            Self::UnexpectedRequest => "unexpected-request",
        }
    }
}

impl FromStr for StanzaErrorCondition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|condition| condition.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for StanzaErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// XMPP stanza error types (RFC 6120 Section 8.3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Retry after providing credentials
    Auth,
    /// Do not retry (unrecoverable error)
    Cancel,
    /// Proceed (the condition was only a warning)
    Continue,
    /// Retry after changing the data sent
    Modify,
    /// Retry after waiting (temporary error)
    Wait,
}

impl ErrorType {
    /// Get the type attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Cancel => "cancel",
            Self::Continue => "continue",
            Self::Modify => "modify",
            Self::Wait => "wait",
        }
    }
}

impl FromStr for ErrorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Self::Auth),
            "cancel" => Ok(Self::Cancel),
            "continue" => Ok(Self::Continue),
            "modify" => Ok(Self::Modify),
            "wait" => Ok(Self::Wait),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What went wrong with a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("{0}")]
    Protocol(StanzaErrorCondition),

    #[error("unknown error condition {}", .0.as_deref().unwrap_or("(none)"))]
    UnknownError(Option<String>),

    #[error("no response before the deadline")]
    Timeout,

    #[error("connection reset before a response arrived")]
    ConnectionReset,

    #[error("request cancelled")]
    Cancelled,
}

/// Qualified name of the payload a request carried, e.g.
/// `{urn:xmpp:mam:2}query`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestContext {
    pub name: String,
    pub namespace: String,
}

impl RequestContext {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Context of the first payload element that is not an `<error/>`.
    pub fn of(stanza: &Stanza) -> Option<Self> {
        stanza
            .payload()
            .iter()
            .find(|node| !is_error_element(node))
            .map(|node| {
                Self::new(
                    node.name(),
                    node.namespace().unwrap_or(ns::JABBER_CLIENT),
                )
            })
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

/// A failed request, either reported by the peer or raised locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanzaError {
    pub kind: ErrorKind,
    pub error_type: Option<ErrorType>,
    pub text: Option<String>,
    pub context: Option<RequestContext>,
}

impl StanzaError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            error_type: None,
            text: None,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<RequestContext>) -> Self {
        self.context = context;
        self
    }

    pub fn condition(&self) -> Option<StanzaErrorCondition> {
        match self.kind {
            ErrorKind::Protocol(condition) => Some(condition),
            _ => None,
        }
    }

    /// Raised by the correlation engine rather than by the peer.
    pub fn is_correlation(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Timeout | ErrorKind::ConnectionReset | ErrorKind::Cancelled
        )
    }

    /// Sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::ConnectionReset)
            || self.error_type == Some(ErrorType::Wait)
    }
}

impl fmt::Display for StanzaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(error_type) = self.error_type {
            write!(f, " ({error_type})")?;
        }
        if let Some(text) = &self.text {
            write!(f, ": {text}")?;
        }
        if let Some(context) = &self.context {
            write!(f, " [{context}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StanzaError {}

fn is_error_element(node: &Node) -> bool {
    node.name() == "error" && node.namespace().is_none_or(|ns| ns == ns::JABBER_CLIENT)
}

/// Classify a stanza. Returns `None` unless its type is `error`.
pub fn classify(stanza: &Stanza) -> Option<StanzaError> {
    if stanza.stanza_type() != Some("error") {
        return None;
    }

    let context = RequestContext::of(stanza);
    let Some(error) = stanza.payload().iter().find(|node| is_error_element(node)) else {
        return Some(StanzaError::new(ErrorKind::UnknownError(None)).with_context(context));
    };

    let error_type = error
        .attribute("type")
        .and_then(|raw| raw.parse::<ErrorType>().ok());

    let kind = match error
        .children()
        .iter()
        .find(|child| child.namespace() == Some(ns::XMPP_STANZAS) && child.name() != "text")
    {
        Some(condition) => match condition.name().parse::<StanzaErrorCondition>() {
            Ok(known) => ErrorKind::Protocol(known),
            Err(()) => ErrorKind::UnknownError(Some(condition.name().to_string())),
        },
        None => ErrorKind::UnknownError(None),
    };

    let text = error
        .find_child("text", Some(ns::XMPP_STANZAS))
        .and_then(Node::text)
        .map(String::from);

    Some(StanzaError {
        kind,
        error_type,
        text,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stanza::IqType;

    fn error_iq(error: &str) -> Stanza {
        let raw = format!(
            "<iq xmlns='jabber:client' type='error' id='e1'><ping xmlns='urn:xmpp:ping'/>{error}</iq>"
        );
        Stanza::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn every_condition_parses_back_from_its_name() {
        for condition in StanzaErrorCondition::ALL {
            assert_eq!(condition.as_str().parse::<StanzaErrorCondition>(), Ok(condition));
        }
        assert!("quota-exceeded".parse::<StanzaErrorCondition>().is_err());
    }

    #[test]
    fn classifies_known_condition_with_text_and_context() {
        let stanza = error_iq(
            "<error type='cancel'>\
             <service-unavailable xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
             <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>try later</text>\
             </error>",
        );

        let error = classify(&stanza).unwrap();
        assert_eq!(
            error.kind,
            ErrorKind::Protocol(StanzaErrorCondition::ServiceUnavailable)
        );
        assert_eq!(error.error_type, Some(ErrorType::Cancel));
        assert_eq!(error.text.as_deref(), Some("try later"));
        assert_eq!(error.context, Some(RequestContext::new("ping", ns::PING)));
        assert!(!error.is_correlation());
    }

    #[test]
    fn text_before_condition_is_skipped() {
        let stanza = error_iq(
            "<error type='wait'>\
             <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>busy</text>\
             <resource-constraint xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
             </error>",
        );

        let error = classify(&stanza).unwrap();
        assert_eq!(error.condition(), Some(StanzaErrorCondition::ResourceConstraint));
        assert!(error.is_retryable());
    }

    #[test]
    fn unrecognised_condition_keeps_raw_name() {
        let stanza = error_iq(
            "<error type='modify'><quota-exceeded xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error>",
        );

        let error = classify(&stanza).unwrap();
        assert_eq!(
            error.kind,
            ErrorKind::UnknownError(Some("quota-exceeded".to_string()))
        );
        assert_eq!(error.error_type, Some(ErrorType::Modify));
    }

    #[test]
    fn missing_error_child_is_unknown() {
        let stanza = Stanza::iq(IqType::Error).with_id("x");
        let error = classify(&stanza).unwrap();
        assert_eq!(error.kind, ErrorKind::UnknownError(None));
        assert!(error.error_type.is_none());
        assert!(error.context.is_none());
    }

    #[test]
    fn condition_in_foreign_namespace_is_ignored() {
        let stanza = error_iq("<error type='bogus'><gone xmlns='urn:example:app'/></error>");
        let error = classify(&stanza).unwrap();
        assert_eq!(error.kind, ErrorKind::UnknownError(None));
        assert!(error.error_type.is_none());
    }

    #[test]
    fn non_error_stanzas_are_not_classified() {
        assert!(classify(&Stanza::iq(IqType::Result)).is_none());
        assert!(classify(&Stanza::message(Some("chat"))).is_none());
    }

    #[test]
    fn round_trips_with_error_builder() {
        let request = Stanza::iq(IqType::Get).with_id("r1").with_from("bob@example.com");
        let reply = Stanza::as_error_to(&request).unwrap().with_error(
            StanzaErrorCondition::NotAllowed,
            ErrorType::Auth,
            None,
        );
        let reparsed = Stanza::parse(&reply.to_bytes().unwrap()).unwrap();

        let error = classify(&reparsed).unwrap();
        assert_eq!(error.condition(), Some(StanzaErrorCondition::NotAllowed));
        assert_eq!(error.error_type, Some(ErrorType::Auth));
        assert!(error.text.is_none());
    }

    #[test]
    fn correlation_errors_render_with_context() {
        let error = StanzaError::new(ErrorKind::Timeout)
            .with_context(Some(RequestContext::new("query", ns::MAM)));
        assert!(error.is_correlation());
        assert!(error.is_retryable());
        assert_eq!(
            error.to_string(),
            "no response before the deadline [{urn:xmpp:mam:2}query]"
        );

        assert!(!StanzaError::new(ErrorKind::Cancelled).is_retryable());
    }
}
