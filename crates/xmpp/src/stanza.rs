use std::fmt;
use std::str::FromStr;

use minidom::Element;

use crate::classify::{ErrorType, StanzaErrorCondition};
use crate::error::{BuildError, PipelineError};
use crate::node::Node;
use crate::ns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanzaKind {
    Message,
    Presence,
    Iq,
}

impl StanzaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StanzaKind::Message => "message",
            StanzaKind::Presence => "presence",
            StanzaKind::Iq => "iq",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "message" => Some(StanzaKind::Message),
            "presence" => Some(StanzaKind::Presence),
            "iq" => Some(StanzaKind::Iq),
            _ => None,
        }
    }
}

impl fmt::Display for StanzaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IqType {
    Get,
    Set,
    Result,
    Error,
}

impl IqType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IqType::Get => "get",
            IqType::Set => "set",
            IqType::Result => "result",
            IqType::Error => "error",
        }
    }

    /// `get` and `set` expect an answer; `result` and `error` are answers.
    pub fn is_request(&self) -> bool {
        matches!(self, IqType::Get | IqType::Set)
    }
}

impl FromStr for IqType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(IqType::Get),
            "set" => Ok(IqType::Set),
            "result" => Ok(IqType::Result),
            "error" => Ok(IqType::Error),
            other => Err(PipelineError::ParseFailed(format!(
                "unknown iq type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for IqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level `message`, `presence` or `iq` element.
///
/// Routing attributes live in typed fields; everything inside the stanza is
/// kept as an ordered list of payload [`Node`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    kind: StanzaKind,
    id: Option<String>,
    to: Option<String>,
    from: Option<String>,
    type_: Option<String>,
    payload: Vec<Node>,
}

impl Stanza {
    pub fn new(kind: StanzaKind, type_: Option<&str>) -> Self {
        Self {
            kind,
            id: None,
            to: None,
            from: None,
            type_: type_.map(String::from),
            payload: Vec::new(),
        }
    }

    pub fn iq(type_: IqType) -> Self {
        Self::new(StanzaKind::Iq, Some(type_.as_str()))
    }

    pub fn iq_to(type_: IqType, to: impl Into<String>) -> Self {
        Self::iq(type_).with_to(to)
    }

    pub fn message(type_: Option<&str>) -> Self {
        Self::new(StanzaKind::Message, type_)
    }

    pub fn presence(type_: Option<&str>) -> Self {
        Self::new(StanzaKind::Presence, type_)
    }

    pub fn kind(&self) -> StanzaKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn set_to(&mut self, to: impl Into<String>) {
        self.to = Some(to.into());
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.set_to(to);
        self
    }

    /// Sender address. Only inbound stanzas carry one; the server stamps it.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn stanza_type(&self) -> Option<&str> {
        self.type_.as_deref()
    }

    /// The `type` of an `iq`; `None` for other kinds or an unknown value.
    pub fn iq_type(&self) -> Option<IqType> {
        if self.kind != StanzaKind::Iq {
            return None;
        }
        self.type_.as_deref().and_then(|t| t.parse().ok())
    }

    pub fn is_iq(&self, type_: IqType) -> bool {
        self.iq_type() == Some(type_)
    }

    pub fn payload(&self) -> &[Node] {
        &self.payload
    }

    pub fn first_payload(&self) -> Option<&Node> {
        self.payload.first()
    }

    pub fn find_payload(&self, name: &str, namespace: &str) -> Option<&Node> {
        self.payload.iter().find(|node| node.is(name, namespace))
    }

    pub fn add_payload(&mut self, node: Node) -> &mut Node {
        self.payload.push(node);
        let last = self.payload.len() - 1;
        &mut self.payload[last]
    }

    pub fn with_payload(mut self, node: Node) -> Self {
        self.payload.push(node);
        self
    }

    /// A `result` answering the IQ `request`: same id, addressed back to
    /// the requester. Only IQs take a `result`.
    pub fn as_response_to(request: &Stanza) -> Result<Stanza, BuildError> {
        Self::answer(request, IqType::Result)
    }

    /// Like [`Stanza::as_response_to`] but of type `error`, and also valid
    /// for messages and presences. The caller
    /// attaches the condition, usually with [`Stanza::with_error`].
    pub fn as_error_to(request: &Stanza) -> Result<Stanza, BuildError> {
        Self::answer(request, IqType::Error)
    }

    fn answer(request: &Stanza, type_: IqType) -> Result<Stanza, BuildError> {
        if type_ == IqType::Result && request.kind != StanzaKind::Iq {
            return Err(BuildError::invalid(
                "type",
                format!("<{}/> stanzas have no result type", request.name()),
            ));
        }
        let id = request
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(BuildError::MissingCorrelationId)?;

        let mut response = Stanza::new(request.kind, Some(type_.as_str())).with_id(id);
        response.to = request.from.clone();
        Ok(response)
    }

    /// Append an RFC 6120 `<error/>` element.
    pub fn with_error(
        self,
        condition: StanzaErrorCondition,
        error_type: ErrorType,
        text: Option<&str>,
    ) -> Self {
        let mut error = Node::element("error")
            .with_attribute("type", error_type.as_str())
            .with_child(Node::namespaced(condition.as_str(), ns::XMPP_STANZAS));
        if let Some(text) = text {
            error.add_child(Node::text_element("text", text).in_namespace(ns::XMPP_STANZAS));
        }
        self.with_payload(error)
    }

    pub fn parse(raw: &[u8]) -> Result<Self, PipelineError> {
        parse_stanza(raw)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        serialize_stanza(self)
    }

    pub fn to_node(&self) -> Node {
        let mut node = Node::namespaced(self.kind.as_str(), ns::JABBER_CLIENT);
        for (key, value) in [
            ("id", &self.id),
            ("to", &self.to),
            ("from", &self.from),
            ("type", &self.type_),
        ] {
            if let Some(value) = value {
                node.set_attribute(key, value.as_str());
            }
        }
        for child in &self.payload {
            node.add_child(child.clone());
        }
        node
    }

    pub fn to_element(&self) -> Result<Element, BuildError> {
        self.to_node().to_element(ns::JABBER_CLIENT)
    }
}

impl TryFrom<Node> for Stanza {
    type Error = PipelineError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        let kind = StanzaKind::from_name(node.name()).ok_or_else(|| {
            PipelineError::ParseFailed(format!("unsupported stanza element <{}/>", node.name()))
        })?;

        let type_ = node.attribute("type").map(String::from);
        if kind == StanzaKind::Iq {
            let raw = type_.as_deref().ok_or_else(|| {
                PipelineError::ParseFailed("<iq/> stanza is missing its type".to_string())
            })?;
            raw.parse::<IqType>()?;
        }

        Ok(Stanza {
            kind,
            id: node.attribute("id").map(String::from),
            to: node.attribute("to").map(String::from),
            from: node.attribute("from").map(String::from),
            type_,
            payload: node.children().to_vec(),
        })
    }
}

impl From<Stanza> for Node {
    fn from(value: Stanza) -> Self {
        value.to_node()
    }
}

impl TryFrom<&Stanza> for Element {
    type Error = BuildError;

    fn try_from(value: &Stanza) -> Result<Self, Self::Error> {
        value.to_element()
    }
}

pub fn parse_stanza(raw: &[u8]) -> Result<Stanza, PipelineError> {
    let xml = std::str::from_utf8(raw).map_err(|error| {
        PipelineError::ParseFailed(format!("invalid UTF-8 stanza bytes: {error}"))
    })?;
    let trimmed = xml.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::ParseFailed(
            "stanza payload is empty".to_string(),
        ));
    }

    let element = Element::from_str(trimmed).map_err(|error| {
        PipelineError::ParseFailed(format!("failed to parse stanza XML: {error}"))
    })?;
    Stanza::try_from(Node::from_element(&element, None))
}

pub fn serialize_stanza(stanza: &Stanza) -> Result<Vec<u8>, PipelineError> {
    let element = stanza.to_element().map_err(|error| {
        PipelineError::ProcessorFailed(format!(
            "cannot serialize <{}/> stanza: {error}",
            stanza.name()
        ))
    })?;
    let mut payload = Vec::new();
    element.write_to(&mut payload).map_err(|error| {
        PipelineError::ProcessorFailed(format!(
            "failed to serialize <{}/> stanza: {error}",
            stanza.name()
        ))
    })?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_XML: &str = "<message xmlns='jabber:client' type='chat' from='alice@example.com' to='bob@example.com'><body>hello</body></message>";
    const PRESENCE_XML: &str =
        "<presence xmlns='jabber:client'><show>away</show><status>out</status></presence>";
    const IQ_XML: &str =
        "<iq xmlns='jabber:client' type='get' id='ping-1' from='example.com'><ping xmlns='urn:xmpp:ping'/></iq>";

    #[test]
    fn parses_message_stanza() {
        let stanza = parse_stanza(MESSAGE_XML.as_bytes()).expect("message stanza should parse");
        assert_eq!(stanza.kind(), StanzaKind::Message);
        assert_eq!(stanza.stanza_type(), Some("chat"));
        assert_eq!(stanza.from(), Some("alice@example.com"));
        let body = stanza.payload().first().unwrap();
        assert_eq!(body.name(), "body");
        assert_eq!(body.namespace(), None);
        assert_eq!(body.text(), Some("hello"));
    }

    #[test]
    fn parses_presence_without_type() {
        let stanza = parse_stanza(PRESENCE_XML.as_bytes()).expect("presence stanza should parse");
        assert_eq!(stanza.kind(), StanzaKind::Presence);
        assert!(stanza.stanza_type().is_none());
        assert_eq!(stanza.payload().len(), 2);
    }

    #[test]
    fn parses_iq_stanza() {
        let stanza = parse_stanza(IQ_XML.as_bytes()).expect("iq stanza should parse");
        assert_eq!(stanza.id(), Some("ping-1"));
        assert_eq!(stanza.iq_type(), Some(IqType::Get));
        assert!(stanza.find_payload("ping", ns::PING).is_some());
    }

    #[test]
    fn parse_rejects_unknown_root_element() {
        let error = parse_stanza(b"<foo xmlns='jabber:client'/>").expect_err("must fail");
        assert!(matches!(error, PipelineError::ParseFailed(_)));
        assert!(
            error
                .to_string()
                .contains("unsupported stanza element <foo/>")
        );
    }

    #[test]
    fn parse_rejects_iq_with_bad_type() {
        let error = parse_stanza(b"<iq xmlns='jabber:client' type='fetch' id='x'/>")
            .expect_err("must fail");
        assert!(error.to_string().contains("unknown iq type"));

        let error = parse_stanza(b"<iq xmlns='jabber:client' id='x'/>").expect_err("must fail");
        assert!(error.to_string().contains("missing its type"));
    }

    #[test]
    fn parse_rejects_invalid_utf8_and_empty_input() {
        let error = parse_stanza(&[0xFF, 0xFE]).expect_err("must fail");
        assert!(error.to_string().contains("invalid UTF-8 stanza bytes"));

        let error = parse_stanza(b"   ").expect_err("must fail");
        assert!(error.to_string().contains("empty"));
    }

    #[test]
    fn serialized_stanza_parses_back_unchanged() {
        for raw in [MESSAGE_XML, PRESENCE_XML, IQ_XML] {
            let stanza = parse_stanza(raw.as_bytes()).expect("stanza should parse");
            let encoded = serialize_stanza(&stanza).expect("stanza should serialize");
            let decoded = parse_stanza(&encoded).expect("serialized stanza should parse");
            assert_eq!(decoded, stanza);
        }
    }

    #[test]
    fn response_copies_id_and_addresses_requester() {
        let request = parse_stanza(IQ_XML.as_bytes()).unwrap();
        let response = Stanza::as_response_to(&request).unwrap();

        assert_eq!(response.id(), Some("ping-1"));
        assert_eq!(response.to(), Some("example.com"));
        assert_eq!(response.iq_type(), Some(IqType::Result));
        assert!(response.from().is_none());
        assert!(response.payload().is_empty());
    }

    #[test]
    fn error_response_carries_condition() {
        let request = parse_stanza(IQ_XML.as_bytes()).unwrap();
        let response = Stanza::as_error_to(&request).unwrap().with_error(
            StanzaErrorCondition::FeatureNotImplemented,
            ErrorType::Cancel,
            Some("no pings here"),
        );

        assert_eq!(response.iq_type(), Some(IqType::Error));
        let error = response.first_payload().unwrap();
        assert_eq!(error.name(), "error");
        assert_eq!(error.namespace(), None);
        assert_eq!(error.attribute("type"), Some("cancel"));
        assert!(
            error
                .find_child("feature-not-implemented", Some(ns::XMPP_STANZAS))
                .is_some()
        );
        assert_eq!(
            error
                .find_child("text", Some(ns::XMPP_STANZAS))
                .and_then(Node::text),
            Some("no pings here")
        );
    }

    #[test]
    fn response_requires_request_id() {
        let request = Stanza::iq(IqType::Get);
        assert_eq!(
            Stanza::as_response_to(&request).unwrap_err(),
            BuildError::MissingCorrelationId
        );

        let request = Stanza::iq(IqType::Set).with_id("");
        assert_eq!(
            Stanza::as_error_to(&request).unwrap_err(),
            BuildError::MissingCorrelationId
        );
    }

    #[test]
    fn only_iq_requests_take_a_result() {
        let message = parse_stanza(MESSAGE_XML.as_bytes()).unwrap().with_id("m1");
        assert!(matches!(
            Stanza::as_response_to(&message),
            Err(BuildError::InvalidArgument { field: "type", .. })
        ));

        let bounce = Stanza::as_error_to(&message).unwrap();
        assert_eq!(bounce.kind(), StanzaKind::Message);
        assert_eq!(bounce.stanza_type(), Some("error"));
        assert_eq!(bounce.to(), Some("alice@example.com"));
    }

    #[test]
    fn serialize_rejects_empty_element_name() {
        let stanza = Stanza::iq(IqType::Get).with_payload(Node::element(""));
        let err = serialize_stanza(&stanza).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ProcessorFailed(ref msg) if msg.contains("empty name")
        ));
    }

    #[test]
    fn iq_to_sets_recipient() {
        let stanza = Stanza::iq_to(IqType::Get, "upload.example.com");
        assert_eq!(stanza.to(), Some("upload.example.com"));
        assert!(stanza.id().is_none());
    }

    #[test]
    fn iq_type_is_none_for_messages() {
        let message = Stanza::message(Some("error"));
        assert!(message.iq_type().is_none());
    }
}
