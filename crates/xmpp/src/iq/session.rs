//! Session-level requests: resource binding (RFC 6120), XEP-0199 ping,
//! XEP-0092 software version and XEP-0013 offline storage purge.
//!
//! ```xml
//! <iq type='set' id='bind_1'>
//!   <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'>
//!     <resource>balcony</resource>
//!   </bind>
//! </iq>
//!
//! <iq type='get' id='c2s1'>
//!   <ping xmlns='urn:xmpp:ping'/>
//! </iq>
//!
//! <iq type='result' id='info1' to='romeo@montague.net/orchard'>
//!   <query xmlns='jabber:iq:version'>
//!     <name>Tern</name>
//!     <version>0.1.0</version>
//!     <os>linux</os>
//!   </query>
//! </iq>
//!
//! <iq type='set' id='purge1'>
//!   <offline xmlns='http://jabber.org/protocol/offline'>
//!     <purge/>
//!   </offline>
//! </iq>
//! ```

use tern_core::AccountConfig;

use super::{StanzaExtension, infallible, require, validate_jid};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Resource binding. Without a resource the server picks one.
#[derive(Debug, Clone, Default)]
pub struct Bind {
    pub resource: Option<String>,
}

impl Bind {
    fn node(self) -> Node {
        let bind = Node::namespaced("bind", ns::BIND);
        match self.resource.filter(|r| !r.is_empty()) {
            Some(resource) => bind.with_child(Node::text_element("resource", resource)),
            None => bind,
        }
    }
}

impl From<&AccountConfig> for Bind {
    fn from(account: &AccountConfig) -> Self {
        Self {
            resource: account.resource.clone(),
        }
    }
}

impl StanzaExtension for Bind {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn bind(resource: Option<&str>) -> Stanza {
    infallible(
        Bind {
            resource: resource.map(String::from),
        },
        Bind::node,
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

impl Ping {
    fn node(self) -> Node {
        Node::namespaced("ping", ns::PING)
    }
}

impl StanzaExtension for Ping {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn ping() -> Stanza {
    infallible(Ping, Ping::node)
}

/// Ask another entity which software it runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionQuery;

impl StanzaExtension for VersionQuery {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(Node::namespaced("query", ns::VERSION))
    }
}

pub fn version_query(to: &str) -> Result<Stanza, BuildError> {
    VersionQuery.into_iq_to(to)
}

/// Answer a `jabber:iq:version` request.
pub fn version_response(
    request: &Stanza,
    name: &str,
    version: &str,
    os: Option<&str>,
) -> Result<Stanza, BuildError> {
    require("name", name)?;
    require("version", version)?;
    if let Some(from) = request.from() {
        validate_jid(from)?;
    }

    let mut query = Node::namespaced("query", ns::VERSION)
        .with_child(Node::text_element("name", name))
        .with_child(Node::text_element("version", version));
    if let Some(os) = os.filter(|os| !os.is_empty()) {
        query.add_child(Node::text_element("os", os));
    }
    Ok(Stanza::as_response_to(request)?.with_payload(query))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePurge;

impl OfflinePurge {
    fn node(self) -> Node {
        Node::namespaced("offline", ns::OFFLINE).with_child(Node::element("purge"))
    }
}

impl StanzaExtension for OfflinePurge {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

/// Delete every message the server stored while we were offline.
pub fn offline_purge() -> Stanza {
    infallible(OfflinePurge, OfflinePurge::node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_with_resource() {
        let stanza = bind(Some("laptop"));
        assert_eq!(stanza.iq_type(), Some(IqType::Set));
        assert_eq!(stanza.payload().len(), 1);

        let payload = stanza.find_payload("bind", ns::BIND).unwrap();
        assert_eq!(payload.child_text("resource"), Some("laptop"));
    }

    #[test]
    fn test_bind_without_resource_omits_child() {
        for resource in [None, Some("")] {
            let stanza = bind(resource);
            let payload = stanza.find_payload("bind", ns::BIND).unwrap();
            assert!(payload.children().is_empty());
        }
    }

    #[test]
    fn test_bind_from_account() {
        let account = AccountConfig {
            jid: "alice@example.com".to_string(),
            resource: Some("tern".to_string()),
        };
        let stanza = Bind::from(&account).into_iq().unwrap();
        let payload = stanza.find_payload("bind", ns::BIND).unwrap();
        assert_eq!(payload.child_text("resource"), Some("tern"));
    }

    #[test]
    fn test_ping() {
        let stanza = ping();
        assert_eq!(stanza.iq_type(), Some(IqType::Get));
        assert!(stanza.id().is_none());
        let payload = stanza.first_payload().unwrap();
        assert!(payload.is("ping", ns::PING));
        assert!(payload.children().is_empty());
    }

    #[test]
    fn test_version_query_validates_recipient() {
        let stanza = version_query("capulet.lit").unwrap();
        assert_eq!(stanza.to(), Some("capulet.lit"));
        assert!(stanza.find_payload("query", ns::VERSION).is_some());

        assert_eq!(
            version_query("").unwrap_err(),
            BuildError::InvalidJid(String::new())
        );
    }

    #[test]
    fn test_version_response() {
        let request = version_query("example.com")
            .unwrap()
            .with_id("v1")
            .with_from("romeo@montague.net/orchard");

        let response = version_response(&request, "Tern", "0.1.0", Some("linux")).unwrap();
        assert_eq!(response.iq_type(), Some(IqType::Result));
        assert_eq!(response.id(), Some("v1"));
        assert_eq!(response.to(), Some("romeo@montague.net/orchard"));

        let query = response.find_payload("query", ns::VERSION).unwrap();
        assert_eq!(query.child_text("name"), Some("Tern"));
        assert_eq!(query.child_text("version"), Some("0.1.0"));
        assert_eq!(query.child_text("os"), Some("linux"));
    }

    #[test]
    fn test_version_response_requires_id_and_name() {
        let request = Stanza::iq(IqType::Get).with_from("example.com");
        assert_eq!(
            version_response(&request, "Tern", "0.1.0", None).unwrap_err(),
            BuildError::MissingCorrelationId
        );

        let request = request.with_id("v2");
        assert!(matches!(
            version_response(&request, "", "0.1.0", None),
            Err(BuildError::InvalidArgument { field: "name", .. })
        ));
        let response = version_response(&request, "Tern", "0.1.0", None).unwrap();
        let query = response.first_payload().unwrap();
        assert!(query.find_child("os", None).is_none());
    }

    #[test]
    fn test_offline_purge() {
        let stanza = offline_purge();
        assert_eq!(stanza.iq_type(), Some(IqType::Set));
        let offline = stanza.find_payload("offline", ns::OFFLINE).unwrap();
        assert!(offline.find_child("purge", Some(ns::OFFLINE)).is_some());
    }
}
