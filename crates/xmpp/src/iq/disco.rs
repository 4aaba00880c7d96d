//! XEP-0030 Service Discovery.
//!
//! ```xml
//! <iq type='get' id='info1' to='plays.shakespeare.lit'>
//!   <query xmlns='http://jabber.org/protocol/disco#info'/>
//! </iq>
//!
//! <iq type='result' id='info1' to='romeo@montague.net/orchard'>
//!   <query xmlns='http://jabber.org/protocol/disco#info'>
//!     <identity category='client' type='phone' name='Tern'/>
//!     <feature var='http://jabber.org/protocol/disco#info'/>
//!     <feature var='urn:xmpp:ping'/>
//!   </query>
//! </iq>
//! ```

use std::collections::BTreeSet;

use super::{StanzaExtension, infallible, require};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

fn query(namespace: &str, node: Option<String>) -> Node {
    let query = Node::namespaced("query", namespace);
    match node.filter(|node| !node.is_empty()) {
        Some(node) => query.with_attribute("node", node),
        None => query,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoInfoQuery {
    pub node: Option<String>,
}

impl DiscoInfoQuery {
    fn node(self) -> Node {
        query(ns::DISCO_INFO, self.node)
    }
}

impl StanzaExtension for DiscoInfoQuery {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn disco_info_query(node: Option<&str>) -> Stanza {
    infallible(
        DiscoInfoQuery {
            node: node.map(String::from),
        },
        DiscoInfoQuery::node,
    )
}

#[derive(Debug, Clone, Default)]
pub struct DiscoItemsQuery {
    pub node: Option<String>,
}

impl DiscoItemsQuery {
    fn node(self) -> Node {
        query(ns::DISCO_ITEMS, self.node)
    }
}

impl StanzaExtension for DiscoItemsQuery {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn disco_items_query(node: Option<&str>) -> Stanza {
    infallible(
        DiscoItemsQuery {
            node: node.map(String::from),
        },
        DiscoItemsQuery::node,
    )
}

/// The `<identity/>` an entity advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub category: String,
    pub kind: String,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(category: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            kind: kind.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn to_node(&self) -> Result<Node, BuildError> {
        require("identity category", &self.category)?;
        require("identity type", &self.kind)?;
        let mut identity = Node::element("identity")
            .with_attribute("category", self.category.as_str())
            .with_attribute("type", self.kind.as_str());
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            identity.set_attribute("name", name);
        }
        Ok(identity)
    }
}

/// Answer a disco#info request. Features are sorted and deduplicated.
pub fn disco_info_response<I, S>(
    request: &Stanza,
    features: I,
    identity: &Identity,
    node: Option<&str>,
) -> Result<Stanza, BuildError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let features: BTreeSet<String> = features.into_iter().map(Into::into).collect();
    if features.iter().any(String::is_empty) {
        return Err(BuildError::empty("feature"));
    }

    let mut query = query(ns::DISCO_INFO, node.map(String::from));
    query.add_child(identity.to_node()?);
    for feature in features {
        query.add_child(Node::element("feature").with_attribute("var", feature));
    }
    Ok(Stanza::as_response_to(request)?.with_payload(query))
}
