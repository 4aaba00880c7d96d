//! XEP-0191: Blocking Command
//!
//! ```xml
//! <iq type='get' id='blocklist1'>
//!   <blocklist xmlns='urn:xmpp:blocking'/>
//! </iq>
//!
//! <iq type='set' id='block1'>
//!   <block xmlns='urn:xmpp:blocking'>
//!     <item jid='romeo@montague.net'/>
//!   </block>
//! </iq>
//!
//! <iq type='set' id='unblock1'>
//!   <unblock xmlns='urn:xmpp:blocking'>
//!     <item jid='romeo@montague.net'/>
//!   </unblock>
//! </iq>
//! ```

use super::{StanzaExtension, infallible, validate_jid};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

fn command(name: &str, jid: String) -> Result<Node, BuildError> {
    validate_jid(&jid)?;
    Ok(Node::namespaced(name, ns::BLOCKING).with_child(Node::element("item").with_attribute("jid", jid)))
}

#[derive(Debug, Clone)]
pub struct Block {
    pub jid: String,
}

impl StanzaExtension for Block {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        command("block", self.jid)
    }
}

#[derive(Debug, Clone)]
pub struct Unblock {
    pub jid: String,
}

impl StanzaExtension for Unblock {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        command("unblock", self.jid)
    }
}

pub fn block(jid: &str) -> Result<Stanza, BuildError> {
    Block {
        jid: jid.to_string(),
    }
    .into_iq()
}

pub fn unblock(jid: &str) -> Result<Stanza, BuildError> {
    Unblock {
        jid: jid.to_string(),
    }
    .into_iq()
}

pub fn set_blocked(blocked: bool, jid: &str) -> Result<Stanza, BuildError> {
    if blocked { block(jid) } else { unblock(jid) }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlocklistRequest;

impl BlocklistRequest {
    fn node(self) -> Node {
        Node::namespaced("blocklist", ns::BLOCKING)
    }
}

impl StanzaExtension for BlocklistRequest {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

pub fn blocklist() -> Stanza {
    infallible(BlocklistRequest, BlocklistRequest::node)
}
