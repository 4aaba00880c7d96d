//! XEP-0357 Push Notifications, plus device registration with the push
//! app server over XEP-0050 ad-hoc commands.
//!
//! ```xml
//! <iq type='set' id='x42'>
//!   <enable xmlns='urn:xmpp:push:0' jid='push-5.client.example' node='yxs32uqsflafdk3iuqo'>
//!     <x xmlns='jabber:x:data' type='submit'>
//!       <field var='FORM_TYPE' type='hidden'>
//!         <value>http://jabber.org/protocol/pubsub#publish-options</value>
//!       </field>
//!       <field var='secret'><value>eruio234vzxc2kla-91</value></field>
//!     </x>
//!   </enable>
//! </iq>
//!
//! <iq type='set' id='reg1' to='push.tern.im'>
//!   <command xmlns='http://jabber.org/protocol/commands' node='v1-register-push' action='execute'>
//!     <x xmlns='jabber:x:data' type='submit'>
//!       <field var='type'><value>apns</value></field>
//!       <field var='token'><value>a1b2c3</value></field>
//!       <field var='device-id'><value>0C3E2F5A</value></field>
//!     </x>
//!   </command>
//! </iq>
//! ```

use super::form::DataForm;
use super::{StanzaExtension, require, validate_jid};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Ad-hoc command node the app server registers devices under.
pub const APPSERVER_REGISTER_NODE: &str = "v1-register-push";

#[derive(Debug, Clone)]
pub struct PushEnable {
    pub appserver: String,
    pub node: String,
    pub secret: String,
}

impl StanzaExtension for PushEnable {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        require("appserver", &self.appserver)?;
        require("node", &self.node)?;
        require("secret", &self.secret)?;
        validate_jid(&self.appserver)?;

        let form = DataForm::with_form_type(ns::PUBSUB_PUBLISH_OPTIONS).field("secret", &self.secret);
        Ok(Node::namespaced("enable", ns::PUSH)
            .with_attribute("jid", self.appserver)
            .with_attribute("node", self.node)
            .with_child(form.into_node()))
    }
}

pub fn push_enable(appserver: &str, node: &str, secret: &str) -> Result<Stanza, BuildError> {
    PushEnable {
        appserver: appserver.to_string(),
        node: node.to_string(),
        secret: secret.to_string(),
    }
    .into_iq()
}

/// Without a node every registration at the app server is disabled.
#[derive(Debug, Clone)]
pub struct PushDisable {
    pub appserver: String,
    pub node: Option<String>,
}

impl StanzaExtension for PushDisable {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        validate_jid(&self.appserver)?;
        let disable = Node::namespaced("disable", ns::PUSH).with_attribute("jid", self.appserver);
        Ok(match self.node.filter(|node| !node.is_empty()) {
            Some(node) => disable.with_attribute("node", node),
            None => disable,
        })
    }
}

pub fn push_disable(appserver: &str, node: Option<&str>) -> Result<Stanza, BuildError> {
    PushDisable {
        appserver: appserver.to_string(),
        node: node.map(String::from),
    }
    .into_iq()
}

/// Register this device's APNs token with the push app server. Address the
/// stanza to the app server with [`StanzaExtension::into_iq_to`] or
/// [`Stanza::set_to`].
#[derive(Debug, Clone)]
pub struct AppServerRegistration {
    pub token: String,
    pub device_id: String,
}

impl StanzaExtension for AppServerRegistration {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        require("token", &self.token)?;
        require("device-id", &self.device_id)?;

        let form = DataForm::submit()
            .field("type", "apns")
            .field("token", &self.token)
            .field("device-id", &self.device_id);
        Ok(Node::namespaced("command", ns::COMMANDS)
            .with_attribute("node", APPSERVER_REGISTER_NODE)
            .with_attribute("action", "execute")
            .with_child(form.into_node()))
    }
}

pub fn appserver_register(token: &str, device_id: &str) -> Result<Stanza, BuildError> {
    AppServerRegistration {
        token: token.to_string(),
        device_id: device_id.to_string(),
    }
    .into_iq()
}
