//! XEP-0077 In-Band Registration: account creation with a captcha form and
//! password change.
//!
//! ```xml
//! <iq type='get' id='reg1' to='shakespeare.lit'>
//!   <query xmlns='jabber:iq:register'/>
//! </iq>
//!
//! <iq type='set' id='reg2' to='shakespeare.lit'>
//!   <query xmlns='jabber:iq:register'>
//!     <x xmlns='jabber:x:data' type='submit'>
//!       <field var='FORM_TYPE' type='hidden'><value>jabber:iq:register</value></field>
//!       <field var='username'><value>juliet</value></field>
//!       <field var='password'><value>R0m30</value></field>
//!       <field var='ocr'><value>7nHL3</value></field>
//!       <field var='challenge' type='hidden'><value>F3A6292C</value></field>
//!     </x>
//!   </query>
//! </iq>
//!
//! <iq type='set' id='change1' to='shakespeare.lit'>
//!   <query xmlns='jabber:iq:register'>
//!     <username>juliet</username>
//!     <password>newpass</password>
//!   </query>
//! </iq>
//! ```

use std::collections::BTreeMap;

use super::form::DataForm;
use super::{StanzaExtension, infallible, require};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationFieldsRequest;

impl RegistrationFieldsRequest {
    fn node(self) -> Node {
        Node::namespaced("query", ns::REGISTER)
    }
}

impl StanzaExtension for RegistrationFieldsRequest {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        Ok(self.node())
    }
}

/// Ask the server which fields (and captcha) registration needs.
pub fn registration_fields() -> Stanza {
    infallible(RegistrationFieldsRequest, RegistrationFieldsRequest::node)
}

/// Submit the registration form.
///
/// `hidden_fields` echoes the hidden fields the server sent with the form,
/// such as the captcha challenge id. They cannot replace the username,
/// password or captcha answer.
#[derive(Debug, Clone)]
pub struct UserRegistration {
    pub username: String,
    pub password: String,
    pub captcha: String,
    pub hidden_fields: BTreeMap<String, String>,
}

impl StanzaExtension for UserRegistration {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("captcha", &self.captcha)?;

        let mut form = DataForm::with_form_type(ns::REGISTER)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("ocr", &self.captcha);
        for (var, value) in &self.hidden_fields {
            if var.is_empty() || form.has_field(var) {
                continue;
            }
            form = form.hidden(var, value);
        }

        Ok(Node::namespaced("query", ns::REGISTER).with_child(form.into_node()))
    }
}

pub fn register_user(
    username: &str,
    password: &str,
    captcha: &str,
    hidden_fields: &BTreeMap<String, String>,
) -> Result<Stanza, BuildError> {
    UserRegistration {
        username: username.to_string(),
        password: password.to_string(),
        captcha: captcha.to_string(),
        hidden_fields: hidden_fields.clone(),
    }
    .into_iq()
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub username: String,
    pub password: String,
}

impl StanzaExtension for PasswordChange {
    const IQ_TYPE: IqType = IqType::Set;

    fn into_payload(self) -> Result<Node, BuildError> {
        require("username", &self.username)?;
        require("password", &self.password)?;

        Ok(Node::namespaced("query", ns::REGISTER)
            .with_child(Node::text_element("username", self.username))
            .with_child(Node::text_element("password", self.password)))
    }
}

/// Change the account password. Address it to the account's server.
pub fn change_password(username: &str, password: &str) -> Result<Stanza, BuildError> {
    PasswordChange {
        username: username.to_string(),
        password: password.to_string(),
    }
    .into_iq()
}
