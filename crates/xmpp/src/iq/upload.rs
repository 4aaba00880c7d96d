//! XEP-0363 HTTP File Upload slot requests.
//!
//! ```xml
//! <iq type='get' id='step_03' to='upload.montague.tld'>
//!   <request xmlns='urn:xmpp:http:upload:0'
//!     filename='tr&#xe8;s cool.jpg'
//!     size='23456'
//!     content-type='image/jpeg'/>
//! </iq>
//! ```

use super::{StanzaExtension, require};
use crate::error::BuildError;
use crate::node::Node;
use crate::ns;
use crate::stanza::{IqType, Stanza};

/// Used when the caller does not know the file's media type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct UploadSlotRequest {
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
}

impl StanzaExtension for UploadSlotRequest {
    const IQ_TYPE: IqType = IqType::Get;

    fn into_payload(self) -> Result<Node, BuildError> {
        require("filename", &self.filename)?;
        if self.size == 0 {
            return Err(BuildError::invalid("size", "must be greater than zero"));
        }
        let content_type = self
            .content_type
            .filter(|content_type| !content_type.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Node::namespaced("request", ns::HTTP_UPLOAD)
            .with_attribute("filename", self.filename)
            .with_attribute("size", self.size.to_string())
            .with_attribute("content-type", content_type))
    }
}

/// Ask for an upload slot. Address it to the upload service found through
/// disco.
pub fn upload_slot(filename: &str, size: u64, content_type: &str) -> Result<Stanza, BuildError> {
    UploadSlotRequest {
        filename: filename.to_string(),
        size,
        content_type: Some(content_type.to_string()),
    }
    .into_iq()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_slot() {
        let stanza = upload_slot("très cool.jpg", 23456, "image/jpeg").unwrap();
        assert_eq!(stanza.iq_type(), Some(IqType::Get));
        assert_eq!(stanza.payload().len(), 1);

        let request = stanza.find_payload("request", ns::HTTP_UPLOAD).unwrap();
        assert_eq!(request.attribute("filename"), Some("très cool.jpg"));
        assert_eq!(request.attribute("size"), Some("23456"));
        assert_eq!(request.attribute("content-type"), Some("image/jpeg"));
    }

    #[test]
    fn test_upload_slot_default_content_type() {
        let stanza = upload_slot("notes.txt", 12, "").unwrap();
        let request = stanza.first_payload().unwrap();
        assert_eq!(request.attribute("content-type"), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_upload_slot_zero_size() {
        let err = upload_slot("empty.bin", 0, "").unwrap_err();
        assert!(matches!(err, BuildError::InvalidArgument { field: "size", .. }));
    }

    #[test]
    fn test_upload_slot_missing_filename() {
        assert_eq!(
            upload_slot("", 10, "text/plain").unwrap_err(),
            BuildError::empty("filename")
        );
    }

    #[test]
    fn test_upload_slot_to_service() {
        let stanza = UploadSlotRequest {
            filename: "a.png".to_string(),
            size: 1,
            content_type: None,
        }
        .into_iq_to("upload.montague.tld")
        .unwrap();
        assert_eq!(stanza.to(), Some("upload.montague.tld"));
    }
}
