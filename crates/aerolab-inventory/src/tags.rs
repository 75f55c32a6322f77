//! Well-known tag keys
//!
//! Tags are the single source of truth for everything the backends know about
//! a resource beyond its raw cloud attributes. Derived values are decoded from
//! these keys on access and never cached on the model.

use base64::Engine;
use std::collections::HashMap;

pub const TAG_NAME: &str = "Name";
pub const TAG_DESCRIPTION: &str = "Description";
pub const TAG_AEROLAB_VERSION: &str = "AEROLAB_VERSION";
pub const TAG_AEROLAB_PROJECT: &str = "AEROLAB_PROJECT";
pub const TAG_OWNER: &str = "AEROLAB_OWNER";
pub const TAG_EXPIRES: &str = "AEROLAB_EXPIRES";
pub const TAG_CLUSTER_NAME: &str = "AEROLAB_CLUSTER_NAME";
pub const TAG_NODE_NO: &str = "AEROLAB_NODE_NO";
pub const TAG_OS_NAME: &str = "AEROLAB_OS_NAME";
pub const TAG_OS_VERSION: &str = "AEROLAB_OS_VERSION";
pub const TAG_CLUSTER_UUID: &str = "AEROLAB_CLUSTER_UUID";

/// Software type installed on the node (server, client, agi, ...)
pub const TAG_SOFT_TYPE: &str = "aerolab.type";
pub const TAG_SOFT_VERSION: &str = "aerolab.soft.version";

// AGI payloads, unpadded standard base64
pub const TAG_AGI_LABEL: &str = "agiLabel";
pub const TAG_AGI_SRC_LOCAL: &str = "agiSrcLocal";
pub const TAG_AGI_SRC_SFTP: &str = "agiSrcSftp";
pub const TAG_AGI_SRC_S3: &str = "agiSrcS3";

/// Decode a base64 tag payload. Values that are not valid base64 text come back verbatim.
pub fn decode_base64_tag(encoded: &str) -> String {
    if encoded.is_empty() {
        return String::new();
    }
    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| encoded.to_string())
}

/// Encode a value the way AGI tags are written
pub fn encode_base64_tag(value: &str) -> String {
    base64::engine::general_purpose::STANDARD_NO_PAD.encode(value)
}

/// Where an AGI instance pulled its logs from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgiSources {
    pub local: String,
    pub sftp: String,
    pub s3: String,
}

impl AgiSources {
    pub(crate) fn from_tags(tags: &HashMap<String, String>) -> Self {
        let decode = |key: &str| tags.get(key).map(|v| decode_base64_tag(v)).unwrap_or_default();
        Self {
            local: decode(TAG_AGI_SRC_LOCAL),
            sftp: decode(TAG_AGI_SRC_SFTP),
            s3: decode(TAG_AGI_SRC_S3),
        }
    }

    /// First configured source, in local/sftp/s3 order
    pub fn primary(&self) -> Option<&str> {
        [&self.local, &self.sftp, &self.s3]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
    }
}

/// Does `tags` satisfy every key/value pair of `wanted`? An empty wanted value only checks presence.
pub fn tags_match(tags: &HashMap<String, String>, wanted: &HashMap<String, String>) -> bool {
    wanted.iter().all(|(key, value)| match tags.get(key) {
        None => false,
        Some(_) if value.is_empty() => true,
        Some(actual) => actual == value,
    })
}
