//! Control Messages
//!
//! The closed set of commands the host application can send, and the
//! replies they produce.

use serde::{Deserialize, Serialize};

// == Control Message ==
/// One-shot command from the host application.
///
/// On the wire the tag is the `type` field, e.g.
/// `{"type":"CACHE_MOVIE","payload":{"slug":"foo","name":"Foo"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    ClaimClients,
    CacheMovie { payload: MoviePayload },
    GetCacheSize,
    ClearCache,
    CheckNetwork,
}

/// Movie details primed into the Runtime tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoviePayload {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl ControlMessage {
    /// Whether the message obliges the handler to reply.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            ControlMessage::GetCacheSize | ControlMessage::ClearCache | ControlMessage::CheckNetwork
        )
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "SKIP_WAITING",
            ControlMessage::ClaimClients => "CLAIM_CLIENTS",
            ControlMessage::CacheMovie { .. } => "CACHE_MOVIE",
            ControlMessage::GetCacheSize => "GET_CACHE_SIZE",
            ControlMessage::ClearCache => "CLEAR_CACHE",
            ControlMessage::CheckNetwork => "CHECK_NETWORK",
        }
    }

    /// Decodes a message; unknown tags and malformed bodies yield `None`.
    pub fn decode(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

// == Control Reply ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    CacheSize { size: usize },
    Cleared {},
    NetworkStatus {
        #[serde(rename = "isOnline")]
        is_online: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_unit_messages() {
        assert_eq!(
            ControlMessage::decode(json!({"type": "SKIP_WAITING"})),
            Some(ControlMessage::SkipWaiting)
        );
        assert_eq!(
            ControlMessage::decode(json!({"type": "GET_CACHE_SIZE"})),
            Some(ControlMessage::GetCacheSize)
        );
    }

    #[test]
    fn test_decode_cache_movie() {
        let msg = ControlMessage::decode(json!({
            "type": "CACHE_MOVIE",
            "payload": {"slug": "foo", "name": "Foo", "poster_url": "/images/foo.jpg"}
        }))
        .unwrap();
        match msg {
            ControlMessage::CacheMovie { payload } => {
                assert_eq!(payload.slug, "foo");
                assert_eq!(payload.poster_url.as_deref(), Some("/images/foo.jpg"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tag_is_ignored() {
        assert_eq!(ControlMessage::decode(json!({"type": "SELF_DESTRUCT"})), None);
        assert_eq!(ControlMessage::decode(json!({"no_type": true})), None);
    }

    #[test]
    fn test_reply_shapes() {
        let size = serde_json::to_value(ControlReply::CacheSize { size: 3 }).unwrap();
        assert_eq!(size, json!({"size": 3}));

        let cleared = serde_json::to_value(ControlReply::Cleared {}).unwrap();
        assert_eq!(cleared, json!({}));

        let online = serde_json::to_value(ControlReply::NetworkStatus { is_online: false }).unwrap();
        assert_eq!(online, json!({"isOnline": false}));
    }

    #[test]
    fn test_expects_reply() {
        assert!(ControlMessage::CheckNetwork.expects_reply());
        assert!(!ControlMessage::SkipWaiting.expects_reply());
        assert_eq!(ControlMessage::ClearCache.tag(), "CLEAR_CACHE");
    }
}
