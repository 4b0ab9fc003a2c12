use serde::Serialize;

/// Uniform JSON response envelope.
///
/// Every JSON response from the gateway — success or failure — uses this
/// shape. Existing clients depend on the exact field names, so this is a
/// compatibility surface.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    /// Whether the request succeeded.
    pub is_success: bool,
    /// The payload, if any.
    pub data: Option<T>,
    /// Human-readable status or error message.
    pub message: String,
    /// Extra response metadata (pagination and the like). Usually empty.
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl<T: Serialize> Envelope<T> {
    /// A success envelope carrying `data`.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            message: message.into(),
            meta: serde_json::Map::new(),
        }
    }

    /// A failure envelope with no payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            data: None,
            message: message.into(),
            meta: serde_json::Map::new(),
        }
    }
}

impl Envelope<serde_json::Value> {
    /// A success envelope with a message but no payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            data: None,
            message: message.into(),
            meta: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let env = Envelope::success(serde_json::json!({"k": 1}), "Success");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["is_success"], true);
        assert_eq!(json["data"]["k"], 1);
        assert_eq!(json["message"], "Success");
        assert!(json["meta"].as_object().unwrap().is_empty());
    }

    #[test]
    fn error_envelope_has_null_data() {
        let env: Envelope<serde_json::Value> = Envelope::error("nope");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["is_success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "nope");
    }
}
