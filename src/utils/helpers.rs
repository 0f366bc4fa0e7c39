use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: None,
            data: None,
            error: Some(message),
            details: None,
        }
    }

    pub fn error_with_details(message: String, details: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: None,
            data: None,
            error: Some(message),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error_fields() {
        let body = serde_json::to_value(ApiResponse::success("ok")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "ok");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn error_envelope_carries_details() {
        let body = serde_json::to_value(ApiResponse::<()>::error_with_details(
            "Refund not found".to_string(),
            "no refund recorded for booking".to_string(),
        ))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Refund not found");
        assert_eq!(body["details"], "no refund recorded for booking");
    }
}
