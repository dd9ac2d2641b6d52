use serde::Deserialize;

use crate::prelude::*;

/// Sunsynk Cloud response envelope.
#[derive(Deserialize)]
pub struct Response<R> {
    /// Non-zero means the request failed.
    code: i32,

    #[serde(rename = "msg")]
    message: Option<String>,

    /// Absent or `null` for the writes.
    data: Option<R>,
}

impl<R> From<Response<R>> for Result<Option<R>> {
    fn from(response: Response<R>) -> Self {
        if response.code == 0 {
            Ok(response.data)
        } else if let Some(message) = response.message {
            bail!(r#"Sunsynk Cloud error {code} ("{message}")"#, code = response.code)
        } else {
            bail!("Sunsynk Cloud error {code}", code = response.code)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_ok() -> Result {
        let response: Response<u32> =
            serde_json::from_value(json!({ "code": 0, "msg": "Success", "data": 42, "success": true }))?;
        assert_eq!(Result::from(response)?, Some(42));
        Ok(())
    }

    #[test]
    fn test_null_data_ok() -> Result {
        let response: Response<u32> =
            serde_json::from_value(json!({ "code": 0, "msg": "Success", "data": null }))?;
        assert_eq!(Result::from(response)?, None);
        Ok(())
    }

    #[test]
    fn test_error_code() -> Result {
        let response: Response<u32> =
            serde_json::from_value(json!({ "code": 102, "msg": "Invalid token" }))?;
        let error = Result::from(response).unwrap_err();
        assert!(error.to_string().contains("Invalid token"), "{error:#}");
        Ok(())
    }
}
