use reqwest::StatusCode;

use crate::provider::ProviderId;

/// Failure taxonomy shared by the boundary, the selector and the adapters.
///
/// `Display` carries the full diagnostic and is meant for logs; what the
/// caller sees comes from [`WeatherError::public_message`].
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("Invalid value {value:?} for parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{provider} request failed{}: {detail}", status_suffix(.status))]
    UpstreamUnavailable {
        provider: ProviderId,
        status: Option<u16>,
        detail: String,
    },

    #[error(
        "No API key configured for provider '{provider}' \
         and no fallback is defined for this endpoint"
    )]
    MisconfiguredProvider { provider: ProviderId },
}

impl WeatherError {
    pub(crate) fn upstream(
        provider: ProviderId,
        status: Option<StatusCode>,
        detail: impl Into<String>,
    ) -> Self {
        WeatherError::UpstreamUnavailable {
            provider,
            status: status.map(|s| s.as_u16()),
            detail: detail.into(),
        }
    }

    /// HTTP-like status class used by the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::MissingParameter(_) | WeatherError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            WeatherError::UpstreamUnavailable { .. }
            | WeatherError::MisconfiguredProvider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message that is safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            WeatherError::UpstreamUnavailable { .. } => {
                "Failed to fetch current weather data".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}
