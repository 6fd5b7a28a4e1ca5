//! HTTP adapter error types and conversions.

use dreamforge_core::error::{DreamforgeError, ExternalService};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{service} request failed: {source}")]
    Request {
        service: ExternalService,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: ExternalService,
        status: u16,
        message: String,
    },

    #[error("{service} sent an unexpected response: {message}")]
    Decode {
        service: ExternalService,
        message: String,
    },

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub(crate) fn request(service: ExternalService) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| RemoteError::Request { service, source }
    }

    pub(crate) fn decode(service: ExternalService, message: impl Into<String>) -> Self {
        RemoteError::Decode {
            service,
            message: message.into(),
        }
    }
}

impl From<RemoteError> for DreamforgeError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Request { service, source } => DreamforgeError::external(
                service,
                source.status().map(|s| s.as_u16()),
                source.to_string(),
            ),
            RemoteError::Status {
                service,
                status,
                message,
            } => DreamforgeError::external(service, Some(status), message),
            RemoteError::Decode { service, message } => {
                DreamforgeError::external(service, None, message)
            }
            RemoteError::Config(message) => DreamforgeError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamforge_core::error::ErrorKind;

    #[test]
    fn status_error_keeps_code() {
        let err: DreamforgeError = RemoteError::Status {
            service: ExternalService::Payment,
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(
            err,
            DreamforgeError::ExternalService {
                service: ExternalService::Payment,
                status: Some(502),
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::External);
    }

    #[test]
    fn config_error_is_internal() {
        let err: DreamforgeError = RemoteError::Config("no api key".into()).into();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }
}
