//! Caller identity taken from trusted request headers.
//!
//! Authentication happens upstream (a proxy or gateway); by the time a
//! request reaches this server the user name and admin flag are plain
//! headers whose names come from the `[auth]` config section.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::service::Identity;

use super::{error::ApiError, state::AppState};

/// Extractor for the authenticated caller. Rejects requests without a
/// user header.
pub struct Caller(pub Identity);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = state.auth();

        let user = parts
            .headers
            .get(auth.user_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthenticated(&auth.user_header))?;

        let is_admin = parts
            .headers
            .get(auth.admin_header.as_str())
            .and_then(|v| v.to_str().ok())
            .is_some_and(parse_flag);

        Ok(Caller(Identity {
            user: user.to_string(),
            is_admin,
        }))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
