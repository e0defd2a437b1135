//! Result of checking an access token.

use serde::{Deserialize, Serialize};

use crate::domain::entities::SessionRecord;

/// Outcome of a per-request access token check
///
/// When `approved` is false the remaining fields carry no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVerification {
    pub approved: bool,
    pub user_id: i64,
    pub platform: String,
    pub session_id: String,
}

impl TokenVerification {
    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn approved(session: &SessionRecord) -> Self {
        Self {
            approved: true,
            user_id: session.user_id,
            platform: session.platform.clone(),
            session_id: session.session_id.clone(),
        }
    }
}
