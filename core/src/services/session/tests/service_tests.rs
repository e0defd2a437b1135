//! Unit tests for AuthTokenService

use std::time::Duration;

use crate::domain::entities::UserIdentity;
use crate::errors::{AuthError, DomainError, TokenError};

use super::fixture;

#[tokio::test]
async fn test_login_issues_pair_and_verifies() {
    let f = fixture();

    let pair = f.service.issue_for_login(1001, "H5").await.unwrap();

    assert_eq!(pair.duration, 7200);
    assert_eq!(pair.access_token.len(), 40);
    assert_eq!(pair.refresh_token.len(), 40);

    let verification = f.service.verify(&pair.access_token).await.unwrap();
    assert!(verification.approved);
    assert_eq!(verification.user_id, 1001);
    assert_eq!(verification.platform, "H5");
    assert!(verification.session_id.starts_with("1001-"));
}

#[tokio::test]
async fn test_login_rejects_missing_or_blocked_user() {
    let f = fixture();
    f.identity.add_user(UserIdentity::blocked(3003)).await;

    let missing = f.service.issue_for_login(9999, "APP").await.unwrap_err();
    assert_eq!(missing, DomainError::Auth(AuthError::UserInvalid));

    let blocked = f.service.issue_for_login(3003, "APP").await.unwrap_err();
    assert_eq!(blocked, DomainError::Auth(AuthError::UserInvalid));
    assert!(f.service.list_sessions(3003).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_invalidates_previous_access_token() {
    let f = fixture();
    let first = f.service.issue_for_login(1001, "H5").await.unwrap();

    let second = f.service.refresh(&first.refresh_token).await.unwrap();

    assert_ne!(second.access_token, first.access_token);
    assert!(!f.service.verify(&first.access_token).await.unwrap().approved);

    let verification = f.service.verify(&second.access_token).await.unwrap();
    assert!(verification.approved);
    assert_eq!(verification.user_id, 1001);
    assert_eq!(verification.platform, "H5");
}

#[tokio::test]
async fn test_refresh_keeps_session_id_and_login_replaces_it() {
    let f = fixture();
    let first = f.service.issue_for_login(1001, "APP").await.unwrap();
    let original = f.service.verify(&first.access_token).await.unwrap().session_id;

    let refreshed = f.service.refresh(&first.refresh_token).await.unwrap();
    let after_refresh = f.service.verify(&refreshed.access_token).await.unwrap().session_id;
    assert_eq!(after_refresh, original);

    let relogin = f.service.issue_for_login(1001, "APP").await.unwrap();
    assert!(!f.service.verify(&refreshed.access_token).await.unwrap().approved);
    assert!(f.service.verify(&relogin.access_token).await.unwrap().approved);
}

#[tokio::test]
async fn test_replayed_refresh_token_is_rejected() {
    let f = fixture();
    let first = f.service.issue_for_login(1001, "H5").await.unwrap();
    let second = f.service.refresh(&first.refresh_token).await.unwrap();

    let replay = f.service.refresh(&first.refresh_token).await.unwrap_err();
    assert_eq!(replay, DomainError::Auth(AuthError::InvalidToken));

    // The replay must not disturb the live session
    assert!(f.service.verify(&second.access_token).await.unwrap().approved);
    assert!(f.service.refresh(&second.refresh_token).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_rotated_refresh_token_enters_grace_window() {
    let f = fixture();
    let first = f.service.issue_for_login(1001, "H5").await.unwrap();
    f.service.refresh(&first.refresh_token).await.unwrap();

    let key = f.repository.keys().refresh(&first.refresh_token);
    assert_eq!(f.cache.ttl_of(&key).await, Some(Duration::from_secs(21_600)));
    assert!(f
        .repository
        .get_by_refresh_token(&first.refresh_token)
        .await
        .unwrap()
        .is_some());

    tokio::time::advance(Duration::from_secs(21_601)).await;
    assert!(!f.cache.contains(&key).await);
}

#[tokio::test(start_paused = true)]
async fn test_late_relogin_does_not_extend_old_refresh_token() {
    let f = fixture();
    let first = f.service.issue_for_login(1001, "H5").await.unwrap();
    let key = f.repository.keys().refresh(&first.refresh_token);

    // 9 days 23 hours in: one hour of refresh life left, less than the grace window
    tokio::time::advance(Duration::from_secs(864_000 - 3600)).await;
    let before = f.cache.ttl_of(&key).await.unwrap();
    assert_eq!(before, Duration::from_secs(3600));

    f.service.issue_for_login(1001, "H5").await.unwrap();

    let after = f.cache.ttl_of(&key).await.unwrap();
    assert!(after <= before, "before={:?} after={:?}", before, after);

    tokio::time::advance(Duration::from_secs(3601)).await;
    assert!(!f.cache.contains(&key).await);
}

#[tokio::test]
async fn test_held_issue_lock_reports_busy() {
    let f = fixture();
    let lock_ttl = Duration::from_secs(10);
    assert!(f.repository.try_lock_issue(1001, "H5", lock_ttl).await.unwrap());

    let err = f.service.issue_for_login(1001, "H5").await.unwrap_err();
    assert_eq!(err, DomainError::Auth(AuthError::SessionBusy));
    assert_eq!(err.status_code(), 429);
    assert!(f.service.list_sessions(1001).await.unwrap().is_empty());

    // Other slots are unaffected
    assert!(f.service.issue_for_login(1001, "APP").await.is_ok());

    f.repository.unlock_issue(1001, "H5").await.unwrap();
    assert!(f.service.issue_for_login(1001, "H5").await.is_ok());
    assert!(!f.cache.contains(&f.repository.keys().issue_lock(1001, "H5")).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_leave_one_live_pair() {
    let f = fixture();

    for _ in 0..20 {
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = f.service.clone();
                tokio::spawn(async move { service.issue_for_login(2002, "WX").await })
            })
            .collect();

        let mut issued = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(pair) => issued.push(pair),
                Err(e) => assert_eq!(e, DomainError::Auth(AuthError::SessionBusy)),
            }
        }
        assert!(!issued.is_empty());

        let current = f
            .repository
            .get_platform_session(2002, "WX")
            .await
            .unwrap()
            .unwrap();
        let mut approved = Vec::new();
        for pair in &issued {
            if f.service.verify(&pair.access_token).await.unwrap().approved {
                approved.push(pair.access_token.clone());
            }
        }
        assert_eq!(approved, vec![current.access_token]);
    }
}

#[tokio::test]
async fn test_unknown_or_malformed_refresh_token_is_invalid() {
    let f = fixture();

    let unknown = f
        .service
        .refresh("0123456789abcdef0123456789abcdef01234567")
        .await
        .unwrap_err();
    assert_eq!(unknown, DomainError::Auth(AuthError::InvalidToken));

    let malformed = f.service.refresh("not-a-token").await.unwrap_err();
    assert_eq!(malformed, DomainError::Auth(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_refresh_denied_once_user_is_blocked() {
    let f = fixture();
    let pair = f.service.issue_for_login(1001, "APP").await.unwrap();

    f.identity.block_user(1001).await;

    let err = f.service.refresh(&pair.refresh_token).await.unwrap_err();
    assert_eq!(err, DomainError::Auth(AuthError::UserInvalid));
}

#[tokio::test]
async fn test_platform_sessions_are_isolated() {
    let f = fixture();
    let app = f.service.issue_for_login(1001, "APP").await.unwrap();
    let h5 = f.service.issue_for_login(1001, "H5").await.unwrap();

    assert_eq!(f.service.verify(&app.access_token).await.unwrap().platform, "APP");
    assert_eq!(f.service.verify(&h5.access_token).await.unwrap().platform, "H5");

    f.service.refresh(&h5.refresh_token).await.unwrap();
    assert!(f.service.verify(&app.access_token).await.unwrap().approved);

    f.service.logout(1001, "H5").await.unwrap();
    assert!(f.service.verify(&app.access_token).await.unwrap().approved);

    let sessions = f.service.list_sessions(1001).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions.contains_key("APP"));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let f = fixture();
    let pair = f.service.issue_for_login(1001, "H5").await.unwrap();

    f.service.logout(1001, "H5").await.unwrap();
    f.service.logout(1001, "H5").await.unwrap();
    f.service.logout(2002, "WX").await.unwrap();

    assert!(!f.service.verify(&pair.access_token).await.unwrap().approved);
    let err = f.service.refresh(&pair.refresh_token).await.unwrap_err();
    assert_eq!(err, DomainError::Auth(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_revoke_all_sessions() {
    let f = fixture();
    let app = f.service.issue_for_login(1001, "APP").await.unwrap();
    let h5 = f.service.issue_for_login(1001, "H5").await.unwrap();
    let other = f.service.issue_for_login(2002, "APP").await.unwrap();

    f.service.revoke_all_sessions(1001).await.unwrap();

    assert!(!f.service.verify(&app.access_token).await.unwrap().approved);
    assert!(!f.service.verify(&h5.access_token).await.unwrap().approved);
    assert!(f.service.list_sessions(1001).await.unwrap().is_empty());
    assert_eq!(
        f.service.refresh(&app.refresh_token).await.unwrap_err(),
        DomainError::Auth(AuthError::InvalidToken)
    );
    assert!(f.service.verify(&other.access_token).await.unwrap().approved);
}

#[tokio::test]
async fn test_verify_fails_closed_on_cache_error() {
    let f = fixture();
    let pair = f.service.issue_for_login(1001, "H5").await.unwrap();

    f.cache.fail_on("get").await;
    let err = f.service.verify(&pair.access_token).await.unwrap_err();

    assert!(matches!(err, DomainError::CacheUnavailable { .. }));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_verify_rejects_malformed_token_without_cache() {
    let f = fixture();
    f.cache.fail_on("get").await;
    let too_long = "a".repeat(41);

    for token in ["", "short", "ADFD821DCB82FAF8943D0B564B9DE63C875387DF", too_long.as_str()] {
        let verification = f.service.verify(token).await.unwrap();
        assert!(!verification.approved);
        assert_eq!(verification.user_id, 0);
    }
}

#[tokio::test]
async fn test_verify_unknown_token_is_not_approved() {
    let f = fixture();
    let verification = f
        .service
        .verify("adfd821dcb82faf8943d0b564b9de63c875387df")
        .await
        .unwrap();
    assert!(!verification.approved);
}

#[tokio::test]
async fn test_identify_unverified_reads_user_without_cache() {
    let f = fixture();
    let pair = f.service.issue_for_login(2002, "WX").await.unwrap();
    f.cache.fail_on("get").await;

    assert_eq!(f.service.identify_unverified(&pair.access_token).unwrap(), 2002);
    assert_eq!(
        f.service.identify_unverified("zz").unwrap_err(),
        DomainError::Token(TokenError::Format)
    );
}

#[tokio::test]
async fn test_failed_store_surfaces_cache_error() {
    let f = fixture();
    f.cache.fail_on("set_with_expiry").await;

    let err = f.service.issue_for_login(1001, "H5").await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::CacheUnavailable { ref operation, .. } if operation.starts_with("put_session")
    ));
}
