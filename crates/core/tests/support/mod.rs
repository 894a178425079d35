//! Shared test helpers for `ringrelay-core` integration tests.
//!
//! In-memory doubles for every core port so the credential manager, event
//! guard and relay handler can be exercised without HTTP or SQLite.

#![allow(dead_code)]

pub mod mocks;

use chrono::Utc;
use ringrelay_domain::{
    AlarmMode, EmailCredential, EventRecord, EventStatus, Principal, TokenCredential,
    TokenResponse,
};

pub const PRINCIPAL: &str = "user-1";
pub const HARDWARE_ID: &str = "hw-test";

pub fn principal() -> Principal {
    Principal::new(PRINCIPAL)
}

pub fn email_credential() -> EmailCredential {
    EmailCredential {
        email: "owner@example.com".into(),
        password: "hunter2".into(),
        hardware_id: HARDWARE_ID.into(),
    }
}

/// Token expiring `secs` seconds from now.
pub fn token_expiring_in(secs: i64) -> TokenCredential {
    TokenCredential {
        access_token: "access-old".into(),
        refresh_token: "refresh-old".into(),
        token_type: "Bearer".into(),
        scope: "client".into(),
        expires_at: Utc::now().timestamp() + secs,
        hardware_id: HARDWARE_ID.into(),
    }
}

pub fn token_response(access: &str, refresh: &str, expires_in: i64) -> TokenResponse {
    TokenResponse {
        access_token: access.into(),
        expires_in,
        refresh_token: refresh.into(),
        scope: "client".into(),
        token_type: "Bearer".into(),
    }
}

pub fn event_record(uuid: &str, status: EventStatus, mode: Option<AlarmMode>) -> EventRecord {
    EventRecord {
        principal: principal(),
        uuid: uuid.into(),
        status,
        mode,
        delay_secs: 0,
        updated_at: Utc::now() - chrono::Duration::minutes(5),
    }
}
