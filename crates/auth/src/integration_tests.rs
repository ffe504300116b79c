//! End-to-end scenarios over the in-memory store and transport, with
//! simulated time.

use std::sync::Arc;

use serde_json::json;

use palisade_core::{ManualClock, Permission, Status, UserId};
use palisade_store::{Filter, InMemoryStore, Row, Store};

use crate::backend::identity::BLOB_STORAGE_NAME;
use crate::backend::record::STORAGE_NAME as RECORD_STORAGE_NAME;
use crate::backend::{MarkerKeys, RecordMarker};
use crate::{
    AuthBuilder, Authenticator, BackendConfig, Credentials, InMemoryTransport, MarkerTransport,
    NewResource, NewRole, RequestMeta,
};

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    for (username, password) in [("alice", "secret"), ("bob", "hunter2")] {
        let mut row = Row::new();
        row.insert("username".into(), json!(username));
        row.insert("password".into(), json!(password));
        store.insert("users", row).unwrap();
    }
    store
}

fn build(
    store: Arc<InMemoryStore>,
    backend: BackendConfig,
    clock: Arc<ManualClock>,
) -> Authenticator {
    AuthBuilder::new(store, backend)
        .clock(clock)
        .request_meta(RequestMeta::from_ip("10.0.0.1"))
        .build()
        .unwrap()
}

fn all_backends(
    transport: Arc<dyn MarkerTransport>,
) -> [(&'static str, BackendConfig); 3] {
    [
        (
            "record",
            BackendConfig::PersistedRecord {
                transport: transport.clone(),
            },
        ),
        (
            "blob",
            BackendConfig::ClientBlob {
                transport: transport.clone(),
            },
        ),
        ("keyed", BackendConfig::ServerKeyed { transport }),
    ]
}

#[test]
fn login_round_trip_works_for_every_backend() {
    let clock = Arc::new(ManualClock::new(0));
    for (label, backend) in all_backends(Arc::new(InMemoryTransport::new(clock.clone()))) {
        let store = seeded_store();
        let mut auth = build(store, backend, clock.clone());

        assert!(auth.is_none(), "{label}: fresh authenticator has a session");
        auth.login(&Credentials::new("alice", "secret")).unwrap();
        assert_eq!(auth.status(), Status::Active, "{label}");
        assert!(auth.is_logged_in(), "{label}");
        assert_eq!(auth.current_user(), Some(UserId::new(1)), "{label}");

        auth.logout().unwrap();
        assert!(auth.is_none(), "{label}");
        assert!(!auth.is_logged_in(), "{label}");
    }
}

#[test]
fn failed_login_leaves_status_untouched() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store,
        BackendConfig::PersistedRecord { transport },
        clock,
    );

    assert!(matches!(
        auth.login(&Credentials::new("alice", "wrong")),
        Err(crate::AuthError::IncorrectCredential)
    ));
    assert!(auth.is_none());

    assert!(matches!(
        auth.login(&Credentials::new("nobody", "secret")),
        Err(crate::AuthError::InvalidIdentity)
    ));
    assert!(auth.is_none());

    assert!(matches!(
        auth.login(&Credentials::new("alice", "")),
        Err(crate::AuthError::IncorrectCredential)
    ));
    assert!(auth.is_none());
}

#[test]
fn login_with_id_skips_verification_but_requires_existence() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(store, BackendConfig::ClientBlob { transport }, clock);

    assert!(matches!(
        auth.login_with_id(UserId::new(999)),
        Err(crate::AuthError::InvalidIdentity)
    ));
    assert!(auth.is_none());

    auth.login_with_id(UserId::new(2)).unwrap();
    assert!(auth.is_logged_in());
    assert_eq!(auth.current_user(), Some(UserId::new(2)));
}

#[test]
fn session_expires_through_active_never_around_it() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = AuthBuilder::new(store, BackendConfig::PersistedRecord { transport })
        .clock(clock.clone())
        .expire_after(3_600)
        .suspend_after(10_000)
        .build()
        .unwrap();

    assert_eq!(auth.status(), Status::None);
    auth.login(&Credentials::new("alice", "secret")).unwrap();
    assert_eq!(auth.status(), Status::Active);

    clock.advance(3_599);
    assert_eq!(auth.status(), Status::Active);

    clock.advance(1);
    assert_eq!(auth.status(), Status::Expired);
    assert!(!auth.is_logged_in());
    // An expired session cannot be resumed.
    assert!(!auth.resume());
    assert_eq!(auth.status(), Status::Expired);
}

#[test]
fn expiry_dominates_suspension() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = AuthBuilder::new(store, BackendConfig::ServerKeyed { transport })
        .clock(clock.clone())
        .expire_after(100)
        .suspend_after(50)
        .build()
        .unwrap();

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    // Both markers have lapsed; expiry wins.
    clock.advance(100);
    assert_eq!(auth.status(), Status::Expired);
}

#[test]
fn suspended_session_keeps_expiring_on_schedule() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = AuthBuilder::new(store, BackendConfig::PersistedRecord { transport })
        .clock(clock.clone())
        .expire_after(100)
        .suspend_after(50)
        .build()
        .unwrap();

    auth.login(&Credentials::new("alice", "secret")).unwrap();

    // An intermediate read latches the suspended state.
    clock.advance(50);
    assert_eq!(auth.status(), Status::Suspended);

    // The expiry timer keeps running underneath the suspension.
    clock.advance(50);
    assert!(auth.is_expired());
    assert_eq!(auth.status(), Status::Expired);
    assert!(!auth.resume());
}

#[test]
fn suspended_session_resumes_with_a_fresh_idle_window() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = AuthBuilder::new(store, BackendConfig::PersistedRecord { transport })
        .clock(clock.clone())
        .suspend_after(60)
        .build()
        .unwrap();

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    clock.advance(60);
    assert_eq!(auth.status(), Status::Suspended);
    assert!(!auth.is_logged_in());

    assert!(auth.resume());
    assert_eq!(auth.status(), Status::Active);
    assert!(auth.is_logged_in());

    // The resume re-armed the window: a second idle period suspends again.
    clock.advance(60);
    assert_eq!(auth.status(), Status::Suspended);
}

#[test]
fn extending_the_idle_window_staves_off_suspension() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = AuthBuilder::new(store, BackendConfig::ClientBlob { transport })
        .clock(clock.clone())
        .suspend_after(60)
        .build()
        .unwrap();

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    clock.advance(59);
    auth.extend_suspend_time().unwrap();
    clock.advance(59);
    assert_eq!(auth.status(), Status::Active);
    clock.advance(1);
    assert_eq!(auth.status(), Status::Suspended);
}

#[test]
fn tampered_record_marker_cannot_switch_users() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store,
        BackendConfig::PersistedRecord {
            transport: transport.clone(),
        },
        clock,
    );

    auth.login(&Credentials::new("alice", "secret")).unwrap();

    // Rewrite the marker's claimed user id to another valid user.
    let keys = MarkerKeys::new(RECORD_STORAGE_NAME, "default");
    let raw = transport.get(&keys.expire).unwrap().unwrap();
    let mut marker: RecordMarker = serde_json::from_str(&raw).unwrap();
    marker.user_id = 2;
    transport
        .set(&keys.expire, serde_json::to_string(&marker).unwrap(), 1_000)
        .unwrap();

    // The session row is authoritative, so the original user comes back.
    assert_eq!(auth.current_user(), Some(UserId::new(1)));
}

#[test]
fn undecodable_blob_marker_reads_as_logged_out() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store,
        BackendConfig::ClientBlob {
            transport: transport.clone(),
        },
        clock,
    );

    auth.login(&Credentials::new("alice", "secret")).unwrap();

    let keys = MarkerKeys::new(BLOB_STORAGE_NAME, "default");
    transport
        .set(&keys.expire, "{not json".to_string(), 1_000)
        .unwrap();

    assert!(!auth.is_logged_in());
    assert_eq!(auth.current_user(), None);
}

#[test]
fn identity_marker_is_bound_to_its_origin_ip() {
    let clock = Arc::new(ManualClock::new(0));
    let transport: Arc<InMemoryTransport> = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();

    let mut origin = AuthBuilder::new(
        store.clone(),
        BackendConfig::ClientBlob {
            transport: transport.clone(),
        },
    )
    .clock(clock.clone())
    .request_meta(RequestMeta::from_ip("10.0.0.1"))
    .build()
    .unwrap();
    origin.login(&Credentials::new("alice", "secret")).unwrap();

    // A replay from another address sees the marker but fails validation.
    let mut replayer = AuthBuilder::new(
        store,
        BackendConfig::ClientBlob { transport },
    )
    .clock(clock)
    .request_meta(RequestMeta::from_ip("192.0.2.9"))
    .build()
    .unwrap();
    assert!(!replayer.resume());
    assert!(origin.resume());
}

#[test]
fn namespaces_isolate_sessions_on_a_shared_transport() {
    let clock = Arc::new(ManualClock::new(0));
    let transport: Arc<InMemoryTransport> = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();

    let mut tenant_a = AuthBuilder::new(
        store.clone(),
        BackendConfig::ServerKeyed {
            transport: transport.clone(),
        },
    )
    .clock(clock.clone())
    .namespace("tenant-a")
    .build()
    .unwrap();
    tenant_a.login(&Credentials::new("alice", "secret")).unwrap();

    let mut tenant_b = AuthBuilder::new(store, BackendConfig::ServerKeyed { transport })
        .clock(clock)
        .namespace("tenant-b")
        .build()
        .unwrap();
    assert!(!tenant_b.resume());
    assert!(tenant_a.is_logged_in());
}

#[test]
fn empty_namespace_is_rejected_at_build() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let result = AuthBuilder::new(seeded_store(), BackendConfig::ServerKeyed { transport })
        .clock(clock)
        .namespace("   ")
        .build();
    assert!(matches!(result, Err(crate::AuthError::InvalidNamespace)));
}

#[test]
fn logout_removes_markers_and_the_session_row() {
    let clock = Arc::new(ManualClock::new(0));
    let transport: Arc<InMemoryTransport> = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store.clone(),
        BackendConfig::PersistedRecord {
            transport: transport.clone(),
        },
        clock,
    );

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    assert_eq!(store.count("sessions", &Filter::new()).unwrap(), 1);

    auth.logout().unwrap();
    assert_eq!(store.count("sessions", &Filter::new()).unwrap(), 0);
    let keys = MarkerKeys::new(RECORD_STORAGE_NAME, "default");
    assert_eq!(transport.get(&keys.expire).unwrap(), None);
    assert_eq!(transport.get(&keys.suspend).unwrap(), None);
}

#[test]
fn destroying_the_current_session_drops_to_none() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store.clone(),
        BackendConfig::PersistedRecord { transport },
        clock,
    );

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    let uuids = auth.session_uuids(None).unwrap();
    assert_eq!(uuids.len(), 1);

    auth.destroy_session(uuids[0]).unwrap();
    assert!(auth.is_none());
    assert!(!auth.is_logged_in());
    assert_eq!(store.count("sessions", &Filter::new()).unwrap(), 0);
}

#[test]
fn session_uuids_enumerates_every_persisted_session_of_a_user() {
    let clock = Arc::new(ManualClock::new(0));
    let store = seeded_store();

    // Two concurrent logins on separate devices, each with its own transport.
    let mut first = build(
        store.clone(),
        BackendConfig::PersistedRecord {
            transport: Arc::new(InMemoryTransport::new(clock.clone())),
        },
        clock.clone(),
    );
    first.login(&Credentials::new("alice", "secret")).unwrap();

    let second_transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let mut second = build(
        store.clone(),
        BackendConfig::PersistedRecord {
            transport: second_transport.clone(),
        },
        clock,
    );
    second.login(&Credentials::new("alice", "secret")).unwrap();

    // Both enumerations cover every session of the user, current one
    // included.
    let uuids = second.session_uuids(Some("alice".into())).unwrap();
    assert_eq!(uuids.len(), 2);
    assert_eq!(second.session_uuids(None).unwrap().len(), 2);

    // The second device's own session is the one named by its marker.
    let keys = MarkerKeys::new(RECORD_STORAGE_NAME, "default");
    let raw = second_transport.get(&keys.expire).unwrap().unwrap();
    let mine: RecordMarker = serde_json::from_str(&raw).unwrap();

    // Revoking the other device's session leaves this one live.
    let other = uuids.iter().find(|u| **u != mine.uuid).copied().unwrap();
    second.destroy_session(other).unwrap();
    assert!(second.is_logged_in());
    assert!(!first.is_logged_in());
    assert_eq!(second.session_uuids(None).unwrap(), vec![mine.uuid]);
}

#[test]
fn permissions_flow_through_the_live_session() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store,
        BackendConfig::PersistedRecord { transport },
        clock,
    );

    auth.authorizer()
        .add_roles(&[NewRole::new("editor")])
        .unwrap();
    auth.authorizer()
        .add_resources(&[NewResource::new("article")])
        .unwrap();
    auth.authorizer()
        .assign_roles("alice", &["editor".into()])
        .unwrap();
    auth.authorizer()
        .allow_role("editor", Permission::Update, "article")
        .unwrap();

    // No session yet: deny regardless of grants.
    assert!(!auth.is_allow(Permission::Update, "article"));

    auth.login(&Credentials::new("alice", "secret")).unwrap();
    assert!(auth.is_allow(Permission::Update, "article"));
    assert!(!auth.is_allow(Permission::Delete, "article"));

    // A per-user deny shadows the role grant for this user only.
    auth.authorizer()
        .disallow_user("alice", Permission::Update, "article")
        .unwrap();
    assert!(!auth.is_allow(Permission::Update, "article"));

    auth.logout().unwrap();
    assert!(!auth.is_allow(Permission::Update, "article"));
}

#[test]
fn admin_check_requires_a_live_session() {
    let clock = Arc::new(ManualClock::new(0));
    let transport = Arc::new(InMemoryTransport::new(clock.clone()));
    let store = seeded_store();
    let mut auth = build(
        store,
        BackendConfig::ServerKeyed { transport },
        clock,
    );

    auth.authorizer()
        .add_roles(&[NewRole::admin("root")])
        .unwrap();
    auth.authorizer()
        .assign_roles("alice", &["root".into()])
        .unwrap();

    assert!(!auth.is_admin());
    auth.login(&Credentials::new("alice", "secret")).unwrap();
    assert!(auth.is_admin());
}
