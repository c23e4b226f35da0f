//! Seeded in-memory state shared by handler tests.

use std::str::FromStr;
use std::sync::Arc;

use rebanho_application::{
    IdentityService, PermissionService, PermissionStore, ProfileAdminService, SystemClock,
    UpsertGrantInput,
};
use rebanho_core::{Principal, PrincipalId};
use rebanho_domain::{CoarseFlags, Permission, PermissionId, PermissionKey, Profile, ProfileId};
use rebanho_infrastructure::{InMemoryAccessStore, InMemoryDecisionCache, MemberRecord};

use crate::state::AppState;

pub(crate) struct Parish {
    pub(crate) state: AppState,
    pub(crate) admin: Principal,
    pub(crate) alice: Principal,
    pub(crate) bob: Principal,
    pub(crate) supervisor: Profile,
    pub(crate) celulas_manage: Permission,
}

fn profile(name: &str, level: i32, is_system: bool) -> Profile {
    Profile::new(ProfileId::new(), name, name.replace('_', " "), level, true, is_system)
        .unwrap_or_else(|error| panic!("invalid fixture profile '{name}': {error}"))
}

fn permission(value: &str, is_sensitive: bool) -> Permission {
    Permission {
        id: PermissionId::new(),
        key: PermissionKey::from_str(value)
            .unwrap_or_else(|error| panic!("invalid fixture key '{value}': {error}")),
        description: format!("allows {value}"),
        is_sensitive,
    }
}

fn principal(name: &str) -> Principal {
    Principal::new(PrincipalId::new(), Some(format!("{name}@igreja.example")), name)
}

pub(crate) async fn seeded_parish() -> Parish {
    let store = Arc::new(InMemoryAccessStore::new());
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(InMemoryDecisionCache::new(clock.clone()));

    let administrador = profile("administrador_geral", 100, true);
    let supervisor = profile("supervisor_regional", 60, false);
    let admin_all = permission("admin.all", true);
    let celulas_manage = permission("celulas.manage", false);
    store.insert_profile(administrador.clone()).await;
    store.insert_profile(supervisor.clone()).await;
    store.insert_permission(admin_all.clone()).await;
    store.insert_permission(celulas_manage.clone()).await;

    let seeded_by = PrincipalId::new();
    for (profile_id, permission_id) in [
        (administrador.id(), admin_all.id),
        (supervisor.id(), celulas_manage.id),
    ] {
        let seeded = store
            .upsert_grant(UpsertGrantInput {
                profile_id,
                permission_id,
                granted: true,
                updated_by: seeded_by,
            })
            .await;
        assert!(seeded.is_ok());
    }

    let admin = principal("carol");
    let alice = principal("alice");
    let bob = principal("bob");
    for (member, assigned) in [(&admin, &administrador), (&alice, &supervisor)] {
        store
            .insert_member(MemberRecord {
                principal_id: Some(member.id()),
                email: member.email().map(str::to_owned),
                profile_id: Some(assigned.id()),
                legacy_role: None,
            })
            .await;
    }
    store
        .set_coarse_flags(
            admin.id(),
            CoarseFlags {
                is_admin: true,
                is_site_admin: true,
                is_mission_pastor: false,
            },
        )
        .await;

    let permission_service = PermissionService::new(store.clone(), cache);
    let state = AppState {
        permission_service: permission_service.clone(),
        identity_service: IdentityService::new(store.clone(), clock),
        profile_admin_service: ProfileAdminService::new(permission_service, store),
        frontend_url: "http://localhost:3000".to_owned(),
        bootstrap_token: "bootstrap-secret".to_owned(),
    };

    Parish {
        state,
        admin,
        alice,
        bob,
        supervisor,
        celulas_manage,
    }
}
