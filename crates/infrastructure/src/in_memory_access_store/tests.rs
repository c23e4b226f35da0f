use std::str::FromStr;
use std::sync::Arc;

use rebanho_application::{
    CoarseFlagRepository, CreateProfileInput, PermissionService, PermissionStore,
    ProfileAdminRepository, ProfileAdminService, SystemClock, UpsertGrantInput,
};
use rebanho_core::{AppError, Principal, PrincipalId};
use rebanho_domain::{CoarseFlags, Permission, PermissionId, PermissionKey, Profile, ProfileId};

use super::{InMemoryAccessStore, MemberRecord};
use crate::InMemoryDecisionCache;

fn profile(name: &str, level: i32) -> Profile {
    Profile::new(ProfileId::new(), name, name.replace('_', " "), level, true, false)
        .unwrap_or_else(|error| panic!("invalid fixture profile '{name}': {error}"))
}

fn permission(value: &str, is_sensitive: bool) -> Permission {
    Permission {
        id: PermissionId::new(),
        key: key(value),
        description: format!("allows {value}"),
        is_sensitive,
    }
}

fn key(value: &str) -> PermissionKey {
    PermissionKey::from_str(value)
        .unwrap_or_else(|error| panic!("invalid fixture key '{value}': {error}"))
}

fn principal(name: &str) -> Principal {
    Principal::new(PrincipalId::new(), Some(format!("{name}@igreja.example")), name)
}

fn member(principal: &Principal, profile: Option<&Profile>) -> MemberRecord {
    MemberRecord {
        principal_id: Some(principal.id()),
        email: principal.email().map(str::to_owned),
        profile_id: profile.map(Profile::id),
        legacy_role: None,
    }
}

#[tokio::test]
async fn member_is_matched_by_email_when_not_linked() {
    let store = InMemoryAccessStore::new();
    let lider = profile("lider_celula", 30);
    store.insert_profile(lider.clone()).await;

    let alice = principal("alice");
    store
        .insert_member(MemberRecord {
            principal_id: None,
            email: Some(" Alice@Igreja.example".to_owned()),
            profile_id: Some(lider.id()),
            legacy_role: Some("Líder".to_owned()),
        })
        .await;

    let assigned = store.profile_for_principal(&alice).await;
    assert!(matches!(assigned, Ok(Some(ref found)) if found.id() == lider.id()));

    let legacy = store.legacy_role_for_principal(&alice).await;
    assert!(matches!(legacy, Ok(Some(ref label)) if label == "Líder"));
}

#[tokio::test]
async fn linked_member_wins_over_email_match() {
    let store = InMemoryAccessStore::new();
    let membro = profile("membro", 10);
    let pastor = profile("pastor", 80);
    store.insert_profile(membro.clone()).await;
    store.insert_profile(pastor.clone()).await;

    let erin = principal("erin");
    store
        .insert_member(MemberRecord {
            principal_id: None,
            email: erin.email().map(str::to_owned),
            profile_id: Some(pastor.id()),
            legacy_role: None,
        })
        .await;
    store.insert_member(member(&erin, Some(&membro))).await;

    let assigned = store.profile_for_principal(&erin).await;
    assert!(matches!(assigned, Ok(Some(ref found)) if found.name() == "membro"));
}

#[tokio::test]
async fn linked_member_without_profile_ignores_email_match() {
    let store = InMemoryAccessStore::new();
    let pastor = profile("pastor", 80);
    store.insert_profile(pastor.clone()).await;

    let grace = principal("grace");
    store
        .insert_member(MemberRecord {
            principal_id: None,
            email: grace.email().map(str::to_owned),
            profile_id: Some(pastor.id()),
            legacy_role: Some("Pastor".to_owned()),
        })
        .await;
    store.insert_member(member(&grace, None)).await;

    assert!(matches!(store.profile_for_principal(&grace).await, Ok(None)));
    assert!(matches!(
        store.legacy_role_for_principal(&grace).await,
        Ok(None)
    ));
}

#[tokio::test]
async fn upsert_grant_replaces_existing_row() {
    let store = InMemoryAccessStore::new();
    let tesoureiro = profile("tesoureiro", 50);
    let exportar = permission("financeiro.exportar", true);
    store.insert_profile(tesoureiro.clone()).await;
    store.insert_permission(exportar.clone()).await;
    let admin = PrincipalId::new();

    for granted in [true, false] {
        let upserted = store
            .upsert_grant(UpsertGrantInput {
                profile_id: tesoureiro.id(),
                permission_id: exportar.id,
                granted,
                updated_by: admin,
            })
            .await;
        assert!(matches!(upserted, Ok(ref grant) if grant.granted == granted));
    }

    let grants = store
        .grants_for_profile(tesoureiro.id())
        .await
        .unwrap_or_default();
    assert_eq!(grants.len(), 1);
    assert!(!grants[0].granted);
    assert_eq!(grants[0].updated_by, Some(admin));
}

#[tokio::test]
async fn upsert_grant_for_unknown_side_is_not_found() {
    let store = InMemoryAccessStore::new();
    let tesoureiro = profile("tesoureiro", 50);
    store.insert_profile(tesoureiro.clone()).await;

    let unknown_permission = store
        .upsert_grant(UpsertGrantInput {
            profile_id: tesoureiro.id(),
            permission_id: PermissionId::new(),
            granted: true,
            updated_by: PrincipalId::new(),
        })
        .await;
    assert!(matches!(unknown_permission, Err(AppError::NotFound(_))));

    let unknown_profile = store
        .upsert_grant(UpsertGrantInput {
            profile_id: ProfileId::new(),
            permission_id: PermissionId::new(),
            granted: true,
            updated_by: PrincipalId::new(),
        })
        .await;
    assert!(matches!(unknown_profile, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn profiles_are_listed_by_level_and_names_are_unique() {
    let store = InMemoryAccessStore::new();
    store.insert_profile(profile("membro", 10)).await;
    store.insert_profile(profile("pastor", 80)).await;

    let created = store
        .create_profile(CreateProfileInput {
            name: "lider_jovens".to_owned(),
            display_name: "Líder de Jovens".to_owned(),
            level: 35,
        })
        .await;
    assert!(matches!(created, Ok(ref created) if created.is_active() && !created.is_system()));

    let duplicate = store
        .create_profile(CreateProfileInput {
            name: "pastor".to_owned(),
            display_name: "Pastor".to_owned(),
            level: 80,
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let names: Vec<String> = store
        .list_profiles()
        .await
        .unwrap_or_default()
        .iter()
        .map(|profile| profile.name().to_owned())
        .collect();
    assert_eq!(names, vec!["pastor", "lider_jovens", "membro"]);
}

#[tokio::test]
async fn unknown_principal_has_no_coarse_flags() {
    let store = InMemoryAccessStore::new();
    let admin = PrincipalId::new();
    let flags = CoarseFlags {
        is_admin: true,
        is_site_admin: false,
        is_mission_pastor: true,
    };
    store.set_coarse_flags(admin, flags).await;

    assert!(matches!(store.coarse_flags(admin).await, Ok(found) if found == flags));
    assert!(matches!(
        store.coarse_flags(PrincipalId::new()).await,
        Ok(found) if found == CoarseFlags::none()
    ));
}

#[tokio::test]
async fn revocation_and_deactivation_reach_cached_principals() {
    let store = Arc::new(InMemoryAccessStore::new());
    let cache = Arc::new(InMemoryDecisionCache::new(Arc::new(SystemClock)));
    let permission_service = PermissionService::new(store.clone(), cache.clone());
    let admin_service = ProfileAdminService::new(permission_service.clone(), store.clone());

    let administrador = profile("administrador_geral", 100);
    let supervisor = profile("supervisor_regional", 60);
    let admin_all = permission("admin.all", true);
    let celulas_manage = permission("celulas.manage", false);
    store.insert_profile(administrador.clone()).await;
    store.insert_profile(supervisor.clone()).await;
    store.insert_permission(admin_all.clone()).await;
    store.insert_permission(celulas_manage.clone()).await;

    let carol = principal("carol");
    let alice = principal("alice");
    store.insert_member(member(&carol, Some(&administrador))).await;
    store.insert_member(member(&alice, Some(&supervisor))).await;

    let bootstrap = PrincipalId::new();
    for (profile_id, permission_id) in [
        (administrador.id(), admin_all.id),
        (supervisor.id(), celulas_manage.id),
    ] {
        let seeded = store
            .upsert_grant(UpsertGrantInput {
                profile_id,
                permission_id,
                granted: true,
                updated_by: bootstrap,
            })
            .await;
        assert!(seeded.is_ok());
    }

    assert!(permission_service.can(&alice, &key("celulas.manage")).await);
    assert_eq!(cache.len().await, 1);

    let revoked = permission_service
        .grant_permission(&carol, supervisor.id(), celulas_manage.id, false)
        .await;
    assert!(revoked.is_ok());
    assert!(!permission_service.can(&alice, &key("celulas.manage")).await);
    assert!(!permission_service.can(&alice, &key("events.view")).await);

    let deactivated = admin_service
        .deactivate_profile(&carol, supervisor.id())
        .await;
    assert!(matches!(deactivated, Ok(ref profile) if !profile.is_active()));

    let access = permission_service.resolve(&alice, false).await;
    assert!(access.profile.is_none());
    assert!(access.allows(&key("events.view")));
}
