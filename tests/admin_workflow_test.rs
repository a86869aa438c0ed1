//! Integration tests for the management workflows over the in-memory store.

mod helpers;

use backoffice_core::error::ErrorKind;
use backoffice_core::types::id::{PermissionId, UserId};
use backoffice_database::{PermissionStore, RoleStore, UserStore};
use backoffice_entity::audit::{AuditOutcome, AuditQuery};
use backoffice_entity::meta_tag::MetaTagInput;
use backoffice_entity::permission::PermissionInput;
use backoffice_entity::role::RoleInput;
use backoffice_entity::user::CreateUserInput;
use backoffice_service::MetaSource;

#[tokio::test]
async fn test_seeded_admin_lacks_permission_management() {
    let app = helpers::TestApp::seeded().await;
    let admin = app.login("admin@mail.com").await;

    assert!(app.users().list(&admin, None, 1).await.is_ok());
    assert!(app.roles().list(&admin, None, 1).await.is_ok());

    let err = app.permissions().list(&admin, None, 1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let user = app.login("user@mail.com").await;
    let err = app.users().list(&user, None, 1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_role_permission_sync_is_idempotent() {
    let app = helpers::TestApp::seeded().await;
    let ctx = app.login("superadmin@mail.com").await;
    let permissions = app.permissions();

    let mut ids = Vec::new();
    for name in ["edit posts", "publish posts"] {
        let outcome = permissions
            .create(&ctx, PermissionInput { name: name.into() })
            .await
            .unwrap();
        ids.push(outcome.into_value().unwrap().id);
    }

    let roles = app.roles();
    let editor = roles
        .create(
            &ctx,
            RoleInput {
                name: "editor".into(),
                permission_ids: Vec::new(),
            },
        )
        .await
        .unwrap()
        .into_value()
        .unwrap();

    let input = RoleInput {
        name: "editor".into(),
        permission_ids: ids.clone(),
    };
    let once = roles.update(&ctx, editor.role.id, input.clone()).await.unwrap();
    let twice = roles.update(&ctx, editor.role.id, input).await.unwrap();

    let mut first = once.into_value().unwrap().permission_ids;
    let mut second = twice.into_value().unwrap().permission_ids;
    first.sort_by_key(|id| id.into_uuid());
    second.sort_by_key(|id| id.into_uuid());
    ids.sort_by_key(|id| id.into_uuid());
    assert_eq!(first, ids);
    assert_eq!(second, ids);
}

#[tokio::test]
async fn test_failed_sync_persists_nothing() {
    let app = helpers::TestApp::seeded().await;
    let ctx = app.login("superadmin@mail.com").await;
    let role = app.store.find_role_by_name("user").await.unwrap().unwrap();

    let outcome = app
        .roles()
        .update(
            &ctx,
            role.id,
            RoleInput {
                name: "member".into(),
                permission_ids: vec![PermissionId::new()],
            },
        )
        .await
        .unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.notification().unwrap().message, "Failed to save role.");
    let stored = app.store.find_role_with_permissions(role.id).await.unwrap().unwrap();
    assert_eq!(stored.role.name, "user");
    assert!(stored.permission_ids.is_empty());

    let failed = app
        .store
        .audit_entries()
        .await
        .into_iter()
        .find(|e| e.action == "role.update")
        .expect("audited");
    assert_eq!(failed.outcome, AuditOutcome::Failed);
}

#[tokio::test]
async fn test_duplicates_are_field_errors_and_insert_nothing() {
    let app = helpers::TestApp::seeded().await;
    let ctx = app.login("superadmin@mail.com").await;
    let audit_before = app.store.audit_entries().await.len();

    let outcome = app
        .users()
        .create(
            &ctx,
            CreateUserInput {
                name: "Another Admin".into(),
                email: "admin@mail.com".into(),
                password: "secret-pass".into(),
                password_confirmation: "secret-pass".into(),
                role_ids: Vec::new(),
            },
        )
        .await
        .unwrap();
    let errors = outcome.field_errors().expect("invalid");
    assert_eq!(errors.get("email"), ["The email has already been taken."]);
    assert_eq!(app.store.count_users().await.unwrap(), 3);

    let outcome = app
        .roles()
        .create(
            &ctx,
            RoleInput {
                name: "admin".into(),
                permission_ids: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert!(outcome.field_errors().unwrap().has("name"));
    assert_eq!(app.store.count_roles().await.unwrap(), 3);

    let outcome = app
        .permissions()
        .create(&ctx, PermissionInput { name: "manage users".into() })
        .await
        .unwrap();
    assert!(outcome.field_errors().unwrap().has("name"));
    assert_eq!(app.store.count_permissions().await.unwrap(), 3);

    let outcome = app
        .meta_tags()
        .create(&ctx, MetaTagInput::for_page("home"))
        .await
        .unwrap();
    assert_eq!(
        outcome.field_errors().unwrap().get("page"),
        ["The page has already been taken."]
    );

    assert_eq!(app.store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn test_meta_tag_lifecycle_and_resolution() {
    let app = helpers::TestApp::new();
    let ctx = app.context_for(UserId::new(), "editor@mail.com").await;
    let service = app.meta_tags();
    let resolver = app.resolver();

    let empty = resolver.resolve("/").await.unwrap();
    assert_eq!(empty.page, "home");
    assert_eq!(empty.source, MetaSource::Default);
    assert_eq!(empty.meta.og_type, "website");
    assert!(empty.meta.title.is_none());

    let mut input = MetaTagInput::for_page("about");
    input.title = Some("About us".into());
    let created = service
        .create(&ctx, input.clone())
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(created.og_type, "website");
    assert_eq!(created.twitter_card, "summary_large_image");

    let updated = service
        .update(&ctx, created.id, input)
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("About us"));

    let found = service.list(&ctx, Some("about".into()), 1).await.unwrap();
    assert_eq!(found.total_items, 1);
    assert_eq!(found.items[0].title.as_deref(), Some("About us"));

    let resolved = resolver.resolve("/about/?ref=nav").await.unwrap();
    assert_eq!(resolved.source, MetaSource::Page);
    assert_eq!(resolved.meta.title.as_deref(), Some("About us"));

    let deleted = service.delete(&ctx, created.id).await.unwrap();
    assert_eq!(
        deleted.notification().unwrap().message,
        "Meta Tag deleted successfully."
    );
    assert_eq!(
        resolver.resolve("/about").await.unwrap().source,
        MetaSource::Default
    );
}

#[tokio::test]
async fn test_audit_trail_records_actor_and_client() {
    let app = helpers::TestApp::seeded().await;
    let ctx = app.login("superadmin@mail.com").await;

    app.permissions()
        .create(&ctx, PermissionInput { name: "view reports".into() })
        .await
        .unwrap();

    let page = app
        .audit_trail()
        .list(
            &ctx,
            &AuditQuery {
                target_type: Some("permission".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total_items, 1);
    let entry = &page.items[0];
    assert_eq!(entry.action, "permission.create");
    assert_eq!(entry.actor_id, Some(ctx.user_id));
    assert_eq!(entry.ip_address.as_deref(), Some("127.0.0.1"));
    assert_eq!(entry.user_agent.as_deref(), Some("integration-test"));

    let seed = app
        .audit_trail()
        .list(
            &ctx,
            &AuditQuery {
                action: Some("system.seed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(seed.total_items, 1);
    assert!(seed.items[0].actor_id.is_none());
}

#[tokio::test]
async fn test_deleting_role_detaches_users() {
    let app = helpers::TestApp::seeded().await;
    let ctx = app.login("superadmin@mail.com").await;
    let admin_role = app.store.find_role_by_name("admin").await.unwrap().unwrap();

    let outcome = app.roles().delete(&ctx, admin_role.id).await.unwrap();
    assert!(outcome.is_success());

    let admin = app.store.find_user_by_email("admin@mail.com").await.unwrap().unwrap();
    let with_roles = app.store.find_user_with_roles(admin.id).await.unwrap().unwrap();
    assert!(with_roles.role_ids.is_empty());
    assert!(app.store.permission_names_for(admin.id).await.unwrap().is_empty());
}
