use std::sync::Arc;

use anyhow::Result;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};

use picture_authz::authz::{Actor, AuthzError, PermissionResolver, ResourceReference, RoleProfileTable};
use picture_authz::models::space::{Space, SpaceType};
use picture_authz::store::{AuthzStore, SqliteStore};

async fn setup() -> Result<(TempDir, SqlitePool)> {
    let dir = tempdir()?;
    let db_path = dir.path().join("test_store.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

async fn insert_space(pool: &SqlitePool, id: i64, owner: i64, space_type: i64, deleted: bool) -> Result<()> {
    sqlx::query("INSERT INTO space (id, space_name, user_id, space_type, is_delete) VALUES (?, 'space', ?, ?, ?)")
        .bind(id)
        .bind(owner)
        .bind(space_type)
        .bind(deleted as i64)
        .execute(pool)
        .await?;
    Ok(())
}

async fn insert_picture(pool: &SqlitePool, id: i64, owner: i64, space_id: Option<i64>) -> Result<()> {
    sqlx::query("INSERT INTO picture (id, name, user_id, space_id) VALUES (?, 'picture', ?, ?)")
        .bind(id)
        .bind(owner)
        .bind(space_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn space_lookup_skips_deleted_rows() -> Result<()> {
    let (_dir, pool) = setup().await?;
    insert_space(&pool, 1, 10, 1, false).await?;
    insert_space(&pool, 2, 10, 0, true).await?;

    let store = SqliteStore::new(pool);
    assert_eq!(store.space_by_id(1).await?, Some(Space::team(1, 10)));
    assert_eq!(store.space_by_id(2).await?, None);
    assert_eq!(store.space_by_id(3).await?, None);

    Ok(())
}

#[tokio::test]
async fn unknown_space_type_is_reported_as_corrupt() -> Result<()> {
    let (_dir, pool) = setup().await?;
    insert_space(&pool, 1, 10, 7, false).await?;

    let store = SqliteStore::new(pool);
    let err = store.space_by_id(1).await.unwrap_err();
    assert!(matches!(err, AuthzError::CorruptRecord(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn picture_scope_joins_owning_space() -> Result<()> {
    let (_dir, pool) = setup().await?;
    insert_space(&pool, 1, 10, 0, false).await?;
    insert_space(&pool, 2, 10, 1, true).await?;
    insert_picture(&pool, 1, 20, None).await?;
    insert_picture(&pool, 2, 20, Some(1)).await?;
    insert_picture(&pool, 3, 20, Some(2)).await?;

    let store = SqliteStore::new(pool);

    let public = store.picture_scope(1).await?.unwrap();
    assert_eq!(public.picture.space_id, None);
    assert!(public.space.is_none());

    let private = store.picture_scope(2).await?.unwrap();
    let space = private.space.unwrap();
    assert_eq!(space.user_id, 10);
    assert_eq!(space.space_type, SpaceType::Private);

    // owning space was soft-deleted
    let orphan = store.picture_scope(3).await?.unwrap();
    assert_eq!(orphan.picture.space_id, Some(2));
    assert!(orphan.space.is_none());

    assert!(store.picture_scope(4).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn one_membership_per_space_and_user() -> Result<()> {
    let (_dir, pool) = setup().await?;
    insert_space(&pool, 1, 10, 1, false).await?;

    sqlx::query("INSERT INTO space_user (space_id, user_id) VALUES (1, 11)")
        .execute(&pool)
        .await?;
    let duplicate = sqlx::query("INSERT INTO space_user (space_id, user_id, space_role) VALUES (1, 11, 'admin')")
        .execute(&pool)
        .await;
    assert!(duplicate.is_err(), "duplicate membership accepted");

    let store = SqliteStore::new(pool);
    let membership = store.membership_by_space_and_user(1, 11).await?.unwrap();
    assert_eq!(membership.space_role, "viewer");
    assert_eq!(store.membership_by_id(membership.id).await?, Some(membership));
    assert_eq!(store.membership_by_space_and_user(1, 12).await?, None);

    Ok(())
}

#[tokio::test]
async fn resolver_reads_from_sqlite() -> Result<()> {
    let (_dir, pool) = setup().await?;
    insert_space(&pool, 1, 10, 1, false).await?;
    insert_picture(&pool, 1, 10, Some(1)).await?;
    sqlx::query("INSERT INTO space_user (space_id, user_id, space_role) VALUES (1, 11, 'editor')")
        .execute(&pool)
        .await?;

    let resolver = PermissionResolver::new(Arc::new(RoleProfileTable::builtin()?), SqliteStore::new(pool));

    let editor = resolver
        .resolve(Some(&Actor::new(11)), ResourceReference::Picture(1))
        .await?;
    assert!(editor.contains("picture:delete"));
    assert!(!editor.contains("spaceUser:manage"));

    // space owner without a membership row holds nothing on a team space
    let owner = resolver
        .resolve(Some(&Actor::new(10)), ResourceReference::Picture(1))
        .await?;
    assert!(owner.is_empty());

    Ok(())
}
