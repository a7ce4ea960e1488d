use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt;

use picture_authz::authz::{AuthzMode, RoleProfileTable};
use picture_authz::create_app;

const OWNER: i64 = 10;
const EDITOR: i64 = 11;
const VIEWER: i64 = 12;
const STRANGER: i64 = 13;

const PRIVATE_SPACE: i64 = 1;
const TEAM_SPACE: i64 = 2;

async fn setup(mode: AuthzMode) -> Result<(TempDir, Router)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_authz.db");
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    seed(&pool).await?;

    let app = create_app(pool, Arc::new(RoleProfileTable::builtin()?), mode);
    Ok((dir, app))
}

async fn seed(pool: &SqlitePool) -> Result<()> {
    for (id, owner, space_type) in [(PRIVATE_SPACE, OWNER, 0), (TEAM_SPACE, OWNER, 1)] {
        sqlx::query("INSERT INTO space (id, space_name, user_id, space_type) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(format!("space {id}"))
            .bind(owner)
            .bind(space_type)
            .execute(pool)
            .await?;
    }

    for (id, user_id, role) in [(1, OWNER, "admin"), (2, EDITOR, "editor"), (3, VIEWER, "viewer")] {
        sqlx::query("INSERT INTO space_user (id, space_id, user_id, space_role) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(TEAM_SPACE)
            .bind(user_id)
            .bind(role)
            .execute(pool)
            .await?;
    }

    // 1: public gallery, 2: private space, 3: team space, 4: space that no longer exists
    for (id, space_id) in [(1, None), (2, Some(PRIVATE_SPACE)), (3, Some(TEAM_SPACE)), (4, Some(99))] {
        sqlx::query("INSERT INTO picture (id, name, user_id, space_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(format!("picture {id}"))
            .bind(OWNER)
            .bind(space_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn post(app: &Router, uri: &str, payload: Value) -> Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))?;
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    Ok((status, body))
}

fn permissions(body: &Value) -> Vec<&str> {
    body.get("permissions")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

const EVERYTHING: [&str; 5] = ["spaceUser:manage", "picture:view", "picture:upload", "picture:edit", "picture:delete"];
const EDITOR_SET: [&str; 4] = ["picture:view", "picture:upload", "picture:edit", "picture:delete"];

#[tokio::test]
async fn generic_id_is_classified_by_route() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Strict).await?;

    // id 2 on the space routes is the team space, where the editor holds a role
    let (status, body) = post(&app, "/authz/resolve", json!({
        "actor_user_id": EDITOR, "id": TEAM_SPACE, "route": "/api/space/get/vo"
    })).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(permissions(&body), EDITOR_SET);

    // the same value on the picture routes is picture 2, inside the private space
    let (status, body) = post(&app, "/authz/resolve", json!({
        "actor_user_id": EDITOR, "id": 2, "route": "/api/picture/edit"
    })).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(permissions(&body).is_empty(), "{body}");

    let (status, body) = post(&app, "/authz/resolve", json!({
        "actor_user_id": EDITOR, "id": 2, "route": "/api/user/get"
    })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body.get("kind").and_then(Value::as_str), Some("unrecognized_route"));

    Ok(())
}

#[tokio::test]
async fn resolve_covers_every_ownership_model() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Strict).await?;

    let cases = [
        // public gallery picture
        (json!({"actor_user_id": OWNER, "picture_id": 1}), EVERYTHING.to_vec()),
        (json!({"actor_user_id": STRANGER, "picture_id": 1}), vec!["picture:view"]),
        (json!({"actor_user_id": STRANGER, "actor_is_admin": true, "picture_id": 1}), EVERYTHING.to_vec()),
        // private space
        (json!({"actor_user_id": OWNER, "space_id": PRIVATE_SPACE}), EVERYTHING.to_vec()),
        (json!({"actor_user_id": STRANGER, "space_id": PRIVATE_SPACE}), vec![]),
        // team space, directly and through its picture
        (json!({"actor_user_id": VIEWER, "space_id": TEAM_SPACE}), vec!["picture:view"]),
        (json!({"actor_user_id": VIEWER, "picture_id": 3}), vec!["picture:view"]),
        (json!({"actor_user_id": STRANGER, "picture_id": 3}), vec![]),
        // membership records
        (json!({"actor_user_id": EDITOR, "space_user_id": 2}), EDITOR_SET.to_vec()),
        (json!({"actor_user_id": OWNER, "space_user_id": 2}), vec![]),
        // nothing named
        (json!({}), EVERYTHING.to_vec()),
    ];

    for (request, expected) in cases {
        let (status, body) = post(&app, "/authz/resolve", request.clone()).await?;
        assert_eq!(status, StatusCode::OK, "{request} -> {body}");
        assert_eq!(permissions(&body), expected, "{request}");
    }

    Ok(())
}

#[tokio::test]
async fn resolve_failures_are_tagged() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Strict).await?;

    let (status, body) = post(&app, "/authz/resolve", json!({"space_id": 5})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.get("kind").and_then(Value::as_str), Some("not_authenticated"));

    let (status, body) = post(&app, "/authz/resolve", json!({"actor_user_id": OWNER, "picture_id": 4})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "dangling space must not read as 'no permission'");
    assert_eq!(body.get("kind").and_then(Value::as_str), Some("not_found"));

    let (status, _) = post(&app, "/authz/resolve", json!({"actor_user_id": OWNER, "space_user_id": 77})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn check_enforces_in_strict_mode() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Strict).await?;

    let (status, body) = post(&app, "/authz/check", json!({
        "actor_user_id": EDITOR, "id": 3, "route": "/api/picture/delete", "permission": "picture:delete"
    })).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body.get("allowed").and_then(Value::as_bool), Some(true));

    let (status, body) = post(&app, "/authz/check", json!({
        "actor_user_id": VIEWER, "id": 3, "route": "/api/picture/delete", "permission": "picture:delete"
    })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body.get("kind").and_then(Value::as_str), Some("forbidden"));

    let (status, _) = post(&app, "/authz/check", json!({
        "id": 3, "route": "/api/picture/delete", "permission": "picture:delete"
    })).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn check_only_logs_in_advisory_mode() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Advisory).await?;

    let (status, _) = post(&app, "/authz/check", json!({
        "actor_user_id": STRANGER, "space_id": PRIVATE_SPACE, "permission": "picture:upload"
    })).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn space_view_lists_display_permissions() -> Result<()> {
    let (_dir, app) = setup(AuthzMode::Strict).await?;

    let (status, body) = post(&app, "/authz/space-view", json!({"actor_user_id": EDITOR, "space_id": TEAM_SPACE})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(permissions(&body), EDITOR_SET);

    let (_, body) = post(&app, "/authz/space-view", json!({"actor_user_id": OWNER})).await?;
    assert!(permissions(&body).is_empty(), "public gallery is admin-only here");

    let (_, body) = post(&app, "/authz/space-view", json!({"actor_user_id": STRANGER, "actor_is_admin": true})).await?;
    assert_eq!(permissions(&body), EVERYTHING);

    let (_, body) = post(&app, "/authz/space-view", json!({"space_id": TEAM_SPACE})).await?;
    assert!(permissions(&body).is_empty());

    let (status, _) = post(&app, "/authz/space-view", json!({"actor_user_id": OWNER, "space_id": 99})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
