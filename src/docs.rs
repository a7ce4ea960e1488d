use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::{ResolutionRequest, ResourceKind};
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::authz::resolve_permissions,
		routes::authz::check_permission,
		routes::authz::space_view_permissions
	),
	components(
		schemas(
			ResolutionRequest,
			ResourceKind,
			routes::authz::PermissionsResponse,
			routes::authz::CheckRequest,
			routes::authz::CheckResponse,
			routes::authz::SpaceViewRequest,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Authz", description = "Permission resolution for pictures, spaces and space members"),
		(name = "Health", description = "Service health")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	add_request_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).try_it_out_enabled(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);
	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn add_request_examples(doc: &mut Value) {
	let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else { return; };

	for (path, item) in paths.iter_mut() {
		let example = match path.as_str() {
			"/authz/resolve" => json!({
				"actor_user_id": 1,
				"actor_is_admin": false,
				"id": 42,
				"route": "/api/picture/edit"
			}),
			"/authz/check" => json!({
				"actor_user_id": 1,
				"space_id": 7,
				"permission": "picture:upload"
			}),
			"/authz/space-view" => json!({
				"actor_user_id": 1,
				"space_id": 7
			}),
			_ => continue,
		};

		let Some(app_json) = item
			.pointer_mut("/post/requestBody/content/application~1json")
			.and_then(Value::as_object_mut)
		else {
			continue;
		};
		app_json.entry("example").or_insert(example);
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let Some(root) = doc.as_object_mut() else { return; };
	root.entry("servers").or_insert_with(|| {
		let mut server = Map::new();
		server.insert("url".to_string(), Value::String(format!("http://localhost:{port}")));
		Value::Array(vec![Value::Object(server)])
	});
}
