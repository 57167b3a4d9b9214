use serde_json::json;
use tracing::info;

use crate::directory::{Directory, UserRecord};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required, resolve_actor, HandlerErr};
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "userCount": state.directory.as_ref().map(|d| d.len())
        }),
    )
}

fn directory_load(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let users: Vec<UserRecord> = get_required(params, "users")?;
    // Validate fully before replacing, so a bad batch keeps the old directory.
    let directory = Directory::from_records(users)?;
    let count = directory.len();
    state.directory = Some(directory);
    info!(users = count, "directory loaded");
    Ok(json!({ "userCount": count }))
}

fn handle_directory_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    match directory_load(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_actor_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    match resolve_actor(state, &req.params) {
        Ok(actor) => ok(&req.id, json!({ "actor": actor })),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "directory.load" => Some(handle_directory_load(state, req)),
        "actor.resolve" => Some(handle_actor_resolve(state, req)),
        _ => None,
    }
}
