use serde_json::json;
use tracing::{debug, info};

use crate::ipc::error::ok;
use crate::ipc::helpers::{get_kind, get_required, get_resource, resolve_actor, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Actor, Operation, Resource, ResourceRecord};
use crate::policy::{self, Decision};

fn audit(state: &AppState, actor: &Actor, op: Operation, resource: &Resource, decision: Decision) {
    match decision {
        Decision::Deny => debug!(
            actor_id = %actor.id,
            role = %actor.role,
            operation = ?op,
            kind = %resource.kind(),
            "access denied"
        ),
        Decision::Allow if state.config.audit_decisions => info!(
            actor_id = %actor.id,
            role = %actor.role,
            operation = ?op,
            kind = %resource.kind(),
            "access allowed"
        ),
        Decision::Allow => {}
    }
}

fn request_parts(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<(Actor, Operation, Resource), HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let op: Operation = get_required(params, "operation")?;
    let resource = get_resource(params)?;
    Ok((actor, op, resource))
}

fn policy_check(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (actor, op, resource) = request_parts(state, params)?;
    let decision = policy::can_access(&actor, op, &resource);
    audit(state, &actor, op, &resource, decision);
    Ok(json!({ "allowed": decision.is_allowed(), "decision": decision }))
}

fn policy_authorize(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (actor, op, resource) = request_parts(state, params)?;
    let outcome = policy::authorize(&actor, op, &resource);
    audit(state, &actor, op, &resource, Decision::from(outcome.is_ok()));
    outcome?;
    Ok(json!({}))
}

fn policy_scope(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let kind = get_kind(params)?;
    let filter = policy::scope_filter(&actor, kind);
    Ok(json!({ "filter": filter, "columns": filter.rule.columns() }))
}

fn policy_filter(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let kind = get_kind(params)?;
    let rows: Vec<serde_json::Value> = get_required(params, "resources")?;
    let filter = policy::scope_filter(&actor, kind);

    let mut visible = Vec::new();
    for (idx, row) in rows.into_iter().enumerate() {
        let rec: ResourceRecord = serde_json::from_value(row.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid resources[{}]: {}", idx, e)))?;
        let resource = rec.into_resource(Some(kind)).map_err(|e| {
            let mut he = HandlerErr::from(e);
            if let Some(d) = he.details.as_mut() {
                d["index"] = json!(idx);
            }
            he
        })?;
        if filter.matches(&resource) {
            visible.push(row);
        }
    }
    debug!(actor_id = %actor.id, kind = %kind, visible = visible.len(), "scope filter applied");
    Ok(json!({ "resources": visible }))
}

fn respond(
    req: &Request,
    result: Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "policy.check" => Some(respond(req, policy_check(state, &req.params))),
        "policy.authorize" => Some(respond(req, policy_authorize(state, &req.params))),
        "policy.scope" => Some(respond(req, policy_scope(state, &req.params))),
        "policy.filter" => Some(respond(req, policy_filter(state, &req.params))),
        _ => None,
    }
}
