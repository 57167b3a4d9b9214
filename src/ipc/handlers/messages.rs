use serde_json::json;

use crate::conversations;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_messages, get_required_str, resolve_actor, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Actor, Message, ResourceKind};
use crate::policy;

// Drop anything the host handed over that this actor may not read.
fn readable(actor: &Actor, messages: Vec<Message>) -> Vec<Message> {
    let filter = policy::scope_filter(actor, ResourceKind::Message);
    messages
        .into_iter()
        .filter(|m| filter.matches(&m.as_resource()))
        .collect()
}

fn messages_conversations(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let messages = get_messages(params)?;
    let mut summaries = conversations::group(&actor.id, &messages);
    if let Some(directory) = state.directory.as_ref() {
        conversations::attach_profiles(&mut summaries, directory);
    }
    Ok(json!({ "conversations": summaries }))
}

fn messages_thread(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let counterpart_id = get_required_str(params, "counterpartId")?;
    let messages = readable(&actor, get_messages(params)?);
    let thread = conversations::thread(&actor.id, &counterpart_id, &messages);
    Ok(json!({ "messages": thread }))
}

fn messages_unread(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = resolve_actor(state, params)?;
    let messages = get_messages(params)?;
    Ok(json!({ "unread": conversations::unread_total(&actor.id, &messages) }))
}

fn handle_with(
    state: &mut AppState,
    req: &Request,
    f: fn(&AppState, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match f(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "messages.conversations" => Some(handle_with(state, req, messages_conversations)),
        "messages.thread" => Some(handle_with(state, req, messages_thread)),
        "messages.unread" => Some(handle_with(state, req, messages_unread)),
        _ => None,
    }
}
