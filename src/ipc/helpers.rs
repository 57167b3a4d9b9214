use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::error;

use crate::error::PolicyError;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::model::{Actor, ActorRecord, Message, Resource, ResourceKind, ResourceRecord};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<PolicyError> for HandlerErr {
    fn from(e: PolicyError) -> Self {
        // Malformed records and roles are host bugs; make them loud.
        if e.is_caller_bug() {
            error!(code = e.code(), "rejected caller input: {e}");
        }
        let details = match &e {
            PolicyError::InvalidResource { kind, missing } => {
                Some(json!({ "kind": kind, "missing": missing }))
            }
            PolicyError::UnknownRole(role) => Some(json!({ "role": role })),
            _ => None,
        };
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<T, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// The acting user: an inline `actor` record, or `actorId` looked up in the
/// loaded directory.
///
/// When a directory is loaded and knows the inline actor's id, the directory
/// entry replaces the inline one, so a parent's children always come from the
/// reverse `parentId` lookup. Inline actors the directory does not know are
/// trusted as given.
pub fn resolve_actor(state: &AppState, params: &serde_json::Value) -> Result<Actor, HandlerErr> {
    if params.get("actor").is_some() {
        let rec: ActorRecord = get_required(params, "actor")?;
        let inline = Actor::try_from(rec)?;
        let known = state
            .directory
            .as_ref()
            .and_then(|d| d.resolve_actor(&inline.id));
        return Ok(known.unwrap_or(inline));
    }
    let actor_id = get_required_str(params, "actorId")
        .map_err(|_| HandlerErr::bad_params("missing actor or actorId"))?;
    let Some(directory) = state.directory.as_ref() else {
        return Err(HandlerErr::new(
            "no_directory",
            "load a directory first or pass an inline actor",
        ));
    };
    directory.resolve_actor(&actor_id).ok_or_else(|| HandlerErr {
        code: "unknown_actor",
        message: "actor not found".to_string(),
        details: Some(json!({ "actorId": actor_id })),
    })
}

pub fn get_kind(params: &serde_json::Value) -> Result<ResourceKind, HandlerErr> {
    get_required(params, "kind")
}

pub fn get_resource(params: &serde_json::Value) -> Result<Resource, HandlerErr> {
    let rec: ResourceRecord = get_required(params, "resource")?;
    Ok(rec.into_resource(None)?)
}

pub fn get_messages(params: &serde_json::Value) -> Result<Vec<Message>, HandlerErr> {
    get_required(params, "messages")
}
