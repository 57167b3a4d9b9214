use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::PolicyError;
use crate::model::{Actor, Child, Role};

/// A user row as the host stores it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_id: Option<String>,
    /// Set on students only. Absent means no parent is linked.
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
struct User {
    name: String,
    role: Role,
    class_id: Option<String>,
}

/// Users known to the sidecar, indexed for actor resolution.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: HashMap<String, User>,
    // parent id -> student ids, in load order
    children_by_parent: HashMap<String, Vec<String>>,
}

impl Directory {
    pub fn from_records(records: Vec<UserRecord>) -> Result<Self, PolicyError> {
        let mut dir = Directory::default();
        for rec in records {
            let id = rec.id.trim().to_string();
            if id.is_empty() {
                return Err(PolicyError::InvalidUser("user id must not be empty".into()));
            }
            let role: Role = rec.role.parse()?;
            if dir.users.contains_key(&id) {
                return Err(PolicyError::InvalidUser(format!("duplicate user id {id}")));
            }

            let blank_to_none = |v: Option<String>| {
                v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
            };
            let class_id = blank_to_none(rec.class_id);
            let parent_id = if role == Role::Student {
                blank_to_none(rec.parent_id)
            } else {
                None
            };

            if let Some(pid) = parent_id {
                dir.children_by_parent
                    .entry(pid)
                    .or_default()
                    .push(id.clone());
            }
            dir.users.insert(
                id,
                User {
                    name: rec.name,
                    role,
                    class_id,
                },
            );
        }
        Ok(dir)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn profile(&self, id: &str) -> Option<UserProfile> {
        let id = id.trim();
        self.users.get(id).map(|u| UserProfile {
            id: id.to_string(),
            name: u.name.clone(),
            role: u.role,
        })
    }

    /// Builds the actor for `id`. A parent's children are every student whose
    /// `parentId` names them; a parent with none gets an empty set.
    pub fn resolve_actor(&self, id: &str) -> Option<Actor> {
        let id = id.trim();
        let user = self.users.get(id)?;
        let actor = match user.role {
            Role::Admin => Actor::admin(id),
            Role::Teacher => Actor::teacher(id),
            Role::Student => Actor::student(id, user.class_id.clone()),
            Role::Parent => {
                let children = self
                    .children_by_parent
                    .get(id)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|sid| {
                                let s = self.users.get(sid)?;
                                Some(Child {
                                    id: sid.clone(),
                                    class_id: s.class_id.clone(),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Actor::parent(id, children)
            }
        };
        Some(actor)
    }
}
