//! Role-scoped authorization.
//!
//! One decision table answers "may this actor perform this operation on this
//! record", and [`scope_filter`] answers "which records of this kind may the
//! actor read" in a form a host can push into its query. The two must agree:
//! `scope_filter(a, k).matches(r)` is exactly `can_access(a, Read, r)` for
//! every `r` of kind `k`.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::PolicyError;
use crate::model::{Actor, Operation, Resource, ResourceKind, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

pub fn can_access(actor: &Actor, op: Operation, resource: &Resource) -> Decision {
    // Self-addressed messages are refused before any role gets a say.
    if let (
        Operation::Create,
        Resource::Message {
            sender_id,
            recipient_id,
        },
    ) = (op, resource)
    {
        if sender_id == recipient_id {
            return Decision::Deny;
        }
    }

    if actor.role == Role::Admin {
        return Decision::Allow;
    }

    let allowed = match resource {
        Resource::Grade {
            student_id,
            teacher_id,
        } => match actor.role {
            Role::Teacher => *teacher_id == actor.id,
            Role::Parent => op == Operation::Read && actor.has_child(student_id),
            Role::Student => op == Operation::Read && *student_id == actor.id,
            Role::Admin => false,
        },
        Resource::Homework {
            class_id,
            teacher_id,
        } => match (actor.role, op) {
            (Role::Teacher, Operation::Read | Operation::Create) => true,
            (Role::Teacher, Operation::Update | Operation::Delete) => *teacher_id == actor.id,
            (Role::Parent, Operation::Read) => actor.has_child_in_class(class_id),
            (Role::Student, Operation::Read) => actor.class_id.as_deref() == Some(class_id),
            _ => false,
        },
        Resource::Message {
            sender_id,
            recipient_id,
        } => match op {
            Operation::Create => matches!(actor.role, Role::Teacher | Role::Parent),
            Operation::Read => *sender_id == actor.id || *recipient_id == actor.id,
            Operation::Update | Operation::Delete => false,
        },
        Resource::ClassRoster { class_id } => match (actor.role, op) {
            (Role::Teacher, Operation::Read) => true,
            (Role::Parent, Operation::Read) => actor.has_child_in_class(class_id),
            (Role::Student, Operation::Read) => actor.class_id.as_deref() == Some(class_id),
            _ => false,
        },
    };

    Decision::from(allowed)
}

/// Same decision as [`can_access`], with a refusal surfaced as
/// [`PolicyError::Denied`].
pub fn authorize(actor: &Actor, op: Operation, resource: &Resource) -> Result<(), PolicyError> {
    if can_access(actor, op, resource).is_allowed() {
        Ok(())
    } else {
        Err(PolicyError::Denied)
    }
}

/// Row predicate for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFilter {
    pub kind: ResourceKind,
    pub rule: ScopeRule,
}

/// The condition a row must satisfy. Serialized with the column it constrains
/// so a host can translate it into a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScopeRule {
    All,
    Nothing,
    StudentIn { ids: BTreeSet<String> },
    TeacherIs { id: String },
    ClassIn { ids: BTreeSet<String> },
    Participant { id: String },
}

impl ScopeRule {
    fn student_in(ids: BTreeSet<String>) -> Self {
        if ids.is_empty() {
            ScopeRule::Nothing
        } else {
            ScopeRule::StudentIn { ids }
        }
    }

    fn class_in(ids: BTreeSet<String>) -> Self {
        if ids.is_empty() {
            ScopeRule::Nothing
        } else {
            ScopeRule::ClassIn { ids }
        }
    }

    /// Columns the rule reads, in the host's record naming.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ScopeRule::All | ScopeRule::Nothing => &[],
            ScopeRule::StudentIn { .. } => &["studentId"],
            ScopeRule::TeacherIs { .. } => &["teacherId"],
            ScopeRule::ClassIn { .. } => &["classId"],
            ScopeRule::Participant { .. } => &["senderId", "recipientId"],
        }
    }
}

impl ScopeFilter {
    pub fn matches(&self, resource: &Resource) -> bool {
        if resource.kind() != self.kind {
            return false;
        }
        match (&self.rule, resource) {
            (ScopeRule::All, _) => true,
            (ScopeRule::Nothing, _) => false,
            (ScopeRule::StudentIn { ids }, Resource::Grade { student_id, .. }) => {
                ids.contains(student_id)
            }
            (ScopeRule::TeacherIs { id }, Resource::Grade { teacher_id, .. })
            | (ScopeRule::TeacherIs { id }, Resource::Homework { teacher_id, .. }) => {
                teacher_id == id
            }
            (ScopeRule::ClassIn { ids }, Resource::Homework { class_id, .. })
            | (ScopeRule::ClassIn { ids }, Resource::ClassRoster { class_id }) => {
                ids.contains(class_id)
            }
            (
                ScopeRule::Participant { id },
                Resource::Message {
                    sender_id,
                    recipient_id,
                },
            ) => sender_id == id || recipient_id == id,
            _ => false,
        }
    }
}

pub fn scope_filter(actor: &Actor, kind: ResourceKind) -> ScopeFilter {
    let own_class = || actor.class_id.iter().cloned().collect::<BTreeSet<_>>();

    let rule = match (actor.role, kind) {
        (Role::Admin, _) => ScopeRule::All,

        (Role::Teacher, ResourceKind::Grade) => ScopeRule::TeacherIs {
            id: actor.id.clone(),
        },
        (Role::Parent, ResourceKind::Grade) => ScopeRule::student_in(actor.child_ids()),
        (Role::Student, ResourceKind::Grade) => {
            ScopeRule::student_in(BTreeSet::from([actor.id.clone()]))
        }

        (Role::Teacher, ResourceKind::Homework | ResourceKind::ClassRoster) => ScopeRule::All,
        (Role::Parent, ResourceKind::Homework | ResourceKind::ClassRoster) => {
            ScopeRule::class_in(actor.child_class_ids())
        }
        (Role::Student, ResourceKind::Homework | ResourceKind::ClassRoster) => {
            ScopeRule::class_in(own_class())
        }

        (_, ResourceKind::Message) => ScopeRule::Participant {
            id: actor.id.clone(),
        },
    };

    ScopeFilter { kind, rule }
}

/// Keeps the resources of `kind` the actor may read, in input order.
pub fn filter_visible(actor: &Actor, kind: ResourceKind, resources: Vec<Resource>) -> Vec<Resource> {
    let filter = scope_filter(actor, kind);
    resources
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect()
}
