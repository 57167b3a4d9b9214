use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PolicyError;

    // Exact literals only; "Admin" or " admin" are not roles.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            "student" => Ok(Role::Student),
            other => Err(PolicyError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Grade,
    Homework,
    Message,
    ClassRoster,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Grade,
        ResourceKind::Homework,
        ResourceKind::Message,
        ResourceKind::ClassRoster,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Grade => "grade",
            ResourceKind::Homework => "homework",
            ResourceKind::Message => "message",
            ResourceKind::ClassRoster => "classRoster",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student linked to a parent, with the class the student is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    #[serde(default)]
    pub class_id: Option<String>,
}

/// The authenticated party behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// Only meaningful for students.
    pub class_id: Option<String>,
    /// Only meaningful for parents. May be empty.
    pub children: Vec<Child>,
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Self {
        Self::bare(id, Role::Admin)
    }

    pub fn teacher(id: impl Into<String>) -> Self {
        Self::bare(id, Role::Teacher)
    }

    pub fn student(id: impl Into<String>, class_id: Option<String>) -> Self {
        Actor {
            class_id,
            ..Self::bare(id, Role::Student)
        }
    }

    pub fn parent(id: impl Into<String>, children: Vec<Child>) -> Self {
        Actor {
            children,
            ..Self::bare(id, Role::Parent)
        }
    }

    fn bare(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
            class_id: None,
            children: Vec::new(),
        }
    }

    pub fn child_ids(&self) -> BTreeSet<String> {
        self.children.iter().map(|c| c.id.clone()).collect()
    }

    pub fn child_class_ids(&self) -> BTreeSet<String> {
        self.children
            .iter()
            .filter_map(|c| c.class_id.clone())
            .collect()
    }

    pub fn has_child(&self, student_id: &str) -> bool {
        self.children.iter().any(|c| c.id == student_id)
    }

    pub fn has_child_in_class(&self, class_id: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.class_id.as_deref() == Some(class_id))
    }
}

/// Actor as supplied inline by the host, before role validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRecord {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub children: Vec<Child>,
}

impl TryFrom<ActorRecord> for Actor {
    type Error = PolicyError;

    fn try_from(rec: ActorRecord) -> Result<Self, Self::Error> {
        if rec.id.trim().is_empty() {
            return Err(PolicyError::InvalidUser("actor id must not be empty".into()));
        }
        let role: Role = rec.role.parse()?;
        Ok(Actor {
            id: rec.id,
            role,
            class_id: non_blank(rec.class_id),
            children: rec.children,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Resource {
    #[serde(rename_all = "camelCase")]
    Grade {
        student_id: String,
        teacher_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Homework { class_id: String, teacher_id: String },
    #[serde(rename_all = "camelCase")]
    Message {
        sender_id: String,
        recipient_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ClassRoster { class_id: String },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Grade { .. } => ResourceKind::Grade,
            Resource::Homework { .. } => ResourceKind::Homework,
            Resource::Message { .. } => ResourceKind::Message,
            Resource::ClassRoster { .. } => ResourceKind::ClassRoster,
        }
    }
}

/// A resource row as the host stores it. Unrelated columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(default)]
    pub kind: Option<ResourceKind>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

impl ResourceRecord {
    /// Builds the typed resource, taking `kind` from the record or, when the
    /// record has none, from `fallback`.
    pub fn into_resource(self, fallback: Option<ResourceKind>) -> Result<Resource, PolicyError> {
        let Some(kind) = self.kind.or(fallback) else {
            return Err(PolicyError::InvalidResource {
                kind: "unknown",
                missing: "kind",
            });
        };
        let label = kind.as_str();
        match kind {
            ResourceKind::Grade => Ok(Resource::Grade {
                student_id: required(self.student_id, label, "studentId")?,
                teacher_id: required(self.teacher_id, label, "teacherId")?,
            }),
            ResourceKind::Homework => Ok(Resource::Homework {
                class_id: required(self.class_id, label, "classId")?,
                teacher_id: required(self.teacher_id, label, "teacherId")?,
            }),
            ResourceKind::Message => Ok(Resource::Message {
                sender_id: required(self.sender_id, label, "senderId")?,
                recipient_id: required(self.recipient_id, label, "recipientId")?,
            }),
            ResourceKind::ClassRoster => Ok(Resource::ClassRoster {
                class_id: required(self.class_id, label, "classId")?,
            }),
        }
    }
}

impl TryFrom<ResourceRecord> for Resource {
    type Error = PolicyError;

    fn try_from(rec: ResourceRecord) -> Result<Self, Self::Error> {
        rec.into_resource(None)
    }
}

fn required(
    value: Option<String>,
    kind: &'static str,
    missing: &'static str,
) -> Result<String, PolicyError> {
    non_blank(value).ok_or(PolicyError::InvalidResource { kind, missing })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A message row handed to the conversation grouper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub recipient_id: String,
    #[serde(default)]
    pub content: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    pub fn as_resource(&self) -> Resource {
        Resource::Message {
            sender_id: self.sender_id.clone(),
            recipient_id: self.recipient_id.clone(),
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.recipient_id == user_id
    }
}
