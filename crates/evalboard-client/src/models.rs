#![forbid(unsafe_code)]

//! Wire records. Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkspace {
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WorkspaceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The signed-in user, persisted under `auth_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl User {
    /// Name if set, otherwise the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn workspace_uses_camel_case() {
        let ws: Workspace = serde_json::from_str(
            r#"{"id":"w1","tenantId":"t1","name":"Prod","slug":"prod"}"#,
        )
        .expect("decode");
        assert_eq!(ws.tenant_id, "t1");
        assert_eq!(ws.description, None);

        let body = serde_json::to_value(NewWorkspace {
            tenant_id: "t1".into(),
            name: "Prod".into(),
            slug: "prod".into(),
            description: None,
        })
        .expect("encode");
        assert_eq!(
            body,
            serde_json::json!({"tenantId": "t1", "name": "Prod", "slug": "prod"})
        );
    }

    #[test]
    fn tenant_tolerates_extra_fields() {
        let tenant: Tenant = serde_json::from_str(
            r#"{"id":"t1","name":"Acme Corp","slug":"acme-corp","createdAt":"2024-01-01","plan":"pro"}"#,
        )
        .expect("decode");
        assert_eq!(tenant.slug, "acme-corp");
        assert_eq!(tenant.created_at.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let body = serde_json::to_value(WorkspaceUpdate::default()).expect("encode");
        assert_eq!(body, serde_json::json!({}));
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = User {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: None,
            tenant_id: None,
        };
        assert_eq!(user.display_name(), "ada@example.com");
    }
}
