//! Directory entities returned by Microsoft Graph.
//!
//! Only the fields the application displays are modelled; unknown fields
//! are ignored on deserialization.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const ODATA_TYPE_GROUP: &str = "#microsoft.graph.group";
pub const ODATA_TYPE_DIRECTORY_ROLE: &str = "#microsoft.graph.directoryRole";
pub const ODATA_TYPE_USER: &str = "#microsoft.graph.user";

/// OData collection response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ODataCollection<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// OData error envelope (`{"error": {"code": ..., "message": ...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail: Option<String>,
    pub job_title: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub mail: Option<String>,
    #[serde(default)]
    pub group_types: Vec<String>,
    pub visibility: Option<String>,
    pub mail_enabled: Option<bool>,
    pub security_enabled: Option<bool>,
}

impl Group {
    /// Microsoft 365 groups carry the `Unified` group type.
    pub fn is_microsoft_365(&self) -> bool {
        self.group_types.iter().any(|t| t == "Unified")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRole {
    pub id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Member of a mixed directory collection such as `/me/memberOf`.
///
/// The variant is chosen from the `@odata.type` annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryObject {
    Group(Group),
    DirectoryRole(DirectoryRole),
    Other {
        id: Option<String>,
        odata_type: Option<String>,
    },
}

impl DirectoryObject {
    pub fn id(&self) -> Option<&str> {
        match self {
            DirectoryObject::Group(group) => Some(&group.id),
            DirectoryObject::DirectoryRole(role) => Some(&role.id),
            DirectoryObject::Other { id, .. } => id.as_deref(),
        }
    }

    pub fn into_group(self) -> Option<Group> {
        match self {
            DirectoryObject::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for DirectoryObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let odata_type = value
            .get("@odata.type")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        match odata_type.as_deref() {
            Some(ODATA_TYPE_GROUP) => serde_json::from_value(value)
                .map(DirectoryObject::Group)
                .map_err(de::Error::custom),
            Some(ODATA_TYPE_DIRECTORY_ROLE) => serde_json::from_value(value)
                .map(DirectoryObject::DirectoryRole)
                .map_err(de::Error::custom),
            _ => Ok(DirectoryObject::Other {
                id: value.get("id").and_then(|v| v.as_str()).map(str::to_string),
                odata_type,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_of_page_parsing() {
        let json = r##"{
            "value": [
                {"@odata.type": "#microsoft.graph.group", "id": "g1", "displayName": "Engineering", "groupTypes": ["Unified"]},
                {"@odata.type": "#microsoft.graph.directoryRole", "id": "r1", "displayName": "Global Reader"},
                {"@odata.type": "#microsoft.graph.administrativeUnit", "id": "au1"}
            ],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/memberOf?$skiptoken=abc"
        }"##;

        let page: ODataCollection<DirectoryObject> = serde_json::from_str(json).unwrap();

        assert_eq!(page.value.len(), 3);
        assert!(matches!(&page.value[0], DirectoryObject::Group(g) if g.is_microsoft_365()));
        assert!(matches!(&page.value[1], DirectoryObject::DirectoryRole(r) if r.id == "r1"));
        assert_eq!(
            page.value[2],
            DirectoryObject::Other {
                id: Some("au1".to_string()),
                odata_type: Some("#microsoft.graph.administrativeUnit".to_string()),
            }
        );
        assert!(page.next_link.is_some());
    }

    #[test]
    fn test_user_ignores_unknown_fields() {
        let json = r#"{
            "id": "u1",
            "displayName": "Adele Vance",
            "userPrincipalName": "adele@contoso.com",
            "businessPhones": ["+1 425 555 0109"]
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Adele Vance"));
        assert!(user.mail.is_none());
    }

    #[test]
    fn test_odata_error_parsing() {
        let json = r#"{"error": {"code": "ImageNotFound", "message": "Exception of type 'Microsoft.Fast.Profile.Core.Exception.ImageNotFoundException' was thrown."}}"#;
        let error: ODataError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.code, "ImageNotFound");
    }
}
