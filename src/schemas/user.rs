use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{SocialLink, User};
use crate::db::types::{AccountStatus, UserRole};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) google_id: Option<String>,
    pub(crate) name: String,
    pub(crate) phone_number: Option<String>,
    pub(crate) birth_date: Option<String>,
    pub(crate) picture: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) status: AccountStatus,
    pub(crate) social_links: Vec<SocialLink>,
    pub(crate) tasks: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            google_id: user.google_id,
            name: user.name,
            phone_number: user.phone_number,
            birth_date: user.birth_date.map(format_date),
            picture: user.picture,
            role: user.role,
            status: user.status,
            social_links: user.social_links.0,
            tasks: user.task_ids,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }

    pub(crate) fn directory_entry(user: User) -> Self {
        Self { google_id: None, ..Self::from_db(user) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UserPayload {
    pub(crate) user: UserResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserListPayload {
    pub(crate) users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PicturePayload {
    pub(crate) user: UserResponse,
    pub(crate) url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserCreateRequest {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) role: Option<String>,
    #[serde(default)]
    pub(crate) picture: Option<String>,
    #[serde(default)]
    pub(crate) phone_number: Option<String>,
    #[serde(default)]
    pub(crate) birth_date: Option<String>,
}

impl UserCreateRequest {
    pub(crate) fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "email" => &mut self.email,
            "name" => &mut self.name,
            "role" => &mut self.role,
            "picture" => &mut self.picture,
            "phoneNumber" => &mut self.phone_number,
            "birthDate" => &mut self.birth_date,
            _ => return,
        };
        *slot = Some(value);
    }

    pub(crate) fn normalized(self) -> Option<NewAccount> {
        let email = non_blank(self.email)?;
        let name = non_blank(self.name)?;
        let role = non_blank(self.role)?;

        Some(NewAccount {
            email,
            name,
            role,
            picture: non_blank(self.picture),
            phone_number: non_blank(self.phone_number),
            birth_date: non_blank(self.birth_date),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub(crate) struct NewAccount {
    #[validate(email(message = "Invalid email address"))]
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) role: String,
    #[validate(url(message = "Invalid picture URL"))]
    pub(crate) picture: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) birth_date: Option<String>,
}

impl NewAccount {
    pub(crate) fn parsed_role(&self) -> Option<UserRole> {
        match self.role.to_ascii_lowercase().as_str() {
            "student" => Some(UserRole::Student),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileUpdateRequest {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) social_links: Option<Vec<SocialLink>>,
    #[serde(default, deserialize_with = "present")]
    pub(crate) phone_number: Option<Option<String>>,
    #[serde(default)]
    pub(crate) birth_date: Option<String>,
}

impl ProfileUpdateRequest {
    pub(crate) fn phone_change(&self) -> Option<Option<String>> {
        self.phone_number.as_ref().map(|value| non_blank(value.clone()))
    }
}

// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_update_distinguishes_absent_null_and_empty_phone() {
        let absent: ProfileUpdateRequest = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert_eq!(absent.phone_change(), None);

        let null: ProfileUpdateRequest =
            serde_json::from_value(json!({"phoneNumber": null})).unwrap();
        assert_eq!(null.phone_change(), Some(None));

        let empty: ProfileUpdateRequest =
            serde_json::from_value(json!({"phoneNumber": "  "})).unwrap();
        assert_eq!(empty.phone_change(), Some(None));

        let set: ProfileUpdateRequest =
            serde_json::from_value(json!({"phoneNumber": "+1 555 0100"})).unwrap();
        assert_eq!(set.phone_change(), Some(Some("+1 555 0100".to_string())));
    }

    #[test]
    fn create_request_requires_email_name_and_role() {
        let request: UserCreateRequest =
            serde_json::from_value(json!({"email": "a@example.com", "name": " "})).unwrap();
        assert!(request.normalized().is_none());

        let mut request = UserCreateRequest::default();
        request.set_field("email", " new@example.com ".into());
        request.set_field("name", "New Student".into());
        request.set_field("role", "student".into());
        request.set_field("phoneNumber", "".into());
        request.set_field("unknown", "ignored".into());

        let account = request.normalized().expect("complete");
        assert_eq!(account.email, "new@example.com");
        assert_eq!(account.phone_number, None);
        assert_eq!(account.parsed_role(), Some(UserRole::Student));
    }

    #[test]
    fn new_account_rejects_malformed_email() {
        let account = NewAccount {
            email: "not-an-email".into(),
            name: "X".into(),
            role: "student".into(),
            picture: None,
            phone_number: None,
            birth_date: None,
        };
        assert!(account.validate().is_err());
        assert!(NewAccount { email: "ok@example.com".into(), ..account }.validate().is_ok());
    }
}
