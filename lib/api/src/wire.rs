//! Request and response bodies of the REST API.

use ghars_core::{ClassId, UserId};
use ghars_session::{AdminProfile, Claims, Identity, Profile, Role, StudentProfile};
use serde::{Deserialize, Serialize};

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Form body of the token endpoint.
///
/// The backend reads the password from `username`; `password` carries it too
/// for servers that follow the standard password grant.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> PasswordForm<'a> {
    pub(crate) fn new(password: &'a str) -> Self {
        Self {
            username: password,
            password,
        }
    }
}

/// A student record as returned by the student endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: UserId,
    pub name: String,
    pub points: i64,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub class_name: Option<String>,
}

/// Body of the profile endpoint.
///
/// Students get their record; admins get only their id (and the stored
/// password, which is never read). Neither carries the role or the admin's
/// capability flags: those live in the credential the call was made with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileRecord {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

impl ProfileRecord {
    /// Builds the identity from this record and the claims of the credential
    /// that fetched it.
    #[must_use]
    pub fn into_identity(self, claims: &Claims) -> Identity {
        let profile = match claims.role() {
            Role::Student => Profile::Student(StudentProfile {
                points: self.points.unwrap_or_default(),
                class_id: self.class_id,
                class_name: self.class_name,
                profile_pic_url: self.profile_pic_url,
            }),
            Role::Admin => Profile::Admin(AdminProfile {
                capabilities: claims.capabilities(),
                profile_pic_url: self.profile_pic_url,
            }),
        };
        Identity::with_profile(self.id, self.name.unwrap_or_default(), profile)
    }
}

/// Body of the add-points call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PointsAward {
    pub points: i64,
}

/// Extracts the human-readable detail from an error body.
///
/// The backend answers `{"detail": "..."}`, or a list of validation errors
/// under `detail`. Anything else is returned as-is.
pub(crate) fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
