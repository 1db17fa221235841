//! Session data model.
//!
//! A `Session` is either empty or a complete `{accessToken, user}` pair.
//! There is no way to build a session with only one half set.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Authenticated jobseeker profile, as returned by the server.
///
/// Modelled fields are filled only when the server sent a string. Any other
/// value stays in `extra` untouched, so the stored user round-trips exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    /// Server fields this client does not model, or sent with another type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for User {
    fn from(mut fields: Map<String, Value>) -> Self {
        let id = take_string(&mut fields, "_id");
        let name = take_string(&mut fields, "name");
        let email = take_string(&mut fields, "email");
        let role = take_string(&mut fields, "role");
        let avatar = take_string(&mut fields, "avatar");
        let cv = take_string(&mut fields, "cv");
        let dob = take_string(&mut fields, "dob");
        let phone = take_string(&mut fields, "phone");
        let address = take_string(&mut fields, "address");
        let about = take_string(&mut fields, "about");
        Self {
            id,
            name,
            email,
            role,
            avatar,
            cv,
            dob,
            phone,
            address,
            about,
            extra: fields,
        }
    }
}

/// Moves `key` out of `fields` when it holds a string; drops it when null.
fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(_)) => match fields.remove(key) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        },
        Some(Value::Null) => {
            fields.remove(key);
            None
        }
        _ => None,
    }
}

impl User {
    /// Editable profile fields seeded from this user.
    pub fn profile_fields(&self) -> ProfileFields {
        ProfileFields {
            name: self.name.clone(),
            dob: self.dob.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            about: self.about.clone(),
            avatar: self.avatar.clone(),
            cv: self.cv.clone(),
            extra: Map::new(),
        }
    }
}

/// An authenticated session: access token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub access_token: String,
    pub user: User,
}

/// The current session. `Empty` means "not authenticated".
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Empty,
    Active(ActiveSession),
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        Session::Active(ActiveSession {
            access_token: access_token.into(),
            user,
        })
    }

    /// Builds a session only when both halves are present.
    pub fn from_parts(access_token: Option<String>, user: Option<User>) -> Option<Self> {
        match (access_token, user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Session::new(token, user)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Session::Empty)
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            Session::Empty => None,
            Session::Active(active) => Some(&active.access_token),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Empty => None,
            Session::Active(active) => Some(&active.user),
        }
    }
}

// Empty serializes as `{}`, matching the payload the UI layer expects.
impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Session::Empty => Map::new().serialize(serializer),
            Session::Active(active) => active.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Session {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            access_token: Option<String>,
            user: Option<User>,
        }

        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|raw| Session::from_parts(raw.access_token, raw.user))
            .unwrap_or_default())
    }
}

/// Login credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Profile fields sent on a profile update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Masks a token for display, keeping a short prefix.
pub fn mask_token(token: &str) -> String {
    if token.len() > 12 {
        let prefix: String = token.chars().take(12).collect();
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}
