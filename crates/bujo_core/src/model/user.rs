//! User and preference models.
//!
//! Credentials and sessions live outside core; a user here is only the
//! identity that owns scopes and receives shares.

use super::scope::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registered journal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Lower-cased, unique.
    pub email: String,
    /// Epoch ms.
    pub created_at: i64,
}

/// Opaque per-user settings object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserPreferences(pub Map<String, Value>);

impl UserPreferences {
    /// Applies merge-patch semantics: keys in `patch` overwrite, `null`
    /// removes the key.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if value.is_null() {
                self.0.remove(key);
            } else {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::UserPreferences;
    use serde_json::json;

    #[test]
    fn merge_overwrites_and_removes_null_keys() {
        let mut prefs = UserPreferences::default();
        prefs.merge(json!({"theme": "dark", "week_start": "monday"}).as_object().unwrap());
        prefs.merge(json!({"theme": "light", "week_start": null}).as_object().unwrap());

        assert_eq!(prefs.get("theme"), Some(&json!("light")));
        assert_eq!(prefs.get("week_start"), None);
        assert_eq!(prefs.0.len(), 1);
    }
}
