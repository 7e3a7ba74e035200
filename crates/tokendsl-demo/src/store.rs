//! In-memory user store.

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated identifier.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Fields for a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Full name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
}

/// Fields to change on an existing user. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New email.
    #[serde(default)]
    pub email: Option<String>,
    /// New age.
    #[serde(default)]
    pub age: Option<u32>,
}

/// Users in insertion order.
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<IndexMap<String, User>>,
}

impl UserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns up to `limit` users after skipping `offset`.
    pub fn list(&self, offset: usize, limit: Option<usize>) -> Vec<User> {
        let users = self.users.read();
        users
            .values()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Returns a user.
    pub fn get(&self, id: &str) -> Option<User> {
        self.users.read().get(id).cloned()
    }

    /// Stores a new user under a fresh id.
    pub fn create(&self, new: NewUser) -> User {
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: new.name,
            email: new.email,
            age: new.age,
        };
        self.users.write().insert(user.id.clone(), user.clone());
        user
    }

    /// Applies `patch`, returning the updated user.
    pub fn update(&self, id: &str, patch: UserPatch) -> Option<User> {
        let mut users = self.users.write();
        let user = users.get_mut(id)?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if patch.age.is_some() {
            user.age = patch.age;
        }
        Some(user.clone())
    }

    /// Removes a user. Returns false if it did not exist.
    pub fn delete(&self, id: &str) -> bool {
        self.users.write().shift_remove(id).is_some()
    }

    /// Returns the number of users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns true if there are no users.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            age: Some(36),
        }
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let store = UserStore::new();
        let a = store.create(ada());
        let b = store.create(ada());
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a.id), Some(a));
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let store = UserStore::new();
        let user = store.create(ada());
        let updated = store
            .update(
                &user.id,
                UserPatch {
                    name: Some("Ada L.".to_string()),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.age, Some(36));
        assert!(store.update("missing", UserPatch::default()).is_none());
    }

    #[test]
    fn test_list_pages_in_insertion_order() {
        let store = UserStore::new();
        let ids: Vec<String> = (0..5).map(|_| store.create(ada()).id).collect();

        let page: Vec<String> = store.list(1, Some(2)).into_iter().map(|u| u.id).collect();
        assert_eq!(page, ids[1..3].to_vec());
        assert_eq!(store.list(0, None).len(), 5);
        assert!(store.list(10, None).is_empty());
    }

    #[test]
    fn test_delete() {
        let store = UserStore::new();
        let user = store.create(ada());
        assert!(store.delete(&user.id));
        assert!(!store.delete(&user.id));
        assert!(store.is_empty());
    }
}
