//! In-memory user repository.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use amg_auth::{CredentialDirectory, CredentialLookupError, Credentials, Role};
use amg_core::{
    DomainError, DomainResult, NewUser, SearchUserQuery, SearchUserResult, User, UserId,
    UserRepository, UserUpdate,
};

/// In-memory user store for tests/dev.
///
/// Emails are unique case-insensitively. Doubles as the credential
/// directory consulted at login.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::storage("user store lock poisoned")
}

fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: NewUser) -> DomainResult<User> {
        user.validate()?;

        let mut map = self.inner.write().map_err(poisoned)?;
        if map.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(DomainError::conflict("email already exists"));
        }

        let now = Utc::now();
        let record = User {
            id: UserId::new(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        map.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: &UserId) -> DomainResult<User> {
        let map = self.inner.read().map_err(poisoned)?;
        map.get(id).cloned().ok_or(DomainError::NotFound)
    }

    fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().find(|u| same_email(&u.email, email)).cloned())
    }

    fn update(&self, id: &UserId, update: UserUpdate) -> DomainResult<User> {
        update.validate()?;

        let mut map = self.inner.write().map_err(poisoned)?;
        if map
            .values()
            .any(|u| u.id != *id && same_email(&u.email, &update.email))
        {
            return Err(DomainError::conflict("email already exists"));
        }

        let user = map.get_mut(id).ok_or(DomainError::NotFound)?;
        user.first_name = update.first_name;
        user.last_name = update.last_name;
        user.email = update.email;
        user.role = update.role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn delete(&self, id: &UserId) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.remove(id).map(|_| ()).ok_or(DomainError::NotFound)
    }

    fn search(&self, query: &SearchUserQuery) -> DomainResult<SearchUserResult> {
        let map = self.inner.read().map_err(poisoned)?;

        let mut matched: Vec<User> = map.values().filter(|u| query.matches(u)).cloned().collect();
        // Newest first.
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = query.page();
        let per_page = query.per_page();
        let total_count = matched.len();
        let users = matched
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Ok(SearchUserResult {
            total_count,
            users,
            page,
            per_page,
        })
    }
}

impl CredentialDirectory for InMemoryUserRepository {
    fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, CredentialLookupError> {
        let user = self
            .find_by_email(email)
            .map_err(|e| CredentialLookupError(e.to_string()))?;

        Ok(user.map(|u| Credentials {
            subject: u.email,
            password_hash: u.password_hash,
            role: Role::new(u.role),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: &str) -> NewUser {
        NewUser {
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn create_get_delete() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("alice@example.com", "user")).unwrap();

        assert_eq!(repo.get(&user.id).unwrap().email, "alice@example.com");
        repo.delete(&user.id).unwrap();
        assert_eq!(repo.get(&user.id), Err(DomainError::NotFound));
        assert_eq!(repo.delete(&user.id), Err(DomainError::NotFound));
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice@example.com", "user")).unwrap();

        let err = repo.create(new_user("ALICE@example.com", "user")).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_cannot_steal_another_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice@example.com", "user")).unwrap();
        let bob = repo.create(new_user("bob@example.com", "user")).unwrap();

        let err = repo
            .update(
                &bob.id,
                UserUpdate {
                    first_name: "Bob".to_string(),
                    last_name: "Jones".to_string(),
                    email: "alice@example.com".to_string(),
                    role: "user".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn search_paginates() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            repo.create(new_user(&format!("user{i}@example.com"), "user")).unwrap();
        }
        repo.create(new_user("root@example.com", "admin")).unwrap();

        let page = repo
            .search(&SearchUserQuery {
                role: Some("user".to_string()),
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(page.total_count, 5);
        assert_eq!(page.users.len(), 2);
        assert_eq!(page.page, 2);
        assert!(page.users.iter().all(|u| u.role == "user"));
    }

    #[test]
    fn credentials_carry_email_and_role() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("root@example.com", "admin")).unwrap();

        let creds = repo.find_credentials("Root@Example.com").unwrap().unwrap();
        assert_eq!(creds.subject, "root@example.com");
        assert_eq!(creds.role, Role::ADMIN);
        assert!(repo.find_credentials("nobody@example.com").unwrap().is_none());
    }
}
