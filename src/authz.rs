use uuid::Uuid;

use crate::error::ApiError;

/// A row that carries its owner's user id.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// Ownership gate for existence-sensitive routes: an absent row and a row
/// owned by someone else both come back as the same 404, so resource ids
/// cannot be enumerated across users.
pub fn require_owned<T: Owned>(
    resource: Option<T>,
    principal_id: Uuid,
    what: &'static str,
) -> Result<T, ApiError> {
    match resource {
        Some(r) if r.owner_id() == principal_id => Ok(r),
        _ => Err(ApiError::NotFound(what)),
    }
}

/// Ownership gate for identity-keyed routes (`/users/:id`): the caller already
/// knows the id it asked for, so a mismatch is a plain 403.
pub fn require_self(path_user_id: Uuid, principal_id: Uuid) -> Result<(), ApiError> {
    if path_user_id == principal_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        user_id: Uuid,
    }

    impl Owned for Row {
        fn owner_id(&self) -> Uuid {
            self.user_id
        }
    }

    #[test]
    fn owner_passes_through() {
        let me = Uuid::new_v4();
        let row = require_owned(Some(Row { user_id: me }), me, "Story").unwrap();
        assert_eq!(row.user_id, me);
    }

    #[test]
    fn absent_and_not_owned_are_the_same_not_found() {
        let me = Uuid::new_v4();
        let theirs = Row {
            user_id: Uuid::new_v4(),
        };

        let absent = require_owned::<Row>(None, me, "Story").unwrap_err();
        let masked = require_owned(Some(theirs), me, "Story").unwrap_err();

        assert!(matches!(absent, ApiError::NotFound("Story")));
        assert!(matches!(masked, ApiError::NotFound("Story")));
    }

    #[test]
    fn self_check_rejects_other_users_with_forbidden() {
        let me = Uuid::new_v4();
        assert!(require_self(me, me).is_ok());
        assert!(matches!(
            require_self(Uuid::new_v4(), me),
            Err(ApiError::Forbidden)
        ));
    }
}
