use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnRelations,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnRelations,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ],
    ),
];

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum ActionType {
    CreateRecipes,

    /// Favorites, shopping cart and subscriptions of the caller.
    ManageOwnRelations,
    ManageOwnRecipes,

    ManageAllRecipes,
    /// Ingredients, tags and the admin registry.
    ManageCatalog,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        ACTION_TABLE
            .iter()
            .find(|(role, _)| *role == session.role)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn users_manage_only_their_own_things() {
        let user = session(UserRole::User);

        assert!(ActionType::CreateRecipes.authenticate(&user));
        assert!(ActionType::ManageOwnRelations.authenticate(&user));
        assert!(!ActionType::ManageAllRecipes.authenticate(&user));
        assert!(!ActionType::ManageCatalog.authenticate(&user));
    }

    #[test]
    fn admins_can_do_everything() {
        let admin = session(UserRole::Admin);

        for action in [
            ActionType::CreateRecipes,
            ActionType::ManageOwnRelations,
            ActionType::ManageOwnRecipes,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ] {
            assert!(action.authenticate(&admin), "{action:?}");
        }
    }

    #[test]
    fn rejected_action_maps_to_forbidden() {
        let err = session(UserRole::User)
            .authenticate(ActionType::ManageCatalog)
            .unwrap_err();

        assert_eq!(err.code, 403);
    }
}
