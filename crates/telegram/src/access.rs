use {teloxide::types::User, tgrelay_common::UserId};

pub const NOT_AUTHORIZED: &str = "You are not authorized to use this command.";

/// Whether `user` may run admin commands. With no owner configured nobody can.
#[must_use]
pub fn is_owner(owner_id: Option<UserId>, user: Option<&User>) -> bool {
    match (owner_id, user) {
        (Some(owner), Some(user)) => user.id.0 == owner.0,
        _ => false,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn user(id: u64) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "is_bot": false,
            "first_name": "Alice"
        }))
        .unwrap()
    }

    #[rstest]
    #[case(Some(1001), Some(1001), true)]
    #[case(Some(1001), Some(2002), false)]
    #[case(None, Some(1001), false)]
    #[case(Some(1001), None, false)]
    fn owner_check(#[case] owner: Option<u64>, #[case] sender: Option<u64>, #[case] allowed: bool) {
        let sender = sender.map(user);
        assert_eq!(is_owner(owner.map(UserId), sender.as_ref()), allowed);
    }
}
