//! Role, gate and capability semantics.

use taskdesk::models::user::{Gate, Role};

#[test]
fn role_tags_round_trip() {
    for (tag, role) in [
        ("admin", Role::Admin),
        ("it_staff", Role::ItStaff),
        ("user", Role::User),
    ] {
        assert_eq!(Role::try_from(tag).unwrap(), role);
        assert_eq!(role.as_str(), tag);
    }
}

#[test]
fn unknown_and_miscased_role_tags_are_rejected() {
    assert!(Role::try_from("superadmin").is_err());
    assert!(Role::try_from("Admin").is_err());
    assert!(Role::try_from("IT_STAFF").is_err());
    assert!(Role::try_from("").is_err());
}

#[test]
fn gates_nest_upward() {
    // Every role passes the anonymous and user gates.
    for role in [Role::Admin, Role::ItStaff, Role::User] {
        assert!(role.meets(Gate::Anonymous));
        assert!(role.meets(Gate::UserOrHigher));
    }

    // Staff gate excludes plain users.
    assert!(Role::Admin.meets(Gate::ItStaffOrHigher));
    assert!(Role::ItStaff.meets(Gate::ItStaffOrHigher));
    assert!(!Role::User.meets(Gate::ItStaffOrHigher));

    // Admin gate excludes everyone else.
    assert!(Role::Admin.meets(Gate::AdminOnly));
    assert!(!Role::ItStaff.meets(Gate::AdminOnly));
    assert!(!Role::User.meets(Gate::AdminOnly));
}
