use crate::models::{HouseholdUser, Role};
use thiserror::Error;
use uuid::Uuid;

/// Households are meant for 2-8 people
pub const MIN_MEMBERS: usize = 2;
pub const MAX_MEMBERS: usize = 8;
pub const MAX_OWNERS: usize = 2;

/// Why a membership change was refused. No state is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("Only household owners can {0}")]
    NotOwner(&'static str),

    #[error("Maximum 8 users per household")]
    MemberLimit,

    #[error("Maximum 2 owners per household")]
    OwnerLimit,

    #[error("You are the only owner. Promote another member to owner before demoting yourself.")]
    SoleOwner,

    #[error("You cannot remove yourself from the household")]
    RemoveSelf,

    #[error("This email is already a member of your household")]
    DuplicateEmail,

    #[error("Member not found: {0}")]
    UnknownMember(Uuid),
}

impl MembershipError {
    /// True for refusals caused by the actor's role rather than household state
    pub fn is_authorization(&self) -> bool {
        matches!(self, MembershipError::NotOwner(_))
    }
}

/// Outcome of a permitted role change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Unchanged,
    Changed { from: Role, to: Role },
}

pub fn owner_count(members: &[HouseholdUser]) -> usize {
    members.iter().filter(|m| m.is_owner()).count()
}

fn find(members: &[HouseholdUser], id: Uuid) -> Result<&HouseholdUser, MembershipError> {
    members
        .iter()
        .find(|m| m.id == id)
        .ok_or(MembershipError::UnknownMember(id))
}

fn require_owner(actor: &HouseholdUser, action: &'static str) -> Result<(), MembershipError> {
    if actor.is_owner() {
        Ok(())
    } else {
        Err(MembershipError::NotOwner(action))
    }
}

/// Check an invitation of `email` (already normalized) with `role`
pub fn check_invite(
    members: &[HouseholdUser],
    actor_id: Uuid,
    email: &str,
    role: Role,
) -> Result<(), MembershipError> {
    let actor = find(members, actor_id)?;
    require_owner(actor, "invite users")?;

    if members.len() >= MAX_MEMBERS {
        return Err(MembershipError::MemberLimit);
    }

    if role == Role::Owner && owner_count(members) >= MAX_OWNERS {
        return Err(MembershipError::OwnerLimit);
    }

    if members.iter().any(|m| m.email.eq_ignore_ascii_case(email)) {
        return Err(MembershipError::DuplicateEmail);
    }

    Ok(())
}

pub fn check_removal(
    members: &[HouseholdUser],
    actor_id: Uuid,
    target_id: Uuid,
) -> Result<(), MembershipError> {
    let actor = find(members, actor_id)?;
    find(members, target_id)?;

    if actor_id == target_id {
        return Err(MembershipError::RemoveSelf);
    }

    require_owner(actor, "remove members")
}

pub fn check_role_change(
    members: &[HouseholdUser],
    actor_id: Uuid,
    target_id: Uuid,
    new_role: Role,
) -> Result<RoleChange, MembershipError> {
    let actor = find(members, actor_id)?;
    let target = find(members, target_id)?;
    require_owner(actor, "change member roles")?;

    if target.role == new_role {
        return Ok(RoleChange::Unchanged);
    }

    let owners = owner_count(members);
    match new_role {
        Role::Owner if owners >= MAX_OWNERS => Err(MembershipError::OwnerLimit),
        Role::Member if target.is_owner() && owners <= 1 => Err(MembershipError::SoleOwner),
        _ => Ok(RoleChange::Changed {
            from: target.role,
            to: new_role,
        }),
    }
}
