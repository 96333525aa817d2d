use types::LynchModifier;

/// Votes needed to lynch with `living` players alive and no modifier:
/// a majority, with ties resolved in favour of the lynch.
pub fn base_threshold(living: usize) -> i64 {
    (living as i64 + 2) / 2
}

/// Votes needed to lynch a target carrying `modifier`. Never less than one.
pub fn threshold(living: usize, modifier: LynchModifier) -> i64 {
    (base_threshold(living) - modifier.value()).max(1)
}
