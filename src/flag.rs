use crate::types::{FlagDiacriticOperation, FlagDiacriticOperator, SymbolNumber, ValueNumber};

/// Mutable flag-diacritic register state: one `i16` slot per distinct feature.
/// `0` means unset; a positive value `v` means "set to `v`"; a negative value
/// means "negatively set" (the forbidden value is its negation).
#[derive(Debug, Clone)]
pub struct FlagState {
    values: Vec<ValueNumber>,
}

impl FlagState {
    pub fn new(size: SymbolNumber) -> FlagState {
        FlagState { values: vec![0; size as usize] }
    }

    #[inline]
    fn get(&self, feature: SymbolNumber) -> ValueNumber {
        self.values[feature as usize]
    }
}

/// Attempts to apply a flag-diacritic operation to `state`, returning the
/// resulting state on success (the caller pushes it and pops on backtrack) or
/// `None` if the operation disallows the current path.
///
/// Semantics, per operator (`s` = current value of `state[feature]`, `val` =
/// the operation's value):
/// - `P`: always succeeds, `s' = val`.
/// - `N`: always succeeds, `s' = -val`.
/// - `R`, `val != 0`: succeeds iff `s == val`, state unchanged.
/// - `R`, `val == 0`: succeeds iff `s != 0`, state unchanged.
/// - `D`, `val != 0`: succeeds iff `s != val`, state unchanged.
/// - `D`, `val == 0`: succeeds iff `s == 0`, state unchanged.
/// - `C`: always succeeds, `s' = 0`.
/// - `U`: succeeds iff `s == 0 || s == val || (s < 0 && -s != val)`, `s' = val`.
pub fn push_state(state: &FlagState, op: &FlagDiacriticOperation) -> Option<FlagState> {
    let current = state.get(op.feature);
    let val = op.value;

    use FlagDiacriticOperator::*;
    match op.operation {
        PositiveSet => Some(set(state, op.feature, val)),
        NegativeSet => Some(set(state, op.feature, -val)),
        Require => {
            let ok = if val != 0 { current == val } else { current != 0 };
            if ok { Some(state.clone()) } else { None }
        }
        Disallow => {
            let ok = if val != 0 { current != val } else { current == 0 };
            if ok { Some(state.clone()) } else { None }
        }
        Clear => Some(set(state, op.feature, 0)),
        Unify => {
            let ok = current == 0 || current == val || (current < 0 && -current != val);
            if ok { Some(set(state, op.feature, val)) } else { None }
        }
    }
}

fn set(state: &FlagState, feature: SymbolNumber, value: ValueNumber) -> FlagState {
    let mut next = state.clone();
    next.values[feature as usize] = value;
    next
}
