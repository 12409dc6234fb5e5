//! Net balance types
//!
//! Balances are derived views rebuilt on every aggregation call. They are
//! never stored as input for a later aggregation.

use super::money::Cents;
use super::obligation::Participant;

/// A participant's aggregate position after netting all pending obligations
///
/// `net > 0` means the participant is owed money overall, `net < 0` means
/// the participant owes money overall.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub participant: Participant,
    pub net: Cents,
}

impl Balance {
    pub fn new(participant: Participant, net: Cents) -> Self {
        Balance { participant, net }
    }

    pub fn is_creditor(&self) -> bool {
        self.net.is_positive()
    }

    pub fn is_debtor(&self) -> bool {
        self.net.is_negative()
    }
}

/// Credit and debit totals of a balance set
///
/// The set is conservative when both sides are equal. Returns `None` if a
/// total overflows.
pub fn balance_totals(balances: &[Balance]) -> Option<(Cents, Cents)> {
    let mut credits = Cents::ZERO;
    let mut debits = Cents::ZERO;

    for balance in balances {
        if balance.net.is_positive() {
            credits = credits.checked_add(balance.net)?;
        } else {
            debits = debits.checked_sub(balance.net)?;
        }
    }

    Some((credits, debits))
}
