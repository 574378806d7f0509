use crate::{
    error::{Error, Result},
    output::Output,
    PolicyId,
};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

/// Multi-asset bag of tokens held by (or paid to) an output
#[serde_with::serde_as]
#[derive(Clone, PartialEq, Debug, Eq, Deserialize, Serialize, Default)]
pub struct Values {
    #[serde_as(as = "HashMap<serde_with::json::JsonString, _>")]
    values: HashMap<PolicyId, u64>,
}

/// Native tokens grouped by policy id then asset name, in ledger order
pub type MultiAsset = BTreeMap<Vec<u8>, BTreeMap<Vec<u8>, u64>>;

impl Values {
    /// Construct a `Values` from a list of `Output`s
    pub fn from_outputs<D>(outputs: &[Output<D>]) -> Result<Self> {
        outputs.iter().try_fold(Values::default(), |mut acc, output| {
            acc.add_values(output.values())?;
            Ok(acc)
        })
    }

    /// Remove `other` from `self`. Fails if any token in `other` isn't covered.
    pub fn try_subtract(&self, other: &Values) -> Result<Values> {
        let mut remainders = Vec::new();
        let mut mine_cloned = self.values.clone();
        for (policy, amt) in other.as_iter() {
            let available = mine_cloned.remove(policy).unwrap_or_default();
            match amt.cmp(&available) {
                Ordering::Less => remainders.push((policy.clone(), available - amt)),
                Ordering::Greater => return Err(Error::InsufficientAmountOf(policy.to_owned())),
                Ordering::Equal => {}
            }
        }
        remainders.extend(mine_cloned);
        let values = remainders.into_iter().collect();
        Ok(Values { values })
    }

    /// Add one value to the `self`. Fails if the total no longer fits a `u64`.
    pub fn add_one_value(&mut self, policy: &PolicyId, amount: u64) -> Result<()> {
        if amount > 0 {
            add_to_map(&mut self.values, policy.clone(), amount)?;
        }
        Ok(())
    }

    /// Builder style setter: `self` holding exactly `amount` of `policy`
    pub fn with(mut self, policy: &PolicyId, amount: u64) -> Self {
        if amount > 0 {
            self.values.insert(policy.clone(), amount);
        } else {
            self.values.remove(policy);
        }
        self
    }

    /// Add a `Values` to the `self`. Left untouched if any total overflows.
    pub fn add_values(&mut self, values: &Values) -> Result<()> {
        let mut sum = self.values.clone();
        for (policy, amt) in values.as_iter() {
            if *amt > 0 {
                add_to_map(&mut sum, policy.clone(), *amt)?;
            }
        }
        self.values = sum;
        Ok(())
    }

    /// Convert the `Values` to an iterator of [`PolicyId`]s and amounts
    pub fn as_iter(&self) -> std::collections::hash_map::Iter<'_, PolicyId, u64> {
        self.values.iter()
    }

    /// Get the amount for a given [`PolicyId`]
    pub fn get(&self, policy: &PolicyId) -> Option<u64> {
        self.values.get(policy).copied()
    }

    /// Lovelace held, zero if none
    pub fn lovelace(&self) -> u64 {
        self.get(&PolicyId::Lovelace).unwrap_or_default()
    }

    /// Remove all values for a given [`PolicyId`] and return the amount
    pub fn take(&mut self, policy: &PolicyId) -> Option<u64> {
        self.values.remove(policy)
    }

    /// True if nothing but Lovelace is held
    pub fn is_pure_ada(&self) -> bool {
        self.values.keys().all(|policy| policy == &PolicyId::Lovelace)
    }

    /// Native tokens with decoded policy ids and asset names
    pub fn multi_asset(&self) -> std::result::Result<MultiAsset, hex::FromHexError> {
        let mut assets = MultiAsset::new();
        for (policy, amount) in self.as_iter() {
            if let PolicyId::NativeToken(id, _) = policy {
                let id = hex::decode(id)?;
                let name = policy.asset_name_bytes()?;
                *assets.entry(id).or_default().entry(name).or_default() += amount;
            }
        }
        Ok(assets)
    }

    /// Get the number of [`PolicyId`]s in the `Values`
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the `Values` is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn add_to_map(
    h_map: &mut HashMap<PolicyId, u64>,
    policy: PolicyId,
    amount: u64,
) -> Result<()> {
    let total = h_map.entry(policy.clone()).or_default();
    *total = total
        .checked_add(amount)
        .ok_or(Error::ValueOverflow(policy))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> PolicyId {
        PolicyId::native_token_named(&"00".repeat(28), b"SHIP0")
    }

    #[test]
    fn subtract_leaves_remainder_of_both_sides() {
        let mine = Values::default()
            .with(&PolicyId::Lovelace, 10)
            .with(&ship(), 1);
        let other = Values::default().with(&PolicyId::Lovelace, 4);

        let rest = mine.try_subtract(&other).unwrap();

        assert_eq!(rest.lovelace(), 6);
        assert_eq!(rest.get(&ship()), Some(1));
    }

    #[test]
    fn subtract_fails_for_missing_token() {
        let mine = Values::default().with(&PolicyId::Lovelace, 10);
        let other = Values::default().with(&ship(), 1);

        let err = mine.try_subtract(&other).unwrap_err();

        assert!(matches!(err, Error::InsufficientAmountOf(policy) if policy == ship()));
    }

    #[test]
    fn exact_subtraction_drops_the_entry() {
        let mine = Values::default().with(&ship(), 1);

        let rest = mine.try_subtract(&mine).unwrap();

        assert!(rest.is_empty());
    }

    #[test]
    fn adding_past_u64_max_is_an_error() {
        let mut mine = Values::default().with(&PolicyId::Lovelace, u64::MAX - 1);
        let other = Values::default()
            .with(&PolicyId::Lovelace, 2)
            .with(&ship(), 1);

        let err = mine.add_values(&other).unwrap_err();

        assert!(matches!(err, Error::ValueOverflow(PolicyId::Lovelace)));
        assert_eq!(mine.lovelace(), u64::MAX - 1);
        assert_eq!(mine.get(&ship()), None);
        assert!(mine.add_one_value(&PolicyId::Lovelace, 1).is_ok());
        assert_eq!(mine.lovelace(), u64::MAX);
    }

    #[test]
    fn with_sets_the_amount() {
        let values = Values::default()
            .with(&PolicyId::Lovelace, 5)
            .with(&PolicyId::Lovelace, 3);

        assert_eq!(values.lovelace(), 3);
    }

    #[test]
    fn multi_asset_groups_by_policy() {
        let values = Values::default()
            .with(&PolicyId::Lovelace, 2_000_000)
            .with(&ship(), 1)
            .with(&PolicyId::native_token_named(&"00".repeat(28), b"PILOT0"), 1);

        let assets = values.multi_asset().unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[&vec![0; 28]].len(), 2);
        assert!(!values.is_pure_ada());
    }
}
