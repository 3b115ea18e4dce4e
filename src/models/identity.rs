//! Composite identity of a survey response

use std::fmt;

use serde::{Deserialize, Serialize};

/// Three-part key identifying one survey response.
///
/// Ordering is lexicographic over `(household_id, census_year, respondent_line)`,
/// which is also the primary key order in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeKey {
    /// Household identifier
    pub household_id: i64,
    /// Census year of the interview
    pub census_year: i32,
    /// Line number of the respondent within the household
    pub respondent_line: i32,
}

impl CompositeKey {
    /// Create a new key
    #[must_use]
    pub const fn new(household_id: i64, census_year: i32, respondent_line: i32) -> Self {
        Self {
            household_id,
            census_year,
            respondent_line,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.household_id, self.census_year, self.respondent_line
        )
    }
}

impl From<(i64, i32, i32)> for CompositeKey {
    fn from((household_id, census_year, respondent_line): (i64, i32, i32)) -> Self {
        Self::new(household_id, census_year, respondent_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_by_household_then_year_then_line() {
        let mut keys = vec![
            CompositeKey::new(2, 2019, 1),
            CompositeKey::new(1, 2020, 1),
            CompositeKey::new(1, 2019, 2),
            CompositeKey::new(1, 2019, 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                CompositeKey::new(1, 2019, 1),
                CompositeKey::new(1, 2019, 2),
                CompositeKey::new(1, 2020, 1),
                CompositeKey::new(2, 2019, 1),
            ]
        );
    }

    #[test]
    fn equal_only_when_all_parts_match() {
        assert_eq!(CompositeKey::from((7, 2021, 3)), CompositeKey::new(7, 2021, 3));
        assert_ne!(CompositeKey::new(7, 2021, 3), CompositeKey::new(7, 2021, 4));
    }
}
