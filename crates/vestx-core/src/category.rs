use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VestxError;

/// Investor class with its own cumulative allocation cap.
///
/// The set is closed: wire values travel as a raw `u8` and are converted
/// with `TryFrom<u8>`, which rejects anything outside the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    AngelInvestor = 0,
    PrivateSale = 1,
    PublicSale = 2,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::AngelInvestor,
        Category::PrivateSale,
        Category::PublicSale,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Category::AngelInvestor => "angel-investor",
            Category::PrivateSale => "private-sale",
            Category::PublicSale => "public-sale",
        }
    }
}

impl TryFrom<u8> for Category {
    type Error = VestxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Category::AngelInvestor),
            1 => Ok(Category::PrivateSale),
            2 => Ok(Category::PublicSale),
            other => Err(VestxError::InvalidCategory(other)),
        }
    }
}

impl From<Category> for u8 {
    fn from(c: Category) -> u8 {
        c.as_u8()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

/// Accepts either the numeric index (`"0"`) or the kebab-case name.
impl FromStr for Category {
    type Err = VestxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<u8>() {
            return Category::try_from(n);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| VestxError::InvalidConfig(format!("unknown category name: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_table_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.as_u8() as usize, i);
            assert_eq!(Category::try_from(i as u8).unwrap(), *c);
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert_eq!(Category::try_from(3), Err(VestxError::InvalidCategory(3)));
        assert_eq!(Category::try_from(255), Err(VestxError::InvalidCategory(255)));
    }

    #[test]
    fn parses_names_and_indices() {
        assert_eq!("private-sale".parse::<Category>().unwrap(), Category::PrivateSale);
        assert_eq!("2".parse::<Category>().unwrap(), Category::PublicSale);
        assert!(matches!("7".parse::<Category>(), Err(VestxError::InvalidCategory(7))));
        assert!("seed-round".parse::<Category>().is_err());
    }
}
