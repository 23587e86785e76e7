//! Package details entered on the package form before any items are picked.

use crate::{
    core::money::{PACKAGING_FEE, round2},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name, optional budget and optional referral code of the package being curated.
///
/// Fields are private so a value can only be built through [`PackageDetails::new`].
/// Deserializing goes through the same checks, so a stored snapshot cannot carry a
/// budget below the packaging fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredPackage")]
pub struct PackageDetails {
    name: String,
    budget: Option<Decimal>,
    referral_code: Option<String>,
}

/// Unvalidated package fields as they appear in local storage.
#[derive(Deserialize)]
struct StoredPackage {
    name: String,
    budget: Option<Decimal>,
    referral_code: Option<String>,
}

impl TryFrom<StoredPackage> for PackageDetails {
    type Error = Error;

    fn try_from(stored: StoredPackage) -> Result<Self> {
        Self::new(stored.name, stored.budget, stored.referral_code)
    }
}

impl PackageDetails {
    /// Validates the package form.
    ///
    /// Blank referral codes are treated as absent.
    ///
    /// # Errors
    /// - `Error::Validation` if the name is empty or whitespace-only
    /// - `Error::BudgetBelowFee` if a budget is given that cannot cover the packaging fee
    pub fn new(
        name: impl Into<String>,
        budget: Option<Decimal>,
        referral_code: Option<String>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Package name is required"));
        }

        let budget = budget.map(round2);
        if let Some(budget) = budget
            && budget < PACKAGING_FEE
        {
            return Err(Error::BudgetBelowFee {
                budget,
                fee: PACKAGING_FEE,
            });
        }

        let referral_code = referral_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        Ok(Self {
            name,
            budget,
            referral_code,
        })
    }

    /// Package used for curated box orders, which skip the package form.
    #[must_use]
    pub fn curated_box(date: NaiveDate) -> Self {
        Self {
            name: format!("Curated Box - {}", date.format("%-m/%-d/%Y")),
            budget: None,
            referral_code: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn budget(&self) -> Option<Decimal> {
        self.budget
    }

    #[must_use]
    pub fn referral_code(&self) -> Option<&str> {
        self.referral_code.as_deref()
    }

    /// Budget left for items once the packaging fee is set aside.
    #[must_use]
    pub fn effective_budget(&self) -> Option<Decimal> {
        self.budget.map(|budget| budget - PACKAGING_FEE)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_effective_budget_subtracts_fee() {
        let package = PackageDetails::new("Birthday", Some(Decimal::new(15_000, 0)), None).unwrap();
        assert_eq!(package.effective_budget(), Some(Decimal::new(5_000, 0)));

        let unbudgeted = PackageDetails::new("Birthday", None, None).unwrap();
        assert_eq!(unbudgeted.effective_budget(), None);
    }

    #[test]
    fn test_budget_equal_to_fee_is_allowed() {
        let package = PackageDetails::new("Tiny", Some(PACKAGING_FEE), None).unwrap();
        assert_eq!(package.effective_budget(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_rejects_budget_below_fee() {
        let result = PackageDetails::new("Birthday", Some(Decimal::new(9_999, 0)), None);
        assert!(matches!(result, Err(Error::BudgetBelowFee { .. })));
    }

    #[test]
    fn test_rejects_blank_name() {
        assert!(matches!(
            PackageDetails::new("   ", None, None),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_trims_name_and_referral_code() {
        let package =
            PackageDetails::new("  Anniversary ", None, Some(" ADA10 ".to_string())).unwrap();
        assert_eq!(package.name(), "Anniversary");
        assert_eq!(package.referral_code(), Some("ADA10"));

        let package = PackageDetails::new("Anniversary", None, Some("  ".to_string())).unwrap();
        assert_eq!(package.referral_code(), None);
    }

    #[test]
    fn test_stored_package_is_validated() {
        let package = PackageDetails::new("Birthday", Some(Decimal::new(15_000, 0)), None).unwrap();
        let raw = serde_json::to_string(&package).unwrap();
        assert_eq!(serde_json::from_str::<PackageDetails>(&raw).unwrap(), package);

        let curated = PackageDetails::curated_box(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        let raw = serde_json::to_string(&curated).unwrap();
        assert_eq!(serde_json::from_str::<PackageDetails>(&raw).unwrap(), curated);

        let below_fee = r#"{"name":"Birthday","budget":"500","referral_code":null}"#;
        assert!(serde_json::from_str::<PackageDetails>(below_fee).is_err());
        let blank = r#"{"name":"  ","budget":null,"referral_code":null}"#;
        assert!(serde_json::from_str::<PackageDetails>(blank).is_err());
    }

    #[test]
    fn test_curated_box_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let package = PackageDetails::curated_box(date);
        assert_eq!(package.name(), "Curated Box - 3/7/2026");
        assert_eq!(package.budget(), None);
    }
}
