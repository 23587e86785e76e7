//! Order summary text and the messaging deep link that carries it.

use crate::core::{catalog::CatalogItem, money::Naira, package::PackageDetails, pricing::Totals};
use rust_decimal::Decimal;
use std::fmt::{self, Write as _};

const MESSAGING_BASE_URL: &str = "https://wa.me";

/// One ordered line as it appears in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl SummaryLine {
    #[must_use]
    pub fn new(item: &CatalogItem, quantity: u32, line_total: Decimal) -> Self {
        Self {
            name: item.name.clone(),
            quantity,
            line_total,
        }
    }
}

/// Everything the confirmation message mentions.
#[derive(Debug, Clone)]
pub struct OrderSummary<'a> {
    pub customer: &'a str,
    pub package: &'a PackageDetails,
    pub lines: &'a [SummaryLine],
    pub totals: Totals,
    /// Curated box orders have no package form and say so instead of naming a package
    pub curated_box: bool,
}

impl OrderSummary<'_> {
    /// Renders the summary as the pre-filled message text.
    ///
    /// # Errors
    /// Propagates a formatter failure from any of the written lines.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut message = String::new();
        writeln!(&mut message, "New Order from {}", self.customer)?;
        if self.curated_box {
            writeln!(&mut message, "Curated Box Order")?;
        } else {
            writeln!(&mut message, "Package Name: {}", self.package.name())?;
        }

        writeln!(&mut message, "Items:")?;
        for line in self.lines {
            writeln!(
                &mut message,
                "- {} (x{}): {}",
                line.name,
                line.quantity,
                Naira(line.line_total)
            )?;
        }

        writeln!(&mut message, "Subtotal: {}", Naira(self.totals.subtotal))?;
        writeln!(
            &mut message,
            "Packaging Fee: {}",
            Naira(self.totals.packaging_fee)
        )?;
        writeln!(&mut message, "Total: {}", Naira(self.totals.final_total))?;

        if !self.curated_box {
            match self.package.budget() {
                Some(budget) => writeln!(&mut message, "Budget: {}", Naira(budget))?,
                None => writeln!(&mut message, "Budget: Not specified")?,
            }
        }
        if let Some(code) = self.package.referral_code() {
            writeln!(&mut message, "Referral Code: {code}")?;
        }

        write!(&mut message, "Please confirm payment details.")?;
        Ok(message)
    }
}

/// Deep link opening a chat with `number` pre-filled with `message`.
///
/// The number is reduced to its digits, since the link format does not accept
/// `+` or separators.
#[must_use]
pub fn whatsapp_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "{MESSAGING_BASE_URL}/{digits}?text={}",
        urlencoding::encode(message)
    )
}
