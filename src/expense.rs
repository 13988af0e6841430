//! The expense model, its validation and the cash/UPI amount split.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{ValidationError, database_id::ExpenseId, user::UserID};

/// The largest amount an expense can have: ten digits with two after the point.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);
/// The maximum number of characters in a category.
pub const MAX_CATEGORY_LENGTH: usize = 50;
/// The maximum number of characters in the UPI VPA, transaction ID and payer name.
pub const MAX_REFERENCE_LENGTH: usize = 100;
/// The maximum number of characters in the notes.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// How an expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Paid with cash.
    Cash,
    /// Paid through the Unified Payments Interface.
    Upi,
}

impl PaymentMethod {
    /// The upper-case name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Upi => "UPI",
        }
    }

    /// The human readable name used in summaries and exports.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CASH") {
            Ok(PaymentMethod::Cash)
        } else if s.eq_ignore_ascii_case("UPI") {
            Ok(PaymentMethod::Upi)
        } else {
            Err(ValidationError::InvalidPaymentMethod(s.to_owned()))
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The fields of an expense that the owner chooses, after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    /// How much was spent, rounded to two decimal places. Always positive.
    pub amount: Decimal,
    /// What the money was spent on.
    pub category: String,
    /// The day the money was spent.
    #[serde(with = "date_format")]
    pub expense_date: Date,
    /// How the expense was paid.
    pub payment_method: PaymentMethod,
    /// The virtual payment address of a UPI payment.
    pub upi_vpa: Option<String>,
    /// The reference of a UPI payment.
    pub transaction_id: Option<String>,
    /// Who made the payment.
    pub payer_name: Option<String>,
    /// Free text notes.
    pub notes: Option<String>,
}

/// How an expense's amount is split between cash and UPI.
///
/// Always built by [derive_amount_split] so that the buckets add up to the
/// amount and only the bucket of the payment method is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountSplit {
    /// The part of the amount paid in cash.
    pub cash_amount: Decimal,
    /// The part of the amount paid by UPI.
    pub upi_amount: Decimal,
}

/// An expense recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who recorded the expense. Never changes.
    pub owner_id: UserID,
    /// The fields chosen by the owner.
    #[serde(flatten)]
    pub details: ExpenseDetails,
    /// The split derived from the amount and payment method.
    #[serde(flatten)]
    pub split: AmountSplit,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// An expense that has not been given an ID yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The user who recorded the expense.
    pub owner_id: UserID,
    /// The fields chosen by the owner.
    pub details: ExpenseDetails,
    /// The split derived from the amount and payment method.
    pub split: AmountSplit,
    /// When the expense was recorded. Also used as the initial update time.
    pub created_at: OffsetDateTime,
}

/// The expense fields sent by a client, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// How much was spent.
    pub amount: Option<Decimal>,
    /// What the money was spent on.
    pub category: Option<String>,
    /// The day the money was spent, as YYYY-MM-DD.
    #[serde(default, with = "optional_date_format")]
    pub expense_date: Option<Date>,
    /// How the expense was paid.
    pub payment_method: Option<PaymentMethod>,
    /// The virtual payment address of a UPI payment.
    pub upi_vpa: Option<String>,
    /// The reference of a UPI payment.
    pub transaction_id: Option<String>,
    /// Who made the payment.
    pub payer_name: Option<String>,
    /// Free text notes.
    pub notes: Option<String>,
}

impl ExpenseInput {
    /// Check the input and turn it into [ExpenseDetails].
    ///
    /// The amount is rounded half away from zero to two decimal places before
    /// it is checked, so `0.001` is rejected as a non-positive amount.
    ///
    /// # Errors
    ///
    /// Returns the first [ValidationError] found, checking the amount,
    /// category, date, payment method, UPI references and field lengths in
    /// that order.
    pub fn validate(self) -> Result<ExpenseDetails, ValidationError> {
        let amount = to_money(self.amount.ok_or(ValidationError::MissingAmount)?);

        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }

        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge);
        }

        let category = self
            .category
            .filter(|category| !is_blank(category))
            .ok_or(ValidationError::MissingCategory)?;

        if category.chars().count() > MAX_CATEGORY_LENGTH {
            return Err(ValidationError::CategoryTooLong(MAX_CATEGORY_LENGTH));
        }

        let expense_date = self
            .expense_date
            .ok_or(ValidationError::MissingExpenseDate)?;
        let payment_method = self
            .payment_method
            .ok_or(ValidationError::MissingPaymentMethod)?;

        if payment_method == PaymentMethod::Upi {
            if self.upi_vpa.as_deref().is_none_or(is_blank) {
                return Err(ValidationError::MissingUpiVpa);
            }

            if self.transaction_id.as_deref().is_none_or(is_blank) {
                return Err(ValidationError::MissingTransactionId);
            }
        }

        check_length("upi_vpa", self.upi_vpa.as_deref(), MAX_REFERENCE_LENGTH)?;
        check_length(
            "transaction_id",
            self.transaction_id.as_deref(),
            MAX_REFERENCE_LENGTH,
        )?;
        check_length("payer_name", self.payer_name.as_deref(), MAX_REFERENCE_LENGTH)?;
        check_length("notes", self.notes.as_deref(), MAX_NOTES_LENGTH)?;

        Ok(ExpenseDetails {
            amount,
            category,
            expense_date,
            payment_method,
            upi_vpa: self.upi_vpa,
            transaction_id: self.transaction_id,
            payer_name: self.payer_name,
            notes: self.notes,
        })
    }
}

/// Put the whole amount into the bucket of the payment method and zero the other.
///
/// Called every time an expense is created or updated.
pub fn derive_amount_split(details: &ExpenseDetails) -> AmountSplit {
    let zero = Decimal::new(0, details.amount.scale());

    match details.payment_method {
        PaymentMethod::Cash => AmountSplit {
            cash_amount: details.amount,
            upi_amount: zero,
        },
        PaymentMethod::Upi => AmountSplit {
            cash_amount: zero,
            upi_amount: details.amount,
        },
    }
}

/// Round `value` to two decimal places and pad it to exactly two places.
pub(crate) fn to_money(value: Decimal) -> Decimal {
    let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn check_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.chars().count() > max => {
            Err(ValidationError::FieldTooLong { field, max })
        }
        _ => Ok(()),
    }
}

mod date_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub(super) const FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Date::parse(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}

mod optional_date_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::date_format::FORMAT;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => {
                let text = date.format(FORMAT).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| Date::parse(&text, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Parse a YYYY-MM-DD date, e.g. from a query string.
///
/// # Errors
///
/// Returns [ValidationError::InvalidDate] if `text` is not a calendar date.
pub fn parse_date(text: &str) -> Result<Date, ValidationError> {
    Date::parse(text.trim(), date_format::FORMAT)
        .map_err(|_| ValidationError::InvalidDate(text.to_owned()))
}
