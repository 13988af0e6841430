//! Renders expenses as a CSV file for download.

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, expense::Expense};

const HEADER: [&str; 13] = [
    "ID",
    "Amount",
    "Category",
    "Expense Date",
    "Payment Method",
    "Cash Amount",
    "UPI Amount",
    "UPI VPA",
    "Transaction ID",
    "Payer Name",
    "Notes",
    "Created At",
    "Updated At",
];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const FILENAME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Render `expenses` as CSV text with a header row.
///
/// Missing optional fields are written as empty strings.
///
/// # Errors
///
/// Returns [Error::CsvError] if a row could not be written or a date could not
/// be formatted.
pub fn export_expenses_csv(expenses: &[Expense]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).map_err(csv_error)?;

    for expense in expenses {
        let details = &expense.details;

        writer
            .write_record([
                expense.id.to_string(),
                details.amount.to_string(),
                details.category.clone(),
                details.expense_date.format(DATE_FORMAT).map_err(format_error)?,
                details.payment_method.label().to_owned(),
                expense.split.cash_amount.to_string(),
                expense.split.upi_amount.to_string(),
                details.upi_vpa.clone().unwrap_or_default(),
                details.transaction_id.clone().unwrap_or_default(),
                details.payer_name.clone().unwrap_or_default(),
                details.notes.clone().unwrap_or_default(),
                expense.created_at.format(TIMESTAMP_FORMAT).map_err(format_error)?,
                expense.updated_at.format(TIMESTAMP_FORMAT).map_err(format_error)?,
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}

/// The name to give an export downloaded at `now`, e.g. `expenses_20240131_120000.csv`.
pub fn csv_filename(now: OffsetDateTime) -> String {
    match now.format(FILENAME_FORMAT) {
        Ok(timestamp) => format!("expenses_{timestamp}.csv"),
        Err(error) => {
            tracing::warn!("Could not format CSV export timestamp: {error}");
            "expenses.csv".to_owned()
        }
    }
}

fn csv_error(error: csv::Error) -> Error {
    Error::CsvError(error.to_string())
}

fn format_error(error: time::error::Format) -> Error {
    Error::CsvError(error.to_string())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::{date, datetime};

    use crate::{
        expense::{Expense, ExpenseInput, derive_amount_split},
        test_utils::{cash_input, upi_input},
        user::UserID,
    };

    use super::{csv_filename, export_expenses_csv};

    fn expense(id: i64, input: ExpenseInput) -> Expense {
        let details = input.validate().unwrap();
        let split = derive_amount_split(&details);

        Expense {
            id,
            owner_id: UserID::new(1),
            details,
            split,
            created_at: datetime!(2024-01-31 09:05:03 UTC),
            updated_at: datetime!(2024-02-01 18:30:00 UTC),
        }
    }

    #[test]
    fn empty_export_has_header_only() {
        let got = export_expenses_csv(&[]).unwrap();

        assert_eq!(
            got,
            "ID,Amount,Category,Expense Date,Payment Method,Cash Amount,UPI Amount,\
            UPI VPA,Transaction ID,Payer Name,Notes,Created At,Updated At\n"
        );
    }

    #[test]
    fn exports_cash_and_upi_rows() {
        let expenses = [
            expense(1, cash_input(dec!(100.00), "Food", date!(2024 - 01 - 15))),
            expense(
                2,
                ExpenseInput {
                    notes: Some("dinner, with friends".to_owned()),
                    ..upi_input(dec!(75.5), "Food", date!(2024 - 01 - 16), "cafe@okbank", "TXN1")
                },
            ),
        ];

        let got = export_expenses_csv(&expenses).unwrap();
        let lines: Vec<&str> = got.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "1,100.00,Food,2024-01-15,Cash,100.00,0.00,,,,,2024-01-31 09:05:03,2024-02-01 18:30:00"
        );
        assert_eq!(
            lines[2],
            "2,75.50,Food,2024-01-16,UPI,0.00,75.50,cafe@okbank,TXN1,,\"dinner, with friends\",\
            2024-01-31 09:05:03,2024-02-01 18:30:00"
        );
    }

    #[test]
    fn filename_includes_timestamp() {
        assert_eq!(
            csv_filename(datetime!(2024-01-31 12:00:05 UTC)),
            "expenses_20240131_120005.csv"
        );
    }
}
