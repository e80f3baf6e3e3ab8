use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

use crate::{EngineError, MoneyCents, ResultEngine};

mod accounts;
mod budgets;
mod categories;
mod summary;
mod transactions;

pub use summary::Summary;
pub use transactions::{TransactionDraft, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Rejects missing and blank input the way the wire contract expects:
/// `None` is "required", whitespace-only is "may not be blank".
fn require_field<'a>(value: Option<&'a str>, field: &'static str) -> ResultEngine<&'a str> {
    let value =
        value.ok_or_else(|| EngineError::validation(field, "This field is required."))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(field, "This field may not be blank."));
    }
    Ok(trimmed)
}

fn parse_amount(value: &str) -> ResultEngine<MoneyCents> {
    value
        .parse()
        .map_err(|_: EngineError| EngineError::validation("amount", "A valid number is required."))
}

fn parse_date(value: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        EngineError::validation(
            "date",
            "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
        )
    })
}

/// Validates a budget period key ("YYYY-MM", month 01-12).
fn validate_month(value: &str) -> ResultEngine<String> {
    let invalid = || EngineError::validation("month", "Month must use the YYYY-MM format.");

    let bytes = value.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err(invalid());
    }
    if !bytes[..4].iter().all(u8::is_ascii_digit) || !bytes[5..].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let month: u8 = value[5..7].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok(value.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
