pub use budgets::Budget;
pub use categories::Category;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, Summary, TransactionDraft, TransactionListFilter};
pub use transactions::{Transaction, TransactionKind};
pub use users::AuthUser;

mod budgets;
mod categories;
mod error;
mod money;
mod ops;
mod transactions;
mod users;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
