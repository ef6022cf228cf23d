//! Task-local binding of the active transaction.

use std::future::Future;
use std::sync::Arc;

use super::Transaction;

tokio::task_local! {
    static CURRENT_TRANSACTION: Arc<dyn Transaction>;
}

/// Run `future` with `transaction` as the task's active transaction.
pub async fn with_transaction<F>(transaction: Arc<dyn Transaction>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_TRANSACTION.scope(transaction, future).await
}

/// The transaction opened by the enclosing unit of work, if any.
pub fn current_transaction() -> Option<Arc<dyn Transaction>> {
    CURRENT_TRANSACTION.try_with(Arc::clone).ok()
}

pub fn in_transaction() -> bool {
    CURRENT_TRANSACTION.try_with(|_| ()).is_ok()
}
