use uuid::Uuid;

use super::errors::DomainError;
use super::order::{ListResult, NewOrderInput, OrderView, TransactionView, TransitionOutcome};
use super::status::{OrderStatus, PaymentStatus};

pub trait OrderRepository: Send + Sync + 'static {
    /// Turn the consumer's cart into a pending order. Checks stock, never
    /// decrements it.
    fn create_from_cart(&self, input: &NewOrderInput) -> Result<Uuid, DomainError>;
    fn transition(&self, id: Uuid, target: OrderStatus) -> Result<TransitionOutcome, DomainError>;
    fn set_payment_status(
        &self,
        order_id: Uuid,
        status: PaymentStatus,
    ) -> Result<TransactionView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(
        &self,
        consumer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;
}
