use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrderInput, OrderView, TransactionView, TransitionOutcome};
use crate::domain::ports::OrderRepository;
use crate::domain::status::{OrderStatus, PaymentStatus};

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_order(&self, input: NewOrderInput) -> Result<Uuid, DomainError> {
        let input = normalize(input)?;
        let order_id = self.repo.create_from_cart(&input)?;
        log::info!(
            "Order {} created for consumer {}",
            order_id,
            input.consumer_id
        );
        Ok(order_id)
    }

    pub fn update_status(&self, id: Uuid, status: &str) -> Result<TransitionOutcome, DomainError> {
        let target: OrderStatus = status.trim().parse()?;
        let outcome = self.repo.transition(id, target)?;
        log::info!(
            "Order {} moved {} -> {} (inventory_adjusted={})",
            id,
            outcome.previous_status,
            outcome.status,
            outcome.inventory_adjusted
        );
        Ok(outcome)
    }

    pub fn update_payment_status(
        &self,
        order_id: Uuid,
        status: &str,
    ) -> Result<TransactionView, DomainError> {
        let status: PaymentStatus = status.trim().parse()?;
        self.repo.set_payment_status(order_id, status)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn list_orders(
        &self,
        consumer_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.repo.list(consumer_id, page, limit)
    }
}

fn normalize(input: NewOrderInput) -> Result<NewOrderInput, DomainError> {
    let payment_method = input.payment_method.trim().to_string();
    if payment_method.is_empty() {
        return Err(DomainError::InvalidInput(
            "payment_method must not be blank".to_string(),
        ));
    }
    let delivery_address = input.delivery_address.trim().to_string();
    if delivery_address.is_empty() {
        return Err(DomainError::InvalidInput(
            "delivery_address must not be blank".to_string(),
        ));
    }
    if matches!(&input.product_ids, Some(ids) if ids.is_empty()) {
        return Err(DomainError::InvalidInput(
            "product_ids must name at least one product when given".to_string(),
        ));
    }
    let notes = input
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(NewOrderInput {
        payment_method,
        delivery_address,
        notes,
        ..input
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingRepo {
        created: Mutex<Vec<NewOrderInput>>,
        transitions: Mutex<Vec<OrderStatus>>,
    }

    impl OrderRepository for RecordingRepo {
        fn create_from_cart(&self, input: &NewOrderInput) -> Result<Uuid, DomainError> {
            self.created.lock().unwrap().push(input.clone());
            Ok(Uuid::new_v4())
        }

        fn transition(
            &self,
            id: Uuid,
            target: OrderStatus,
        ) -> Result<TransitionOutcome, DomainError> {
            self.transitions.lock().unwrap().push(target);
            Ok(TransitionOutcome {
                order_id: id,
                previous_status: OrderStatus::Pending,
                status: target,
                inventory_adjusted: false,
                stock_effect: None,
                adjustments: vec![],
            })
        }

        fn set_payment_status(
            &self,
            _order_id: Uuid,
            _status: PaymentStatus,
        ) -> Result<TransactionView, DomainError> {
            Err(DomainError::NotFound)
        }

        fn find_by_id(&self, _id: Uuid) -> Result<Option<OrderView>, DomainError> {
            Ok(None)
        }

        fn list(
            &self,
            _consumer_id: Option<Uuid>,
            _page: i64,
            _limit: i64,
        ) -> Result<ListResult, DomainError> {
            Ok(ListResult {
                items: vec![],
                total: 0,
            })
        }
    }

    fn input() -> NewOrderInput {
        NewOrderInput {
            consumer_id: Uuid::new_v4(),
            payment_method: " cod ".to_string(),
            delivery_address: " Purok 3, Nueva Ecija ".to_string(),
            notes: Some("   ".to_string()),
            product_ids: None,
        }
    }

    #[test]
    fn create_order_trims_fields_and_drops_blank_notes() {
        let service = OrderService::new(RecordingRepo::default());
        service.create_order(input()).expect("create failed");

        let created = service.repo.created.lock().unwrap();
        assert_eq!(created[0].payment_method, "cod");
        assert_eq!(created[0].delivery_address, "Purok 3, Nueva Ecija");
        assert!(created[0].notes.is_none());
    }

    #[test]
    fn create_order_rejects_blank_address_before_touching_storage() {
        let service = OrderService::new(RecordingRepo::default());
        let err = service
            .create_order(NewOrderInput {
                delivery_address: "  ".to_string(),
                ..input()
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(service.repo.created.lock().unwrap().is_empty());
    }

    #[test]
    fn create_order_rejects_empty_selection() {
        let service = OrderService::new(RecordingRepo::default());
        let err = service
            .create_order(NewOrderInput {
                product_ids: Some(vec![]),
                ..input()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn update_status_rejects_unknown_value_without_transition() {
        let service = OrderService::new(RecordingRepo::default());
        let err = service
            .update_status(Uuid::new_v4(), "refunded")
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidStatus(_)));
        assert!(service.repo.transitions.lock().unwrap().is_empty());
    }

    #[test]
    fn update_status_parses_known_value() {
        let service = OrderService::new(RecordingRepo::default());
        let outcome = service
            .update_status(Uuid::new_v4(), "shipped")
            .expect("transition failed");
        assert_eq!(outcome.status, OrderStatus::Shipped);
    }

    #[test]
    fn update_payment_status_rejects_unknown_value() {
        let service = OrderService::new(RecordingRepo::default());
        let err = service
            .update_payment_status(Uuid::new_v4(), "refunded")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatus(_)));
    }
}
