use std::sync::Arc;

use return_policy::catalog::{LeadTime, LeadTimeAnchor, PaymentMethod, RefundMethod};
use return_policy::returns::{Payment, RefundEvent, RefundPortion, RefundScheduler};
use return_policy::PolicyCatalog;

fn scheduler() -> RefundScheduler {
    RefundScheduler::new(Arc::new(PolicyCatalog::builtin().unwrap()))
}

#[test]
fn credit_card_refunds_on_next_billing_cycle() {
    let plan = scheduler()
        .schedule(&Payment::new(PaymentMethod::CreditCard), RefundEvent::ReturnAccepted)
        .unwrap();

    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].method.to_string(), "credit card refund");
    assert_eq!(plan.steps[0].lead_time.to_string(), "next billing cycle");
}

#[test]
fn cancelled_cod_order_is_paid_by_bank_transfer() {
    let plan = scheduler()
        .schedule(&Payment::new(PaymentMethod::CashOnDelivery), RefundEvent::OrderCancelled)
        .unwrap();

    assert_eq!(plan.steps[0].method, RefundMethod::BankTransfer);
    assert_eq!(
        plan.steps[0].lead_time,
        LeadTime::Days { min: 3, max: 5, after: LeadTimeAnchor::BankDetailsReceived }
    );
    assert_eq!(plan.steps[0].lead_time.to_string(), "3–5 days after bank details received");
}

#[test]
fn accepted_return_and_cancellation_refund_the_same_way() {
    let scheduler = scheduler();
    for method in [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::CashOnDelivery,
        PaymentMethod::BankTransfer,
        PaymentMethod::EWallet,
        PaymentMethod::LoyaltyPoints,
    ] {
        let payment = Payment::new(method);
        let accepted = scheduler.schedule(&payment, RefundEvent::ReturnAccepted).unwrap();
        let cancelled = scheduler.schedule(&payment, RefundEvent::OrderCancelled).unwrap();
        assert_eq!(accepted.steps, cancelled.steps, "{}", method);
    }
}

#[test]
fn loyalty_points_are_refunded_before_the_card() {
    let payment = Payment::new(PaymentMethod::CreditCard).with_loyalty_points(500);
    let plan = scheduler().schedule(&payment, RefundEvent::ReturnAccepted).unwrap();

    assert!(plan.is_split());
    assert_eq!(plan.steps[0].portion, RefundPortion::LoyaltyPoints { points: 500 });
    assert_eq!(plan.steps[0].method, RefundMethod::LoyaltyAccount);
    assert_eq!(plan.steps[1].portion, RefundPortion::Remainder);
    assert_eq!(plan.steps[1].method, RefundMethod::CreditCardRefund);
}

#[test]
fn payment_method_aliases_parse() {
    assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::CashOnDelivery);
    assert_eq!("The 1 Point".parse::<PaymentMethod>().unwrap(), PaymentMethod::LoyaltyPoints);
    assert!("cheque".parse::<PaymentMethod>().is_err());
}
