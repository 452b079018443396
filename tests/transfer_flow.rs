use ledger_service::credentials::Plaintext;
use ledger_service::models::{Account, TransferRequest, User};
use ledger_service::store::{Collection, InMemoryStore};
use ledger_service::token::TokenAuthenticator;
use ledger_service::users::Registration;
use ledger_service::{AuthError, LedgerService, ServiceError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn test_service() -> (LedgerService, Collection<Account>) {
    let users: Collection<User> = Collection::new(Arc::new(InMemoryStore::new()));
    let accounts: Collection<Account> = Collection::new(Arc::new(InMemoryStore::new()));
    let authenticator = Arc::new(TokenAuthenticator::new(
        "test-secret",
        Duration::from_secs(3600),
    ));

    let service = LedgerService::with_collections(
        users,
        accounts.clone(),
        authenticator,
        Arc::new(Plaintext),
    );

    (service, accounts)
}

async fn register(service: &LedgerService, name: &str) -> Registration {
    service
        .register(name, &format!("{name}@x.com"), "pw123")
        .await
        .unwrap()
}

/// Test setup only: put funds on an account directly through the store.
async fn credit(accounts: &Collection<Account>, account_number: &str, amount: Decimal) {
    let account_number = account_number.to_owned();
    accounts
        .update(move |records| {
            let account = records
                .iter_mut()
                .find(|a| a.account_number == account_number)
                .unwrap();
            account.balance += amount;
            Ok(())
        })
        .await
        .unwrap();
}

fn request(from: &str, to: &str, password: &str, amount: Decimal) -> TransferRequest {
    TransferRequest {
        from_account_number: Some(from.to_owned()),
        to_account_number: Some(to.to_owned()),
        transfer_password: Some(password.to_owned()),
        amount: Some(amount),
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[tokio::test]
async fn test_registration_creates_zero_balance_account() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;

    assert_eq!(alice.account.balance, Decimal::ZERO);
    assert_eq!(alice.account.user_id, alice.user.id);

    // Number shape: five digits, dash, check digit
    let (digits, check) = alice.account.account_number.split_once('-').unwrap();
    assert_eq!(digits.len(), 5);
    assert!(digits.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(check.len(), 1);

    // Exactly one account, with no transfer password configured yet
    let stored = accounts.snapshot().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].transfer_password.is_none());
}

// ============================================================================
// TRANSFER SCENARIO (alice -> bob)
// ============================================================================

#[tokio::test]
async fn test_insufficient_funds_then_successful_transfer() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();

    // Balance is 0, so 50 must bounce
    let req = request(
        &alice.account.account_number,
        &bob.account.account_number,
        "1234",
        dec!(50),
    );
    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientFunds));

    // Both sides untouched by the failed attempt
    assert_eq!(
        service
            .balance(Some(&alice.token), &alice.account.id)
            .await
            .unwrap(),
        Decimal::ZERO
    );

    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    let outcome = service.transfer(Some(&alice.token), &req).await.unwrap();
    assert_eq!(outcome.from_account.balance, dec!(50.00));
    assert_eq!(outcome.to_account.balance, dec!(50.00));

    assert_eq!(
        service
            .balance(Some(&bob.token), &bob.account.id)
            .await
            .unwrap(),
        dec!(50.00)
    );
}

#[tokio::test]
async fn test_conservation_of_funds() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();
    service
        .set_transfer_password(Some(&bob.token), &bob.account.account_number, "5678")
        .await
        .unwrap();

    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    for amount in [dec!(10), dec!(25.50), dec!(0.01)] {
        let req = request(
            &alice.account.account_number,
            &bob.account.account_number,
            "1234",
            amount,
        );
        service.transfer(Some(&alice.token), &req).await.unwrap();
    }

    let back = request(
        &bob.account.account_number,
        &alice.account.account_number,
        "5678",
        dec!(5),
    );
    service.transfer(Some(&bob.token), &back).await.unwrap();

    let stored = accounts.snapshot().await.unwrap();
    let total: Decimal = stored.iter().map(|a| a.balance).sum();
    assert_eq!(total, dec!(100));
    assert!(stored.iter().all(|a| a.balance >= Decimal::ZERO));
}

// ============================================================================
// TRANSFER GATES
// ============================================================================

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (service, _) = test_service();

    let alice = register(&service, "alice").await;

    let mut req = TransferRequest::default();
    req.from_account_number = Some(alice.account.account_number.clone());

    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput));
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_unknown_account_rejected() {
    let (service, _) = test_service();

    let alice = register(&service, "alice").await;

    let req = request(&alice.account.account_number, "00000-0", "1234", dec!(10));
    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::AccountNotFound));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_same_account_transfer_rejected() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();
    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    // Rejected regardless of password or balance
    let req = request(
        &alice.account.account_number,
        &alice.account.account_number,
        "wrong",
        dec!(10),
    );
    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::SameAccount));
}

#[tokio::test]
async fn test_transfer_without_password_configured() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    let req = request(
        &alice.account.account_number,
        &bob.account.account_number,
        "1234",
        dec!(10),
    );
    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::TransferPasswordNotSet));
    assert_eq!(err.status(), 401);
    assert_eq!(err.code(), Some("P404"));
}

#[tokio::test]
async fn test_wrong_transfer_password_leaves_balances_unchanged() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();
    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    let req = request(
        &alice.account.account_number,
        &bob.account.account_number,
        "9999",
        dec!(10),
    );
    let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::TransferPasswordIncorrect));
    assert_eq!(err.status(), 401);
    assert_eq!(err.code(), Some("P401"));

    let stored = accounts.snapshot().await.unwrap();
    let alice_stored = stored
        .iter()
        .find(|a| a.id == alice.account.id)
        .unwrap();
    let bob_stored = stored.iter().find(|a| a.id == bob.account.id).unwrap();
    assert_eq!(alice_stored.balance, dec!(100));
    assert_eq!(bob_stored.balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_non_positive_amount_rejected() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();
    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    for amount in [Decimal::ZERO, dec!(-10)] {
        let req = request(
            &alice.account.account_number,
            &bob.account.account_number,
            "1234",
            amount,
        );
        let err = service.transfer(Some(&alice.token), &req).await.unwrap_err();
        assert!(matches!(err, ServiceError::NonPositiveAmount));
    }
}

#[tokio::test]
async fn test_transfer_from_foreign_account_forbidden() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    service
        .set_transfer_password(Some(&alice.token), &alice.account.account_number, "1234")
        .await
        .unwrap();
    credit(&accounts, &alice.account.account_number, dec!(100)).await;

    // Bob knows alice's transfer password, but the session does not own
    // the source account
    let req = request(
        &alice.account.account_number,
        &bob.account.account_number,
        "1234",
        dec!(10),
    );
    let err = service.transfer(Some(&bob.token), &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn test_transfer_requires_token() {
    let (service, _) = test_service();

    let req = request("11111-1", "22222-2", "1234", dec!(10));
    let err = service.transfer(None, &req).await.unwrap_err();
    assert!(matches!(err, ServiceError::Auth(AuthError::MissingToken)));
}

// ============================================================================
// BALANCE READS
// ============================================================================

#[tokio::test]
async fn test_balance_read_is_ownership_checked() {
    let (service, accounts) = test_service();

    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    credit(&accounts, &alice.account.account_number, dec!(75)).await;

    assert_eq!(
        service
            .balance(Some(&alice.token), &alice.account.id)
            .await
            .unwrap(),
        dec!(75)
    );

    let err = service
        .balance(Some(&bob.token), &alice.account.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let err = service
        .balance(Some(&alice.token), "no-such-id")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}
