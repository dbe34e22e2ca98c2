//! End-to-end cart page flows against a wiremock storefront.

use std::{sync::Arc, time::Duration};

use testresult::TestResult;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use burka_cart::{
    api::HttpStorefrontClient,
    checkout::{CheckoutState, CheckoutTimings},
    items::CartItemId,
    page::{CartPage, CheckoutOutcome, PageError, RemoveOutcome},
    payment::SimulatedGateway,
    store::{CartStore, RemoteCartStore},
    vendors::VendorId,
    view::{CartBody, PrimaryAction},
};

fn vendors_body() -> serde_json::Value {
    serde_json::json!([
        { "_id": "v-1", "firmName": "Noor Textiles", "discount": 10 },
        { "_id": "v-2", "firmName": "Plain Co" }
    ])
}

fn cart_body() -> serde_json::Value {
    serde_json::json!([
        {
            "_id": "c-1",
            "quantity": 2,
            "product": { "_id": "p-1", "name": "Black Abaya", "price": 100 }
        }
    ])
}

async fn mount_page(server: &MockServer) -> TestResult<CartPage> {
    let api = Arc::new(HttpStorefrontClient::with_base_url(
        &server.uri(),
        Duration::from_secs(5),
    )?);
    let store = Arc::new(RemoteCartStore::new(api.clone()));

    store.refresh().await?;

    let page = CartPage::new(
        store,
        api,
        Arc::new(SimulatedGateway::new(Duration::from_millis(20))),
        CheckoutTimings {
            settle_delay: Duration::from_millis(10),
        },
    );

    page.mount().await;

    Ok(page)
}

#[tokio::test]
async fn checkout_clears_remote_cart_and_saves_invoice() -> TestResult {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendors_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/cart/remove/p-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let page = mount_page(&server).await?;

    assert_eq!(
        page.view()?.primary_action(),
        Some(PrimaryAction::ProceedToCheckout { enabled: false })
    );

    page.select_vendor(Some(VendorId::new("v-1")));
    page.open_checkout()?;

    let outcome = page.confirm_payment().await?;

    assert!(matches!(
        outcome,
        CheckoutOutcome::Completed { ref failed_removals, .. } if failed_removals.is_empty()
    ));
    assert_eq!(page.checkout_state(), CheckoutState::Done);
    assert!(page.items().is_empty());

    let view = page.view()?;

    assert!(matches!(view.body, CartBody::Empty(_)));
    assert_eq!(view.primary_action(), Some(PrimaryAction::DownloadInvoice));

    let dir = tempfile::tempdir()?;
    let saved = page.download_invoice(dir.path())?;

    assert!(saved.ends_with("invoice.pdf"));

    let invoice = page.invoice().ok_or("invoice should be captured")?;
    let text = invoice.to_text();

    assert!(text.contains("Black Abaya"));
    assert!(text.contains("Subtotal: ₹200.00"));
    assert!(text.contains("Discount (10%): ₹20.00"));
    assert!(text.contains("Total: ₹180.00"));

    Ok(())
}

#[tokio::test]
async fn vendor_failure_leaves_checkout_disabled() -> TestResult {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
        .mount(&server)
        .await;

    let page = mount_page(&server).await?;
    let view = page.view()?;

    assert_eq!(view.error.as_deref(), Some("Failed to load vendors."));
    assert!(page.vendors().is_empty());
    assert!(page.open_checkout().is_err());

    Ok(())
}

#[tokio::test]
async fn failed_remove_keeps_the_line() -> TestResult {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendors_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/cart/remove/p-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let page = mount_page(&server).await?;

    assert_eq!(
        page.remove_item(&CartItemId::new("c-1")).await,
        RemoveOutcome::Failed
    );
    assert_eq!(page.error(), Some(PageError::Delete));
    assert_eq!(page.items().len(), 1);

    Ok(())
}
