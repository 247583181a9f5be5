//! Integration tests for the API server.

use std::sync::OnceLock;

use api::Config;
use api::demo::{DEMO_ACCESS_TOKEN, DEMO_CUSTOMER};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> axum::Router {
    let state = api::create_demo_state(&Config::default()).await;
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn burger_and_pizza_order() -> serde_json::Value {
    serde_json::json!({
        "customer_id": DEMO_CUSTOMER.to_string(),
        "payment_type": "pix",
        "delivery_address": "Rua das Flores, 123",
        "lines": [
            { "item_id": "hamburguer-artesanal", "extras": ["bacon-extra"], "quantity": 2 },
            { "item_id": "pizza-margherita" }
        ]
    })
}

async fn place_order(app: &axum::Router) -> String {
    let (status, json) = send(app, json_request("POST", "/orders", burger_and_pizza_order())).await;
    assert_eq!(status, StatusCode::CREATED);
    json["order_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["organization_id"], api::demo::DEMO_ORGANIZATION.to_string());
}

#[tokio::test]
async fn test_catalog_lists_demo_menu() {
    let app = setup().await;

    let (status, json) = send(&app, get("/catalog")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 8);
    assert_eq!(json["categories"].as_array().unwrap().len(), 4);
    assert_eq!(json["restaurant"], "Restaurante");
}

#[tokio::test]
async fn test_catalog_search_and_category_filter() {
    let app = setup().await;

    let (_, json) = send(&app, get("/catalog?q=BACON")).await;
    let ids: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    // Name match and description match both count.
    assert!(ids.contains(&"hamburguer-bacon"));
    assert!(ids.contains(&"pasta-carbonara"));

    let (_, json) = send(&app, get("/catalog?category=pizzas")).await;
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["allows_dual_composite"] == true));
    assert_eq!(items[0]["complements"][0]["id"], "refrigerante");
}

#[tokio::test]
async fn test_second_flavor_candidates() {
    let app = setup().await;

    let (status, json) = send(&app, get("/catalog/items/pizza-margherita/flavors")).await;
    assert_eq!(status, StatusCode::OK);
    let candidates = json.as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["id"], "pizza-pepperoni");

    let (status, json) = send(&app, get("/catalog/items/salada-caesar/flavors")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());

    let (status, _) = send(&app, get("/catalog/items/lasanha/flavors")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_returns_handoff_message() {
    let app = setup().await;

    let (status, json) = send(&app, json_request("POST", "/orders", burger_and_pizza_order())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["total_cents"], 9070);
    assert_eq!(json["total"], "R$ 90.70");
    assert_eq!(json["line_item_ids"].as_array().unwrap().len(), 2);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("2x Hambúrguer Artesanal - R$ 57.80"));
    assert!(message.contains("*TOTAL: R$ 90.70*"));
}

#[tokio::test]
async fn test_place_dual_order_with_complements() {
    let app = setup().await;

    let (status, json) = send(
        &app,
        json_request(
            "POST",
            "/orders",
            serde_json::json!({
                "customer_id": DEMO_CUSTOMER.to_string(),
                "payment_type": "cartao",
                "delivery_address": "Av. Brasil, 500",
                "lines": [{
                    "flavors": ["pizza-margherita", "pizza-pepperoni"],
                    "complements": [{ "id": "refrigerante", "quantity": 2 }]
                }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    // Higher flavor price plus two drinks.
    assert_eq!(json["total_cents"], 4790);

    let order_id = json["order_id"].as_str().unwrap();
    let (_, order) = send(&app, get(&format!("/orders/{order_id}"))).await;
    let line = &order["lines"][0];
    assert_eq!(line["product_id"], "pizza-margherita");
    assert_eq!(line["flavors"].as_array().unwrap().len(), 2);
    assert_eq!(line["flavors"][1]["position"], 2);
    assert_eq!(line["complements"][0]["value_cents"], 1200);
}

#[tokio::test]
async fn test_missing_payment_type_is_unprocessable() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body.as_object_mut().unwrap().remove("payment_type");

    let (status, json) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "missing_required_field");
    assert_eq!(json["field"], "paymentType");
}

#[tokio::test]
async fn test_empty_cart_is_unprocessable() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body["lines"] = serde_json::json!([]);

    let (status, json) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "empty_cart");
}

#[tokio::test]
async fn test_invalid_lines_are_bad_requests() {
    let app = setup().await;

    let cases = [
        serde_json::json!({ "item_id": "lasanha" }),
        serde_json::json!({ "flavors": ["pizza-margherita", "salada-caesar"] }),
        serde_json::json!({ "flavors": ["pizza-margherita", "pizza-margherita"] }),
        serde_json::json!({ "item_id": "hamburguer-artesanal", "extras": ["borda-catupiry"] }),
        serde_json::json!({ "item_id": "pizza-margherita", "flavors": ["pizza-pepperoni"] }),
        serde_json::json!({ "item_id": "pizza-margherita", "quantity": 0 }),
    ];

    for line in cases {
        let mut body = burger_and_pizza_order();
        body["lines"] = serde_json::json!([line.clone()]);
        let (status, _) = send(&app, json_request("POST", "/orders", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "line {line} should be rejected");
    }
}

#[tokio::test]
async fn test_oversized_quantities_are_bad_requests() {
    let app = setup().await;

    let mut body = burger_and_pizza_order();
    body["lines"] = serde_json::json!([
        { "item_id": "salada-caesar", "quantity": domain::MAX_LINE_QUANTITY + 1 }
    ]);
    let (status, _) = send(&app, json_request("POST", "/orders", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = burger_and_pizza_order();
    body["lines"] = serde_json::json!([{
        "item_id": "pizza-margherita",
        "complements": [
            { "id": "refrigerante", "quantity": 3000000000u64 },
            { "id": "refrigerante", "quantity": 3000000000u64 }
        ]
    }]);
    let (status, _) = send(&app, json_request("POST", "/orders", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = send(&app, get("/orders")).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_quantity_at_limit_is_accepted() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body["lines"] = serde_json::json!([
        { "item_id": "salada-caesar", "quantity": domain::MAX_LINE_QUANTITY }
    ]);

    let (status, json) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        json["total_cents"],
        1990 * i64::from(domain::MAX_LINE_QUANTITY)
    );
}

#[tokio::test]
async fn test_unknown_payment_type_is_bad_request() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body["payment_type"] = serde_json::json!("cheque");

    let (status, _) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_access_token_is_single_use() {
    let app = setup().await;
    let order = || {
        serde_json::json!({
            "access_token": DEMO_ACCESS_TOKEN,
            "payment_type": "dinheiro",
            "delivery_address": "Rua A, 1",
            "lines": [{ "item_id": "salada-caesar" }]
        })
    };

    let (status, json) = send(&app, json_request("POST", "/orders", order())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["message"].as_str().unwrap().contains("*Cliente:* Cliente Demo"));

    let (status, _) = send(&app, json_request("POST", "/orders", order())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_access_token_is_forbidden() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body["access_token"] = serde_json::json!("not-a-token");

    let (status, _) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_access_token_locks_customer() {
    let app = setup().await;
    let mut body = burger_and_pizza_order();
    body["access_token"] = serde_json::json!(DEMO_ACCESS_TOKEN);
    body["customer_id"] = serde_json::json!(uuid::Uuid::new_v4().to_string());

    let (status, _) = send(&app, json_request("POST", "/orders", body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_and_get_orders() {
    let app = setup().await;
    let order_id = place_order(&app).await;

    let (status, json) = send(&app, get("/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], order_id.as_str());
    assert_eq!(json[0]["status"], "pending");
    assert_eq!(json[0]["orphaned"], false);

    let (status, json) = send(&app, get(&format!("/orders/{order_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payment_type"], "pix");
    assert_eq!(json["total_cents"], 9070);
    assert_eq!(json["lines"][0]["unit_value_cents"], 2890);
    assert_eq!(json["lines"][0]["quantity"], 2);

    let (status, _) = send(&app, get(&format!("/orders/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/orders/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_by_status() {
    let app = setup().await;
    let first = place_order(&app).await;
    place_order(&app).await;

    send(
        &app,
        json_request(
            "PATCH",
            &format!("/orders/{first}/status"),
            serde_json::json!({ "status": "preparing" }),
        ),
    )
    .await;

    let (_, json) = send(&app, get("/orders?status=preparing")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], first.as_str());

    let (_, json) = send(&app, get("/orders?status=pending")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/orders?status=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_lifecycle() {
    let app = setup().await;
    let order_id = place_order(&app).await;
    let uri = format!("/orders/{order_id}/status");

    for next in ["preparing", "ready", "delivered"] {
        let (status, json) = send(
            &app,
            json_request("PATCH", &uri, serde_json::json!({ "status": next })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], next);
    }

    let (status, _) = send(
        &app,
        json_request("PATCH", &uri, serde_json::json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_skipping_a_status_is_conflict() {
    let app = setup().await;
    let order_id = place_order(&app).await;

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/orders/{order_id}/status"),
            serde_json::json!({ "status": "delivered" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_orphaned_orders_empty_after_clean_submissions() {
    let app = setup().await;
    place_order(&app).await;

    let (status, json) = send(&app, get("/orders/orphaned")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    place_order(&app).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_submitted_total"));
}
