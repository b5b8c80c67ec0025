use std::str::FromStr as _;

use alloy::signers::local::PrivateKeySigner;
use aster_futures_client::clock;
use aster_futures_client::error::Kind;
use aster_futures_client::futures::{
    FuturesClient, NewOrderRequest, OrderSelector, OrderType, PositionSide, Side, TimeInForce,
};
use aster_futures_client::signing::{ParamValue, ParameterSet, RequestSigner};
use aster_futures_client::types::Address;
use httpmock::Method::{DELETE, GET, POST};
use httpmock::MockServer;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use rust_decimal_macros::dec;
use url::Url;

// Well-known development keys; never funded.
const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const USER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

const NOW_MICROS: i64 = 1_749_545_309_665_123;

fn client(server: &MockServer) -> FuturesClient {
    let user = Address::from_str(USER).expect("user address");
    let key = PrivateKeySigner::from_str(PRIVATE_KEY).expect("private key");
    let signer = RequestSigner::new(user, key)
        .with_clock(clock::Fixed::from_micros(NOW_MICROS).expect("clock"));
    let host = Url::parse(&server.base_url()).expect("host");

    FuturesClient::with_signer(host, signer, ReqwestClient::new())
}

fn selector() -> OrderSelector {
    OrderSelector::builder()
        .symbol("SANDUSDT")
        .order_id(2_194_215)
        .build()
}

#[tokio::test]
async fn place_order_posts_signed_form_body() {
    let server = MockServer::start_async().await;
    let expected_body = concat!(
        "symbol=SANDUSDT&positionSide=BOTH&type=LIMIT&side=BUY&timeInForce=GTC",
        "&quantity=30&price=0.325&reduceOnly=True&recvWindow=50000&timestamp=1749545309665",
        "&nonce=1749545309665123",
        "&user=0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "&signer=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "&signature=0x772d319a5c7c741be32753b8a1e8982fad9dba915cc4ab566125c286eda202661efebefc32d6358e9e705ceada43e42c659c0090ca9b2e8cc0ffcd4392d9f7b51c",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/fapi/v3/order")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(expected_body);
            then.status(200).body(r#"{"orderId":2194215,"status":"NEW"}"#);
        })
        .await;

    let order = NewOrderRequest::builder()
        .symbol("SANDUSDT")
        .side(Side::Buy)
        .order_type(OrderType::Limit)
        .position_side(PositionSide::Both)
        .time_in_force(TimeInForce::Gtc)
        .quantity(dec!(30))
        .price(dec!(0.325))
        .reduce_only(true)
        .build();
    let response = client(&server).place_order(&order).await.expect("response");

    mock.assert_async().await;
    assert!(response.is_success(), "200 from mock");
    assert_eq!(response.path, "/fapi/v3/order");
    let body: serde_json::Value = response.json().expect("json body");
    assert_eq!(body["orderId"], 2_194_215);
}

#[tokio::test]
async fn query_order_sends_signed_query_string() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v3/order")
                .query_param("symbol", "SANDUSDT")
                .query_param("orderId", "2194215")
                .query_param("recvWindow", "50000")
                .query_param("timestamp", "1749545309665")
                .query_param("nonce", "1749545309665123")
                .query_param("user", USER)
                .query_param("signer", SIGNER)
                .query_param(
                    "signature",
                    "0xf31401d7bee405dfc842d26bbfa0bd7caf53b3ce336247adee1a7fb1b335888e757327d921608bea894a7032101fdf41644bcf492635612b45ddffdc4ff6f3e51c",
                );
            then.status(200).body(r#"{"orderId":2194215}"#);
        })
        .await;

    let response = client(&server)
        .query_order(&selector())
        .await
        .expect("response");

    mock.assert_async().await;
    assert_eq!(response.method, Method::GET);
}

#[tokio::test]
async fn cancel_order_sends_form_body_with_delete() {
    let server = MockServer::start_async().await;
    let expected_body = concat!(
        "symbol=SANDUSDT&orderId=2194215&recvWindow=50000&timestamp=1749545309665",
        "&nonce=1749545309665123",
        "&user=0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "&signer=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "&signature=0xf31401d7bee405dfc842d26bbfa0bd7caf53b3ce336247adee1a7fb1b335888e757327d921608bea894a7032101fdf41644bcf492635612b45ddffdc4ff6f3e51c",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/fapi/v3/order").body(expected_body);
            then.status(200).body(r#"{"status":"CANCELED"}"#);
        })
        .await;

    client(&server)
        .cancel_order(&selector())
        .await
        .expect("response");

    mock.assert_async().await;
}

#[tokio::test]
async fn nested_params_are_sent_as_their_signed_json() {
    let server = MockServer::start_async().await;
    let expected_body = concat!(
        "symbol=SANDUSDT&price=0.325",
        "&orders=%5B%22%7B%5C%22symbol%5C%22%3A+%5C%22BTCUSDT%5C%22%2C+%5C%22quantity%5C%22%3A+%5C%222.5%5C%22%7D%22%2C+%22x%22%5D",
        "&meta=%7B%22note%22%3A+%22a+b%22%7D",
        "&recvWindow=50000&timestamp=1749545309665",
        "&nonce=1749545309665123",
        "&user=0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "&signer=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "&signature=0x54392f816e896260a3f5320890afe6c0f38a8d2ad2a0254ed748b3baf3b4288f3ea862be31341b6b5cc6f50c2f3bbca28925aa6ac4fbc310cec85d31b0094ff41b",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/fapi/v3/order")
                .header("content-type", "application/x-www-form-urlencoded")
                .header_exists("user-agent")
                .body(expected_body);
            then.status(200).body("{}");
        })
        .await;

    let params = ParameterSet::new()
        .with("symbol", "SANDUSDT")
        .with("price", 0.325)
        .with(
            "orders",
            vec![
                ParamValue::from(
                    ParameterSet::new()
                        .with("symbol", "BTCUSDT")
                        .with("quantity", 2.5),
                ),
                ParamValue::from("x"),
            ],
        )
        .with("meta", ParameterSet::new().with("note", "a b"));
    let response = client(&server)
        .send(Method::POST, "/fapi/v3/order", params)
        .await
        .expect("response");

    mock.assert_async().await;
    assert!(response.is_success(), "200 from mock");
}

#[tokio::test]
async fn close_position_posts_reduce_only_market_order() {
    let server = MockServer::start_async().await;
    let expected_body = concat!(
        "symbol=SANDUSDT&type=MARKET&side=SELL&quantity=30&reduceOnly=True",
        "&recvWindow=50000&timestamp=1749545309665",
        "&nonce=1749545309665123",
        "&user=0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "&signer=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "&signature=0xd8ccb715e1106a6c3f1b3c26c266f32df9f7d7da01825b52a8bf3e2a812c76cb4d32634c52a2ad3f307a5c7e99763efa7fea66db17d253b25ee0273fc811cfec1b",
    );
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/fapi/v3/order").body(expected_body);
            then.status(200).body(r#"{"status":"FILLED"}"#);
        })
        .await;

    client(&server)
        .close_position("SANDUSDT", Side::Sell, dec!(30))
        .await
        .expect("response");

    mock.assert_async().await;
}

#[tokio::test]
async fn history_reads_are_signed_gets() {
    let server = MockServer::start_async().await;
    let all_orders = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v3/allOrders")
                .query_param("symbol", "SANDUSDT")
                .query_param("limit", "50")
                .query_param("signer", SIGNER)
                .query_param_exists("signature");
            then.status(200).body("[]");
        })
        .await;
    let user_trades = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v3/userTrades")
                .query_param("symbol", "SANDUSDT")
                .query_param_missing("limit")
                .query_param_exists("signature");
            then.status(200).body("[]");
        })
        .await;

    let client = client(&server);
    client
        .all_orders("SANDUSDT", Some(50))
        .await
        .expect("all orders");
    client
        .user_trades("SANDUSDT", None)
        .await
        .expect("user trades");

    all_orders.assert_async().await;
    user_trades.assert_async().await;
}

#[tokio::test]
async fn market_data_reads_are_unsigned() {
    let server = MockServer::start_async().await;
    let ticker = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v1/ticker/24hr")
                .query_param("symbol", "SANDUSDT")
                .query_param_missing("timestamp")
                .query_param_missing("nonce")
                .query_param_missing("signature");
            then.status(200).body(r#"{"symbol":"SANDUSDT","lastPrice":"0.3250"}"#);
        })
        .await;
    let exchange_info = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v1/exchangeInfo")
                .query_param_missing("signature")
                .header_exists("user-agent");
            then.status(200).body(r#"{"symbols":[]}"#);
        })
        .await;

    let client = client(&server);
    let response = client
        .ticker_24hr(Some("SANDUSDT"))
        .await
        .expect("ticker");
    client.exchange_info().await.expect("exchange info");

    ticker.assert_async().await;
    exchange_info.assert_async().await;
    let body: serde_json::Value = response.json().expect("json body");
    assert_eq!(body["lastPrice"], "0.3250");
}

#[tokio::test]
async fn error_status_is_returned_raw() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/fapi/v3/positionRisk");
            then.status(400)
                .body(r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#);
        })
        .await;

    let response = client(&server)
        .position_risk(Some("SANDUSDT"))
        .await
        .expect("transport succeeded");

    mock.assert_async().await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("-1022"), "body passed through");
}

#[tokio::test]
async fn account_reads_are_signed_gets() {
    let server = MockServer::start_async().await;
    let balance = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v3/balance")
                .query_param("recvWindow", "50000")
                .query_param_exists("signature");
            then.status(200).body("[]");
        })
        .await;
    let open_orders = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fapi/v3/openOrders")
                .query_param_exists("signature");
            then.status(200).body("[]");
        })
        .await;

    let client = client(&server);
    client.balance().await.expect("balance");
    client.open_orders(None).await.expect("open orders");

    balance.assert_async().await;
    open_orders.assert_async().await;
}

#[tokio::test]
async fn unsupported_method_is_rejected_before_sending() {
    let server = MockServer::start_async().await;

    let err = client(&server)
        .send(Method::PUT, "/fapi/v3/order", ParameterSet::new())
        .await
        .expect_err("PUT is not supported");

    assert_eq!(err.kind(), Kind::Validation);
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let user = Address::from_str(USER).expect("user address");
    let key = PrivateKeySigner::from_str(PRIVATE_KEY).expect("private key");
    let host = Url::parse("http://127.0.0.1:1").expect("host");
    let client = FuturesClient::with_signer(host, RequestSigner::new(user, key), ReqwestClient::new());

    let err = client.balance().await.expect_err("nothing listens on port 1");

    assert_eq!(err.kind(), Kind::Transport);
}
