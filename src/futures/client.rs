use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Request};
use url::Url;

use crate::error::Error;
use crate::futures::{FuturesConfig, NewOrderRequest, OrderSelector, Side};
use crate::signing::{ParameterSet, RequestSigner, SignedRequest, canonical};
use crate::types::Decimal;
use crate::{RawResponse, Result};

const ORDER: &str = "fapi/v3/order";
const OPEN_ORDERS: &str = "fapi/v3/openOrders";
const BALANCE: &str = "fapi/v3/balance";
const POSITION_RISK: &str = "fapi/v3/positionRisk";
const ALL_ORDERS: &str = "fapi/v3/allOrders";
const USER_TRADES: &str = "fapi/v3/userTrades";

const TICKER_24HR: &str = "fapi/v1/ticker/24hr";
const EXCHANGE_INFO: &str = "fapi/v1/exchangeInfo";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Signed REST client for the futures v3 endpoints.
///
/// Every call signs with a fresh nonce and performs exactly one HTTP request;
/// nothing is retried.
#[derive(Clone, Debug)]
pub struct FuturesClient {
    host: Url,
    signer: RequestSigner,
    client: ReqwestClient,
}

impl FuturesClient {
    pub fn new(config: FuturesConfig) -> Result<Self> {
        Self::with_client(config, ReqwestClient::new())
    }

    /// Creates a client with a custom HTTP client, e.g. one with a timeout.
    pub fn with_client(config: FuturesConfig, client: ReqwestClient) -> Result<Self> {
        let signer = config.request_signer()?;
        Ok(Self::with_signer(config.host, signer, client))
    }

    #[must_use]
    pub fn with_signer(host: Url, signer: RequestSigner, client: ReqwestClient) -> Self {
        Self {
            host,
            signer,
            client,
        }
    }

    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    pub async fn place_order(&self, order: &NewOrderRequest) -> Result<RawResponse> {
        self.send(Method::POST, ORDER, order.to_params()?).await
    }

    /// Closes `quantity` of a position with a reduce-only market order on the
    /// closing `side`.
    pub async fn close_position(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<RawResponse> {
        let order = NewOrderRequest::close_position(symbol, side, quantity);
        self.place_order(&order).await
    }

    pub async fn query_order(&self, selector: &OrderSelector) -> Result<RawResponse> {
        self.send(Method::GET, ORDER, selector.to_params()?).await
    }

    pub async fn cancel_order(&self, selector: &OrderSelector) -> Result<RawResponse> {
        self.send(Method::DELETE, ORDER, selector.to_params()?).await
    }

    /// Open orders, optionally limited to one symbol.
    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<RawResponse> {
        let params = ParameterSet::new().with("symbol", symbol);
        self.send(Method::GET, OPEN_ORDERS, params).await
    }

    pub async fn balance(&self) -> Result<RawResponse> {
        self.send(Method::GET, BALANCE, ParameterSet::new()).await
    }

    pub async fn position_risk(&self, symbol: Option<&str>) -> Result<RawResponse> {
        let params = ParameterSet::new().with("symbol", symbol);
        self.send(Method::GET, POSITION_RISK, params).await
    }

    /// Order history for `symbol`, newest last.
    pub async fn all_orders(&self, symbol: &str, limit: Option<u32>) -> Result<RawResponse> {
        let params = ParameterSet::new()
            .with("symbol", symbol)
            .with("limit", limit);
        self.send(Method::GET, ALL_ORDERS, params).await
    }

    pub async fn user_trades(&self, symbol: &str, limit: Option<u32>) -> Result<RawResponse> {
        let params = ParameterSet::new()
            .with("symbol", symbol)
            .with("limit", limit);
        self.send(Method::GET, USER_TRADES, params).await
    }

    /// 24h price statistics; all symbols when `symbol` is `None`. Unsigned.
    pub async fn ticker_24hr(&self, symbol: Option<&str>) -> Result<RawResponse> {
        let params = ParameterSet::new().with("symbol", symbol);
        self.send_public(TICKER_24HR, params).await
    }

    /// Trading rules and symbol list. Unsigned.
    pub async fn exchange_info(&self) -> Result<RawResponse> {
        self.send_public(EXCHANGE_INFO, ParameterSet::new()).await
    }

    /// Signs `params` and sends them to `path`.
    ///
    /// `GET` carries the fields in the query string; `POST` and `DELETE`
    /// send them as a url-encoded form body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: ParameterSet,
    ) -> Result<RawResponse> {
        let nonce = self.signer.next_nonce()?;
        let signed = self.signer.sign(params, nonce)?;
        let (request, headers) = self.build_request(method, path, &signed)?;

        crate::request(&self.client, request, headers).await
    }

    /// Sends a market-data `GET` without auth fields. Null values are dropped.
    async fn send_public(&self, path: &str, mut params: ParameterSet) -> Result<RawResponse> {
        params.drop_nulls();
        let mut url = self.endpoint(path)?;
        if !params.is_empty() {
            let pairs = params
                .iter()
                .map(|(key, value)| Ok((key.to_owned(), canonical::stringify(value)?)))
                .collect::<Result<Vec<_>>>()?;
            url.set_query(Some(&serde_html_form::to_string(pairs)?));
        }
        let request = self.client.request(Method::GET, url).build()?;

        crate::request(&self.client, request, None).await
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        signed: &SignedRequest,
    ) -> Result<(Request, Option<HeaderMap>)> {
        let mut url = self.endpoint(path)?;
        let form = serde_html_form::to_string(signed.form_pairs()?)?;

        if method == Method::GET {
            url.set_query(Some(&form));
            let request = self.client.request(method, url).build()?;
            return Ok((request, None));
        }
        if method != Method::POST && method != Method::DELETE {
            return Err(Error::validation(format!(
                "unsupported method {method} for {path}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
        let request = self.client.request(method, url).body(form).build()?;
        Ok((request, Some(headers)))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.host.join(path.trim_start_matches('/'))?)
    }
}
