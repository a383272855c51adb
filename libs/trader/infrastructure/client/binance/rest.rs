//! Signed REST client for the Binance-style spot API.

use super::types::*;
use crate::domain::{
    AccountSnapshot, Balance, CancelAck, Candlestick, CandleInterval, OpenOrder, OrderAck,
    OrderRequest, OrderType, RulesSnapshot, SymbolPrice, Ticker24h,
};
use crate::infrastructure::client::{ExchangeError, ExchangeResult};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl RestClient {
    pub(crate) fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn map_transport(e: reqwest::Error) -> ExchangeError {
        if e.is_timeout() {
            ExchangeError::Timeout
        } else {
            ExchangeError::Transport(e.to_string())
        }
    }

    /// Turn a non-2xx response into the exchange's numeric rejection
    /// when the body carries one.
    async fn check_status(response: Response) -> ExchangeResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(err) = serde_json::from_str::<ApiErrorBody>(&body) {
            return Err(ExchangeError::Rejected {
                code: err.code,
                message: err.msg,
            });
        }
        Err(ExchangeError::Transport(format!(
            "HTTP {}: {}",
            status, body
        )))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> ExchangeResult<T> {
        let body = response.text().await.map_err(Self::map_transport)?;
        serde_json::from_str(&body).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }

    /// Public (unsigned) request.
    async fn public<T: DeserializeOwned>(&self, path: &str, query: &str) -> ExchangeResult<T> {
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };
        debug!("[rest] GET {}", url);
        let response = self.http.get(&url).send().await.map_err(Self::map_transport)?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Signed request; appends timestamp and signature.
    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &str,
    ) -> ExchangeResult<T> {
        let timestamp = Utc::now().timestamp_millis();
        let query = if query.is_empty() {
            format!("timestamp={}", timestamp)
        } else {
            format!("{}&timestamp={}", query, timestamp)
        };
        let signature = self.sign(&query);
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query, signature
        );
        debug!("[rest] {} {}{}", method, self.base_url, path);
        let response = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(Self::map_transport)?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Request authenticated by API key only (listen-key lifecycle).
    async fn keyed(&self, method: Method, path: &str, query: &str) -> ExchangeResult<Response> {
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };
        let response = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(Self::map_transport)?;
        Self::check_status(response).await
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    pub(crate) async fn exchange_info(&self) -> ExchangeResult<RulesSnapshot> {
        let info: ExchangeInfoResponse = self.public("/api/v3/exchangeInfo", "").await?;
        let rules = info.symbols.into_iter().map(SymbolInfo::into_rules).collect();
        Ok(RulesSnapshot::new(rules, Utc::now()))
    }

    pub(crate) async fn account(&self) -> ExchangeResult<AccountSnapshot> {
        let account: AccountResponse = self.signed(Method::GET, "/api/v3/account", "").await?;
        let balances: Vec<Balance> = account.balances.into_iter().map(Balance::from).collect();
        Ok(AccountSnapshot::new(balances, Utc::now()))
    }

    pub(crate) async fn prices(&self) -> ExchangeResult<Vec<SymbolPrice>> {
        let rows: Vec<PriceRow> = self.public("/api/v3/ticker/price", "").await?;
        Ok(rows.into_iter().map(SymbolPrice::from).collect())
    }

    pub(crate) async fn ticker_24h(&self, symbol: &str) -> ExchangeResult<Ticker24h> {
        let query = format!("symbol={}", symbol);
        let row: Ticker24hResponse = self.public("/api/v3/ticker/24hr", &query).await?;
        Ok(row.into())
    }

    pub(crate) async fn open_orders(&self) -> ExchangeResult<Vec<OpenOrder>> {
        let rows: Vec<OpenOrderRow> = self.signed(Method::GET, "/api/v3/openOrders", "").await?;
        Ok(rows
            .into_iter()
            .filter_map(OpenOrderRow::into_open_order)
            .collect())
    }

    pub(crate) async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<OrderAck> {
        let mut query = format!(
            "symbol={}&side={}&type={}&quantity={}",
            request.symbol,
            request.side.as_str(),
            request.order_type.as_str(),
            request.quantity,
        );
        if request.order_type == OrderType::Limit {
            query.push_str(&format!(
                "&timeInForce={}&price={}",
                request.time_in_force.as_str(),
                request.price
            ));
        }
        query.push_str("&newOrderRespType=RESULT");

        let ack: OrderAckResponse = self.signed(Method::POST, "/api/v3/order", &query).await?;
        ack.into_ack()
            .ok_or_else(|| ExchangeError::Malformed("unknown order status in ack".to_string()))
    }

    pub(crate) async fn cancel_order(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> ExchangeResult<CancelAck> {
        let query = format!("symbol={}&orderId={}", symbol, order_id);
        let ack: CancelAckResponse = self.signed(Method::DELETE, "/api/v3/order", &query).await?;
        Ok(ack.into())
    }

    pub(crate) async fn klines(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ExchangeResult<Vec<Candlestick>> {
        let query = format!(
            "symbol={}&interval={}&startTime={}&endTime={}",
            symbol,
            interval.as_str(),
            start.timestamp_millis(),
            end.timestamp_millis()
        );
        let rows: Vec<Vec<serde_json::Value>> = self.public("/api/v3/klines", &query).await?;
        Ok(rows.iter().filter_map(|row| kline_to_candle(row)).collect())
    }

    pub(crate) async fn create_listen_key(&self) -> ExchangeResult<String> {
        let response = self
            .keyed(Method::POST, "/api/v3/userDataStream", "")
            .await?;
        let key: ListenKeyResponse = Self::parse_json(response).await?;
        Ok(key.listen_key)
    }

    pub(crate) async fn keepalive_listen_key(&self, listen_key: &str) -> ExchangeResult<()> {
        let query = format!("listenKey={}", listen_key);
        self.keyed(Method::PUT, "/api/v3/userDataStream", &query)
            .await?;
        Ok(())
    }

    pub(crate) async fn close_listen_key(&self, listen_key: &str) -> ExchangeResult<()> {
        let query = format!("listenKey={}", listen_key);
        self.keyed(Method::DELETE, "/api/v3/userDataStream", &query)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_hex() {
        let client = RestClient::new("https://api.example.com", "key", "secret");
        let a = client.sign("symbol=ETHUSDT&timestamp=1");
        let b = client.sign("symbol=ETHUSDT&timestamp=1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
