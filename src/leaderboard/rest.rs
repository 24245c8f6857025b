//! Hosted table REST client (WASM only)

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::{LeaderboardClient, LeaderboardError, ScoreEntry};
use crate::config::LeaderboardConfig;

fn js_err(value: JsValue) -> LeaderboardError {
    LeaderboardError::Transport(format!("{:?}", value))
}

pub struct RestLeaderboard {
    config: LeaderboardConfig,
}

impl RestLeaderboard {
    pub fn new(config: LeaderboardConfig) -> Self {
        Self { config }
    }

    fn headers(&self) -> Result<Headers, LeaderboardError> {
        let headers = Headers::new().map_err(js_err)?;
        headers
            .set("apikey", &self.config.anon_key)
            .map_err(js_err)?;
        headers
            .set("Authorization", &format!("Bearer {}", self.config.anon_key))
            .map_err(js_err)?;
        Ok(headers)
    }

    async fn send(&self, url: &str, init: &RequestInit) -> Result<Response, LeaderboardError> {
        let request = Request::new_with_str_and_init(url, init).map_err(js_err)?;
        let window = web_sys::window()
            .ok_or_else(|| LeaderboardError::Transport("no window".to_string()))?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?;
        let response: Response = value.dyn_into().map_err(js_err)?;
        if !response.ok() {
            return Err(LeaderboardError::Status(response.status()));
        }
        Ok(response)
    }
}

impl LeaderboardClient for RestLeaderboard {
    async fn submit(&self, entry: &ScoreEntry) -> Result<(), LeaderboardError> {
        if !self.config.is_configured() {
            return Err(LeaderboardError::NotConfigured);
        }

        let body =
            serde_json::to_string(entry).map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        let headers = self.headers()?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_err)?;
        headers
            .set("Prefer", "return=representation")
            .map_err(js_err)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        self.send(&self.config.table_url(), &init).await?;
        Ok(())
    }

    async fn fetch_top(&self, n: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        if !self.config.is_configured() {
            return Err(LeaderboardError::NotConfigured);
        }

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_mode(RequestMode::Cors);
        init.set_headers(&self.headers()?);

        let response = self.send(&self.config.top_url(n), &init).await?;
        let text = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?
            .as_string()
            .ok_or_else(|| LeaderboardError::Decode("body is not text".to_string()))?;

        // Anything other than an array of rows reads as an empty board
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| LeaderboardError::Decode(e.to_string()))
    }
}
