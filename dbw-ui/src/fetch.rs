//! Browser `Transport` built on `window.fetch`.

use anyhow::{anyhow, Context};
use dbw_api::server::API_PREFIX;
use dbw_api::Transport;
use log::{debug, warn};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

fn js_error(err: JsValue) -> anyhow::Error {
    anyhow!(
        "{}",
        err.as_string().unwrap_or_else(|| format!("{:?}", err))
    )
}

#[derive(Debug, Clone)]
pub struct FetchTransport {
    base_url: String,
}

impl FetchTransport {
    /// `base_url` may be empty to talk to the page's own origin.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, name)
    }

    fn request(&self, method: &str, url: &str, body: Option<&Value>) -> anyhow::Result<Request> {
        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            init.set_body(&JsValue::from_str(&body.to_string()));
        }
        let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
        if body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }
        Ok(request)
    }

    async fn send(&self, request: Request) -> anyhow::Result<Response> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        response.dyn_into::<Response>().map_err(js_error)
    }

    /// The server answers errors with a JSON body too; status alone is not
    /// an error.
    async fn read_json(&self, request: Request) -> anyhow::Result<Value> {
        let response = self.send(request).await?;
        let url = response.url();
        if !response.ok() {
            warn!("API {} returned status {}", url, response.status());
        }
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();
        serde_json::from_str(&text).with_context(|| {
            format!("API {} returned status {} with a non-JSON body", url, response.status())
        })
    }
}

impl Transport for FetchTransport {
    async fn get(&self, name: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let mut url = self.url(name);
        for (i, (key, value)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&String::from(js_sys::encode_uri_component(value)));
        }
        debug!("API GET {}", url);
        let request = self.request("GET", &url, None)?;
        self.read_json(request).await
    }

    async fn post(&self, name: &str, body: Value) -> anyhow::Result<Value> {
        let url = self.url(name);
        debug!("API POST {} {}", url, body);
        let request = self.request("POST", &url, Some(&body))?;
        self.read_json(request).await
    }

    async fn download(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.url(name);
        debug!("API download {}", url);
        let response = self.send(self.request("GET", &url, None)?).await?;
        if !response.ok() {
            return Err(anyhow!("API {} returned status {}", url, response.status()));
        }
        let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}
