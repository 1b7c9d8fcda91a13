//! Request modifiers: path, method, headers, query and body.
//!
//! Every modifier here is a thin request step appended through
//! [`NetworkClient::modify_request_with_configs`].

use super::NetworkClient;
use crate::codec::ContentSerializer;
use crate::config::Configs;
use crate::error::{NetError, Result};
use crate::protocol::HeaderMode;
use crate::types::{Bytes, ContentType, HttpMethod, HttpRequest};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

impl NetworkClient {
    /// Append path segments.
    ///
    /// The component is split on `/` and each non-empty part is appended as one
    /// percent-encoded segment, so `path("store/order")` adds two segments.
    #[must_use]
    pub fn path(&self, component: impl ToString) -> Self {
        let component = component.to_string();
        self.modify_request(move |request| append_path(request, &component))
    }

    /// Append several path components in order.
    #[must_use]
    pub fn paths<I>(&self, components: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        components
            .into_iter()
            .fold(self.clone(), |client, component| client.path(component))
    }

    /// Overwrite the method.
    #[must_use]
    pub fn method(&self, method: impl Into<HttpMethod>) -> Self {
        let method = method.into();
        self.modify_request(move |request| {
            request.method = method.clone();
            Ok(())
        })
    }

    /// `GET`
    #[must_use]
    pub fn get(&self) -> Self {
        self.method(HttpMethod::GET)
    }

    /// `POST`
    #[must_use]
    pub fn post(&self) -> Self {
        self.method(HttpMethod::POST)
    }

    /// `PUT`
    #[must_use]
    pub fn put(&self) -> Self {
        self.method(HttpMethod::PUT)
    }

    /// `PATCH`
    #[must_use]
    pub fn patch(&self) -> Self {
        self.method(HttpMethod::PATCH)
    }

    /// `DELETE`
    #[must_use]
    pub fn delete(&self) -> Self {
        self.method(HttpMethod::DELETE)
    }

    /// Write a header with an explicit [`HeaderMode`].
    #[must_use]
    pub fn header_with_mode(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        mode: HeaderMode,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        self.modify_request(move |request| request.set_header(&name, &value, mode))
    }

    /// Set a header, replacing earlier values.
    #[must_use]
    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_with_mode(name, value, HeaderMode::Set)
    }

    /// Append a header value, keeping earlier ones.
    #[must_use]
    pub fn add_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_with_mode(name, value, HeaderMode::Add)
    }

    /// Set several headers.
    #[must_use]
    pub fn headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self.clone(), |client, (name, value)| client.header(name, value))
    }

    /// Set `Content-Type`.
    #[must_use]
    pub fn content_type(&self, content_type: ContentType) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type.to_string())
    }

    /// Set `Authorization` directly, bypassing the auth switch.
    #[must_use]
    pub fn authorization(&self, value: impl Into<String>) -> Self {
        self.header(AUTHORIZATION.as_str(), value)
    }

    /// Append query items from a serializable value.
    ///
    /// The value is flattened by the snapshot's query encoder at
    /// materialization time; the default encoder emits object keys sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use netclient::NetworkClient;
    /// use serde_json::json;
    ///
    /// let client = NetworkClient::new("https://example.com/search")
    ///     .query(json!({"b": 1, "a": 2}));
    /// assert_eq!(client.request().unwrap().url.query(), Some("a=2&b=1"));
    /// ```
    #[must_use]
    pub fn query<T>(&self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.modify_request_with_configs(move |request, configs| {
            let value = serde_json::to_value(&value).map_err(NetError::encode)?;
            let items = configs.query_encoder().encode(&value)?;
            append_query(request, items);
            Ok(())
        })
    }

    /// Append one query item. A `None` value appends nothing.
    #[must_use]
    pub fn query_item<V: ToString>(&self, name: impl Into<String>, value: Option<V>) -> Self {
        let name = name.into();
        let value = value.map(|v| v.to_string());
        self.modify_request(move |request| {
            if let Some(value) = &value {
                append_query(request, vec![(name.clone(), value.clone())]);
            }
            Ok(())
        })
    }

    /// Append query items sorted by name.
    ///
    /// Items sharing a name keep their relative order, so map and list inputs
    /// both produce the same query on every run.
    #[must_use]
    pub fn query_items<I, K, V>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut items: Vec<(String, String)> = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        self.modify_request(move |request| {
            append_query(request, items.clone());
            Ok(())
        })
    }

    /// Set the body through an explicit content serializer.
    ///
    /// Replaces any earlier body and, when the serializer reports one, the
    /// `Content-Type` header.
    #[must_use]
    pub fn body_with<T>(&self, value: T, serializer: ContentSerializer<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.modify_request_with_configs(move |request, configs| {
            let (body, content_type) = serializer.serialize(&value, configs)?;
            request.body = Some(body);
            if let Some(content_type) = content_type {
                request.set_header(
                    CONTENT_TYPE.as_str(),
                    &content_type.to_string(),
                    HeaderMode::Set,
                )?;
            }
            Ok(())
        })
    }

    /// Set the body with the snapshot's body encoder (JSON by default).
    #[must_use]
    pub fn body<T>(&self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.body_with(value, ContentSerializer::encodable())
    }

    /// Set an untyped JSON body.
    #[must_use]
    pub fn body_json(&self, value: Value) -> Self {
        self.body_with(value, ContentSerializer::json())
    }

    /// Set raw body bytes. `Content-Type` is left as is.
    #[must_use]
    pub fn body_bytes(&self, bytes: impl Into<Bytes>) -> Self {
        self.body_with(bytes.into(), ContentSerializer::bytes())
    }

    /// Set a `text/plain` body.
    #[must_use]
    pub fn body_text(&self, text: impl Into<String>) -> Self {
        self.body_with(text.into(), ContentSerializer::text())
    }

    /// Set a form-urlencoded body.
    #[must_use]
    pub fn body_form<T>(&self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.body_with(value, ContentSerializer::form())
    }

    /// Replace the body with one computed from the snapshot at
    /// materialization time.
    #[must_use]
    pub fn body_fn<F>(&self, body: F) -> Self
    where
        F: Fn(&Configs) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.modify_request_with_configs(move |request, configs| {
            request.body = Some(body(configs)?);
            Ok(())
        })
    }
}

fn append_path(request: &mut HttpRequest, component: &str) -> Result<()> {
    let url = request.url.to_string();
    let mut segments = request.url.path_segments_mut().map_err(|_| {
        NetError::RequestCreationFailed(format!("cannot append a path to {}", url).into())
    })?;
    segments.pop_if_empty();
    for part in component.split('/').filter(|part| !part.is_empty()) {
        segments.push(part);
    }
    Ok(())
}

fn append_query(request: &mut HttpRequest, items: Vec<(String, String)>) {
    if items.is_empty() {
        return;
    }
    let mut pairs = request.url.query_pairs_mut();
    for (name, value) in &items {
        pairs.append_pair(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ArrayEncoding, QueryEncoderKey, UrlQueryEncoder};
    use crate::config::LevelFilter;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn client() -> NetworkClient {
        NetworkClient::new("https://example.com/api/")
    }

    #[test]
    fn test_path_segments() {
        let request = client().path("store/order").path(7).request().unwrap();
        assert_eq!(request.url.path(), "/api/store/order/7");
    }

    #[test]
    fn test_path_is_percent_encoded() {
        let request = client().path("a b").request().unwrap();
        assert_eq!(request.url.path(), "/api/a%20b");
    }

    #[test]
    fn test_paths() {
        let request = client().paths(["pet", "1"]).request().unwrap();
        assert_eq!(request.url.path(), "/api/pet/1");
    }

    #[test]
    fn test_method_overwrite() {
        let request = client().post().put().request().unwrap();
        assert_eq!(request.method, HttpMethod::PUT);
        let request = client().method("purge").request().unwrap();
        assert_eq!(request.method.as_str(), "PURGE");
    }

    #[test]
    fn test_header_modes() {
        let request = client()
            .add_header("Accept", "text/html")
            .add_header("Accept", "application/json")
            .request()
            .unwrap();
        assert_eq!(request.headers.get_all("accept").iter().count(), 2);

        let request = client()
            .add_header("Accept", "text/html")
            .header("Accept", "*/*")
            .request()
            .unwrap();
        let values: Vec<_> = request.headers.get_all("accept").iter().collect();
        assert_eq!(values, vec!["*/*"]);
    }

    #[test]
    fn test_invalid_header_fails_materialization() {
        let result = client().header("bad name", "x").request();
        assert!(matches!(result, Err(NetError::RequestCreationFailed(_))));
    }

    #[test]
    fn test_query_deterministic() {
        let client = client().query(json!({"b": 1, "a": 2}));
        let first = client.request().unwrap();
        let second = client.request().unwrap();
        assert_eq!(first.url.query(), Some("a=2&b=1"));
        assert_eq!(first.url.as_str(), second.url.as_str());
    }

    #[test]
    fn test_query_uses_snapshot_encoder() {
        let encoder = UrlQueryEncoder {
            arrays: ArrayEncoding::RepeatedKey,
            ..Default::default()
        };
        let request = client()
            .query(json!({"tag": ["x", "y"]}))
            .config::<QueryEncoderKey>(Arc::new(encoder))
            .request()
            .unwrap();
        assert_eq!(request.url.query(), Some("tag=x&tag=y"));
    }

    #[test]
    fn test_query_item() {
        let request = client()
            .query_item("limit", Some(10))
            .query_item::<u32>("offset", None)
            .request()
            .unwrap();
        assert_eq!(request.url.query(), Some("limit=10"));
    }

    #[test]
    fn test_query_items_sorted_from_map() {
        let items: HashMap<String, u32> = (1..=20).map(|i| (format!("k{:02}", i), i)).collect();
        let client = client().query_items(items);
        let query = client.request().unwrap().url.query().map(str::to_string);
        let expected: Vec<String> = (1..=20).map(|i| format!("k{:02}={}", i, i)).collect();
        assert_eq!(query, Some(expected.join("&")));
        assert_eq!(client.request().unwrap().url.query().map(str::to_string), query);
    }

    #[test]
    fn test_query_items_keep_order_within_name() {
        let request = client()
            .query_items([("tag", "b"), ("id", "1"), ("tag", "a")])
            .request()
            .unwrap();
        assert_eq!(request.url.query(), Some("id=1&tag=b&tag=a"));
    }

    #[test]
    fn test_empty_query_leaves_url_clean() {
        let request = client().query(json!({})).request().unwrap();
        assert_eq!(request.url.query(), None);
    }

    #[test]
    fn test_body_json_sets_content_type() {
        let request = client().body(json!({"name": "Rex"})).request().unwrap();
        assert_eq!(request.body.as_deref(), Some(&br#"{"name":"Rex"}"#[..]));
        assert_eq!(request.content_type(), Some(ContentType::json()));
    }

    #[test]
    fn test_body_replaces_previous() {
        let request = client()
            .body_text("first")
            .body_form(json!({"a": 1}))
            .request()
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(&b"a=1"[..]));
        assert_eq!(request.content_type(), Some(ContentType::form_url_encoded()));
    }

    #[test]
    fn test_body_fn_reads_snapshot() {
        let request = client()
            .body_fn(|configs| {
                let verbose = configs.log_level() == LevelFilter::DEBUG;
                Ok(Bytes::from(if verbose { "verbose" } else { "quiet" }))
            })
            .log_level(LevelFilter::DEBUG)
            .request()
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(&b"verbose"[..]));
    }

    #[test]
    fn test_body_bytes_keeps_content_type() {
        let request = client()
            .content_type(ContentType::octet_stream())
            .body_bytes(vec![1_u8, 2, 3])
            .request()
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(&[1_u8, 2, 3][..]));
        assert_eq!(request.content_type(), Some(ContentType::octet_stream()));
    }
}
