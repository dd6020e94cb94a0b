#![allow(dead_code)]

use axum::Router;
use axum::http::{StatusCode, Uri};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use arabic_translator_rust::settings::Settings;

/// What a mock endpoint saw: how many requests, and each request's URI and body.
#[derive(Clone, Default)]
pub struct Hits {
    count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl Hits {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn uris(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }
}

pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Answers every request with `status` and `body`, counting hits. Requests whose URI
/// contains `slow` are held for `delay` first.
pub async fn mock_with_delay(status: StatusCode, body: &str, delay: Duration) -> (String, Hits) {
    let hits = Hits::default();
    let recorded = hits.clone();
    let body = body.to_string();
    let app = Router::new().fallback(move |uri: Uri, request_body: String| {
        let recorded = recorded.clone();
        let body = body.clone();
        async move {
            recorded.count.fetch_add(1, Ordering::SeqCst);
            recorded
                .requests
                .lock()
                .unwrap()
                .push((uri.to_string(), request_body));
            if uri.to_string().contains("slow") {
                tokio::time::sleep(delay).await;
            }
            (status, [("content-type", "application/json")], body)
        }
    });
    (serve(app).await, hits)
}

pub async fn mock(status: StatusCode, body: &str) -> (String, Hits) {
    mock_with_delay(status, body, Duration::ZERO).await
}

/// An address nothing listens on.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Default settings with no translation backends configured.
pub fn offline_settings() -> Settings {
    let mut settings = Settings::default();
    settings.providers.lingva_url = String::new();
    settings.providers.mymemory_url = String::new();
    settings.providers.libretranslate_urls = Vec::new();
    settings
}

pub fn chain_settings(lingva: &str, mymemory: &str, libretranslate: &[String]) -> Settings {
    let mut settings = Settings::default();
    settings.providers.timeout_seconds = 5;
    settings.providers.lingva_url = lingva.to_string();
    settings.providers.mymemory_url = mymemory.to_string();
    settings.providers.libretranslate_urls = libretranslate.to_vec();
    settings
}
