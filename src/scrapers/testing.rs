use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{FetchMetadata, FetchOptions, FetchResult};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

enum Scripted {
    Page(FetchResult),
    Raise(String),
}

/// One recorded call to the fetcher
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    pub options: FetchOptions,
}

/// Page fetcher double that replays queued responses per URL and records every call.
/// A URL with nothing left in its queue raises.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, page: FetchResult) -> Self {
        self.push(url, Scripted::Page(page))
    }

    pub fn raise(self, url: &str, message: &str) -> Self {
        self.push(url, Scripted::Raise(message.to_string()))
    }

    fn push(mut self, url: &str, scripted: Scripted) -> Self {
        self.scripts
            .get_mut()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResult> {
        self.calls.lock().unwrap().push(FetchCall {
            url: url.to_string(),
            options: options.clone(),
        });

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Raise(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted response for {}", url)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "Scripted"
    }
}

/// Successful page with the given text, resolved to `source_url`
pub fn page(markdown: &str, source_url: &str, title: &str) -> FetchResult {
    FetchResult {
        success: true,
        markdown: markdown.to_string(),
        html: String::new(),
        metadata: FetchMetadata {
            status_code: Some(200),
            source_url: Some(source_url.to_string()),
            title: Some(title.to_string()),
            ..FetchMetadata::default()
        },
        error: None,
    }
}

/// Page answered with the given status code
pub fn status(code: u16) -> FetchResult {
    FetchResult {
        success: true,
        markdown: "Access denied".to_string(),
        metadata: FetchMetadata {
            status_code: Some(code),
            ..FetchMetadata::default()
        },
        ..FetchResult::default()
    }
}

/// Fetcher-reported failure
pub fn failed() -> FetchResult {
    FetchResult {
        success: false,
        error: Some("scrape failed".to_string()),
        ..FetchResult::default()
    }
}
