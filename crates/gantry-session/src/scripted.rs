//! In-memory `Session` backed by a fixture description of the site.
//!
//! This is not a browser engine; it is the test double behind the
//! [`Session`](crate::Session) seam. Pages, elements, and the network
//! exchanges a click produces are all declared up front, which is enough
//! to drive bindings, page objects, and the interception ledger end to end.

use crate::intercept::{Exchange, InterceptionLedger};
use crate::session::{ElementSnapshot, Session};
use crate::{Result, SessionError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFixture {
    pub pages: Vec<PageFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFixture {
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub elements: Vec<ElementFixture>,
    #[serde(default)]
    pub click_routes: Vec<ClickRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementFixture {
    pub selector: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Network traffic a click on `selector` produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRoute {
    pub selector: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl SiteFixture {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| SessionError::Transport(format!("invalid site fixture: {e}")))
    }

    /// The built-in demo site: a home page with a search input and a button
    /// that fetches comments, plus login and products pages.
    pub fn demo() -> Self {
        Self {
            pages: vec![
                PageFixture {
                    path: "/".to_string(),
                    title: "Cypi Storefront".to_string(),
                    elements: vec![
                        ElementFixture {
                            selector: "#mongo".to_string(),
                            tag: "input".to_string(),
                            text: String::new(),
                            attributes: HashMap::from([
                                ("id".to_string(), "mongo".to_string()),
                                ("placeholder".to_string(), "Search".to_string()),
                            ]),
                        },
                        ElementFixture {
                            selector: "button[class=send-me]".to_string(),
                            tag: "button".to_string(),
                            text: "Send me".to_string(),
                            attributes: HashMap::from([(
                                "class".to_string(),
                                "send-me".to_string(),
                            )]),
                        },
                    ],
                    click_routes: vec![ClickRoute {
                        selector: "button[class=send-me]".to_string(),
                        method: "GET".to_string(),
                        url: "http://localhost:3000/comments".to_string(),
                        status: 200,
                        body: json!([{ "id": 1, "body": "some comment", "postId": 1 }]),
                    }],
                },
                PageFixture {
                    path: "/login".to_string(),
                    title: "Cypi Login".to_string(),
                    elements: vec![ElementFixture {
                        selector: "#username".to_string(),
                        tag: "input".to_string(),
                        text: String::new(),
                        attributes: HashMap::from([("id".to_string(), "username".to_string())]),
                    }],
                    click_routes: Vec::new(),
                },
                PageFixture {
                    path: "/products".to_string(),
                    title: "Cypi Products".to_string(),
                    elements: Vec::new(),
                    click_routes: Vec::new(),
                },
            ],
        }
    }
}

struct DocumentState {
    site: SiteFixture,
    current: Option<usize>,
}

/// Fixture-driven session. Exchanges a click produces are pushed into the
/// ledger in declaration order, which is the transport order waits observe.
pub struct ScriptedSession {
    state: Mutex<DocumentState>,
    ledger: Arc<InterceptionLedger>,
}

impl ScriptedSession {
    pub fn new(site: SiteFixture, ledger: Arc<InterceptionLedger>) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                site,
                current: None,
            }),
            ledger,
        }
    }

    fn page_path(url: &str) -> &str {
        let without_scheme = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url);
        match without_scheme.find('/') {
            Some(idx) if url.contains("://") => &without_scheme[idx..],
            _ if url.contains("://") => "/",
            _ => url,
        }
    }

    fn find_element<'a>(page: &'a PageFixture, selector: &str) -> Option<&'a ElementFixture> {
        page.elements.iter().find(|el| {
            if el.selector == selector || el.tag == selector {
                return true;
            }
            selector
                .strip_prefix('#')
                .is_some_and(|id| el.attributes.get("id").is_some_and(|v| v == id))
        })
    }

    fn find_element_mut<'a>(
        page: &'a mut PageFixture,
        selector: &str,
    ) -> Option<&'a mut ElementFixture> {
        page.elements.iter_mut().find(|el| {
            if el.selector == selector || el.tag == selector {
                return true;
            }
            selector
                .strip_prefix('#')
                .is_some_and(|id| el.attributes.get("id").is_some_and(|v| v == id))
        })
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn visit(&self, url: &str) -> Result<()> {
        let path = Self::page_path(url);
        let normalized = if path.is_empty() { "/" } else { path };
        let mut state = self.state.lock().await;
        let index = state
            .site
            .pages
            .iter()
            .position(|p| p.path == normalized)
            .ok_or_else(|| SessionError::Navigation(format!("no route serves {url}")))?;
        state.current = Some(index);
        tracing::debug!(url, path = normalized, "scripted navigation");
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().await;
        let index = state
            .current
            .ok_or_else(|| SessionError::Navigation("no page loaded".to_string()))?;
        Ok(state.site.pages[index].title.clone())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        let state = self.state.lock().await;
        let index = state
            .current
            .ok_or_else(|| SessionError::Navigation("no page loaded".to_string()))?;
        let page = &state.site.pages[index];
        Ok(Self::find_element(page, selector).map(|el| ElementSnapshot {
            selector: el.selector.clone(),
            tag: el.tag.clone(),
            text: el.text.clone(),
            attributes: el.attributes.clone(),
        }))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let routes = {
            let state = self.state.lock().await;
            let index = state
                .current
                .ok_or_else(|| SessionError::Navigation("no page loaded".to_string()))?;
            let page = &state.site.pages[index];
            if Self::find_element(page, selector).is_none() {
                return Err(SessionError::ElementNotFound(selector.to_string()));
            }
            page.click_routes
                .iter()
                .filter(|r| r.selector == selector)
                .cloned()
                .collect::<Vec<_>>()
        };
        for route in routes {
            let exchange = Exchange::new(&route.method, &route.url, route.status, route.body);
            tracing::debug!(selector, url = %exchange.url, "click produced exchange");
            self.ledger.observe(exchange).await;
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = state
            .current
            .ok_or_else(|| SessionError::Navigation("no page loaded".to_string()))?;
        let page = &mut state.site.pages[index];
        let element = Self::find_element_mut(page, selector)
            .ok_or_else(|| SessionError::ElementNotFound(selector.to_string()))?;
        element
            .attributes
            .insert("value".to_string(), text.to_string());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let state = self.state.lock().await;
        let mut out = String::new();
        match state.current {
            Some(index) => {
                let page = &state.site.pages[index];
                out.push_str(&format!("page: {}\ntitle: {}\n", page.path, page.title));
                for el in &page.elements {
                    out.push_str(&format!(
                        "  {} [{}] {:?} {:?}\n",
                        el.selector, el.tag, el.text, el.attributes
                    ));
                }
            }
            None => out.push_str("no page loaded\n"),
        }
        Ok(out.into_bytes())
    }
}
