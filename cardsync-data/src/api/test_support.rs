//! Test doubles for the provider session.
//!
//! [`ScriptedExchange`] answers requests from a queue of canned responses
//! (or a responder closure) and records every request it sees.
//! [`RecordingSleeper`] records waits instead of blocking. Both are cheap
//! handles over shared state, so a test keeps one clone for assertions and
//! hands the other to the code under test.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use cardsync_core::{Identifier, RawRecord};
use serde_json::{Value, json};

use super::error::TransportError;
use super::exchange::{ApiRequest, ApiResponse, HttpExchange, Sleeper};

type Outcome = Result<ApiResponse, TransportError>;
type Responder = Box<dyn FnMut(&ApiRequest) -> Outcome>;

#[derive(Default)]
struct Script {
    queued: VecDeque<Outcome>,
    fallback: Option<Outcome>,
    responder: Option<Responder>,
    requests: Vec<ApiRequest>,
}

/// Scripted [`HttpExchange`] for tests.
///
/// Queued outcomes are consumed first, then the responder or the repeated
/// fallback. With nothing left to answer it fails with
/// [`TransportError::Other`].
///
/// # Example
///
/// ```
/// use cardsync_data::api::test_support::ScriptedExchange;
/// use cardsync_data::api::{ApiRequest, HttpExchange};
/// use serde_json::json;
/// use url::Url;
///
/// let exchange = ScriptedExchange::new().respond_json(200, json!({"ok": true}));
/// let url = Url::parse("https://api.example.test/sets").expect("valid URL");
/// let response = exchange.send(&ApiRequest::get(url)).expect("scripted response");
/// assert_eq!(response.status, 200);
/// assert_eq!(exchange.request_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ScriptedExchange {
    script: Rc<RefCell<Script>>,
}

impl std::fmt::Debug for ScriptedExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let script = self.script.borrow();
        f.debug_struct("ScriptedExchange")
            .field("queued", &script.queued.len())
            .field("requests", &script.requests.len())
            .finish_non_exhaustive()
    }
}

impl ScriptedExchange {
    /// An exchange with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, outcome: Outcome) -> Self {
        self.script.borrow_mut().queued.push_back(outcome);
        self
    }

    /// Queue a JSON response.
    #[must_use]
    pub fn respond_json(self, status: u16, body: impl Into<Value>) -> Self {
        self.push(Ok(json_response(status, &body.into())))
    }

    /// Queue a response with an empty body.
    #[must_use]
    pub fn respond_status(self, status: u16) -> Self {
        self.respond_raw(status, Vec::new())
    }

    /// Queue a response with a raw body.
    #[must_use]
    pub fn respond_raw(self, status: u16, body: Vec<u8>) -> Self {
        self.push(Ok(ApiResponse {
            status,
            retry_after: None,
            body,
        }))
    }

    /// Queue an HTTP 429 carrying `Retry-After`.
    #[must_use]
    pub fn respond_rate_limited(self, retry_after: Duration) -> Self {
        self.push(Ok(ApiResponse {
            status: 429,
            retry_after: Some(retry_after),
            body: Vec::new(),
        }))
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    /// Answer every unqueued request with `status` and an empty body.
    #[must_use]
    pub fn always_status(self, status: u16) -> Self {
        self.script.borrow_mut().fallback = Some(Ok(ApiResponse {
            status,
            retry_after: None,
            body: Vec::new(),
        }));
        self
    }

    /// Fail every unqueued request with `error`.
    #[must_use]
    pub fn always_fail(self, error: TransportError) -> Self {
        self.script.borrow_mut().fallback = Some(Err(error));
        self
    }

    /// Answer unqueued requests with `responder`.
    #[must_use]
    pub fn respond_with(self, responder: impl FnMut(&ApiRequest) -> Outcome + 'static) -> Self {
        self.script.borrow_mut().responder = Some(Box::new(responder));
        self
    }

    /// Answer collection requests like the provider: every identifier in
    /// `unknown` is reported in `not_found`, every other one is returned as
    /// a card built by [`card_json`].
    #[must_use]
    pub fn echo_collection(self, unknown: Vec<Identifier>) -> Self {
        self.respond_with(move |request| {
            let requested: Vec<Identifier> = request
                .body
                .as_ref()
                .and_then(|body| body.get("identifiers"))
                .and_then(|ids| serde_json::from_value(ids.clone()).ok())
                .unwrap_or_default();
            let (missing, present): (Vec<_>, Vec<_>) =
                requested.into_iter().partition(|id| unknown.contains(id));
            let data: Vec<RawRecord> = present
                .iter()
                .map(|id| card_json(&id.set, &id.collector_number))
                .collect();
            Ok(json_response(
                200,
                &json!({"object": "list", "not_found": missing, "data": data}),
            ))
        })
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.borrow().requests.clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.script.borrow().requests.len()
    }
}

impl HttpExchange for ScriptedExchange {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());
        if let Some(outcome) = script.queued.pop_front() {
            return outcome;
        }
        if let Some(responder) = script.responder.as_mut() {
            return responder(request);
        }
        script.fallback.clone().unwrap_or_else(|| {
            Err(TransportError::Other {
                url: request.url.to_string(),
                message: "no scripted response".into(),
            })
        })
    }
}

/// [`Sleeper`] that records requested waits without blocking.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Rc<RefCell<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// A sleeper with no recorded waits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

fn json_response(status: u16, body: &Value) -> ApiResponse {
    ApiResponse {
        status,
        retry_after: None,
        body: body.to_string().into_bytes(),
    }
}

fn object(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

/// A provider-shaped set record that passes validation.
#[must_use]
pub fn set_json(code: &str) -> RawRecord {
    object(json!({
        "object": "set",
        "code": code,
        "name": format!("Set {}", code.to_uppercase()),
        "set_type": "expansion",
        "released_at": "2025-04-11",
        "card_count": 286,
        "digital": false,
        "foil_only": false,
        "nonfoil_only": false,
        "icon_svg_uri": format!("https://svgs.example.test/sets/{code}.svg"),
        "search_uri": format!("https://api.example.test/cards/search?q=e%3A{code}")
    }))
}

/// A provider-shaped card record that passes validation.
///
/// The card id is derived from the identifier so repeated fetches upsert the
/// same row.
#[must_use]
pub fn card_json(set: &str, collector_number: &str) -> RawRecord {
    object(json!({
        "object": "card",
        "id": format!("{set}-{collector_number}"),
        "name": format!("Card {set} {collector_number}"),
        "mana_cost": "{1}{G}",
        "cmc": 2.0,
        "type_line": "Creature Dragon",
        "oracle_text": "Flying",
        "power": "2",
        "toughness": "2",
        "colors": ["G"],
        "color_identity": ["G"],
        "rarity": "common",
        "set": set,
        "set_name": format!("Set {}", set.to_uppercase()),
        "collector_number": collector_number,
        "artist": "Test Artist",
        "layout": "normal",
        "prices": {"usd": "0.10"}
    }))
}
