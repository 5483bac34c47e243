//! Request interface.
//!
//! A small request/response server on [`REQUEST_PORT`](crate::config::REQUEST_PORT).
//! One path is built in:
//!
//! | Method | Path     | Response                              |
//! |--------|----------|---------------------------------------|
//! | GET    | `/adopt` | adoption document, `application/json` |
//!
//! Firmware adds its own GET/POST extensions with exact path matching.
//! Unknown paths get 404; a known path with the other method gets 405.

use log::{debug, info, warn};
use serde_json::Value;

use crate::adoption::AdoptionBuilder;
use crate::app::ports::{HttpConnection, RequestListener, SessionTransport, SettingsPort};
use crate::session::SessionSupervisor;

/// Built-in path; extensions may not shadow it.
pub const ADOPT_PATH: &str = "/adopt";
/// Firmware extension slots.
pub const MAX_ROUTES: usize = 16;

pub type PathString = heapless::String<64>;
pub type RouteHandler = Box<dyn FnMut(&Request) -> Response>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Vec<u8>,
}

impl Request {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: Vec::new(),
        }
    }

    pub fn post(path: &str, body: &[u8]) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: body.to_vec(),
        }
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// Serialize `value` as the body.  A value that cannot be encoded
    /// becomes a 500.
    pub fn json_value(status: u16, value: &Value) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::json(status, body),
            Err(_) => Self::text(500, "encode failed"),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn ok() -> Self {
        Self::text(200, "")
    }

    fn not_found() -> Self {
        Self::text(404, "not found")
    }

    fn method_not_allowed() -> Self {
        Self::text(405, "method not allowed")
    }
}

struct Route {
    method: Method,
    path: PathString,
    handler: RouteHandler,
}

pub struct RequestInterface<L: RequestListener> {
    listener: L,
    routes: heapless::Vec<Route, MAX_ROUTES>,
    port: Option<u16>,
}

impl<L: RequestListener> RequestInterface<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            routes: heapless::Vec::new(),
            port: None,
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn register_get(&mut self, path: &str, handler: RouteHandler) -> bool {
        self.register(Method::Get, path, handler)
    }

    pub fn register_post(&mut self, path: &str, handler: RouteHandler) -> bool {
        self.register(Method::Post, path, handler)
    }

    fn register(&mut self, method: Method, path: &str, handler: RouteHandler) -> bool {
        if path == ADOPT_PATH {
            warn!("api: {} is reserved", ADOPT_PATH);
            return false;
        }
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.path == path)
        {
            warn!("api: {:?} {} already registered", method, path);
            return false;
        }
        let Ok(path) = PathString::try_from(path) else {
            warn!("api: path too long: {}", path);
            return false;
        };
        if self.routes.push(Route { method, path, handler }).is_err() {
            warn!("api: route table full");
            return false;
        }
        true
    }

    /// Load persisted session settings into `session`, then start
    /// listening.  Storage failures fall back to the code defaults.
    pub fn begin<S, M>(&mut self, port: u16, settings: &S, session: &mut SessionSupervisor<M>)
    where
        S: SettingsPort,
        M: SessionTransport,
    {
        match settings.load() {
            Ok(Some(persisted)) => {
                info!("api: applying stored session settings");
                session.apply_persisted(&persisted);
            }
            Ok(None) => debug!("api: no stored session settings"),
            Err(e) => warn!("api: {}, using defaults", e),
        }

        self.listener.begin(port);
        self.port = Some(port);
        info!("api: listening on port {}", port);
    }

    /// Service at most one pending request.  Returns `true` if one was
    /// handled.
    pub fn poll(&mut self, adoption: &AdoptionBuilder<'_>) -> bool {
        let Some(mut conn) = self.listener.accept() else {
            return false;
        };
        let Some(request) = conn.read_request() else {
            warn!("api: unreadable request");
            conn.respond(&Response::text(400, "bad request"));
            return true;
        };

        let response = self.handle(&request, adoption);
        debug!(
            "api: {:?} {} -> {}",
            request.method, request.path, response.status
        );
        conn.respond(&response);
        true
    }

    fn handle(&mut self, request: &Request, adoption: &AdoptionBuilder<'_>) -> Response {
        if request.path == ADOPT_PATH {
            if request.method != Method::Get {
                return Response::method_not_allowed();
            }
            return match adoption.build().and_then(|doc| doc.encode()) {
                Ok(bytes) => Response::json(200, bytes),
                Err(e) => {
                    warn!("api: {}", e);
                    Response::text(500, "adoption document too large")
                }
            };
        }

        let mut path_known = false;
        for route in &mut self.routes {
            if route.path != request.path.as_str() {
                continue;
            }
            if route.method == request.method {
                return (route.handler)(request);
            }
            path_known = true;
        }

        if path_known {
            Response::method_not_allowed()
        } else {
            Response::not_found()
        }
    }
}
