//! In-process request server.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::api::{Request, Response};
use crate::app::ports::{HttpConnection, RequestListener};

#[derive(Debug, Default)]
struct HttpSim {
    port: Option<u16>,
    pending: VecDeque<Request>,
    responses: Vec<Response>,
}

/// Listener fed by [`SimListener::send`]; nothing is accepted before
/// `begin()`.
#[derive(Debug, Clone, Default)]
pub struct SimListener {
    inner: Rc<RefCell<HttpSim>>,
}

impl SimListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a client request.
    pub fn send(&self, request: Request) {
        self.inner.borrow_mut().pending.push_back(request);
    }

    pub fn port(&self) -> Option<u16> {
        self.inner.borrow().port
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Responses written so far, oldest first.
    pub fn responses(&self) -> Vec<Response> {
        self.inner.borrow().responses.clone()
    }

    pub fn last_response(&self) -> Option<Response> {
        self.inner.borrow().responses.last().cloned()
    }
}

impl RequestListener for SimListener {
    type Connection = SimConnection;

    fn begin(&mut self, port: u16) {
        self.inner.borrow_mut().port = Some(port);
    }

    fn accept(&mut self) -> Option<SimConnection> {
        let mut sim = self.inner.borrow_mut();
        sim.port?;
        let request = sim.pending.pop_front()?;
        Some(SimConnection {
            request: Some(request),
            inner: self.inner.clone(),
        })
    }
}

pub struct SimConnection {
    request: Option<Request>,
    inner: Rc<RefCell<HttpSim>>,
}

impl HttpConnection for SimConnection {
    fn read_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    fn respond(&mut self, response: &Response) {
        self.inner.borrow_mut().responses.push(response.clone());
    }
}
