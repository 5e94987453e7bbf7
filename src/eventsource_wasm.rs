//! WASM EventSource client for the cluster metrics stream

use crate::stream_state::StreamState;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

/// Shared message buffer: stream callback pushes, app drains in update()
pub type MessageBuffer = Rc<RefCell<VecDeque<String>>>;

/// Server-sent events subscription.
///
/// Dropping the client closes the stream and releases its callbacks.
pub struct EventSourceClient {
    source: EventSource,
    state: Rc<RefCell<StreamState>>,
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl EventSourceClient {
    /// Subscribe to an SSE endpoint
    ///
    /// Message payloads are buffered into `msg_buffer` for the app to drain.
    pub fn connect(
        url: &str,
        msg_buffer: MessageBuffer,
        state: Rc<RefCell<StreamState>>,
    ) -> Result<Self, JsValue> {
        info!(url, "Subscribing to metrics stream");

        let source = EventSource::new(url)?;

        let state_clone = state.clone();
        let on_open = Closure::wrap(Box::new(move |_: Event| {
            info!("Metrics stream connected");
            *state_clone.borrow_mut() = StreamState::Connected;
        }) as Box<dyn FnMut(Event)>);
        source.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        // On message - push to buffer (processed in app update())
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Some(text) = e.data().as_string() {
                msg_buffer.borrow_mut().push_back(text);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        // EventSource reconnects on its own; only surface the state
        let state_clone = state.clone();
        let source_clone = source.clone();
        let on_error = Closure::wrap(Box::new(move |_: Event| {
            let ready_state = source_clone.ready_state();
            error!(ready_state, "Metrics stream error");
            *state_clone.borrow_mut() = if ready_state == EventSource::CLOSED {
                StreamState::Disconnected
            } else {
                StreamState::Error("reconnecting".to_string())
            };
        }) as Box<dyn FnMut(Event)>);
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            source,
            state,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
        })
    }
}

impl Drop for EventSourceClient {
    fn drop(&mut self) {
        self.source.set_onopen(None);
        self.source.set_onmessage(None);
        self.source.set_onerror(None);
        self.source.close();
        *self.state.borrow_mut() = StreamState::Disconnected;
        info!("Metrics stream closed");
    }
}
