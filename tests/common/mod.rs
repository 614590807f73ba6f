#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use txdispatch::domain::ports::{Channel, ConnectivityState, SendOutcome};
use txdispatch::domain::transaction::TransactionDraft;
use txdispatch::error::Result;

pub fn draft(n: usize) -> TransactionDraft {
    TransactionDraft {
        product_code: format!("P{n}"),
        destination_code: format!("0812{n}"),
        amount: "1000".into(),
        pin: "1234".into(),
    }
}

pub fn ok() -> Result<SendOutcome> {
    Ok(SendOutcome { success: true, message: None })
}

pub fn rejected(reason: &str) -> Result<SendOutcome> {
    Ok(SendOutcome { success: false, message: Some(reason.to_string()) })
}

type OnSend = Box<dyn Fn(usize) + Send + Sync>;

/// Channel test double: replays a script of outcomes and records every
/// send. Once the script is exhausted, further sends succeed.
pub struct ScriptedChannel {
    state: ConnectivityState,
    script: Mutex<VecDeque<Result<SendOutcome>>>,
    sends: Mutex<Vec<(String, String)>>,
    on_send: Option<OnSend>,
}

impl ScriptedChannel {
    pub fn connected(script: Vec<Result<SendOutcome>>) -> Self {
        Self {
            state: ConnectivityState::Connected,
            script: Mutex::new(script.into()),
            sends: Mutex::new(Vec::new()),
            on_send: None,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            state: ConnectivityState::Disconnected,
            script: Mutex::new(VecDeque::new()),
            sends: Mutex::new(Vec::new()),
            on_send: None,
        }
    }

    /// Invokes `hook` with the 1-based send index after recording each
    /// send. Used to trigger cancellation at a known point in a run.
    pub fn with_on_send(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn sends(&self) -> Vec<(String, String)> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn status(&self) -> Result<ConnectivityState> {
        Ok(self.state)
    }

    async fn send(&self, destination: &str, payload: &str) -> Result<SendOutcome> {
        let nth = {
            let mut sends = self.sends.lock().unwrap();
            sends.push((destination.to_string(), payload.to_string()));
            sends.len()
        };
        if let Some(hook) = &self.on_send {
            hook(nth);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SendOutcome { success: true, message: None }))
    }
}
