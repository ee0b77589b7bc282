#![allow(dead_code)]

use async_trait::async_trait;
use lego_ev3::{Brick, Ev3Error, Protocol, Result, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const FRAME_HEADER: usize = 7;

#[derive(Default)]
struct State {
    sent: Vec<Vec<u8>>,
    payloads: VecDeque<Vec<u8>>,
    pending: VecDeque<Vec<u8>>,
    fail_next: bool,
    closed: bool,
}

/// Fake brick: records every frame and answers replies with queued payloads
/// (zero-filled when nothing is queued).
#[derive(Clone)]
pub struct MockBrick {
    protocol: Protocol,
    state: Arc<Mutex<State>>,
}

impl MockBrick {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn brick(&self) -> Brick {
        Brick::from_transport(Box::new(self.clone()))
    }

    pub fn queue_payload(&self, payload: Vec<u8>) {
        self.state.lock().unwrap().payloads.push_back(payload);
    }

    pub fn queue_f32s(&self, values: &[f32]) {
        self.queue_payload(values.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    pub fn queue_i32s(&self, values: &[i32]) {
        self.queue_payload(values.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Operation bytes of every frame sent, header stripped.
    pub fn ops(&self) -> Vec<Vec<u8>> {
        self.frames()
            .iter()
            .map(|frame| frame[FRAME_HEADER..].to_vec())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Transport for MockBrick {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(frame.to_vec());

        if frame[4] == 0x00 {
            let global_mem = (u16::from_le_bytes([frame[5], frame[6]]) & 0x3FF) as usize;
            let mut payload = state
                .payloads
                .pop_front()
                .unwrap_or_else(|| vec![0; global_mem]);
            payload.resize(global_mem.max(payload.len()), 0);

            let status = if std::mem::take(&mut state.fail_next) {
                0x04
            } else {
                0x02
            };
            let length = (3 + payload.len()) as u16;
            let mut reply = length.to_le_bytes().to_vec();
            reply.extend_from_slice(&frame[2..4]);
            reply.push(status);
            reply.extend(payload);
            state.pending.push_back(reply);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        let next = self.state.lock().unwrap().pending.pop_front();
        next.ok_or_else(|| Ev3Error::ConnectionError {
            message: "mock brick has nothing to send".to_string(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }
}

/// NUL-padded string payload, as the brick fills global memory.
pub fn cstr_payload(text: &str, len: usize) -> Vec<u8> {
    let mut payload = text.as_bytes().to_vec();
    payload.resize(len, 0);
    payload
}
