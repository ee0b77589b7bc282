//! EV3 direct-command wire format.
//!
//! ```text
//! ┌──────────┬──────────┬──────┬──────────────────────┬─────────────┐
//! │  Length  │ Counter  │ Type │ Global | Local << 10  │  Operations │
//! │  u16 LE  │  u16 LE  │  u8  │        u16 LE         │   n bytes   │
//! └──────────┴──────────┴──────┴──────────────────────┴─────────────┘
//! ```
//!
//! The length field counts every byte after itself. Replies carry the same
//! counter, a status byte and the requested global memory.

use crate::utils::error::{Ev3Error, Result};

pub const DIRECT_COMMAND_REPLY: u8 = 0x00;
pub const DIRECT_COMMAND_NO_REPLY: u8 = 0x80;
pub const DIRECT_REPLY_OK: u8 = 0x02;
pub const DIRECT_REPLY_ERROR: u8 = 0x04;

pub const MAX_GLOBAL_MEM: u16 = 1019;
pub const MAX_LOCAL_MEM: u8 = 63;

/// Counter, type and memory header bytes that follow the length field.
const HEADER_LEN: usize = 5;

pub mod opcodes {
    pub const UI_READ: u8 = 0x81;
    pub const UI_WRITE: u8 = 0x82;
    pub const UI_BUTTON: u8 = 0x83;
    pub const UI_DRAW: u8 = 0x84;
    pub const SOUND: u8 = 0x94;
    pub const INPUT_DEVICE: u8 = 0x99;
    pub const OUTPUT_RESET: u8 = 0xA2;
    pub const OUTPUT_STOP: u8 = 0xA3;
    pub const OUTPUT_SPEED: u8 = 0xA5;
    pub const OUTPUT_START: u8 = 0xA6;
    pub const OUTPUT_CLR_COUNT: u8 = 0xB2;
    pub const COM_GET: u8 = 0xD3;
    pub const COM_SET: u8 = 0xD4;
}

/// Sub-commands, grouped by the opcode they follow.
pub mod subcodes {
    // opUI_Read
    pub const GET_VBATT: i32 = 0x01;
    pub const GET_FW_VERS: i32 = 0x0A;
    pub const GET_LBATT: i32 = 0x12;

    // opUI_Write
    pub const LED: i32 = 0x1B;

    // opUI_Button
    pub const WAIT_FOR_PRESS: i32 = 0x03;
    pub const PRESS: i32 = 0x05;

    // opUI_Draw
    pub const UPDATE: i32 = 0x00;
    pub const PIXEL: i32 = 0x02;
    pub const LINE: i32 = 0x03;
    pub const CIRCLE: i32 = 0x04;
    pub const TEXT: i32 = 0x05;
    pub const FILLRECT: i32 = 0x09;
    pub const RECT: i32 = 0x0A;
    pub const TOPLINE: i32 = 0x12;
    pub const FILLWINDOW: i32 = 0x13;
    pub const FILLCIRCLE: i32 = 0x18;
    pub const BMPFILE: i32 = 0x1C;

    // opSound
    pub const BREAK: i32 = 0x00;
    pub const TONE: i32 = 0x01;
    pub const PLAY: i32 = 0x02;
    pub const REPEAT: i32 = 0x03;

    // opInput_Device
    pub const READY_RAW: i32 = 0x1C;
    pub const READY_SI: i32 = 0x1D;

    // opCom_Get / opCom_Set
    pub const GET_BRICKNAME: i32 = 0x0D;
    pub const SET_BRICKNAME: i32 = 0x08;
}

/// Local constant, shortest form that fits.
pub fn lcx(value: i32) -> Vec<u8> {
    if (-31..=31).contains(&value) {
        vec![(value & 0x3F) as u8]
    } else if (-127..=127).contains(&value) {
        vec![0x81, value as i8 as u8]
    } else if (-32767..=32767).contains(&value) {
        let mut out = vec![0x82];
        out.extend_from_slice(&(value as i16).to_le_bytes());
        out
    } else {
        let mut out = vec![0x83];
        out.extend_from_slice(&value.to_le_bytes());
        out
    }
}

/// Local constant string, NUL terminated.
pub fn lcs(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(0x84);
    out.extend_from_slice(value.as_bytes());
    out.push(0x00);
    out
}

fn variable(short_prefix: u8, long_prefix: u8, offset: u32) -> Vec<u8> {
    if offset < 32 {
        vec![short_prefix | offset as u8]
    } else if offset < 256 {
        vec![long_prefix | 0x01, offset as u8]
    } else if offset < 65536 {
        let mut out = vec![long_prefix | 0x02];
        out.extend_from_slice(&(offset as u16).to_le_bytes());
        out
    } else {
        let mut out = vec![long_prefix | 0x03];
        out.extend_from_slice(&offset.to_le_bytes());
        out
    }
}

/// Global variable at `offset` in the reply buffer.
pub fn gvx(offset: u32) -> Vec<u8> {
    variable(0x60, 0xE0, offset)
}

/// Local variable at `offset`.
pub fn lvx(offset: u32) -> Vec<u8> {
    variable(0x40, 0xC0, offset)
}

/// A sequence of operations plus the memory they need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    ops: Vec<u8>,
    global_mem: u16,
    local_mem: u8,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, opcode: u8) -> Self {
        self.ops.push(opcode);
        self
    }

    pub fn lcx(mut self, value: i32) -> Self {
        self.ops.extend(lcx(value));
        self
    }

    pub fn lcs(mut self, value: &str) -> Self {
        self.ops.extend(lcs(value));
        self
    }

    pub fn gvx(mut self, offset: u32) -> Self {
        self.ops.extend(gvx(offset));
        self
    }

    pub fn lvx(mut self, offset: u32) -> Self {
        self.ops.extend(lvx(offset));
        self
    }

    pub fn with_global_mem(mut self, bytes: u16) -> Self {
        self.global_mem = bytes;
        self
    }

    pub fn with_local_mem(mut self, bytes: u8) -> Self {
        self.local_mem = bytes;
        self
    }

    /// Appends another command's operations; memory sizes take the larger of the two.
    pub fn then(mut self, other: Command) -> Self {
        self.ops.extend(other.ops);
        self.global_mem = self.global_mem.max(other.global_mem);
        self.local_mem = self.local_mem.max(other.local_mem);
        self
    }

    pub fn ops(&self) -> &[u8] {
        &self.ops
    }

    pub fn global_mem(&self) -> u16 {
        self.global_mem
    }

    pub fn local_mem(&self) -> u8 {
        self.local_mem
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

pub fn encode_frame(counter: u16, reply: bool, command: &Command) -> Result<Vec<u8>> {
    if command.global_mem > MAX_GLOBAL_MEM {
        return Err(Ev3Error::protocol(format!(
            "global memory {} exceeds {} bytes",
            command.global_mem, MAX_GLOBAL_MEM
        )));
    }
    if command.local_mem > MAX_LOCAL_MEM {
        return Err(Ev3Error::protocol(format!(
            "local memory {} exceeds {} bytes",
            command.local_mem, MAX_LOCAL_MEM
        )));
    }

    let body_len = HEADER_LEN + command.ops.len();
    let length = u16::try_from(body_len)
        .map_err(|_| Ev3Error::protocol(format!("command of {} bytes is too long", body_len)))?;
    let mem = command.global_mem | (u16::from(command.local_mem) << 10);

    let mut frame = Vec::with_capacity(body_len + 2);
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&counter.to_le_bytes());
    frame.push(if reply {
        DIRECT_COMMAND_REPLY
    } else {
        DIRECT_COMMAND_NO_REPLY
    });
    frame.extend_from_slice(&mem.to_le_bytes());
    frame.extend_from_slice(&command.ops);
    Ok(frame)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub counter: u16,
    pub ok: bool,
    pub payload: Vec<u8>,
}

pub fn decode_reply(frame: &[u8]) -> Result<Reply> {
    if frame.len() < 5 {
        return Err(Ev3Error::protocol(format!(
            "reply of {} bytes is shorter than its header",
            frame.len()
        )));
    }

    let length = u16::from_le_bytes([frame[0], frame[1]]) as usize;
    let end = length + 2;
    if end < 5 || frame.len() < end {
        return Err(Ev3Error::protocol(format!(
            "reply announces {} bytes but carries {}",
            length,
            frame.len() - 2
        )));
    }

    let counter = u16::from_le_bytes([frame[2], frame[3]]);
    let ok = match frame[4] {
        DIRECT_REPLY_OK => true,
        DIRECT_REPLY_ERROR => false,
        other => {
            return Err(Ev3Error::protocol(format!(
                "unexpected reply type 0x{:02X}",
                other
            )))
        }
    };

    Ok(Reply {
        counter,
        ok,
        payload: frame[5..end].to_vec(),
    })
}

pub fn read_f32(payload: &[u8], offset: usize) -> Result<f32> {
    let bytes = payload
        .get(offset..offset + 4)
        .ok_or_else(|| Ev3Error::protocol(format!("no float at offset {}", offset)))?;
    Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_i32(payload: &[u8], offset: usize) -> Result<i32> {
    let bytes = payload
        .get(offset..offset + 4)
        .ok_or_else(|| Ev3Error::protocol(format!("no int at offset {}", offset)))?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// ASCII string up to the first NUL. Any other byte is a protocol error.
pub fn read_cstr(payload: &[u8]) -> Result<String> {
    let end = payload.iter().position(|b| *b == 0).unwrap_or(payload.len());
    let text = &payload[..end];
    if !text.is_ascii() {
        return Err(Ev3Error::protocol(format!(
            "expected an ASCII string, got {:02X?}",
            text
        )));
    }
    Ok(text.iter().map(|b| *b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcx_picks_shortest_form() {
        assert_eq!(lcx(0), vec![0x00]);
        assert_eq!(lcx(31), vec![0x1F]);
        assert_eq!(lcx(-1), vec![0x3F]);
        assert_eq!(lcx(-31), vec![0x21]);
        assert_eq!(lcx(32), vec![0x81, 0x20]);
        assert_eq!(lcx(-100), vec![0x81, 0x9C]);
        assert_eq!(lcx(1000), vec![0x82, 0xE8, 0x03]);
        assert_eq!(lcx(100_000), vec![0x83, 0xA0, 0x86, 0x01, 0x00]);
    }

    #[test]
    fn test_lcs() {
        assert_eq!(lcs("ab"), vec![0x84, b'a', b'b', 0x00]);
    }

    #[test]
    fn test_gvx_boundaries() {
        assert_eq!(gvx(0), vec![0x60]);
        assert_eq!(gvx(31), vec![0x7F]);
        assert_eq!(gvx(32), vec![0xE1, 0x20]);
        assert_eq!(gvx(300), vec![0xE2, 0x2C, 0x01]);
        assert_eq!(lvx(4), vec![0x44]);
    }

    #[test]
    fn test_encode_frame_header() {
        let cmd = Command::new()
            .op(opcodes::SOUND)
            .lcx(subcodes::BREAK)
            .with_global_mem(16)
            .with_local_mem(1);
        let frame = encode_frame(0x0102, true, &cmd).unwrap();

        assert_eq!(frame, vec![0x07, 0x00, 0x02, 0x01, 0x00, 0x10, 0x04, 0x94, 0x00]);
    }

    #[test]
    fn test_encode_frame_rejects_oversized_memory() {
        let cmd = Command::new().with_global_mem(MAX_GLOBAL_MEM + 1);
        assert!(encode_frame(0, true, &cmd).is_err());
    }

    #[test]
    fn test_decode_reply() {
        let reply = decode_reply(&[0x07, 0x00, 0x2A, 0x00, 0x02, b'E', b'V', b'3', 0x00]).unwrap();
        assert_eq!(reply.counter, 42);
        assert!(reply.ok);
        assert_eq!(read_cstr(&reply.payload).unwrap(), "EV3");

        let reply = decode_reply(&[0x03, 0x00, 0x01, 0x00, 0x04]).unwrap();
        assert!(!reply.ok);
        assert!(reply.payload.is_empty());
    }

    #[test]
    fn test_read_cstr() {
        assert_eq!(read_cstr(b"myEV3\0\0junk").unwrap(), "myEV3");
        assert_eq!(read_cstr(b"").unwrap(), "");
        assert!(matches!(
            read_cstr(&[b'E', 0xC3, 0xA9, 0x00]),
            Err(Ev3Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn test_decode_reply_ignores_padding_after_length() {
        let mut frame = vec![0x03, 0x00, 0x05, 0x00, 0x02];
        frame.resize(1024, 0);
        let reply = decode_reply(&frame).unwrap();
        assert!(reply.payload.is_empty());
    }

    #[test]
    fn test_decode_reply_errors() {
        assert!(decode_reply(&[0x01, 0x00]).is_err());
        assert!(decode_reply(&[0x09, 0x00, 0x01, 0x00, 0x02]).is_err());
        assert!(decode_reply(&[0x03, 0x00, 0x01, 0x00, 0x07]).is_err());
    }
}
