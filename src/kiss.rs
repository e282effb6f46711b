//! KISS framing for TNC command frames.
//!
//! Only the transmit side is needed: escape the payload and wrap it in
//! frame delimiters.

pub const FEND: u8 = 0xC0; // frame delimiter
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

/// "Set hardware" command; the TNC reads the payload byte as a mode number.
pub const CMD_SET_HARDWARE: u8 = 0x06;

/// Byte-stuff `payload` so neither `FEND` nor `FESC` appears literally.
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len());
    for &b in payload {
        match b {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            _ => out.push(b),
        }
    }
    out
}

pub fn build_frame(command: u8, payload: &[u8]) -> Vec<u8> {
    let escaped = escape(payload);
    let mut frame = Vec::with_capacity(escaped.len() + 3);
    frame.push(FEND);
    frame.push(command);
    frame.extend_from_slice(&escaped);
    frame.push(FEND);
    frame
}
