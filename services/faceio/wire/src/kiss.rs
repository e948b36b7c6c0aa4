//! KISS byte-stuffing for serial media.
//!
//! The Bluetooth serial face carries packets over a byte stream, so
//! frames are delimited with KISS TNC framing:
//! `FEND + CMD_DATA + escaped(data) + FEND`.

use crate::error::FramingError;

/// Frame delimiter.
pub const FEND: u8 = 0xC0;
/// Escape introducer.
pub const FESC: u8 = 0xDB;
/// Escaped FEND.
pub const TFEND: u8 = 0xDC;
/// Escaped FESC.
pub const TFESC: u8 = 0xDD;
/// Data-frame command byte.
pub const CMD_DATA: u8 = 0x00;

/// Frame `data` with KISS delimiters and byte-stuffing.
pub fn kiss_frame(data: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(data.len() + 3);
    framed.push(FEND);
    framed.push(CMD_DATA);
    for &byte in data {
        match byte {
            FEND => framed.extend_from_slice(&[FESC, TFEND]),
            FESC => framed.extend_from_slice(&[FESC, TFESC]),
            _ => framed.push(byte),
        }
    }
    framed.push(FEND);
    framed
}

/// Strip KISS delimiters and command byte from a complete frame and
/// undo the byte-stuffing.
pub fn kiss_unframe(framed: &[u8]) -> Result<Vec<u8>, FramingError> {
    if framed.len() < 3 || framed[0] != FEND || framed[framed.len() - 1] != FEND {
        return Err(FramingError::MissingDelimiter);
    }

    let inner = &framed[2..framed.len() - 1];
    let mut data = Vec::with_capacity(inner.len());
    let mut bytes = inner.iter();
    while let Some(&byte) = bytes.next() {
        if byte == FESC {
            match bytes.next() {
                Some(&TFEND) => data.push(FEND),
                Some(&TFESC) => data.push(FESC),
                Some(&other) => return Err(FramingError::InvalidEscape(other)),
                None => return Err(FramingError::IncompleteEscape),
            }
        } else {
            data.push(byte);
        }
    }
    Ok(data)
}

/// Incremental deframer for a polled serial stream.
///
/// Feed it whatever the port produced this iteration; it emits each
/// completed frame exactly once, in arrival order, regardless of how
/// the bytes were split across reads. Frames longer than `max_frame`
/// are discarded whole.
pub struct KissDeframer {
    buf: Vec<u8>,
    max_frame: usize,
    in_frame: bool,
    escaped: bool,
    overflow: bool,
}

impl KissDeframer {
    /// New deframer accepting frames of up to `max_frame` decoded bytes.
    pub fn new(max_frame: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_frame),
            max_frame,
            in_frame: false,
            escaped: false,
            overflow: false,
        }
    }

    /// Consume `chunk`, invoking `emit` once per completed frame. The
    /// emitted slice excludes delimiters and the command byte.
    pub fn feed(&mut self, chunk: &[u8], mut emit: impl FnMut(&[u8])) {
        for &byte in chunk {
            if byte == FEND {
                // Close the current frame. The first decoded byte is the
                // command byte; a bare FEND pair between frames is noise.
                if self.in_frame && !self.overflow && self.buf.len() > 1 {
                    emit(&self.buf[1..]);
                }
                self.buf.clear();
                self.in_frame = true;
                self.escaped = false;
                self.overflow = false;
                continue;
            }
            if !self.in_frame {
                continue;
            }
            let decoded = if self.escaped {
                self.escaped = false;
                match byte {
                    TFEND => FEND,
                    TFESC => FESC,
                    // Bad escape poisons the rest of this frame.
                    _ => {
                        self.overflow = true;
                        continue;
                    }
                }
            } else if byte == FESC {
                self.escaped = true;
                continue;
            } else {
                byte
            };

            if self.buf.len() > self.max_frame {
                self.overflow = true;
            } else {
                self.buf.push(decoded);
            }
        }
    }
}
