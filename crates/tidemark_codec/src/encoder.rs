//! Canonical CBOR encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encode a value to canonical CBOR bytes.
///
/// The output is deterministic following RFC 8949 Section 4.2.1:
/// - Map keys are sorted by their encoded form (length-first, then bytewise)
/// - Integers use the shortest possible encoding
/// - Floats always use the 64-bit form
/// - No indefinite-length encoding
///
/// # Errors
///
/// Returns an error if the value contains a NaN or infinite float.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder.
///
/// Produces deterministic output suitable for storage and bytewise
/// comparison. Map entries are assumed to already be in canonical key
/// order, which [`Value::map`] and the document builders guarantee.
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => {
                self.buffer.push(0xf6);
                Ok(())
            }
            Value::Bool(b) => {
                self.buffer.push(if *b { 0xf5 } else { 0xf4 });
                Ok(())
            }
            Value::Integer(n) => {
                self.encode_integer(*n);
                Ok(())
            }
            Value::Float(f) => self.encode_float(*f),
            Value::Bytes(b) => {
                self.write_header(2, b.len() as u64);
                self.buffer.extend_from_slice(b);
                Ok(())
            }
            Value::Text(s) => {
                self.encode_text(s);
                Ok(())
            }
            Value::Array(items) => {
                self.write_header(4, items.len() as u64);
                for item in items {
                    self.encode(item)?;
                }
                Ok(())
            }
            Value::Map(pairs) => {
                self.write_header(5, pairs.len() as u64);
                for (key, val) in pairs {
                    self.encode_text(key);
                    self.encode(val)?;
                }
                Ok(())
            }
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[allow(clippy::cast_sign_loss)]
    fn encode_integer(&mut self, n: i64) {
        if n >= 0 {
            self.write_header(0, n as u64);
        } else {
            // CBOR negative integers carry -(n+1) as the argument, so
            // -1 encodes argument 0, -2 encodes argument 1, and i64::MIN
            // stays in range.
            self.write_header(1, (-(n + 1)) as u64);
        }
    }

    fn encode_float(&mut self, f: f64) -> CodecResult<()> {
        if !f.is_finite() {
            return Err(CodecError::NonFiniteFloat);
        }
        // Always the 64-bit form: one representation per value keeps the
        // encoding deterministic without shortest-float analysis.
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&f.to_bits().to_be_bytes());
        Ok(())
    }

    fn encode_text(&mut self, s: &str) {
        self.write_header(3, s.len() as u64);
        self.buffer.extend_from_slice(s.as_bytes());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_header(&mut self, major_type: u8, argument: u64) {
        let mt = major_type << 5;

        if argument < 24 {
            self.buffer.push(mt | (argument as u8));
        } else if u8::try_from(argument).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(argument as u8);
        } else if u16::try_from(argument).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer
                .extend_from_slice(&(argument as u16).to_be_bytes());
        } else if u32::try_from(argument).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer
                .extend_from_slice(&(argument as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&argument.to_be_bytes());
        }
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}
