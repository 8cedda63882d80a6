//! Newline-delimited JSON framing for RPC traffic.
//!
//! Each frame is one JSON document on a single line. The codec is generic
//! over what it decodes and what it encodes so the same type serves both
//! ends of a connection:
//! - server side: `JsonLinesCodec<Request, Reply>`
//! - client side: `JsonLinesCodec<Reply, Request>`

use crate::error::ProtocolError;
use bytes::BytesMut;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder, LinesCodec};

/// Upper bound on a single frame. Gossip carries whole stores, so this is generous.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

pub struct JsonLinesCodec<In, Out> {
    lines: LinesCodec,
    _marker: PhantomData<fn(Out) -> In>,
}

impl<In, Out> JsonLinesCodec<In, Out> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(MAX_FRAME_LEN),
            _marker: PhantomData,
        }
    }
}

impl<In, Out> Default for JsonLinesCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In: DeserializeOwned, Out> Decoder for JsonLinesCodec<In, Out> {
    type Item = In;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<In>, ProtocolError> {
        loop {
            match self.lines.decode(src)? {
                // Blank keep-alive lines carry nothing.
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(Some(serde_json::from_str(&line)?)),
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<In>, ProtocolError> {
        match self.lines.decode_eof(src)? {
            Some(line) if line.trim().is_empty() => Ok(None),
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Ok(None),
        }
    }
}

impl<In, Out: Serialize> Encoder<Out> for JsonLinesCodec<In, Out> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = serde_json::to_string(&item)?;
        if line.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLong { max: MAX_FRAME_LEN });
        }
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
