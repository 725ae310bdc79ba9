// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Wire format for the EAPOL-Key frame (IEEE Std 802.11-2016, 12.7.2) and the
//! transport used to send such frames to a peer station.
//!
//! This crate only knows how to encode, decode, and re-serialize a Key
//! frame's octets. It carries no opinion about what a valid handshake looks
//! like; that lives in the `four-way-handshake` crate.

mod key_info;

use bytes::{BufMut, Bytes};
use failure::Fail;
use nom::{be_u16, be_u64, be_u8, call, do_parse, eof, error_position, named_args, take, verify};
use std::convert::AsMut;

pub use key_info::{KeyInfo, MessageNumber};

// IEEE Std 802.1X-2010, 11.3.2, Table 11-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Key = 3,
}

// IEEE Std 802.1X-2010, 11.9, Table 11-5
pub const DESCRIPTOR_TYPE_IEEE802DOT11: u8 = 2;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "frame too short or malformed EAPOL-Key frame")]
    Malformed,
    #[fail(display = "unexpected EAPOL packet type {}, expected Key (3)", _0)]
    NotAKeyFrame(u8),
}

/// Logical view of an EAPOL-Key PDU (IEEE Std 802.11-2016, 12.7.2, Figure
/// 12-32). `nonce`/`rsc`/`mic`/`data` are exposed as owned buffers so the
/// engine using this crate can rewrite `data` in place once it has been
/// decrypted, per IEEE Std 802.11-2016 12.7.2 and the in-place decryption
/// design noted for the state-compliance validator.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    pub version: u8,
    pub packet_type: u8,
    pub descriptor_type: u8,
    pub info: KeyInfo,
    pub length: u16,
    pub replay_counter: u64,
    pub nonce: [u8; 32],
    pub iv: [u8; 16],
    pub rsc: [u8; 8],
    pub mic: Bytes,
    pub data: Bytes,
}

impl KeyFrame {
    /// Number of bytes in the frame excluding the dynamic MIC and Key Data
    /// fields, matching the wire layout of IEEE Std 802.11-2016 12.7.2.
    const STATIC_LEN: usize = 1 + 1 + 2 + 1 + 2 + 2 + 8 + 32 + 16 + 8 + 8 + 2;

    pub fn len(&self) -> usize {
        Self::STATIC_LEN + self.mic.len() + self.data.len()
    }

    /// Serializes the frame, optionally zeroing the MIC field — required
    /// before computing a fresh MIC over the frame, since the field being
    /// computed cannot itself be an input to its own computation.
    pub fn as_bytes(&self, clear_mic: bool, buf: &mut Vec<u8>) {
        buf.reserve(self.len());

        buf.put_u8(self.version);
        buf.put_u8(self.packet_type);
        let body_len = (self.len() - 4) as u16; // exclude version/type/body_length itself
        buf.put_u16_be(body_len);
        buf.put_u8(self.descriptor_type);
        buf.put_u16_be(self.info.value());
        buf.put_u16_be(self.length);
        buf.put_u64_be(self.replay_counter);
        buf.put_slice(&self.nonce[..]);
        buf.put_slice(&self.iv[..]);
        buf.put_slice(&self.rsc[..]);
        buf.put_uint_be(0, 8); // Key ID, reserved.
        if clear_mic {
            buf.put_slice(&vec![0u8; self.mic.len()][..]);
        } else {
            buf.put_slice(&self.mic[..]);
        }
        buf.put_u16_be(self.data.len() as u16);
        buf.put_slice(&self.data[..]);
    }

    /// Returns a copy of this frame with its MIC field zeroed, suitable as
    /// input to a MIC computation.
    pub fn bytes_for_mic(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        self.as_bytes(true, &mut buf);
        buf
    }

    pub fn parse(raw: &[u8], mic_len: usize) -> Result<KeyFrame, Error> {
        if let Some(&packet_type) = raw.get(1) {
            if packet_type != PacketType::Key as u8 {
                return Err(Error::NotAKeyFrame(packet_type));
            }
        }
        match key_frame_from_bytes(raw, mic_len as u16) {
            Ok((_, frame)) => Ok(frame),
            Err(_) => Err(Error::Malformed),
        }
    }
}

fn to_array<A>(slice: &[u8]) -> A
where
    A: Sized + Default + AsMut<[u8]>,
{
    let mut array = Default::default();
    <A as AsMut<[u8]>>::as_mut(&mut array).clone_from_slice(slice);
    array
}

named_args!(key_frame_from_bytes(mic_len: u16) <KeyFrame>,
    do_parse!(
        version: be_u8 >>
        packet_type: verify!(be_u8, |v: u8| v == PacketType::Key as u8) >>
        _body_length: be_u16 >>
        descriptor_type: be_u8 >>
        info: be_u16 >>
        length: be_u16 >>
        replay_counter: be_u64 >>
        nonce: take!(32) >>
        iv: take!(16) >>
        rsc: take!(8) >>
        take!(8 /* Key ID, reserved */) >>
        mic: take!(mic_len) >>
        data_length: be_u16 >>
        data: take!(data_length) >>
        eof!() >>
        (KeyFrame {
            version,
            packet_type,
            descriptor_type,
            info: KeyInfo::from_raw(info),
            length,
            replay_counter,
            nonce: to_array(nonce),
            iv: to_array(iv),
            rsc: to_array(rsc),
            mic: Bytes::from(mic),
            data: Bytes::from(data),
        })
    )
);

/// Sends a fully-assembled EAPOL-Key frame to a peer station.
///
/// Implementations are free to perform I/O; from the engine's point of view
/// the call is synchronous and must return before control leaves the state
/// handler that triggered it (see the core crate's concurrency model).
pub trait Transport {
    fn send_eapol_key_frame(
        &mut self,
        src: [u8; 6],
        dst: [u8; 6],
        frame: KeyFrame,
    ) -> Result<(), TransportError>;
}

#[derive(Debug, Fail)]
pub enum TransportError {
    #[fail(display = "failed to send EAPOL-Key frame: {}", _0)]
    SendFailed(String),
}
