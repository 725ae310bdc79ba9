// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-peer handshake state: the `Session` data model (spec.md §3), the
//! stateful checks that couple an incoming frame to that state (§4.4,
//! grounded in the original Go's `isStateCompliant`), and the tagged-variant
//! state machine that replaces the original's three state-handler objects
//! (§4.5, spec.md §9 design note).

use bytes::Bytes;

use eapol::{KeyFrame, MessageNumber, Transport};

use crate::crypto::{self, Ptk};
use crate::error::{Error, SemanticViolation, StateViolation};
use crate::key_data;

/// Static configuration for one Supplicant-side handshake session. Held for
/// the session's lifetime; `transport` is the external collaborator used to
/// deliver messages 2 and 4 to the peer (spec.md §6).
pub struct FourWayConfig {
    pub passphrase: Vec<u8>,
    pub ssid: Vec<u8>,
    pub sta_addr: [u8; 6],
    pub peer_addr: [u8; 6],
    /// The RSNE this station advertised in its (Re)Association Request.
    pub assoc_rsne: Vec<u8>,
    pub transport: Box<dyn Transport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    WaitingGtk,
    Completed,
}

impl State {
    fn admits(&self, msg: MessageNumber) -> bool {
        match (self, msg) {
            (State::Idle, MessageNumber::First) => true,
            (State::WaitingGtk, MessageNumber::First) => true,
            (State::WaitingGtk, MessageNumber::Third) => true,
            (State::Completed, _) => true,
            _ => false,
        }
    }
}

/// One Supplicant-side 4-Way Handshake in progress.
pub struct Session {
    config: FourWayConfig,
    state: State,
    key_replay_counter: u64,
    a_nonce: [u8; 32],
    s_nonce: [u8; 32],
    ptk: Option<Ptk>,
}

impl Session {
    pub fn new(config: FourWayConfig) -> Session {
        Session {
            config,
            state: State::Idle,
            key_replay_counter: 0,
            a_nonce: [0u8; 32],
            s_nonce: [0u8; 32],
            ptk: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == State::Completed
    }

    /// Processes one inbound EAPOL-Key frame, per spec.md §4.4/§4.5. May send
    /// message 2 or message 4 to the peer through `config.transport` as a
    /// side effect.
    pub fn handle_key_frame(&mut self, mut frame: KeyFrame) -> Result<(), Error> {
        let msg = crate::integrity::validate(&frame)?;

        loop {
            self.validate_state_compliance(&mut frame, msg)?;

            match self.state {
                State::Idle => {
                    self.handle_message1(&frame)?;
                    self.state = State::WaitingGtk;
                    return Ok(());
                }
                State::WaitingGtk => match msg {
                    MessageNumber::First => {
                        // A fresh message 1 while waiting for the GTK restarts
                        // the handshake from scratch (spec.md §4.5, §9).
                        self.ptk = None;
                        self.a_nonce = [0u8; 32];
                        self.s_nonce = [0u8; 32];
                        self.state = State::Idle;
                        continue;
                    }
                    MessageNumber::Third => {
                        self.handle_message3(&frame)?;
                        self.state = State::Completed;
                        return Ok(());
                    }
                },
                State::Completed => {
                    // Further frames are accepted and ignored; the handshake
                    // has already installed its keys.
                    return Ok(());
                }
            }
        }
    }

    /// IEEE Std 802.11-2016 12.7.2 d); spec.md §4.4.
    fn validate_state_compliance(&mut self, frame: &mut KeyFrame, msg: MessageNumber) -> Result<(), Error> {
        if frame.replay_counter <= self.key_replay_counter {
            return Err(StateViolation::ReplayCounterNotAdvanced.into());
        }

        if frame.info.mic() && self.ptk.is_none() {
            return Err(StateViolation::CannotValidateMic.into());
        }
        if frame.info.mic() {
            let ptk = self.ptk.as_ref().expect("checked above");
            let mic_input = frame.bytes_for_mic();
            let expected = crypto::mic(ptk.kck(), &mic_input);
            if !crypto::fixed_time_eq(&expected, &frame.mic) {
                return Err(StateViolation::InvalidMic.into());
            }
        }

        if frame.info.encrypted_key_data() && self.ptk.is_none() {
            return Err(StateViolation::CannotDecrypt.into());
        }
        if frame.info.encrypted_key_data() {
            let ptk = self.ptk.as_ref().expect("checked above");
            let plaintext = crypto::key_unwrap(ptk.kek(), &frame.data)
                .map_err(|_| StateViolation::DecryptionFailed)?;
            frame.data = Bytes::from(plaintext);
        }

        if msg == MessageNumber::Third && frame.nonce != self.a_nonce {
            return Err(StateViolation::NonceMismatch.into());
        }

        if !self.state.admits(msg) {
            return Err(StateViolation::UnexpectedMessageForState.into());
        }

        Ok(())
    }

    fn handle_message1(&mut self, msg1: &KeyFrame) -> Result<(), Error> {
        let pmk = crypto::psk(&self.config.passphrase, &self.config.ssid)?;
        self.a_nonce = msg1.nonce;
        self.s_nonce = crypto::generate_nonce(&self.config.sta_addr);
        let ptk = crypto::derive_ptk(
            &pmk,
            &self.config.sta_addr,
            &self.config.peer_addr,
            &self.a_nonce,
            &self.s_nonce,
        );
        log::debug!("derived PTK for peer {:02x?}", self.config.peer_addr);
        log::trace!(
            "KCK={:02x?} KEK={:02x?} TK={:02x?}",
            ptk.kck(),
            ptk.kek(),
            ptk.tk()
        );

        let mut info = msg1.info;
        info.set_install(false);
        info.set_ack(false);
        info.set_mic(true);
        info.set_secure(false);
        info.set_error(false);
        info.set_request(false);
        info.set_encrypted_key_data(false);

        let mut message2 = KeyFrame {
            version: msg1.version,
            packet_type: msg1.packet_type,
            descriptor_type: msg1.descriptor_type,
            info,
            length: 16,
            replay_counter: msg1.replay_counter,
            nonce: self.s_nonce,
            iv: [0u8; 16],
            rsc: [0u8; 8],
            mic: Bytes::from(vec![0u8; 16]),
            data: Bytes::from(self.config.assoc_rsne.clone()),
        };
        let mic = crypto::mic(ptk.kck(), &message2.bytes_for_mic());
        message2.mic = Bytes::from(mic);
        self.ptk = Some(ptk);

        self.config
            .transport
            .send_eapol_key_frame(self.config.sta_addr, self.config.peer_addr, message2)
            .map_err(Error::from)
    }

    fn handle_message3(&mut self, msg3: &KeyFrame) -> Result<(), Error> {
        self.key_replay_counter = msg3.replay_counter;

        let parsed = key_data::parse_key_data(&msg3.data)?;
        let rsn_ie = parsed.rsn_ie.ok_or(SemanticViolation::MissingIe)?;
        let gtk = parsed.gtk.ok_or(SemanticViolation::MissingGtk)?;
        if rsn_ie != self.config.assoc_rsne {
            return Err(SemanticViolation::RsnMismatch.into());
        }
        log::trace!(
            "GTK from message 3: key_id={} tx={} len={}",
            gtk.key_id,
            gtk.tx,
            gtk.gtk.len()
        );

        let ptk = self.ptk.as_ref().expect("PTK must be set once message 1 is handled");

        let mut info = msg3.info;
        info.set_install(false);
        info.set_ack(false);
        info.set_mic(true);
        info.set_secure(true);
        info.set_error(false);
        info.set_request(false);
        info.set_encrypted_key_data(false);

        let mut message4 = KeyFrame {
            version: msg3.version,
            packet_type: msg3.packet_type,
            descriptor_type: msg3.descriptor_type,
            info,
            length: 16,
            replay_counter: msg3.replay_counter,
            nonce: [0u8; 32],
            iv: [0u8; 16],
            rsc: [0u8; 8],
            mic: Bytes::from(vec![0u8; 16]),
            data: Bytes::new(),
        };
        let mic = crypto::mic(ptk.kck(), &message4.bytes_for_mic());
        message4.mic = Bytes::from(mic);

        self.config
            .transport
            .send_eapol_key_frame(self.config.sta_addr, self.config.peer_addr, message4)
            .map_err(Error::from)
    }
}
