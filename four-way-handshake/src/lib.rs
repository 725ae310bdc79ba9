// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A Supplicant-side WPA2 4-Way Handshake engine (IEEE Std 802.11-2016,
//! 12.7.6). Given a pre-shared key and the peer's EAPOL-Key frames, derives
//! the PTK, validates the Authenticator's messages, and emits the
//! Supplicant's own messages through a caller-supplied `eapol::Transport`.
//!
//! This crate does not open sockets, install keys into a driver, or decide
//! association policy; see `eapol` for the wire format and transport
//! boundary this crate is built on.

mod crypto;
mod error;
mod integrity;
mod key_data;
mod session;

pub use error::{CryptoError, Error, IntegrityViolation, SemanticViolation, StateViolation};
pub use session::{FourWayConfig, Session};
