// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Walks message 3's (decrypted) Key Data field for the two items the
//! Supplicant cares about: the GTK KDE and the RSN element, tolerating any
//! other KDEs or IEs an Authenticator may have included.
//!
//! Grounded in the original Go implementation's `extractInfoFromMessage3`,
//! which walks the same forward-only cursor over `PeekType`/`ReadKDE`/
//! `ReadElement`.

use crate::error::Error;

const KDE_ID: u8 = 0xDD;
const KDE_OUI: [u8; 3] = [0x00, 0x0F, 0xAC];
const KDE_DATA_TYPE_GTK: u8 = 0x01;
const IE_ID_RSN: u8 = 0x30;

/// IEEE Std 802.11-2016, 12.7.2, Figure 12-35 (GTK KDE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtkKde {
    pub key_id: u8,
    pub tx: bool,
    pub gtk: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyData {
    pub gtk: Option<GtkKde>,
    /// Raw bytes of the first RSN element found, including its id/length
    /// header, for direct comparison against the association RSNE.
    pub rsn_ie: Option<Vec<u8>>,
}

/// Parses a decrypted Key Data field into its GTK KDE and RSN element, if
/// present. Unknown KDEs and IEs are skipped rather than rejected, since
/// IEEE Std 802.11-2016 12.7.6.4 permits an Authenticator to include items a
/// Supplicant does not recognize.
pub fn parse_key_data(data: &[u8]) -> Result<KeyData, Error> {
    let mut result = KeyData::default();
    let mut cursor = 0usize;

    while cursor < data.len() {
        if cursor + 2 > data.len() {
            return Err(Error::Malformed("truncated key data item header".into()));
        }
        let id = data[cursor];
        let len = data[cursor + 1] as usize;
        let item_end = cursor + 2 + len;
        if item_end > data.len() {
            return Err(Error::Malformed("key data item length overruns buffer".into()));
        }

        if id == KDE_ID && result.gtk.is_none() {
            if let Some(gtk) = try_parse_gtk_kde(&data[cursor + 2..item_end]) {
                result.gtk = Some(gtk);
            }
        } else if id == IE_ID_RSN && result.rsn_ie.is_none() {
            result.rsn_ie = Some(data[cursor..item_end].to_vec());
        }

        cursor = item_end;
    }

    Ok(result)
}

fn try_parse_gtk_kde(body: &[u8]) -> Option<GtkKde> {
    if body.len() < 6 {
        return None;
    }
    let oui = [body[0], body[1], body[2]];
    let data_type = body[3];
    if oui != KDE_OUI || data_type != KDE_DATA_TYPE_GTK {
        return None;
    }
    let flags = body[4];
    Some(GtkKde {
        key_id: flags & 0b0000_0011,
        tx: flags & 0b0000_0100 != 0,
        gtk: body[6..].to_vec(),
    })
}
