/// Map sharing
///
/// A shared map travels as the URI `mapquestor://map/{mapId}`. The string is
/// exactly what a QR widget encodes; for NFC the same URI is packed into a
/// standard NDEF URI record (well-known type `U`, prefix-compressed). Devices
/// without NFC surface `UnsupportedCapability` through the writer seam.

use url::Url;

use crate::error::{Error, Result};
use crate::model::MapId;

/// URI scheme for share links
pub const SHARE_SCHEME: &str = "mapquestor";

/// Prefix table from the NFC Forum URI record type definition. The payload's
/// first byte is the index of the longest matching prefix; 0x00 means the
/// URI is carried in full.
const NDEF_URI_PREFIXES: &[&str] = &[
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
];

/// A shareable reference to one map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    map_id: MapId,
}

impl SharePayload {
    pub fn new(map_id: MapId) -> Self {
        SharePayload { map_id }
    }

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    /// The share link; also the exact string a QR widget renders
    pub fn uri(&self) -> String {
        format!("{}://map/{}", SHARE_SCHEME, self.map_id)
    }

    /// The URI as a single NDEF URI record (short-record form), ready to be
    /// written to a tag
    pub fn ndef_uri_record(&self) -> Result<Vec<u8>> {
        encode_ndef_uri(&self.uri())
    }
}

/// Parse a share link back into a map id. Rejects other schemes, other
/// hosts, and links without an id.
pub fn parse_share_uri(input: &str) -> Result<SharePayload> {
    let url = Url::parse(input)
        .map_err(|e| Error::ValidationFailed(format!("unparseable share link: {}", e)))?;
    if url.scheme() != SHARE_SCHEME {
        return Err(Error::ValidationFailed(format!(
            "share links use the {}:// scheme, got {}://",
            SHARE_SCHEME,
            url.scheme()
        )));
    }
    if url.host_str() != Some("map") {
        return Err(Error::ValidationFailed(format!("'{}' is not a map share link", input)));
    }
    let id = url.path().trim_start_matches('/');
    if id.is_empty() || id.contains('/') {
        return Err(Error::ValidationFailed(format!("'{}' carries no map id", input)));
    }
    Ok(SharePayload::new(MapId(id.to_string())))
}

/// Encode a URI as a single short-form NDEF record:
/// flags (MB|ME|SR, TNF=well-known), type length 1, payload length,
/// type `U`, then the prefix index and the remainder of the URI.
fn encode_ndef_uri(uri: &str) -> Result<Vec<u8>> {
    let (code, rest) = NDEF_URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, prefix)| uri.starts_with(**prefix))
        .map(|(i, prefix)| (i as u8, &uri[prefix.len()..]))
        .unwrap_or((0x00, uri));

    let payload_len = 1 + rest.len();
    if payload_len > u8::MAX as usize {
        // Long-form records are not needed for map links
        return Err(Error::ValidationFailed(format!(
            "URI too long for a short NDEF record ({} bytes)",
            payload_len
        )));
    }

    let mut record = Vec::with_capacity(4 + payload_len);
    record.push(0xD1); // MB | ME | SR | TNF well-known
    record.push(0x01); // type length
    record.push(payload_len as u8);
    record.push(b'U'); // URI record type
    record.push(code);
    record.extend_from_slice(rest.as_bytes());
    Ok(record)
}

/// Seam for pushing a share payload onto an NFC tag. The feature is
/// optional hardware; platforms without it plug in [`NfcUnavailable`].
pub trait NfcWriter {
    fn write_tag(&self, payload: &SharePayload) -> Result<()>;
}

/// The no-NFC device: every write reports the missing capability
pub struct NfcUnavailable;

impl NfcWriter for NfcUnavailable {
    fn write_tag(&self, _payload: &SharePayload) -> Result<()> {
        Err(Error::UnsupportedCapability("NFC is not available on this device".into()))
    }
}
