pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;

pub(crate) const UBX_SYNC_LEN: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_LENGTH_LEN: usize = 2;
pub(crate) const UBX_HEADER_LEN: usize =
    UBX_SYNC_LEN + UBX_CLASS_LEN + UBX_ID_LEN + UBX_LENGTH_LEN;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

pub(crate) const UBX_CLASS_OFFSET: usize = 2; // After SYNC_CHAR_1, SYNC_CHAR_2
pub(crate) const UBX_MSG_ID_OFFSET: usize = 3; // After CLASS
pub(crate) const UBX_LENGTH_OFFSET: usize = 4; // After MSG_ID

/// Largest payload length any known u-blox message declares. A header whose
/// length field exceeds this is treated as garbage rather than waited on.
pub const MAX_PAYLOAD_LEN: u16 = 1240;

/// Largest complete message on the wire: header + payload + checksum.
pub(crate) const MAX_MESSAGE_LEN: usize =
    UBX_HEADER_LEN + MAX_PAYLOAD_LEN as usize + UBX_CHECKSUM_LEN;

/// Default ceiling on the synchronizer cursor. Once buffered bytes exceed
/// this, the oldest are dropped and a buffer-overflow desync is reported.
pub const DEFAULT_CURSOR_CEILING: usize = 4 * MAX_MESSAGE_LEN;
