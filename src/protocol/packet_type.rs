//! Main header packet type table

use serde::{Deserialize, Serialize};

/// Packet type carried in the low 7 bits of every main header.
///
/// Codes below `0x40` are control-class and use the [`CtrlHeader`](super::CtrlHeader)
/// layout; codes from `0x40` up are data-class and use [`DataHeader`](super::DataHeader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    Sync,
    Connect,
    Disconnect,
    Reset,
    Accept,
    Reject,
    Finished,
    JumpAprom,
    JumpDfu,
    GetStatus,
    Error,
    GetData,
    GetFile,
    StartGraph,
    StopGraph,
    EnablePdMonitor,
    DisablePdMonitor,
    Head,
    /// Data response carrying a logical packet chain
    PutData,
    MemoryDownload,
    StreamingAuth,
    Unknown(u8),
}

impl PacketType {
    pub fn code(self) -> u8 {
        match self {
            PacketType::Sync => 0x01,
            PacketType::Connect => 0x02,
            PacketType::Disconnect => 0x03,
            PacketType::Reset => 0x04,
            PacketType::Accept => 0x05,
            PacketType::Reject => 0x06,
            PacketType::Finished => 0x07,
            PacketType::JumpAprom => 0x08,
            PacketType::JumpDfu => 0x09,
            PacketType::GetStatus => 0x0A,
            PacketType::Error => 0x0B,
            PacketType::GetData => 0x0C,
            PacketType::GetFile => 0x0D,
            PacketType::StartGraph => 0x0E,
            PacketType::StopGraph => 0x0F,
            PacketType::EnablePdMonitor => 0x10,
            PacketType::DisablePdMonitor => 0x11,
            PacketType::Head => 0x40,
            PacketType::PutData => 0x41,
            PacketType::MemoryDownload => 0x44,
            PacketType::StreamingAuth => 0x4C,
            PacketType::Unknown(code) => code,
        }
    }

    /// Control-class packets use the attribute layout in the upper half-word.
    pub fn is_control(self) -> bool {
        self.code() < 0x40
    }
}

impl From<u8> for PacketType {
    /// Values wider than 7 bits are masked, matching the header field width.
    fn from(code: u8) -> Self {
        match code & 0x7F {
            0x01 => PacketType::Sync,
            0x02 => PacketType::Connect,
            0x03 => PacketType::Disconnect,
            0x04 => PacketType::Reset,
            0x05 => PacketType::Accept,
            0x06 => PacketType::Reject,
            0x07 => PacketType::Finished,
            0x08 => PacketType::JumpAprom,
            0x09 => PacketType::JumpDfu,
            0x0A => PacketType::GetStatus,
            0x0B => PacketType::Error,
            0x0C => PacketType::GetData,
            0x0D => PacketType::GetFile,
            0x0E => PacketType::StartGraph,
            0x0F => PacketType::StopGraph,
            0x10 => PacketType::EnablePdMonitor,
            0x11 => PacketType::DisablePdMonitor,
            0x40 => PacketType::Head,
            0x41 => PacketType::PutData,
            0x44 => PacketType::MemoryDownload,
            0x4C => PacketType::StreamingAuth,
            other => PacketType::Unknown(other),
        }
    }
}
