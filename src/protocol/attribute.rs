//! Attribute codes and request masks

use serde::{Deserialize, Serialize};

/// Kind of data a logical packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    None,
    Adc,
    AdcQueue,
    AdcQueue10k,
    Settings,
    PdPacket,
    PdStatus,
    QcPacket,
    Unknown(u16),
}

impl Attribute {
    /// Every named attribute, in bit order.
    pub const KNOWN: [Attribute; 7] = [
        Attribute::Adc,
        Attribute::AdcQueue,
        Attribute::AdcQueue10k,
        Attribute::Settings,
        Attribute::PdPacket,
        Attribute::PdStatus,
        Attribute::QcPacket,
    ];

    pub fn code(self) -> u16 {
        match self {
            Attribute::None => 0x0000,
            Attribute::Adc => 0x0001,
            Attribute::AdcQueue => 0x0002,
            Attribute::AdcQueue10k => 0x0004,
            Attribute::Settings => 0x0008,
            Attribute::PdPacket => 0x0010,
            Attribute::PdStatus => 0x0020,
            Attribute::QcPacket => 0x0040,
            Attribute::Unknown(code) => code,
        }
    }
}

impl From<u16> for Attribute {
    fn from(code: u16) -> Self {
        match code & 0x7FFF {
            0x0000 => Attribute::None,
            0x0001 => Attribute::Adc,
            0x0002 => Attribute::AdcQueue,
            0x0004 => Attribute::AdcQueue10k,
            0x0008 => Attribute::Settings,
            0x0010 => Attribute::PdPacket,
            0x0020 => Attribute::PdStatus,
            0x0040 => Attribute::QcPacket,
            other => Attribute::Unknown(other),
        }
    }
}

/// Set of attributes requested in one GetData command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMask(pub u16);

impl AttributeMask {
    /// Interpret the 15-bit control header attribute field as a request mask.
    ///
    /// The device writes request masks starting one bit above the field origin, so an
    /// ADC request (`0x0001`) reads back as field value `0x0002`.
    pub fn from_request_field(field: u16) -> Self {
        Self(field >> 1)
    }

    /// Inverse of [`from_request_field`](Self::from_request_field).
    pub fn to_request_field(self) -> u16 {
        (self.0 << 1) & 0x7FFF
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        let code = attribute.code();
        code != 0 && (self.0 & code) == code
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Get the raw mask value.
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Named attributes present in the mask; unnamed bits are reported once as `Unknown`.
    pub fn iter(&self) -> impl Iterator<Item = Attribute> + '_ {
        let known_bits = Attribute::KNOWN.iter().fold(0u16, |acc, a| acc | a.code());
        let leftover = self.0 & !known_bits;
        Attribute::KNOWN
            .into_iter()
            .filter(|attribute| self.contains(*attribute))
            .chain((leftover != 0).then_some(Attribute::Unknown(leftover)))
    }
}

impl FromIterator<Attribute> for AttributeMask {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |acc, attribute| acc | attribute.code()))
    }
}
