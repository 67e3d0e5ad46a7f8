//! Wire code definitions
//!
//! Single-byte discriminators used on the wire: control bytes, scalar
//! type tags and response codes.

/// Control byte that opens every message a node writes outside the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExecutionCode {
    RequestMaster = 0x00,
    RequestSlave = 0x01,
    ExecFunction = 0x02,
}

impl ExecutionCode {
    /// First byte value that is not a valid control byte
    pub const MAX: u8 = 0x03;

    /// Parse a control byte, `None` for anything >= `MAX`
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::RequestMaster),
            0x01 => Some(Self::RequestSlave),
            0x02 => Some(Self::ExecFunction),
            _ => None,
        }
    }
}

/// Scalar type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Byte = 0x00,
    UByte = 0x01,
    Short = 0x02,
    UShort = 0x03,
    Int = 0x04,
    UInt = 0x05,
    Float = 0x06,
    Double = 0x07,
    String = 0x08,
    Boolean = 0x09,
}

impl DataType {
    /// First byte value that is not a valid type tag
    pub const MAX: u8 = 0x0A;

    /// Parse a type tag, `None` for anything >= `MAX`
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Byte),
            0x01 => Some(Self::UByte),
            0x02 => Some(Self::Short),
            0x03 => Some(Self::UShort),
            0x04 => Some(Self::Int),
            0x05 => Some(Self::UInt),
            0x06 => Some(Self::Float),
            0x07 => Some(Self::Double),
            0x08 => Some(Self::String),
            0x09 => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Encoded width in bytes, `None` for variable-length strings
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Byte | Self::UByte | Self::Boolean => Some(1),
            Self::Short | Self::UShort => Some(2),
            Self::Int | Self::UInt | Self::Float => Some(4),
            Self::Double => Some(8),
            Self::String => None,
        }
    }
}

/// Response codes written back by the node servicing a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    Okay = 0x00,
    NoResult = 0x01,
    InvalidFunction = 0x02,
    NodeError = 0x03,
    InvalidExecCode = 0x04,
    NotAllowed = 0x05,
}

impl ResponseCode {
    /// Sentinel: codes at or above this value are unrecognized
    pub const MAX: u8 = 0x06;

    /// Parse a response code, `None` for anything >= `MAX`
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Okay),
            0x01 => Some(Self::NoResult),
            0x02 => Some(Self::InvalidFunction),
            0x03 => Some(Self::NodeError),
            0x04 => Some(Self::InvalidExecCode),
            0x05 => Some(Self::NotAllowed),
            _ => None,
        }
    }

    /// Human readable meaning of the code
    pub fn description(self) -> &'static str {
        match self {
            Self::Okay => "Okay",
            Self::NoResult => "Okay (No result)",
            Self::InvalidFunction => "An invalid function was specified",
            Self::NodeError => "Node reported an internal error",
            Self::InvalidExecCode => "An invalid execution code was specified",
            Self::NotAllowed => {
                "Remote functions are not allowed from this node, remote is the current master"
            }
        }
    }

    /// Whether the code reports a successful call
    pub fn is_success(self) -> bool {
        matches!(self, Self::Okay | Self::NoResult)
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
