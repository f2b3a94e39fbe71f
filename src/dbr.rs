//! Data representation (DBR) structures: the fixed-layout payload types
//! carried by data-bearing commands.
//!
//! Each structure is identified on the wire by a `DBR_ID` in `[0, 38]`
//! (21 and 28 are reserved — EPICS never defined a graphic/control
//! string type). All multi-byte fields are big-endian. Fixed string
//! fields are 40 bytes, null-padded; `units` is 8 bytes; enum string
//! tables are 16 entries of 26 bytes each.

use crate::error::RemoteProtocolError;

pub const STRING_SIZE: usize = 40;
pub const MAX_UNITS_SIZE: usize = 8;
pub const MAX_ENUM_STRING_SIZE: usize = 26;
pub const MAX_ENUM_STATES: usize = 16;

/// EPICS timestamp: seconds since the 1990-01-01 EPICS epoch, plus
/// nanoseconds within that second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpicsTimeStamp {
    pub seconds_since_epoch: u32,
    pub nano_seconds: u32,
}

impl EpicsTimeStamp {
    pub const WIRE_SIZE: usize = 8;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.seconds_since_epoch.to_be_bytes());
        buf.extend_from_slice(&self.nano_seconds.to_be_bytes());
    }

    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let seconds_since_epoch = read_u32(buf, pos)?;
        let nano_seconds = read_u32(buf, pos)?;
        Ok(Self {
            seconds_since_epoch,
            nano_seconds,
        })
    }
}

fn need(buf: &[u8], pos: usize, n: usize) -> Result<(), RemoteProtocolError> {
    if buf.len() < pos + n {
        return Err(RemoteProtocolError::new(format!(
            "DBR payload truncated: need {n} bytes at offset {pos}, have {}",
            buf.len()
        )));
    }
    Ok(())
}

fn read_i16(buf: &[u8], pos: &mut usize) -> Result<i16, RemoteProtocolError> {
    need(buf, *pos, 2)?;
    let v = i16::from_be_bytes([buf[*pos], buf[*pos + 1]]);
    *pos += 2;
    Ok(v)
}

fn read_u16(buf: &[u8], pos: &mut usize) -> Result<u16, RemoteProtocolError> {
    need(buf, *pos, 2)?;
    let v = u16::from_be_bytes([buf[*pos], buf[*pos + 1]]);
    *pos += 2;
    Ok(v)
}

fn read_i32(buf: &[u8], pos: &mut usize) -> Result<i32, RemoteProtocolError> {
    need(buf, *pos, 4)?;
    let v = i32::from_be_bytes(buf[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    Ok(v)
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, RemoteProtocolError> {
    need(buf, *pos, 4)?;
    let v = u32::from_be_bytes(buf[*pos..*pos + 4].try_into().unwrap());
    *pos += 4;
    Ok(v)
}

fn read_f32(buf: &[u8], pos: &mut usize) -> Result<f32, RemoteProtocolError> {
    Ok(f32::from_bits(read_u32(buf, pos)?))
}

fn read_f64(buf: &[u8], pos: &mut usize) -> Result<f64, RemoteProtocolError> {
    need(buf, *pos, 8)?;
    let v = u64::from_be_bytes(buf[*pos..*pos + 8].try_into().unwrap());
    *pos += 8;
    Ok(f64::from_bits(v))
}

fn read_u8(buf: &[u8], pos: &mut usize) -> Result<u8, RemoteProtocolError> {
    need(buf, *pos, 1)?;
    let v = buf[*pos];
    *pos += 1;
    Ok(v)
}

fn read_fixed_string(buf: &[u8], pos: &mut usize, len: usize) -> Result<String, RemoteProtocolError> {
    need(buf, *pos, len)?;
    let raw = &buf[*pos..*pos + len];
    *pos += len;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

fn encode_fixed_string(buf: &mut Vec<u8>, s: &str, len: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(len);
    buf.extend_from_slice(&bytes[..n]);
    buf.resize(buf.len() + (len - n), 0u8);
}

fn read_units(buf: &[u8], pos: &mut usize) -> Result<String, RemoteProtocolError> {
    read_fixed_string(buf, pos, MAX_UNITS_SIZE)
}

fn encode_units(buf: &mut Vec<u8>, units: &str) {
    encode_fixed_string(buf, units, MAX_UNITS_SIZE);
}

fn read_enum_strings(buf: &[u8], pos: &mut usize) -> Result<Vec<String>, RemoteProtocolError> {
    let mut strs = Vec::with_capacity(MAX_ENUM_STATES);
    for _ in 0..MAX_ENUM_STATES {
        strs.push(read_fixed_string(buf, pos, MAX_ENUM_STRING_SIZE)?);
    }
    Ok(strs)
}

fn encode_enum_strings(buf: &mut Vec<u8>, strs: &[String]) {
    for i in 0..MAX_ENUM_STATES {
        let s = strs.get(i).map(String::as_str).unwrap_or("");
        encode_fixed_string(buf, s, MAX_ENUM_STRING_SIZE);
    }
}

/// Identifies which DBR wire structure a payload uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbrType {
    String,
    Int,
    Float,
    Enum,
    Char,
    Long,
    Double,
    StsString,
    StsInt,
    StsFloat,
    StsEnum,
    StsChar,
    StsLong,
    StsDouble,
    TimeString,
    TimeInt,
    TimeFloat,
    TimeEnum,
    TimeChar,
    TimeLong,
    TimeDouble,
    GrInt,
    GrFloat,
    GrEnum,
    GrChar,
    GrLong,
    GrDouble,
    CtrlInt,
    CtrlFloat,
    CtrlEnum,
    CtrlChar,
    CtrlLong,
    CtrlDouble,
    PutAckt,
    PutAcks,
    StsackString,
    ClassName,
}

impl DbrType {
    /// Aliases: EPICS exposes `DBR_SHORT` et al. as pure naming aliases
    /// of the `*_INT` catalog entries, sharing the same wire `DBR_ID`.
    pub const SHORT: DbrType = DbrType::Int;
    pub const STS_SHORT: DbrType = DbrType::StsInt;
    pub const TIME_SHORT: DbrType = DbrType::TimeInt;
    pub const GR_SHORT: DbrType = DbrType::GrInt;
    pub const CTRL_SHORT: DbrType = DbrType::CtrlInt;

    pub fn id(self) -> u16 {
        match self {
            DbrType::String => 0,
            DbrType::Int => 1,
            DbrType::Float => 2,
            DbrType::Enum => 3,
            DbrType::Char => 4,
            DbrType::Long => 5,
            DbrType::Double => 6,
            DbrType::StsString => 7,
            DbrType::StsInt => 8,
            DbrType::StsFloat => 9,
            DbrType::StsEnum => 10,
            DbrType::StsChar => 11,
            DbrType::StsLong => 12,
            DbrType::StsDouble => 13,
            DbrType::TimeString => 14,
            DbrType::TimeInt => 15,
            DbrType::TimeFloat => 16,
            DbrType::TimeEnum => 17,
            DbrType::TimeChar => 18,
            DbrType::TimeLong => 19,
            DbrType::TimeDouble => 20,
            DbrType::GrInt => 22,
            DbrType::GrFloat => 23,
            DbrType::GrEnum => 24,
            DbrType::GrChar => 25,
            DbrType::GrLong => 26,
            DbrType::GrDouble => 27,
            DbrType::CtrlInt => 29,
            DbrType::CtrlFloat => 30,
            DbrType::CtrlEnum => 31,
            DbrType::CtrlChar => 32,
            DbrType::CtrlLong => 33,
            DbrType::CtrlDouble => 34,
            DbrType::PutAckt => 35,
            DbrType::PutAcks => 36,
            DbrType::StsackString => 37,
            DbrType::ClassName => 38,
        }
    }

    pub fn from_id(id: u16) -> Result<DbrType, RemoteProtocolError> {
        Ok(match id {
            0 => DbrType::String,
            1 => DbrType::Int,
            2 => DbrType::Float,
            3 => DbrType::Enum,
            4 => DbrType::Char,
            5 => DbrType::Long,
            6 => DbrType::Double,
            7 => DbrType::StsString,
            8 => DbrType::StsInt,
            9 => DbrType::StsFloat,
            10 => DbrType::StsEnum,
            11 => DbrType::StsChar,
            12 => DbrType::StsLong,
            13 => DbrType::StsDouble,
            14 => DbrType::TimeString,
            15 => DbrType::TimeInt,
            16 => DbrType::TimeFloat,
            17 => DbrType::TimeEnum,
            18 => DbrType::TimeChar,
            19 => DbrType::TimeLong,
            20 => DbrType::TimeDouble,
            22 => DbrType::GrInt,
            23 => DbrType::GrFloat,
            24 => DbrType::GrEnum,
            25 => DbrType::GrChar,
            26 => DbrType::GrLong,
            27 => DbrType::GrDouble,
            29 => DbrType::CtrlInt,
            30 => DbrType::CtrlFloat,
            31 => DbrType::CtrlEnum,
            32 => DbrType::CtrlChar,
            33 => DbrType::CtrlLong,
            34 => DbrType::CtrlDouble,
            35 => DbrType::PutAckt,
            36 => DbrType::PutAcks,
            37 => DbrType::StsackString,
            38 => DbrType::ClassName,
            21 | 28 => {
                return Err(RemoteProtocolError::new(format!(
                    "DBR_ID {id} is reserved (no graphic/control string type)"
                )));
            }
            other => {
                return Err(RemoteProtocolError::new(format!("unknown DBR_ID {other}")));
            }
        })
    }

    /// Size in bytes of one element of this DBR type on the wire.
    pub fn element_size(self) -> usize {
        match self {
            DbrType::String => STRING_SIZE,
            DbrType::Int | DbrType::Enum => 2,
            DbrType::Float => 4,
            DbrType::Char => 1,
            DbrType::Long => 4,
            DbrType::Double => 8,
            DbrType::StsString => 4 + STRING_SIZE,
            DbrType::StsInt | DbrType::StsEnum => 6,
            DbrType::StsFloat => 8,
            DbrType::StsChar => 6,
            DbrType::StsLong => 8,
            DbrType::StsDouble => 16,
            DbrType::TimeString => 12 + STRING_SIZE,
            DbrType::TimeInt | DbrType::TimeEnum => 16,
            DbrType::TimeFloat => 16,
            DbrType::TimeChar => 16,
            DbrType::TimeLong => 16,
            DbrType::TimeDouble => 24,
            DbrType::GrInt => 4 + MAX_UNITS_SIZE + 14,
            DbrType::GrFloat => 8 + MAX_UNITS_SIZE + 28,
            DbrType::GrEnum => 6 + MAX_ENUM_STATES * MAX_ENUM_STRING_SIZE + 2,
            DbrType::GrChar => 4 + MAX_UNITS_SIZE + 7,
            DbrType::GrLong => 4 + MAX_UNITS_SIZE + 28,
            DbrType::GrDouble => 8 + MAX_UNITS_SIZE + 56,
            DbrType::CtrlInt => 4 + MAX_UNITS_SIZE + 18,
            DbrType::CtrlFloat => 8 + MAX_UNITS_SIZE + 36,
            DbrType::CtrlEnum => 6 + MAX_ENUM_STATES * MAX_ENUM_STRING_SIZE + 2,
            DbrType::CtrlChar => 4 + MAX_UNITS_SIZE + 10,
            DbrType::CtrlLong => 4 + MAX_UNITS_SIZE + 36,
            DbrType::CtrlDouble => 8 + MAX_UNITS_SIZE + 72,
            DbrType::PutAckt | DbrType::PutAcks => 2,
            DbrType::StsackString => 8 + STRING_SIZE,
            DbrType::ClassName => 2,
        }
    }
}

macro_rules! dbr_value_enum {
    ($($variant:ident ( $ty:ident ) ),* $(,)?) => {
        /// One decoded DBR element. Each variant pairs a [`DbrType`]
        /// with the concrete struct holding its fields.
        #[derive(Debug, Clone, PartialEq)]
        pub enum DbrValue {
            $($variant($ty),)*
        }

        impl DbrValue {
            pub fn dbr_type(&self) -> DbrType {
                match self {
                    $(DbrValue::$variant(_) => DbrType::$variant,)*
                }
            }

            pub fn encode(&self, buf: &mut Vec<u8>) {
                match self {
                    $(DbrValue::$variant(v) => v.encode(buf),)*
                }
            }

            pub fn decode(ty: DbrType, buf: &[u8], pos: &mut usize) -> Result<DbrValue, RemoteProtocolError> {
                Ok(match ty {
                    $(DbrType::$variant => DbrValue::$variant($ty::decode(buf, pos)?),)*
                })
            }
        }
    };
}

dbr_value_enum! {
    String(DbrString),
    Int(DbrInt),
    Float(DbrFloat),
    Enum(DbrEnum),
    Char(DbrChar),
    Long(DbrLong),
    Double(DbrDouble),
    StsString(DbrStsString),
    StsInt(DbrStsInt),
    StsFloat(DbrStsFloat),
    StsEnum(DbrStsEnum),
    StsChar(DbrStsChar),
    StsLong(DbrStsLong),
    StsDouble(DbrStsDouble),
    TimeString(DbrTimeString),
    TimeInt(DbrTimeInt),
    TimeFloat(DbrTimeFloat),
    TimeEnum(DbrTimeEnum),
    TimeChar(DbrTimeChar),
    TimeLong(DbrTimeLong),
    TimeDouble(DbrTimeDouble),
    GrInt(DbrGrInt),
    GrFloat(DbrGrFloat),
    GrEnum(DbrGrEnum),
    GrChar(DbrGrChar),
    GrLong(DbrGrLong),
    GrDouble(DbrGrDouble),
    CtrlInt(DbrCtrlInt),
    CtrlFloat(DbrCtrlFloat),
    CtrlEnum(DbrCtrlEnum),
    CtrlChar(DbrCtrlChar),
    CtrlLong(DbrCtrlLong),
    CtrlDouble(DbrCtrlDouble),
    PutAckt(DbrPutAckt),
    PutAcks(DbrPutAcks),
    StsackString(DbrStsackString),
    ClassName(DbrClassName),
}

// ── Raw values (no status/severity prefix) ─────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DbrString {
    pub value: String,
}
impl DbrString {
    fn encode(&self, buf: &mut Vec<u8>) {
        encode_fixed_string(buf, &self.value, STRING_SIZE);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_fixed_string(buf, pos, STRING_SIZE)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrInt {
    pub value: i16,
}
impl DbrInt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_i16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrFloat {
    pub value: f32,
}
impl DbrFloat {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_f32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrEnum {
    pub value: u16,
}
impl DbrEnum {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_u16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrChar {
    pub value: u8,
}
impl DbrChar {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.value);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_u8(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrLong {
    pub value: i32,
}
impl DbrLong {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_i32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrDouble {
    pub value: f64,
}
impl DbrDouble {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_f64(buf, pos)?,
        })
    }
}

// ── Status-prefixed values ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DbrStsString {
    pub status: i16,
    pub severity: i16,
    pub value: String,
}
impl DbrStsString {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_fixed_string(buf, &self.value, STRING_SIZE);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            value: read_fixed_string(buf, pos, STRING_SIZE)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsInt {
    pub status: i16,
    pub severity: i16,
    pub value: i16,
}
impl DbrStsInt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            value: read_i16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsFloat {
    pub status: i16,
    pub severity: i16,
    pub value: f32,
}
impl DbrStsFloat {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            value: read_f32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsEnum {
    pub status: i16,
    pub severity: i16,
    pub value: u16,
}
impl DbrStsEnum {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            value: read_u16(buf, pos)?,
        })
    }
}

/// Carries an explicit RISC-alignment pad byte between `severity` and
/// `value`, reproduced byte-for-byte though never read back out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsChar {
    pub status: i16,
    pub severity: i16,
    pub value: u8,
}
impl DbrStsChar {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.push(0); // RISC_pad
        buf.push(self.value);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        read_u8(buf, pos)?; // RISC_pad
        let value = read_u8(buf, pos)?;
        Ok(Self {
            status,
            severity,
            value,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsLong {
    pub status: i16,
    pub severity: i16,
    pub value: i32,
}
impl DbrStsLong {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            value: read_i32(buf, pos)?,
        })
    }
}

/// Carries a 4-byte RISC-alignment pad before `value` so the following
/// 8-byte double lands on an 8-byte boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrStsDouble {
    pub status: i16,
    pub severity: i16,
    pub value: f64,
}
impl DbrStsDouble {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes()); // RISC_pad
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        read_i32(buf, pos)?; // RISC_pad
        let value = read_f64(buf, pos)?;
        Ok(Self {
            status,
            severity,
            value,
        })
    }
}

// ── Time-stamped values ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DbrTimeString {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: String,
}
impl DbrTimeString {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        encode_fixed_string(buf, &self.value, STRING_SIZE);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            stamp: EpicsTimeStamp::decode(buf, pos)?,
            value: read_fixed_string(buf, pos, STRING_SIZE)?,
        })
    }
}

/// Value type follows the doc-commented `dbr_short_t` (signed), not
/// the source's stray `dbr_ushort` field declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeInt {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: i16,
}
impl DbrTimeInt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let stamp = EpicsTimeStamp::decode(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad
        let value = read_i16(buf, pos)?;
        Ok(Self {
            status,
            severity,
            stamp,
            value,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeFloat {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: f32,
}
impl DbrTimeFloat {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            stamp: EpicsTimeStamp::decode(buf, pos)?,
            value: read_f32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeEnum {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: u16,
}
impl DbrTimeEnum {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let stamp = EpicsTimeStamp::decode(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad
        let value = read_u16(buf, pos)?;
        Ok(Self {
            status,
            severity,
            stamp,
            value,
        })
    }
}

/// Corrects the source's duplicate `RISC_pad0` field name: the true
/// layout (per its own doc comment) is a 2-byte pad followed by a
/// 1-byte pad, both reproduced here though neither round-trips a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeChar {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: u8,
}
impl DbrTimeChar {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad0
        buf.push(0); // RISC_pad1
        buf.push(self.value);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let stamp = EpicsTimeStamp::decode(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad0
        read_u8(buf, pos)?; // RISC_pad1
        let value = read_u8(buf, pos)?;
        Ok(Self {
            status,
            severity,
            stamp,
            value,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeLong {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: i32,
}
impl DbrTimeLong {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            stamp: EpicsTimeStamp::decode(buf, pos)?,
            value: read_i32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrTimeDouble {
    pub status: i16,
    pub severity: i16,
    pub stamp: EpicsTimeStamp,
    pub value: f64,
}
impl DbrTimeDouble {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        self.stamp.encode(buf);
        buf.extend_from_slice(&0i32.to_be_bytes()); // RISC_pad
        buf.extend_from_slice(&self.value.to_bits().to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let stamp = EpicsTimeStamp::decode(buf, pos)?;
        read_i32(buf, pos)?; // RISC_pad
        let value = read_f64(buf, pos)?;
        Ok(Self {
            status,
            severity,
            stamp,
            value,
        })
    }
}

// ── Graphic values ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrInt {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: i16,
    pub lower_disp_limit: i16,
    pub upper_alarm_limit: i16,
    pub upper_warning_limit: i16,
    pub lower_warning_limit: i16,
    pub lower_alarm_limit: i16,
    pub value: i16,
}
impl DbrGrInt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            units: read_units(buf, pos)?,
            upper_disp_limit: read_i16(buf, pos)?,
            lower_disp_limit: read_i16(buf, pos)?,
            upper_alarm_limit: read_i16(buf, pos)?,
            upper_warning_limit: read_i16(buf, pos)?,
            lower_warning_limit: read_i16(buf, pos)?,
            lower_alarm_limit: read_i16(buf, pos)?,
            value: read_i16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrFloat {
    pub status: i16,
    pub severity: i16,
    pub precision: i16,
    pub units: String,
    pub upper_disp_limit: f32,
    pub lower_disp_limit: f32,
    pub upper_alarm_limit: f32,
    pub upper_warning_limit: f32,
    pub lower_warning_limit: f32,
    pub lower_alarm_limit: f32,
    pub value: f32,
}
impl DbrGrFloat {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.precision.to_be_bytes());
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad0
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let precision = read_i16(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad0
        let units = read_units(buf, pos)?;
        Ok(Self {
            status,
            severity,
            precision,
            units,
            upper_disp_limit: read_f32(buf, pos)?,
            lower_disp_limit: read_f32(buf, pos)?,
            upper_alarm_limit: read_f32(buf, pos)?,
            upper_warning_limit: read_f32(buf, pos)?,
            lower_warning_limit: read_f32(buf, pos)?,
            lower_alarm_limit: read_f32(buf, pos)?,
            value: read_f32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrEnum {
    pub status: i16,
    pub severity: i16,
    pub strs: Vec<String>,
    pub value: u16,
}
impl DbrGrEnum {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&(self.strs.len() as i16).to_be_bytes());
        encode_enum_strings(buf, &self.strs);
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let no_str = read_i16(buf, pos)? as usize;
        let all = read_enum_strings(buf, pos)?;
        let value = read_u16(buf, pos)?;
        Ok(Self {
            status,
            severity,
            strs: all.into_iter().take(no_str.min(MAX_ENUM_STATES)).collect(),
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrChar {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: u8,
    pub lower_disp_limit: u8,
    pub upper_alarm_limit: u8,
    pub upper_warning_limit: u8,
    pub lower_warning_limit: u8,
    pub lower_alarm_limit: u8,
    pub value: u8,
}
impl DbrGrChar {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.value,
        ] {
            buf.push(v);
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            units: read_units(buf, pos)?,
            upper_disp_limit: read_u8(buf, pos)?,
            lower_disp_limit: read_u8(buf, pos)?,
            upper_alarm_limit: read_u8(buf, pos)?,
            upper_warning_limit: read_u8(buf, pos)?,
            lower_warning_limit: read_u8(buf, pos)?,
            lower_alarm_limit: read_u8(buf, pos)?,
            value: read_u8(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrLong {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: i32,
    pub lower_disp_limit: i32,
    pub upper_alarm_limit: i32,
    pub upper_warning_limit: i32,
    pub lower_warning_limit: i32,
    pub lower_alarm_limit: i32,
    pub value: i32,
}
impl DbrGrLong {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            units: read_units(buf, pos)?,
            upper_disp_limit: read_i32(buf, pos)?,
            lower_disp_limit: read_i32(buf, pos)?,
            upper_alarm_limit: read_i32(buf, pos)?,
            upper_warning_limit: read_i32(buf, pos)?,
            lower_warning_limit: read_i32(buf, pos)?,
            lower_alarm_limit: read_i32(buf, pos)?,
            value: read_i32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrGrDouble {
    pub status: i16,
    pub severity: i16,
    pub precision: i16,
    pub units: String,
    pub upper_disp_limit: f64,
    pub lower_disp_limit: f64,
    pub upper_alarm_limit: f64,
    pub upper_warning_limit: f64,
    pub lower_warning_limit: f64,
    pub lower_alarm_limit: f64,
    pub value: f64,
}
impl DbrGrDouble {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.precision.to_be_bytes());
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad0
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let precision = read_i16(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad0
        let units = read_units(buf, pos)?;
        Ok(Self {
            status,
            severity,
            precision,
            units,
            upper_disp_limit: read_f64(buf, pos)?,
            lower_disp_limit: read_f64(buf, pos)?,
            upper_alarm_limit: read_f64(buf, pos)?,
            upper_warning_limit: read_f64(buf, pos)?,
            lower_warning_limit: read_f64(buf, pos)?,
            lower_alarm_limit: read_f64(buf, pos)?,
            value: read_f64(buf, pos)?,
        })
    }
}

// ── Control values ───────────────────────────────────────────────────

/// Does not carry a `precision` field: the source's `_fields_` list
/// includes one, but it contradicts the struct's own doc comment
/// (which matches the true EPICS `dbr_ctrl_int`, which has none). The
/// doc comment is followed here.
#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlInt {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: i16,
    pub lower_disp_limit: i16,
    pub upper_alarm_limit: i16,
    pub upper_warning_limit: i16,
    pub lower_warning_limit: i16,
    pub lower_alarm_limit: i16,
    pub upper_ctrl_limit: i16,
    pub lower_ctrl_limit: i16,
    pub value: i16,
}
impl DbrCtrlInt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.upper_ctrl_limit,
            self.lower_ctrl_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            units: read_units(buf, pos)?,
            upper_disp_limit: read_i16(buf, pos)?,
            lower_disp_limit: read_i16(buf, pos)?,
            upper_alarm_limit: read_i16(buf, pos)?,
            upper_warning_limit: read_i16(buf, pos)?,
            lower_warning_limit: read_i16(buf, pos)?,
            lower_alarm_limit: read_i16(buf, pos)?,
            upper_ctrl_limit: read_i16(buf, pos)?,
            lower_ctrl_limit: read_i16(buf, pos)?,
            value: read_i16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlFloat {
    pub status: i16,
    pub severity: i16,
    pub precision: i16,
    pub units: String,
    pub upper_disp_limit: f32,
    pub lower_disp_limit: f32,
    pub upper_alarm_limit: f32,
    pub upper_warning_limit: f32,
    pub lower_warning_limit: f32,
    pub lower_alarm_limit: f32,
    pub upper_ctrl_limit: f32,
    pub lower_ctrl_limit: f32,
    pub value: f32,
}
impl DbrCtrlFloat {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.precision.to_be_bytes());
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad0
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.upper_ctrl_limit,
            self.lower_ctrl_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let precision = read_i16(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad0
        let units = read_units(buf, pos)?;
        Ok(Self {
            status,
            severity,
            precision,
            units,
            upper_disp_limit: read_f32(buf, pos)?,
            lower_disp_limit: read_f32(buf, pos)?,
            upper_alarm_limit: read_f32(buf, pos)?,
            upper_warning_limit: read_f32(buf, pos)?,
            lower_warning_limit: read_f32(buf, pos)?,
            lower_alarm_limit: read_f32(buf, pos)?,
            upper_ctrl_limit: read_f32(buf, pos)?,
            lower_ctrl_limit: read_f32(buf, pos)?,
            value: read_f32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlEnum {
    pub status: i16,
    pub severity: i16,
    pub strs: Vec<String>,
    pub value: u16,
}
impl DbrCtrlEnum {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&(self.strs.len() as i16).to_be_bytes());
        encode_enum_strings(buf, &self.strs);
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let no_str = read_i16(buf, pos)? as usize;
        let all = read_enum_strings(buf, pos)?;
        let value = read_u16(buf, pos)?;
        Ok(Self {
            status,
            severity,
            strs: all.into_iter().take(no_str.min(MAX_ENUM_STATES)).collect(),
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlChar {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: u8,
    pub lower_disp_limit: u8,
    pub upper_alarm_limit: u8,
    pub upper_warning_limit: u8,
    pub lower_warning_limit: u8,
    pub lower_alarm_limit: u8,
    pub upper_ctrl_limit: u8,
    pub lower_ctrl_limit: u8,
    pub value: u8,
}
impl DbrCtrlChar {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.upper_ctrl_limit,
            self.lower_ctrl_limit,
        ] {
            buf.push(v);
        }
        buf.push(0); // RISC_pad
        buf.push(self.value);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let units = read_units(buf, pos)?;
        let upper_disp_limit = read_u8(buf, pos)?;
        let lower_disp_limit = read_u8(buf, pos)?;
        let upper_alarm_limit = read_u8(buf, pos)?;
        let upper_warning_limit = read_u8(buf, pos)?;
        let lower_warning_limit = read_u8(buf, pos)?;
        let lower_alarm_limit = read_u8(buf, pos)?;
        let upper_ctrl_limit = read_u8(buf, pos)?;
        let lower_ctrl_limit = read_u8(buf, pos)?;
        read_u8(buf, pos)?; // RISC_pad
        let value = read_u8(buf, pos)?;
        Ok(Self {
            status,
            severity,
            units,
            upper_disp_limit,
            lower_disp_limit,
            upper_alarm_limit,
            upper_warning_limit,
            lower_warning_limit,
            lower_alarm_limit,
            upper_ctrl_limit,
            lower_ctrl_limit,
            value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlLong {
    pub status: i16,
    pub severity: i16,
    pub units: String,
    pub upper_disp_limit: i32,
    pub lower_disp_limit: i32,
    pub upper_alarm_limit: i32,
    pub upper_warning_limit: i32,
    pub lower_warning_limit: i32,
    pub lower_alarm_limit: i32,
    pub upper_ctrl_limit: i32,
    pub lower_ctrl_limit: i32,
    pub value: i32,
}
impl DbrCtrlLong {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.upper_ctrl_limit,
            self.lower_ctrl_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            units: read_units(buf, pos)?,
            upper_disp_limit: read_i32(buf, pos)?,
            lower_disp_limit: read_i32(buf, pos)?,
            upper_alarm_limit: read_i32(buf, pos)?,
            upper_warning_limit: read_i32(buf, pos)?,
            lower_warning_limit: read_i32(buf, pos)?,
            lower_alarm_limit: read_i32(buf, pos)?,
            upper_ctrl_limit: read_i32(buf, pos)?,
            lower_ctrl_limit: read_i32(buf, pos)?,
            value: read_i32(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrCtrlDouble {
    pub status: i16,
    pub severity: i16,
    pub precision: i16,
    pub units: String,
    pub upper_disp_limit: f64,
    pub lower_disp_limit: f64,
    pub upper_alarm_limit: f64,
    pub upper_warning_limit: f64,
    pub lower_warning_limit: f64,
    pub lower_alarm_limit: f64,
    pub upper_ctrl_limit: f64,
    pub lower_ctrl_limit: f64,
    pub value: f64,
}
impl DbrCtrlDouble {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.precision.to_be_bytes());
        buf.extend_from_slice(&0i16.to_be_bytes()); // RISC_pad0
        encode_units(buf, &self.units);
        for v in [
            self.upper_disp_limit,
            self.lower_disp_limit,
            self.upper_alarm_limit,
            self.upper_warning_limit,
            self.lower_warning_limit,
            self.lower_alarm_limit,
            self.upper_ctrl_limit,
            self.lower_ctrl_limit,
            self.value,
        ] {
            buf.extend_from_slice(&v.to_bits().to_be_bytes());
        }
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        let status = read_i16(buf, pos)?;
        let severity = read_i16(buf, pos)?;
        let precision = read_i16(buf, pos)?;
        read_i16(buf, pos)?; // RISC_pad0
        let units = read_units(buf, pos)?;
        Ok(Self {
            status,
            severity,
            precision,
            units,
            upper_disp_limit: read_f64(buf, pos)?,
            lower_disp_limit: read_f64(buf, pos)?,
            upper_alarm_limit: read_f64(buf, pos)?,
            upper_warning_limit: read_f64(buf, pos)?,
            lower_warning_limit: read_f64(buf, pos)?,
            lower_alarm_limit: read_f64(buf, pos)?,
            upper_ctrl_limit: read_f64(buf, pos)?,
            lower_ctrl_limit: read_f64(buf, pos)?,
            value: read_f64(buf, pos)?,
        })
    }
}

// ── Miscellaneous ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrPutAckt {
    pub value: u16,
}
impl DbrPutAckt {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_u16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrPutAcks {
    pub value: u16,
}
impl DbrPutAcks {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_u16(buf, pos)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbrStsackString {
    pub status: i16,
    pub severity: i16,
    pub ackt: u16,
    pub acks: u16,
    pub value: String,
}
impl DbrStsackString {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.status.to_be_bytes());
        buf.extend_from_slice(&self.severity.to_be_bytes());
        buf.extend_from_slice(&self.ackt.to_be_bytes());
        buf.extend_from_slice(&self.acks.to_be_bytes());
        encode_fixed_string(buf, &self.value, STRING_SIZE);
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            status: read_i16(buf, pos)?,
            severity: read_i16(buf, pos)?,
            ackt: read_u16(buf, pos)?,
            acks: read_u16(buf, pos)?,
            value: read_fixed_string(buf, pos, STRING_SIZE)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbrClassName {
    pub value: u16,
}
impl DbrClassName {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
    }
    fn decode(buf: &[u8], pos: &mut usize) -> Result<Self, RemoteProtocolError> {
        Ok(Self {
            value: read_u16(buf, pos)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: DbrValue) {
        let ty = value.dbr_type();
        let mut buf = Vec::new();
        value.encode(&mut buf);
        assert_eq!(buf.len(), ty.element_size());
        let mut pos = 0;
        let decoded = DbrValue::decode(ty, &buf, &mut pos).unwrap();
        assert_eq!(pos, buf.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn raw_family_roundtrips() {
        roundtrip(DbrValue::String(DbrString { value: "hello".into() }));
        roundtrip(DbrValue::Int(DbrInt { value: -7 }));
        roundtrip(DbrValue::Float(DbrFloat { value: 3.25 }));
        roundtrip(DbrValue::Enum(DbrEnum { value: 4 }));
        roundtrip(DbrValue::Char(DbrChar { value: 9 }));
        roundtrip(DbrValue::Long(DbrLong { value: -123456 }));
        roundtrip(DbrValue::Double(DbrDouble { value: 3.14159 }));
    }

    #[test]
    fn status_family_roundtrips() {
        roundtrip(DbrValue::StsInt(DbrStsInt {
            status: 1,
            severity: 2,
            value: 42,
        }));
        roundtrip(DbrValue::StsDouble(DbrStsDouble {
            status: 0,
            severity: 0,
            value: 2.5,
        }));
    }

    #[test]
    fn time_family_roundtrips() {
        roundtrip(DbrValue::TimeDouble(DbrTimeDouble {
            status: 1,
            severity: 1,
            stamp: EpicsTimeStamp {
                seconds_since_epoch: 100,
                nano_seconds: 500,
            },
            value: 3.14,
        }));
        roundtrip(DbrValue::TimeChar(DbrTimeChar {
            status: 0,
            severity: 0,
            stamp: EpicsTimeStamp::default(),
            value: 7,
        }));
    }

    #[test]
    fn graphic_and_control_roundtrip() {
        roundtrip(DbrValue::GrFloat(DbrGrFloat {
            status: 0,
            severity: 0,
            precision: 3,
            units: "mm".into(),
            upper_disp_limit: 10.0,
            lower_disp_limit: -10.0,
            upper_alarm_limit: 9.0,
            upper_warning_limit: 8.0,
            lower_warning_limit: -8.0,
            lower_alarm_limit: -9.0,
            value: 1.5,
        }));
        roundtrip(DbrValue::CtrlEnum(DbrCtrlEnum {
            status: 0,
            severity: 0,
            strs: vec!["OFF".into(), "ON".into()],
            value: 1,
        }));
    }

    #[test]
    fn ctrl_int_has_no_precision_field() {
        let value = DbrCtrlInt {
            status: 0,
            severity: 0,
            units: "V".into(),
            upper_disp_limit: 10,
            lower_disp_limit: -10,
            upper_alarm_limit: 9,
            upper_warning_limit: 8,
            lower_warning_limit: -8,
            lower_alarm_limit: -9,
            upper_ctrl_limit: 10,
            lower_ctrl_limit: -10,
            value: 0,
        };
        let mut buf = Vec::new();
        value.encode(&mut buf);
        assert_eq!(buf.len(), DbrType::CtrlInt.element_size());
    }

    #[test]
    fn dbr_type_id_roundtrip() {
        for ty in [
            DbrType::String,
            DbrType::StsDouble,
            DbrType::TimeEnum,
            DbrType::GrLong,
            DbrType::CtrlChar,
            DbrType::StsackString,
            DbrType::ClassName,
        ] {
            assert_eq!(DbrType::from_id(ty.id()).unwrap(), ty);
        }
    }

    #[test]
    fn reserved_ids_rejected() {
        assert!(DbrType::from_id(21).is_err());
        assert!(DbrType::from_id(28).is_err());
    }

    #[test]
    fn short_aliases_share_int_id() {
        assert_eq!(DbrType::SHORT, DbrType::Int);
        assert_eq!(DbrType::SHORT.id(), DbrType::Int.id());
    }
}
