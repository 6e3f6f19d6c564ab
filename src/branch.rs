//! Types for representing branches and branch outcomes.

use serde::{ Deserialize, Serialize };

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl Outcome {
    pub fn from_bool(b: bool) -> Self {
        match b {
            true => Self::T,
            false => Self::N,
        }
    }

    /// The signed unit value used as perceptron input (+1 taken, -1 not).
    pub fn signum(self) -> i8 {
        match self {
            Self::T => 1,
            Self::N => -1,
        }
    }

    pub fn is_taken(self) -> bool {
        self == Self::T
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self {
        Self::from_bool(x)
    }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> bool {
        x.is_taken()
    }
}

/// Different kinds of control-transfer instructions.
///
/// The predictor treats every kind identically. The distinction only
/// matters to whatever produced the trace.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BranchKind {
    /// A direct conditional branch instruction.
    DirectBranch = BranchFlags::BRN_FLAG,

    /// A direct unconditional jump instruction.
    DirectJump   = BranchFlags::JMP_FLAG,

    /// An indirect unconditional jump instruction.
    IndirectJump = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG,

    /// A direct procedure call instruction.
    DirectCall   = BranchFlags::CALL_FLAG,

    /// An indirect procedure call instruction.
    IndirectCall = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG,

    /// A return instruction.
    Return       = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG,

    /// A system call instruction.
    Syscall      = BranchFlags::SYSCALL_FLAG,
}
impl BranchKind {
    const DIRECT_BRANCH: u32 = BranchFlags::BRN_FLAG;
    const DIRECT_JUMP: u32 = BranchFlags::JMP_FLAG;
    const DIRECT_CALL: u32 = BranchFlags::CALL_FLAG;
    const INDIRECT_CALL: u32 = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG;
    const INDIRECT_JUMP: u32 = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG;
    const RETURN: u32 = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG;
    const SYSCALL: u32 = BranchFlags::SYSCALL_FLAG;

    /// Decode the kind bits of some [BranchFlags].
    /// Returns [None] for combinations that don't name a kind.
    pub fn from_flags(x: u32) -> Option<Self> {
        match x & BranchFlags::KIND_MASK {
            Self::DIRECT_BRANCH => Some(Self::DirectBranch),
            Self::DIRECT_JUMP   => Some(Self::DirectJump),
            Self::DIRECT_CALL   => Some(Self::DirectCall),
            Self::INDIRECT_JUMP => Some(Self::IndirectJump),
            Self::INDIRECT_CALL => Some(Self::IndirectCall),
            Self::RETURN        => Some(Self::Return),
            Self::SYSCALL       => Some(Self::Syscall),
            _ => None,
        }
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::DirectBranch)
    }

    pub fn is_procedural(&self) -> bool {
        matches!(self, Self::DirectCall | Self::IndirectCall | Self::Return)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchFlags(pub u32);
impl BranchFlags {
    const BRN_FLAG: u32     = 1 << 0;
    const JMP_FLAG: u32     = 1 << 1;
    const CALL_FLAG: u32    = 1 << 2;
    const RET_FLAG: u32     = 1 << 3;
    const IND_FLAG: u32     = 1 << 4;
    const TAKEN_FLAG: u32   = 1 << 5;
    const SYSCALL_FLAG: u32 = 1 << 6;

    /// Bits that select a [BranchKind].
    const KIND_MASK: u32 = 0b101_1111;

    pub fn new(kind: BranchKind, outcome: Outcome) -> Self {
        let kbits = kind as u32;
        let tbits = if outcome.is_taken() { Self::TAKEN_FLAG } else { 0 };
        Self(kbits | tbits)
    }

    pub fn is_brn(&self) -> bool { self.0 & Self::BRN_FLAG != 0 }
    pub fn is_jmp(&self) -> bool { self.0 & Self::JMP_FLAG != 0 }
    pub fn is_call(&self) -> bool { self.0 & Self::CALL_FLAG != 0 }
    pub fn is_ret(&self) -> bool { self.0 & Self::RET_FLAG != 0 }
    pub fn is_syscall(&self) -> bool { self.0 & Self::SYSCALL_FLAG != 0 }
    pub fn is_direct(&self) -> bool { self.0 & Self::IND_FLAG == 0 }
    pub fn is_indirect(&self) -> bool { self.0 & Self::IND_FLAG != 0 }
    pub fn is_taken(&self) -> bool { self.0 & Self::TAKEN_FLAG != 0 }

    pub fn kind(&self) -> Option<BranchKind> {
        BranchKind::from_flags(self.0)
    }
}


/// A record of branch execution, as stored in a binary trace.
///
/// On disk each record is [BranchRecord::SIZE] bytes, little-endian:
/// the program counter, the target, the flags, and four bytes of padding
/// (the layout of the equivalent `#[repr(C)]` struct on a 64-bit target).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchRecord {
    /// The program counter value for this branch
    pub pc: usize,

    /// The target address evaluated for this branch
    pub tgt: usize,

    pub flags: BranchFlags,
}
impl BranchRecord {
    /// Size of an encoded record in bytes.
    pub const SIZE: usize = 24;

    pub fn new(pc: usize, tgt: usize, kind: BranchKind, outcome: Outcome)
        -> Self
    {
        Self { pc, tgt, flags: BranchFlags::new(kind, outcome) }
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_bool(self.flags.is_taken())
    }

    /// The kind of branch. Records built by [BranchRecord::new] or
    /// accepted by [BranchRecord::from_bytes] always have one.
    pub fn kind(&self) -> Option<BranchKind> {
        self.flags.kind()
    }

    /// Returns 'true' if this is a conditional instruction.
    pub fn is_conditional(&self) -> bool {
        self.flags.is_brn()
    }

    /// Returns 'true' if this is a "call" or "return".
    pub fn is_procedural(&self) -> bool {
        self.flags.is_call() || self.flags.is_ret()
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut res = [0u8; Self::SIZE];
        res[0..8].copy_from_slice(&(self.pc as u64).to_le_bytes());
        res[8..16].copy_from_slice(&(self.tgt as u64).to_le_bytes());
        res[16..20].copy_from_slice(&self.flags.0.to_le_bytes());
        res
    }

    /// Decode a record. Returns [None] when the flags don't name a
    /// [BranchKind].
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Option<Self> {
        let mut pc  = [0u8; 8];
        let mut tgt = [0u8; 8];
        let mut flg = [0u8; 4];
        pc.copy_from_slice(&bytes[0..8]);
        tgt.copy_from_slice(&bytes[8..16]);
        flg.copy_from_slice(&bytes[16..20]);

        let flags = BranchFlags(u32::from_le_bytes(flg));
        flags.kind()?;
        Some(Self {
            pc: u64::from_le_bytes(pc) as usize,
            tgt: u64::from_le_bytes(tgt) as usize,
            flags,
        })
    }
}

/// A single resolved control-transfer event presented to the predictor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BranchEvent {
    pub pc: usize,
    pub kind: BranchKind,
    pub outcome: Outcome,
}
impl BranchEvent {
    pub fn new(pc: usize, kind: BranchKind, outcome: Outcome) -> Self {
        Self { pc, kind, outcome }
    }

    /// A conditional branch event, for callers that don't care about kind.
    pub fn conditional(pc: usize, outcome: Outcome) -> Self {
        Self::new(pc, BranchKind::DirectBranch, outcome)
    }
}

impl TryFrom<&BranchRecord> for BranchEvent {
    type Error = u32;
    fn try_from(r: &BranchRecord) -> Result<Self, u32> {
        let kind = r.kind().ok_or(r.flags.0)?;
        Ok(Self::new(r.pc, kind, r.outcome()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_bytes_keep_kind_and_outcome() {
        let r = BranchRecord::new(
            0xdead_beef, 0x1000, BranchKind::IndirectCall, Outcome::T
        );
        let d = BranchRecord::from_bytes(&r.to_bytes()).unwrap();
        assert_eq!(d, r);
        assert_eq!(d.kind(), Some(BranchKind::IndirectCall));
        assert_eq!(d.outcome(), Outcome::T);
        assert!(d.is_procedural());
        assert!(!d.is_conditional());
    }

    #[test]
    fn syscall_flags_decode() {
        let f = BranchFlags::new(BranchKind::Syscall, Outcome::N);
        assert!(f.is_syscall());
        assert!(!f.is_taken());
        assert_eq!(f.kind(), Some(BranchKind::Syscall));
    }

    #[test]
    fn bogus_flags_are_rejected() {
        // call + return is not a kind
        let mut bytes = [0u8; BranchRecord::SIZE];
        bytes[16] = 0b0000_1100;
        assert_eq!(BranchRecord::from_bytes(&bytes), None);
        assert_eq!(BranchKind::from_flags(0), None);
    }

    #[test]
    fn outcome_signum() {
        assert_eq!(Outcome::T.signum(), 1);
        assert_eq!(Outcome::N.signum(), -1);
        assert_eq!(!Outcome::T, Outcome::N);
        assert!(bool::from(Outcome::from(true)));
    }
}
