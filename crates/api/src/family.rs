use std::fmt;

bitflags::bitflags! {
    /// Routing key shared by a command and the handlers/extensions eligible
    /// to process it. Families compose by bitwise OR, so one command can be
    /// routed through several pipeline stages without re-specifying context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Family: u32 {
        const CLASSIFY    = 1 << 0;
        const RESOLVE     = 1 << 1;
        const COMPILE     = 1 << 2;
        const LINK        = 1 << 3;
        const PACKAGE     = 1 << 4;
        const LINT        = 1 << 5;
        const INSTALL     = 1 << 6;
        const PROJECT_GEN = 1 << 7;
    }
}

impl Family {
    /// Look up a single family by its configuration name.
    pub fn from_name(name: &str) -> crate::ApiResult<Self> {
        match name {
            "classify" => Ok(Family::CLASSIFY),
            "resolve" => Ok(Family::RESOLVE),
            "compile" => Ok(Family::COMPILE),
            "link" => Ok(Family::LINK),
            "package" => Ok(Family::PACKAGE),
            "lint" => Ok(Family::LINT),
            "install" => Ok(Family::INSTALL),
            "project-gen" => Ok(Family::PROJECT_GEN),
            other => Err(crate::ApiError::UnknownFamily(other.to_string())),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.bits())
    }
}

/// Composite command identifier. The low-order half carries the family bits;
/// the high-order half is a template discriminator for specialized commands
/// (zero for ordinary commands created from a bare family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    pub const fn new(template: u32, family: Family) -> Self {
        Self(((template as u64) << 32) | family.bits() as u64)
    }

    /// Id of an ordinary command: the family itself, no template component.
    pub const fn from_family(family: Family) -> Self {
        Self::new(0, family)
    }

    /// The family component is the low-order half of the composite id.
    pub const fn family(self) -> Family {
        Family::from_bits_retain(self.0 as u32)
    }

    pub const fn template(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Widen the routing key by OR-ing in additional family bits.
    /// The template component is preserved.
    pub const fn widen(self, extra: Family) -> Self {
        Self(self.0 | extra.bits() as u64)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<Family> for CommandId {
    fn from(family: Family) -> Self {
        Self::from_family(family)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
