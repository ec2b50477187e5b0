use bitflags::bitflags;

bitflags! {
    /// Options of a serialize call.
    ///
    /// Encoder options live in the low bits, engine options are reserved in the
    /// top bits so both can be packed into a single integer.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SerializeFlags: u32 {
        /// Indent produced JSON text.
        const PRETTY_PRINT = 1 << 7;
        /// Do not retry a failed encode with sanitized text.
        const SKIP_SANITIZE = 1 << 28;
        /// Ignore custom serialize and field filter hooks.
        const SKIP_MAGIC_METHODS = 1 << 29;
        /// Do not write type tags.
        const SKIP_CLASS_NAME = 1 << 30;
    }
}

bitflags! {
    /// Options of a deserialize call.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DecodeFlags: u32 {
        /// Integers that do not fit `i64` decode as strings instead of floats.
        const BIGINT_AS_STRING = 1 << 1;
    }
}

/// Default recursion budget of facade calls.
pub const DEFAULT_MAX_DEPTH: usize = 512;
