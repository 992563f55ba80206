//! Schema of the "proxy drivers" option group.
//!
//! The option names, defaults and help text are static metadata owned by the
//! configuration crate. Loading layers values over these defaults; the schema
//! itself is never mutated at runtime.

/// Name of the option group selecting proxy drivers.
pub const DRIVER_GROUP: &str = "proxy:drivers";

/// Static description of a recognised option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Option name within its group.
    pub name: &'static str,
    /// Value used when no layer supplies one.
    pub default: &'static str,
    /// One-line description for operators.
    pub help: &'static str,
}

pub(crate) const TRANSPORT_OPTION: OptionSpec = OptionSpec {
    name: "transport",
    default: "wsgi",
    help: "Transport driver to use",
};

pub(crate) const STORAGE_OPTION: OptionSpec = OptionSpec {
    name: "storage",
    default: "memory",
    help: "Storage driver to use",
};

/// Options recognised in [`DRIVER_GROUP`].
pub const DRIVER_OPTIONS: [OptionSpec; 2] = [TRANSPORT_OPTION, STORAGE_OPTION];

/// Borrowed view over the resolved "proxy drivers" group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions<'a> {
    /// Transport driver name.
    pub transport: &'a str,
    /// Storage driver name.
    pub storage: &'a str,
}

impl DriverOptions<'_> {
    /// Looks up an option of the group by its schema name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            "transport" => Some(self.transport),
            "storage" => Some(self.storage),
            _ => None,
        }
    }
}
