/// One named test stream: a mount name plus the `videotestsrc` pattern it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// URL-safe token, used verbatim as the mount path segment.
    pub name: &'static str,
    /// Pattern nick understood by `videotestsrc` (`smpte`, `ball`, `snow`, ...).
    ///
    /// Not validated here; an unknown pattern only fails when a client
    /// first requests the stream.
    pub pattern: &'static str,
}

impl CatalogEntry {
    pub const fn new(name: &'static str, pattern: &'static str) -> Self {
        Self { name, pattern }
    }
}

/// Streams served by the daemon.
pub const CATALOG: &[CatalogEntry] = &[CatalogEntry::new("test", "smpte")];
