//! Mount registration: catalog × codec → mount points.

use crate::catalog::CatalogEntry;
use crate::pipeline::Codec;

/// Which direction a mount's media flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Server to client only.
    Play,
}

/// Everything the media server needs to publish one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRegistration {
    /// URL path, e.g. `/test-vp8`.
    pub path: String,
    /// Launch line handed to the media factory.
    pub launch: String,
    pub transport_mode: TransportMode,
    /// One pipeline shared by every client of the mount.
    pub shared: bool,
    pub codec: Codec,
}

impl MountRegistration {
    pub fn new(entry: &CatalogEntry, codec: Codec) -> Self {
        Self {
            path: codec.mount_path(entry),
            launch: codec.describe(entry),
            transport_mode: TransportMode::Play,
            shared: true,
            codec,
        }
    }
}

/// Registry of mount points on the media server.
///
/// Registration cannot fail: a bad launch line only surfaces when a client
/// requests the stream.
pub trait MountPoints {
    fn add_mount(&mut self, registration: MountRegistration);
}

/// All registrations for `catalog`, H.264 mounts first, each codec in
/// catalog order.
pub fn registrations(catalog: &[CatalogEntry]) -> Vec<MountRegistration> {
    Codec::ALL
        .iter()
        .flat_map(|&codec| {
            catalog
                .iter()
                .map(move |entry| MountRegistration::new(entry, codec))
        })
        .collect()
}

/// Register every catalog stream with `mounts`, returning what was added.
pub fn register_catalog<M: MountPoints + ?Sized>(
    catalog: &[CatalogEntry],
    mounts: &mut M,
) -> Vec<MountRegistration> {
    let registrations = registrations(catalog);
    for registration in &registrations {
        tracing::debug!(path = %registration.path, codec = registration.codec.label(), "registering mount");
        mounts.add_mount(registration.clone());
    }
    registrations
}

/// `rtsp://localhost:<port><path>` for the startup banner.
pub fn stream_url(port: u16, registration: &MountRegistration) -> String {
    format!("rtsp://localhost:{port}{}", registration.path)
}
