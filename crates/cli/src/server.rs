//! GStreamer RTSP server behind the [`MountPoints`] seam.

use gst::glib;
use gst_rtsp_server::prelude::*;
use gst_rtsp_server::{RTSPMediaFactory, RTSPMountPoints, RTSPServer, RTSPTransportMode};

use rtsp_test_server::{MountPoints, MountRegistration, Result, ServerError, TransportMode};

pub struct RtspServer {
    server: RTSPServer,
    mounts: RTSPMountPoints,
}

impl RtspServer {
    /// Create a server listening on `0.0.0.0:<port>` once attached.
    pub fn new(port: u16) -> Result<Self> {
        let server = RTSPServer::new();
        server.set_address("0.0.0.0");
        server.set_service(&port.to_string());

        let mounts = server
            .mount_points()
            .ok_or(ServerError::MountPointsUnavailable)?;

        Ok(Self { server, mounts })
    }

    /// Start accepting clients on the default main context.
    ///
    /// The returned source must be removed once the main loop has returned.
    pub fn attach(&self) -> Result<glib::SourceId> {
        let id = self
            .server
            .attach(None)
            .map_err(|e| ServerError::Attach(e.to_string()))?;
        tracing::debug!(port = self.server.bound_port(), "server attached");
        Ok(id)
    }
}

/// Media factory publishing `registration`'s launch line.
fn media_factory(registration: &MountRegistration) -> RTSPMediaFactory {
    let factory = RTSPMediaFactory::new();
    factory.set_transport_mode(match registration.transport_mode {
        TransportMode::Play => RTSPTransportMode::PLAY,
    });
    factory.set_launch(&registration.launch);
    factory.set_shared(registration.shared);
    factory
}

impl MountPoints for RtspServer {
    fn add_mount(&mut self, registration: MountRegistration) {
        self.mounts
            .add_factory(&registration.path, media_factory(&registration));
        tracing::info!(path = %registration.path, codec = registration.codec.label(), "mount registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtsp_test_server::mount::register_catalog;
    use rtsp_test_server::{CATALOG, CatalogEntry, Codec};

    fn mounted(server: &RtspServer, path: &str) -> RTSPMediaFactory {
        let (factory, matched) = server.mounts.match_(path);
        assert_eq!(matched as usize, path.len(), "{path} only partially matched");
        let factory: Option<RTSPMediaFactory> = Option::from(factory);
        factory.unwrap_or_else(|| panic!("nothing mounted at {path}"))
    }

    #[test]
    fn server_uses_configured_port() {
        gst::init().unwrap();
        let server = RtspServer::new(18554).unwrap();
        assert_eq!(server.server.service().as_deref(), Some("18554"));
        assert_eq!(server.server.address().as_deref(), Some("0.0.0.0"));
    }

    #[test]
    fn catalog_reaches_mount_points() {
        gst::init().unwrap();
        let mut server = RtspServer::new(18554).unwrap();
        let registrations = register_catalog(CATALOG, &mut server);
        assert_eq!(registrations.len(), 2);

        let entry = CatalogEntry::new("test", "smpte");
        for (path, codec) in [("/test", Codec::H264), ("/test-vp8", Codec::Vp8)] {
            let factory = mounted(&server, path);
            assert_eq!(
                factory.launch().as_deref(),
                Some(codec.describe(&entry).as_str())
            );
            assert_eq!(factory.transport_mode(), RTSPTransportMode::PLAY);
            assert!(factory.is_shared());
        }
    }

    #[test]
    fn factory_mirrors_registration() {
        gst::init().unwrap();
        let entry = CatalogEntry::new("bars", "smpte100");
        let registration = MountRegistration::new(&entry, Codec::Vp8);
        let factory = media_factory(&registration);
        assert_eq!(
            factory.launch().as_deref(),
            Some(registration.launch.as_str())
        );
        assert!(factory.launch().unwrap().contains("pattern=smpte100"));
        assert_eq!(factory.transport_mode(), RTSPTransportMode::PLAY);
        assert!(factory.is_shared());
    }
}
