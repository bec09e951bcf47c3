/*!
 * End-to-end demo against the simulated vendor adapter.
 *
 * Discovers a simulated device, connects a media service to it, launches a
 * video, subscribes to play state changes and drives a few transport
 * commands.
 */
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use castbridge_devices::adapters::simulated::{SimulatedDiscoveryAdapter, SimulatedMediaDevice};
use castbridge_devices::capability::{CapabilityInterface, CapabilityRegistry};
use castbridge_devices::command::FnResponseListener;
use castbridge_devices::discovery::{DiscoveryListener, DiscoveryProvider, ServiceDescription};
use castbridge_devices::media::{ImageInfo, MediaInfo, MediaLaunchObject};
use castbridge_devices::service::{DeviceService, MediaControl, MediaPlayer, MediaService};
use castbridge_devices::subscription::PlayStateStatus;
use castbridge_devices::ServiceCommandError;

struct LoggingDiscoveryListener;

impl DiscoveryListener for LoggingDiscoveryListener {
    fn on_service_added(&self, _provider: &DiscoveryProvider, description: &ServiceDescription) {
        info!(
            uuid = %description.uuid,
            name = %description.friendly_name,
            "Found device"
        );
    }

    fn on_service_removed(&self, _provider: &DiscoveryProvider, description: &ServiceDescription) {
        info!(uuid = %description.uuid, "Lost device");
    }

    fn on_discovery_failed(&self, provider: &DiscoveryProvider, error: ServiceCommandError) {
        info!(service_id = %provider.service_id(), %error, "Discovery failed");
    }
}

#[tokio::main]
async fn main() -> Result<(), castbridge_core::error::Error> {
    castbridge_core::init()?;

    let adapter = SimulatedDiscoveryAdapter::new();
    adapter.add_device(SimulatedMediaDevice::new("sim-livingroom", "Living Room TV"));

    let provider = DiscoveryProvider::new(adapter.clone());
    provider.add_listener(Arc::new(LoggingDiscoveryListener));
    provider.start();

    let description = provider
        .found_services()
        .into_iter()
        .next()
        .ok_or_else(|| castbridge_core::error::Error::event("no device discovered"))?;

    let service = MediaService::from_description(description);
    service.connect();

    let config = castbridge_core::config::BridgeConfig::default();
    let registry = CapabilityRegistry::from_config(&config.discovery);
    registry.register(service.clone());
    let player = registry
        .best_for(CapabilityInterface::MediaPlayer)
        .ok_or_else(|| castbridge_core::error::Error::event("no media player available"))?;
    info!(service_id = %player.service_id(), "Routing media commands");

    service.subscribe_play_state(Some(FnResponseListener::new(
        |state: PlayStateStatus| info!(?state, "Play state changed"),
        |error| info!(%error, "Play state error"),
    )));

    let media = MediaInfo::builder()
        .url("http://example.com/trailer.mp4")
        .mime_type("video/mp4")
        .title("Sintel Trailer")
        .description("Blender Foundation short film")
        .image(ImageInfo::new("http://example.com/trailer.jpg"))
        .build();

    service.play_media(
        &media,
        false,
        Some(FnResponseListener::new(
            |launch: MediaLaunchObject| {
                info!(session = %launch.launch_session.id, "Media launched")
            },
            |error| info!(%error, "Launch failed"),
        )),
    );

    tokio::time::sleep(Duration::from_millis(200)).await;

    service.seek(5_000, None);
    service.pause(None);
    service.play(None);
    service.close_media(None);

    tokio::time::sleep(Duration::from_millis(200)).await;

    service.disconnect();
    provider.stop();
    Ok(())
}
