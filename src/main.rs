//! Scan for Mopeka tank sensors and log their readings.
//!
//! Every observed advertisement with Mopeka's manufacturer id is decoded
//! and fed into an aggregator. All discovered sensors share one
//! configuration, taken from the environment:
//!
//! - `TANKREAD_MEDIUM` (default `propane`)
//! - `TANKREAD_TANK` (default `20lb_v`)
//! - `TANKREAD_MIN_QUALITY` (default `0`, one of 0/20/50/80)

use std::time::SystemTime;

use anyhow::anyhow;
use bluest::{Adapter, Uuid};
use futures_util::StreamExt;
use log::{debug, info, warn};

use tankread::{Aggregator, Outcome, SensorConfig, MANUFACTURER_ID, SERVICE_UUID};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let medium = std::env::var("TANKREAD_MEDIUM").unwrap_or_else(|_| "propane".to_string());
    let tank = std::env::var("TANKREAD_TANK").unwrap_or_else(|_| "20lb_v".to_string());
    let min_quality = match std::env::var("TANKREAD_MIN_QUALITY") {
        Ok(value) => value.parse()?,
        Err(_) => 0,
    };
    let config = SensorConfig::new(&medium, &tank, min_quality)?;
    info!("Tank {tank}, medium {}, minimum quality {min_quality}%", config.medium);

    let adapter = Adapter::default()
        .await
        .ok_or(anyhow!("Default adapter not found"))?;
    adapter.wait_available().await?;

    let required_services = [Uuid::parse_str(SERVICE_UUID)?];
    let mut scan = adapter.scan(&required_services).await?;
    info!("Scanning for Mopeka sensors");

    let mut aggregator = Aggregator::new();
    while let Some(discovered) = scan.next().await {
        let Some(manufacturer_data) = discovered.adv_data.manufacturer_data else {
            continue;
        };
        if manufacturer_data.company_id != MANUFACTURER_ID {
            continue;
        }
        let payload = manufacturer_data.data;
        let Some(&hardware_id) = payload.first() else {
            continue;
        };

        let identity = format!("{:?}", discovered.device.id());
        if !aggregator.is_configured(&identity) {
            info!("Discovered sensor {identity}");
            aggregator.add_sensor(&identity, config.clone());
        }

        match aggregator.handle_advertisement(&identity, hardware_id, &payload, SystemTime::now())
        {
            Ok(Outcome::Accepted(reading)) => {
                info!(
                    "{identity}: level {:.1}%, {} °C, battery {}%, quality {}%",
                    reading.level_percent,
                    reading.temperature_celsius,
                    reading.battery_percent,
                    reading.quality_percent
                );
            }
            Ok(Outcome::Rejected { quality_percent }) => {
                debug!("{identity}: reading rejected, quality {quality_percent}%");
            }
            Ok(Outcome::NotConfigured) => {}
            Err(err) => {
                let payload = hex::encode(&payload);
                warn!("{identity}: {err} (payload {payload})");
            }
        }
    }

    Ok(())
}
