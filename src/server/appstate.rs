use std::fs::File;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use zigate_api::config::AppConfig;

use crate::backend::luup::{DevicesInfos, LuupClient};
use crate::error::ApiResult;
use crate::model::discovery::{self, DiscoveredEquipment};
use crate::model::equipment::{self, Equipment};

/// One full-replacement view of the gateway's world.
///
/// Never patched in place: every refresh builds a new snapshot and swaps it
/// whole, so readers either see the previous complete state or the next one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub equipments: Vec<Equipment>,
    #[serde(default)]
    pub discovered: Vec<DiscoveredEquipment>,
    #[serde(default)]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Build a snapshot from a refresh document: sort for display and reject
    /// discovered records whose mappings don't line up with their
    /// capabilities.
    #[must_use]
    pub fn ingest(infos: DevicesInfos) -> Self {
        let mut equipments = infos.equipments;
        equipment::sort_equipments(&mut equipments);
        for equipment in &mut equipments {
            equipment.sort_mappings();
        }

        let mut discovered = Vec::with_capacity(infos.discovered_equipments.len());
        for record in infos.discovered_equipments {
            match record.validate() {
                Ok(()) => discovered.push(record),
                Err(err) => log::warn!("Rejecting discovered equipment: {err}"),
            }
        }
        discovery::sort_discovered(&mut discovered);

        Self {
            equipments,
            discovered,
            refreshed_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    conf: Arc<AppConfig>,
    luup: Arc<LuupClient>,
    snapshot: Arc<Mutex<Arc<Snapshot>>>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> ApiResult<Self> {
        let luup = LuupClient::new(&config.luup)?;

        let snapshot = match File::open(&config.admin.state_file) {
            Ok(fd) => {
                log::debug!("Existing state file found, loading..");
                match serde_yml::from_reader(fd) {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        log::warn!(
                            "Failed to parse {}, starting empty: {err}",
                            config.admin.state_file
                        );
                        Snapshot::default()
                    }
                }
            }
            Err(_) => Snapshot::default(),
        };

        Ok(Self {
            conf: Arc::new(config),
            luup: Arc::new(luup),
            snapshot: Arc::new(Mutex::new(Arc::new(snapshot))),
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        self.conf.clone()
    }

    #[must_use]
    pub fn luup(&self) -> &LuupClient {
        &self.luup
    }

    /// The current snapshot; empty until the first successful refresh.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.lock().await.clone()
    }

    /// Fetch a fresh document from the gateway and swap it in atomically.
    pub async fn reload(&self) -> ApiResult<Arc<Snapshot>> {
        let infos = self.luup.get_devices_infos().await?;
        let snapshot = Arc::new(Snapshot::ingest(infos));

        *self.snapshot.lock().await = snapshot.clone();

        if let Err(err) = self.persist(&snapshot) {
            log::warn!("Failed to persist snapshot: {err}");
        }

        Ok(snapshot)
    }

    fn persist(&self, snapshot: &Snapshot) -> ApiResult<()> {
        let file = File::create(&self.conf.admin.state_file)?;
        serde_yml::to_writer(file, snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ingest_rejects_mismatched_discovered_records() {
        let infos: DevicesInfos = serde_json::from_value(json!({
            "equipments": [],
            "discoveredEquipments": [
                {
                    "protocol": "ZIGBEE",
                    "id": "good",
                    "capabilities": [{
                        "name": "onoff",
                        "features": {"state": {"name": "state"}},
                        "modelings": [{
                            "mappings": [{
                                "deviceTypes": ["urn:schemas-upnp-org:device:BinaryLight:1"],
                                "featureNames": ["state"],
                            }],
                        }],
                    }],
                },
                {
                    "protocol": "ZIGBEE",
                    "id": "bad",
                    "capabilities": [{
                        "name": "onoff",
                        "features": {},
                        "modelings": [{
                            "mappings": [{
                                "deviceTypes": ["urn:schemas-upnp-org:device:BinaryLight:1"],
                                "featureNames": ["state"],
                            }],
                        }],
                    }],
                },
            ],
        }))
        .unwrap();

        let snapshot = Snapshot::ingest(infos);
        assert_eq!(snapshot.discovered.len(), 1);
        assert_eq!(snapshot.discovered[0].equipment_id, "good");
        assert!(snapshot.refreshed_at.is_some());
    }

    #[test]
    fn ingest_sorts_equipments_for_display() {
        let infos: DevicesInfos = serde_json::from_value(json!({
            "equipments": [
                {"protocol": "ZIGBEE", "id": "2", "room": "Kitchen"},
                {"protocol": "ZIGBEE", "id": "1", "room": "Bedroom"},
            ],
            "discoveredEquipments": [],
        }))
        .unwrap();

        let snapshot = Snapshot::ingest(infos);
        assert_eq!(snapshot.equipments[0].equipment_id, "1");
    }
}
