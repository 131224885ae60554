//! Building a simulation from a persisted scheme

use log::{info, warn};
use qureed_types::Scheme;
use std::collections::HashMap;

use super::Simulation;
use crate::device::{Device, DeviceId};
use crate::error::{SimulationError, SimulationResult};
use crate::registry::Registry;

impl Simulation {
    /// Instantiate, configure and wire every device of `scheme`.
    ///
    /// Returns the scheme uuid -> device id map. Scheme uuids that are valid
    /// UUIDs are kept as device ids; anything else gets a fresh id. Loading is
    /// all or nothing: on error no device of the scheme stays registered.
    pub fn load_scheme(
        &mut self,
        scheme: &Scheme,
        registry: &Registry,
    ) -> SimulationResult<HashMap<String, DeviceId>> {
        let devices = build_devices(scheme, registry)?;

        let mut ids = HashMap::new();
        if let Err(err) = self.install_scheme(scheme, registry, devices, &mut ids) {
            for id in ids.values() {
                self.take_device(*id);
            }
            warn!(
                target: "qureed::simulation",
                "scheme load failed, removed {} devices: {}",
                ids.len(),
                err
            );
            return Err(err);
        }

        info!(
            target: "qureed::simulation",
            "loaded {} devices and {} connections",
            scheme.devices.len(),
            scheme.connections.len()
        );
        Ok(ids)
    }

    fn install_scheme(
        &mut self,
        scheme: &Scheme,
        registry: &Registry,
        devices: Vec<(String, Box<dyn Device>)>,
        ids: &mut HashMap<String, DeviceId>,
    ) -> SimulationResult<()> {
        for (uuid, device) in devices {
            let id = self.register_device(device)?;
            ids.insert(uuid, id);
        }

        for connection in &scheme.connections {
            let kind = registry.signal_kind(&connection.signal)?;
            let [from, to] = &connection.conn;
            let resolve = |uuid: &str| {
                ids.get(uuid)
                    .copied()
                    .ok_or_else(|| SimulationError::UnknownDevice(uuid.to_string()))
            };
            let from_id = resolve(&from.device_uuid)?;
            let to_id = resolve(&to.device_uuid)?;
            self.connect(kind, (from_id, &from.port), (to_id, &to.port))?;
        }
        Ok(())
    }
}

/// Create and configure every scheme device without registering any
fn build_devices(
    scheme: &Scheme,
    registry: &Registry,
) -> SimulationResult<Vec<(String, Box<dyn Device>)>> {
    let mut devices = Vec::with_capacity(scheme.devices.len());
    for entry in &scheme.devices {
        let id = DeviceId::parse(&entry.uuid).unwrap_or_else(|| {
            warn!(
                target: "qureed::simulation",
                "scheme uuid '{}' is not a UUID, assigning a new id",
                entry.uuid
            );
            DeviceId::new()
        });
        let mut device = registry.create(&entry.device, entry.name.as_deref(), id)?;
        if let Some(values) = &entry.values {
            device
                .set_values(values)
                .map_err(|source| SimulationError::Device {
                    device: device.display_name(),
                    type_name: device.type_name(),
                    source,
                })?;
        }
        devices.push((entry.uuid.clone(), device));
    }
    Ok(devices)
}
