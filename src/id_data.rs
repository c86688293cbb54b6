use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// How deep the vendor tree of an ids data file goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy {
    /// Vendors and their devices, as found in `usb.ids`.
    VendorDevice,
    /// Vendors, devices and subsystems, as found in `pci.ids`.
    VendorDeviceSubsystem,
}

impl Hierarchy {
    pub fn has_subsystems(self) -> bool {
        matches!(self, Hierarchy::VendorDeviceSubsystem)
    }
}

/// A hexadecimal identifier, normalized to uppercase.
///
/// The digits are kept as found in the source, so leading zeros and the
/// original width survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId(String);

impl HexId {
    pub fn new(digits: &str) -> Self {
        HexId(digits.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A map that remembers the order in which keys were first inserted.
#[derive(Debug, Clone)]
pub struct OrderedEntries<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> OrderedEntries<K, V> {
    pub fn new() -> Self {
        OrderedEntries {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    pub fn get_at_mut(&mut self, pos: usize) -> Option<&mut V> {
        self.entries.get_mut(pos).map(|(_, value)| value)
    }

    /// Inserts `value` unless `key` is already present, in which case the
    /// existing value is kept. Returns the position of `key`.
    pub fn insert_first(&mut self, key: K, value: V) -> usize {
        if let Some(pos) = self.position(&key) {
            return pos;
        }
        self.push(key, value)
    }

    /// Inserts `value`, replacing the value of an existing `key` in place.
    /// Returns the position of `key`, which never moves once assigned.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        match self.position(&key) {
            Some(pos) => {
                self.entries[pos].1 = value;
                pos
            }
            None => self.push(key, value),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    fn push(&mut self, key: K, value: V) -> usize {
        let pos = self.entries.len();
        self.positions.insert(key.clone(), pos);
        self.entries.push((key, value));
        pos
    }
}

impl<K: Eq + Hash + Clone, V> Default for OrderedEntries<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for OrderedEntries<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// The vendor tree read from one ids data file.
#[derive(Debug, PartialEq)]
pub struct IdData {
    hierarchy: Hierarchy,
    vendors: OrderedEntries<HexId, Vendor>,
}

impl IdData {
    pub fn new(hierarchy: Hierarchy) -> Self {
        IdData {
            hierarchy,
            vendors: OrderedEntries::new(),
        }
    }

    pub fn hierarchy(&self) -> Hierarchy {
        self.hierarchy
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    /// Vendors in the order they first appeared.
    pub fn vendors(&self) -> impl Iterator<Item = &Vendor> {
        self.vendors.values()
    }

    pub fn get_vendor(&self, vendor_id: &str) -> Option<&Vendor> {
        self.vendors.get(&HexId::new(vendor_id))
    }

    /// Opens the vendor `id`, creating it if needed. An existing vendor keeps
    /// its name.
    pub(crate) fn open_vendor(&mut self, id: HexId, name: &str) -> usize {
        let vendor = Vendor::new(id.clone(), name);
        self.vendors.insert_first(id, vendor)
    }

    pub(crate) fn add_device(&mut self, vendor_pos: usize, id: HexId, name: &str) -> Option<usize> {
        let vendor = self.vendors.get_at_mut(vendor_pos)?;
        let device = Device::new(id.clone(), name);
        Some(vendor.devices.insert(id, device))
    }

    pub(crate) fn add_subsystem(
        &mut self,
        vendor_pos: usize,
        device_pos: usize,
        subvendor_id: HexId,
        subdevice_id: HexId,
        name: &str,
    ) -> Option<usize> {
        let device = self
            .vendors
            .get_at_mut(vendor_pos)?
            .devices
            .get_at_mut(device_pos)?;
        let key = SubsystemKey {
            subvendor_id: subvendor_id.clone(),
            subdevice_id: subdevice_id.clone(),
        };
        let subsystem = Subsystem::new(subvendor_id, subdevice_id, name);
        Some(device.subsystems.insert(key, subsystem))
    }
}

#[derive(Debug, PartialEq)]
pub struct Vendor {
    pub id: HexId,
    pub name: String,
    devices: OrderedEntries<HexId, Device>,
}

impl Vendor {
    fn new(id: HexId, name: &str) -> Self {
        Vendor {
            id,
            name: String::from(name),
            devices: OrderedEntries::new(),
        }
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn get_device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(&HexId::new(device_id))
    }
}

#[derive(Debug, PartialEq)]
pub struct Device {
    pub id: HexId,
    pub name: String,
    subsystems: OrderedEntries<SubsystemKey, Subsystem>,
}

impl Device {
    fn new(id: HexId, name: &str) -> Self {
        Device {
            id,
            name: String::from(name),
            subsystems: OrderedEntries::new(),
        }
    }

    pub fn subsystems(&self) -> impl Iterator<Item = &Subsystem> {
        self.subsystems.values()
    }

    pub fn get_subsystem(&self, subvendor_id: &str, subdevice_id: &str) -> Option<&Subsystem> {
        self.subsystems.get(&SubsystemKey {
            subvendor_id: HexId::new(subvendor_id),
            subdevice_id: HexId::new(subdevice_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SubsystemKey {
    subvendor_id: HexId,
    subdevice_id: HexId,
}

#[derive(Debug, PartialEq)]
pub struct Subsystem {
    pub subvendor_id: HexId,
    pub subdevice_id: HexId,
    pub name: String,
}

impl Subsystem {
    fn new(subvendor_id: HexId, subdevice_id: HexId, name: &str) -> Self {
        Subsystem {
            subvendor_id,
            subdevice_id,
            name: String::from(name),
        }
    }
}
