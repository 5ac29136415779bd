pub mod association;
pub mod device;
pub mod error;
pub mod sdata;
pub mod settings;

pub use association::{Association, AssociationLink, AssociationSets, LinkKind, PressLevel};
pub use device::Device;
pub use settings::{SettingValue, Settings};
