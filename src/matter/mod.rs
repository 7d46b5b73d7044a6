pub mod attribute;
pub mod clusters;
pub mod device_types;
pub mod endpoint_descriptor;
pub mod ids;
pub mod model;
pub mod status;

pub use endpoint_descriptor::{DescriptorBuilder, EndpointDescriptor};
pub use ids::{AttributePath, CommandPath};
pub use model::{DeviceModel, InMemoryModel, RegisterError};
pub use status::Status;
