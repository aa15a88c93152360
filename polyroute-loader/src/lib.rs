//! Format-keyed `Model` factories and the format-detection policy consulted
//! when a spec omits an explicit format tag.

mod detect;
mod http_loader;
mod mock_loader;
mod spec;
mod trait_def;

pub use detect::detect_format;
pub use http_loader::{HttpLoader, HttpModel};
pub use mock_loader::MockLoader;
pub use spec::{ModelDescriptor, ModelSpec};
pub use trait_def::Loader;
