pub mod http_gateway;
pub mod local_file;
pub mod notifier;

pub use http_gateway::{Credentials, HttpGateway};
pub use local_file::read_upload;
pub use notifier::ChannelNotifier;
