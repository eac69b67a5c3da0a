pub mod coordinator;
pub mod error;
pub mod message;
pub mod provider;
pub mod registration;
pub mod relay;
pub mod window;

pub use aptwise_api::Provider;
pub use coordinator::{CoordinatorSettings, HandshakeOutcome, OAuthCoordinator};
pub use error::OAuthError;
pub use message::CallbackMessage;
pub use provider::{ProviderMeta, Purpose};
pub use registration::RegistrationForm;
pub use relay::CallbackRelay;
pub use window::{
    LocalOpener, LocalPopup, LocalWindows, MessageBus, Opener, OpenedPopup, Popup, PopupFeatures,
    PopupHost, WindowMessage,
};
