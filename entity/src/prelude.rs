pub use super::broadcast::Entity as Broadcast;
pub use super::call::Entity as Call;
pub use super::call_message::Entity as CallMessage;
pub use super::call_participant::Entity as CallParticipant;
pub use super::connection::Entity as Connection;
pub use super::hub::Entity as Hub;
pub use super::hub_message::Entity as HubMessage;
