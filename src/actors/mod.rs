pub mod messages;
pub mod process_actor;
pub mod sweeper;

pub use process_actor::ProcessActorHandle;
pub use sweeper::SweeperHandle;
