pub mod context_data;
pub mod flag;
pub mod ids;
pub mod session;
pub mod state;
pub mod turn;
pub mod types;

pub use context_data::ContextData;
pub use flag::Flag;
pub use ids::{ContextId, FlagId, ProfileId, SessionId, TurnId};
pub use session::{Session, SystemMessage, SystemMessageKind};
pub use state::{ConversationState, PerceptionRecord, PerceptionSet, TypedCollection};
pub use turn::Turn;
pub use types::{Availability, ContextType, is_valid_combination};
