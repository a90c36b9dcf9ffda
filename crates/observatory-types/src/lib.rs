//! Shared record types for the Observatory dashboard.
//!
//! Every record here is owned by the simulation backend and is only ever
//! read by the Observatory. Types flow downstream to `TypeScript` via
//! `ts-rs` so the browser dashboard and the Rust services agree on shape.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Event tags and status enumerations
//! - [`records`] -- Row records (events, agents, eras, quotes, ...)
//! - [`functions`] -- Bodies of the backend function calls

pub mod enums;
pub mod functions;
pub mod ids;
pub mod records;

pub use enums::{AgentStatus, EventType, UnknownVariant, WorldStatus};
pub use functions::{
    SimplifyTextRequest, SimplifyTextResponse, VerifyPasswordRequest, VerifyPasswordResponse,
};
pub use ids::{AgentId, ArtifactId, BriefingId, EraId, EventId, MoodId, QuoteId, TurnId, WorldId};
pub use records::{
    Agent, Artifact, Briefing, Era, Event, LeaderboardEntry, Mood, PopulationSample, Quote, World,
};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // Calling export_all writes the TypeScript files into `bindings/`.
        use ts_rs::TS;

        let _ = crate::ids::WorldId::export_all();
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::TurnId::export_all();
        let _ = crate::ids::ArtifactId::export_all();
        let _ = crate::ids::BriefingId::export_all();
        let _ = crate::ids::EraId::export_all();
        let _ = crate::ids::QuoteId::export_all();
        let _ = crate::ids::MoodId::export_all();

        let _ = crate::enums::EventType::export_all();
        let _ = crate::enums::AgentStatus::export_all();
        let _ = crate::enums::WorldStatus::export_all();

        let _ = crate::records::World::export_all();
        let _ = crate::records::Event::export_all();
        let _ = crate::records::Agent::export_all();
        let _ = crate::records::Artifact::export_all();
        let _ = crate::records::Briefing::export_all();
        let _ = crate::records::Era::export_all();
        let _ = crate::records::Quote::export_all();
        let _ = crate::records::Mood::export_all();
        let _ = crate::records::LeaderboardEntry::export_all();
        let _ = crate::records::PopulationSample::export_all();

        let _ = crate::functions::SimplifyTextRequest::export_all();
        let _ = crate::functions::SimplifyTextResponse::export_all();
        let _ = crate::functions::VerifyPasswordRequest::export_all();
        let _ = crate::functions::VerifyPasswordResponse::export_all();
    }
}
