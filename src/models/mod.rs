pub mod availability;
pub mod event;
pub mod participant;

pub use availability::{Availability, AvailabilityRequest, SlotUpdate};
pub use event::{CreateEventRequest, Event, EventStatus, EventUpdate, NewEvent, UpdateEventRequest};
pub use participant::{CreateParticipantRequest, NewParticipant, Participant, PARTICIPANT_COLORS};
