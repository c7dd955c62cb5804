// libs/shared/models/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every appointment occupies exactly this many minutes.
pub const APPOINTMENT_DURATION_MINUTES: i64 = 60;

pub fn appointment_duration() -> Duration {
    Duration::minutes(APPOINTMENT_DURATION_MINUTES)
}

/// Query values that mean "no filter": absent, empty, or the literal `null`
/// some clients send for unset fields.
pub fn non_wildcard(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
}

/// Entity kinds named by not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Doctor,
    Patient,
    Appointment,
    Prescription,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Doctor => write!(f, "Doctor"),
            Entity::Patient => write!(f, "Patient"),
            Entity::Appointment => write!(f, "Appointment"),
            Entity::Prescription => write!(f, "Prescription"),
        }
    }
}

// ==============================================================================
// TIME SLOT TEMPLATES
// ==============================================================================

/// A doctor's recurring daily interval, e.g. `09:00-10:00`.
///
/// The label form is the canonical representation: it is what gets stored,
/// serialised and compared against booked appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SlotParseError> {
        if end <= start {
            return Err(SlotParseError::EndNotAfterStart(format!(
                "{}-{}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    /// The slot an appointment starting at `start` occupies.
    ///
    /// Wraps past midnight the way time-of-day arithmetic does, so this is the
    /// only constructor that may produce `end < start`.
    pub fn booked_from(start: NaiveTime) -> Self {
        let start = start.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(start);
        Self {
            start,
            end: start + appointment_duration(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    /// True when the slot is exactly as long as one appointment, so booking
    /// its start occupies the whole slot and nothing more.
    pub fn spans_one_appointment(&self) -> bool {
        self.end - self.start == appointment_duration()
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn starts_before_noon(&self) -> bool {
        self.start.hour() < 12
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| SlotParseError::Malformed(s.to_string()))?;

        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), "%H:%M")
                .map_err(|_| SlotParseError::Malformed(s.to_string()))
        };

        TimeSlot::new(parse(start)?, parse(end)?)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotParseError {
    #[error("Malformed time slot '{0}', expected HH:MM-HH:MM")]
    Malformed(String),

    #[error("Time slot '{0}' must end after it starts")]
    EndNotAfterStart(String),
}

// ==============================================================================
// DIRECTORY ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub available_times: Vec<TimeSlot>,
}

impl Doctor {
    pub fn has_morning_slot(&self) -> bool {
        self.available_times.iter().any(TimeSlot::starts_before_noon)
    }

    pub fn has_afternoon_slot(&self) -> bool {
        self.available_times.iter().any(|slot| !slot.starts_before_noon())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "StatusRepr")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
}

impl AppointmentStatus {
    /// Legacy numeric code: 0 = scheduled, 1 = completed.
    pub fn code(&self) -> u8 {
        match self {
            AppointmentStatus::Scheduled => 0,
            AppointmentStatus::Completed => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AppointmentStatus::Scheduled),
            1 => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }

    /// Status only moves forward; writing the current status again is allowed.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.code() <= next.code()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" | "0" => Ok(AppointmentStatus::Scheduled),
            "completed" | "1" => Ok(AppointmentStatus::Completed),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<StatusRepr> for AppointmentStatus {
    type Error = String;

    fn try_from(repr: StatusRepr) -> Result<Self, Self::Error> {
        match repr {
            StatusRepr::Code(code) => AppointmentStatus::from_code(code)
                .ok_or_else(|| format!("unknown appointment status code {}", code)),
            StatusRepr::Name(name) => name.parse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.scheduled_at + appointment_duration()
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::booked_from(self.scheduled_at.time())
    }
}

/// Appointment joined with the display fields of both parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_address: String,
    pub scheduled_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl AppointmentDetails {
    pub fn assemble(appointment: &Appointment, doctor: &Doctor, patient: &Patient) -> Self {
        Self {
            id: appointment.id,
            doctor_id: doctor.id,
            doctor_name: doctor.name.clone(),
            patient_id: patient.id,
            patient_name: patient.name.clone(),
            patient_email: patient.email.clone(),
            patient_phone: patient.phone.clone(),
            patient_address: patient.address.clone(),
            scheduled_at: appointment.scheduled_at,
            end_at: appointment.end_at(),
            status: appointment.status,
        }
    }
}

// ==============================================================================
// PRESCRIPTIONS
// ==============================================================================

/// Written by the appointment's doctor; at most one per appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub doctor_notes: Option<String>,
    pub issued_at: DateTime<Utc>,
}
