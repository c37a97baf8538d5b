use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{
    AvailabilityConstraints, Doctor, FastLaneMatchRequest, InsuranceType, MatchResult,
    MatchedAppointment, MatchingError, SpecialtyMatchRequest, TimeSlot,
};
use crate::services::availability::SlotAvailabilityProvider;

/// The external matcher the booking engine talks to.
///
/// The engine only depends on this shape; how a match is found is the
/// implementor's business.
#[async_trait]
pub trait MatchingService: Send + Sync {
    async fn fast_lane_match(&self, request: &FastLaneMatchRequest) -> Result<MatchResult, MatchingError>;

    async fn specialty_match(&self, request: &SpecialtyMatchRequest) -> Result<MatchResult, MatchingError>;
}

/// In-process matcher over a fixed roster and the generated calendars.
pub struct SimulatedMatchingService {
    roster: Vec<Doctor>,
    availability: SlotAvailabilityProvider,
    latency: Duration,
}

struct Candidate<'a> {
    doctor: &'a Doctor,
    slot: TimeSlot,
    score: u32,
}

impl SimulatedMatchingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            roster: default_roster(),
            availability: SlotAvailabilityProvider::from_today(),
            latency: Duration::from_millis(config.match_latency_ms),
        }
    }

    pub fn with_roster(mut self, roster: Vec<Doctor>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_availability(mut self, availability: SlotAvailabilityProvider) -> Self {
        self.availability = availability;
        self
    }

    pub fn roster(&self) -> &[Doctor] {
        &self.roster
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }

    /// Earliest available slot for a doctor that passes the constraints.
    fn first_open_slot(&self, doctor: &Doctor, constraints: Option<&AvailabilityConstraints>) -> Option<TimeSlot> {
        self.availability
            .get_calendar(&doctor.id)
            .into_iter()
            .filter(|slot| slot.available)
            .find(|slot| constraints.map_or(true, |c| c.allows(slot)))
    }

    /// Highest score wins; ties go to the earlier slot, then roster order.
    fn best_candidate<'a>(mut candidates: Vec<Candidate<'a>>) -> Option<Candidate<'a>> {
        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.slot.starts_at().cmp(&b.slot.starts_at()))
        });
        candidates.into_iter().next()
    }

    fn insured_doctors(&self, insurance: InsuranceType) -> impl Iterator<Item = &Doctor> {
        self.roster.iter().filter(move |d| d.accepts(&insurance))
    }
}

#[async_trait]
impl MatchingService for SimulatedMatchingService {
    async fn fast_lane_match(&self, request: &FastLaneMatchRequest) -> Result<MatchResult, MatchingError> {
        debug!("Fast-lane matching for patient {} in {}", request.patient.patient_id, request.city);
        self.simulate_latency().await;

        let candidates: Vec<Candidate> = self
            .insured_doctors(request.insurance)
            .filter_map(|doctor| {
                self.first_open_slot(doctor, None).map(|slot| Candidate {
                    doctor,
                    slot,
                    score: u32::from(doctor.is_in_city(&request.city)),
                })
            })
            .collect();

        // Fast lane is about speed: only prefer the patient's city for the same slot time.
        let soonest = candidates.iter().map(|c| c.slot.starts_at()).min();
        let candidates = candidates
            .into_iter()
            .filter(|c| Some(c.slot.starts_at()) == soonest)
            .collect();

        match Self::best_candidate(candidates) {
            Some(best) => {
                info!("Fast-lane match: {} on {} at {}", best.doctor.id, best.slot.date, best.slot.time);
                Ok(MatchResult::matched(MatchedAppointment {
                    doctor_id: best.doctor.id.clone(),
                    doctor_name: best.doctor.full_name(),
                    specialty: best.doctor.specialty.clone(),
                    date: best.slot.date,
                    time: best.slot.time,
                    requires_confirmation: false,
                }))
            }
            None => {
                warn!("No fast-lane doctor accepts {:?}", request.insurance);
                Ok(MatchResult::no_match())
            }
        }
    }

    async fn specialty_match(&self, request: &SpecialtyMatchRequest) -> Result<MatchResult, MatchingError> {
        if request.specialty.trim().is_empty() {
            return Err(MatchingError::InvalidRequest("specialty is required".to_string()));
        }

        debug!("Specialty matching '{}' for patient {}", request.specialty, request.patient.patient_id);
        self.simulate_latency().await;

        let constraints = request.availability.as_ref();
        let preferred = request.preferred_doctor_id.as_deref();

        let candidates: Vec<Candidate> = self
            .insured_doctors(request.insurance)
            .filter(|doctor| doctor.practices(&request.specialty))
            .filter_map(|doctor| {
                self.first_open_slot(doctor, constraints).map(|slot| {
                    let mut score = 0;
                    if preferred == Some(doctor.id.as_str()) {
                        score += 10;
                    }
                    if doctor.is_in_city(&request.city) {
                        score += 1;
                    }
                    Candidate { doctor, slot, score }
                })
            })
            .collect();

        let Some(best) = Self::best_candidate(candidates) else {
            warn!("No {} doctor available for the requested constraints", request.specialty);
            return Ok(MatchResult::no_match());
        };

        // A different doctor than the one asked for needs the patient's consent.
        let requires_confirmation = preferred.is_some_and(|id| id != best.doctor.id);

        info!(
            "Specialty match: {} on {} at {} (confirmation required: {})",
            best.doctor.id, best.slot.date, best.slot.time, requires_confirmation
        );

        Ok(MatchResult::matched(MatchedAppointment {
            doctor_id: best.doctor.id.clone(),
            doctor_name: best.doctor.full_name(),
            specialty: best.doctor.specialty.clone(),
            date: best.slot.date,
            time: best.slot.time,
            requires_confirmation,
        }))
    }
}

fn doctor(id: &str, first: &str, last: &str, specialty: &str, city: &str, insurance: &[InsuranceType]) -> Doctor {
    Doctor {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        specialty: specialty.to_string(),
        city: city.to_string(),
        accepted_insurance: insurance.to_vec(),
    }
}

pub fn default_roster() -> Vec<Doctor> {
    use InsuranceType::*;

    vec![
        doctor("doc-gp-01", "Ana", "Ribeiro", "general_practice", "Lisbon", &[Public, Private, SelfPay]),
        doctor("doc-gp-02", "Tomas", "Keller", "general_practice", "Porto", &[Public, SelfPay]),
        doctor("doc-card-01", "Ines", "Moreau", "cardiology", "Lisbon", &[Private, SelfPay]),
        doctor("doc-card-02", "Rui", "Duarte", "cardiology", "Porto", &[Public, Private]),
        doctor("doc-derm-01", "Clara", "Nunes", "dermatology", "Lisbon", &[Private]),
        doctor("doc-ped-01", "Joao", "Almeida", "pediatrics", "Coimbra", &[Public, Private, SelfPay]),
    ]
}
