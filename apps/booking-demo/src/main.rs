use chrono::Local;
use dotenv::dotenv;
use futures::future::join_all;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod session;

use appointment_cell::models::AppointmentStatus;
use booking_queue_cell::{BookingRequest, BookingSubmissionOrchestrator};
use doctor_cell::models::{
    AvailabilityConstraints, DayBand, FastLaneMatchRequest, InsuranceType, MatchRequest, PatientIdentity,
    SpecialtyMatchRequest,
};
use shared_config::AppConfig;
use shared_models::AppError;

use session::{create_session, BookingSession};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking demo");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        anyhow::bail!("booking configuration is inconsistent: {:?}", config);
    }

    if let Err(e) = run(&config).await {
        error!("Booking demo failed: {}", e.to_json());
        return Err(e.into());
    }
    Ok(())
}

async fn run(config: &AppConfig) -> Result<(), AppError> {
    let session = create_session(config);
    let mut routes = session.navigator.subscribe();

    let receipts = vec![
        submit(&session.orchestrator, fast_lane_booking())?,
        submit(&session.orchestrator, specialty_booking())?,
    ];

    while let Ok(route) = routes.try_recv() {
        info!("Navigated to {:?}", route);
    }
    if let Some(summary) = session.orchestrator.last_request_summary() {
        info!("Request summary on screen: {} ({})", summary.patient_name, summary.match_type);
    }

    join_all(receipts.into_iter().map(|r| r.handle.finished())).await;

    print_appointments(&session);
    print_alternatives(&session, config.suggestion_limit);
    Ok(())
}

fn submit(
    orchestrator: &BookingSubmissionOrchestrator,
    request: BookingRequest,
) -> Result<booking_queue_cell::SubmissionReceipt, AppError> {
    let receipt = orchestrator.submit(request)?;
    println!("Request sent, appointment {} is matching", receipt.appointment_id);
    Ok(receipt)
}

fn patient() -> PatientIdentity {
    PatientIdentity {
        patient_id: "patient-demo".to_string(),
        name: "Maria Silva".to_string(),
    }
}

fn fast_lane_booking() -> BookingRequest {
    BookingRequest::new(MatchRequest::FastLane(FastLaneMatchRequest {
        patient: patient(),
        city: "Lisbon".to_string(),
        insurance: InsuranceType::Public,
    }))
}

fn specialty_booking() -> BookingRequest {
    BookingRequest::new(MatchRequest::Specialty(SpecialtyMatchRequest {
        patient: patient(),
        specialty: "pediatrics".to_string(),
        preferred_doctor_id: None,
        city: "Coimbra".to_string(),
        insurance: InsuranceType::Private,
        availability: Some(AvailabilityConstraints {
            preferred_weekdays: Vec::new(),
            preferred_band: Some(DayBand::Afternoon),
            earliest_date: None,
        }),
    }))
    .for_family_member("child-demo", "Leo")
}

fn print_appointments(session: &BookingSession) {
    println!();
    println!("Appointments:");
    for appointment in session.store.all() {
        let slot = match (appointment.date, appointment.time) {
            (Some(date), Some(time)) => format!("{} {}", date, time.format("%H:%M")),
            _ => "no slot".to_string(),
        };
        println!(
            "  {} [{}] {} {}{}",
            appointment.id,
            appointment.status,
            appointment.doctor_name.as_deref().unwrap_or("unassigned"),
            slot,
            appointment
                .for_user_name
                .as_deref()
                .map(|name| format!(" for {}", name))
                .unwrap_or_default(),
        );
    }
}

fn print_alternatives(session: &BookingSession, limit: usize) {
    let confirmed = session.store.by_status(AppointmentStatus::Confirmed);
    let Some(appointment) = confirmed.last() else {
        warn!("No confirmed appointment to reschedule");
        return;
    };
    let Some(doctor_id) = appointment.doctor_id.as_deref() else {
        return;
    };

    println!();
    println!("Reschedule options for {}:", appointment.id);
    for suggestion in session.ranker.get_suggested_slots(doctor_id, appointment, limit) {
        println!("  {}", suggestion.label);
    }

    match session.picker.pick_for_doctor(doctor_id, Local::now().naive_local()) {
        Some(slot) => println!("Quick rebook: {} at {}", slot.date, slot.time.format("%H:%M")),
        None => println!("Quick rebook: nothing available"),
    }
}
