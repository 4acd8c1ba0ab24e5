//! Walk an estimate form through a few edits and a throttled recalculation loop.
use roi_estimator::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let mut session = EstimateSession::default();
    print_estimate("defaults", &mut session);

    // A visitor types an impossible value; the estimate fails closed.
    if let Some(err) = session.edit(FieldName::TimePerTask, 900.0) {
        println!("timePerTask rejected: {}", err.message);
    }
    print_estimate("after bad edit", &mut session);

    session.edit(FieldName::TimePerTask, 45.0);
    session.edit(FieldName::TasksPerWeek, 120.0);
    session.edit(FieldName::CurrentCostPerHour, 18.5);
    print_estimate("after fixes", &mut session);

    // Throttle recomputation: 2 per second for this visitor.
    let clock = ManualClock::new();
    let limiter = SlidingWindow::new(InMemoryTimestampStore::new()).with_clock(clock.clone());
    let cfg = RateLimitConfig::new(1_000, 2).expect("valid rate limit");
    for step in 0..5 {
        session.edit(FieldName::AuditFrequency, f64::from(step * 2));
        match session.recalculate_with(&limiter, "visitor-1", &cfg) {
            Ok(estimate) => println!("t={}ms  annual savings {}", clock.now_millis(), estimate.annual_savings),
            Err(denied) => println!("t={}ms  throttled, retry in {:?}", clock.now_millis(), denied.wait),
        }
        clock.advance(300);
    }
}

fn print_estimate(label: &str, session: &mut EstimateSession) {
    let estimate = session.result();
    if !estimate.is_valid {
        println!("{label}: not shown ({} field error(s))", session.errors().len());
        return;
    }
    let payback = match estimate.payback {
        Payback::Months(months) => format!("{months} month(s)"),
        Payback::NotComputable => "n/a".to_string(),
    };
    println!(
        "{label}: weekly {} -> {}, annual savings {}, payback {}",
        estimate.current_weekly_cost, estimate.improved_weekly_cost, estimate.annual_savings, payback
    );
}
