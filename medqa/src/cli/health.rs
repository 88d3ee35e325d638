use medqa::domain::{OverallStatus, SystemHealth};
use medqa::{LiveMedQa, Result};

use super::print_json;

pub async fn run(app: &LiveMedQa, json: bool) -> Result<()> {
    let health = app.health().await;

    if json {
        print_json(&health)?;
    } else {
        print_health(&health);
    }

    if health.status == OverallStatus::Degraded {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn run_stats(app: &LiveMedQa, json: bool) -> Result<()> {
    let stats = app.stats().await;

    if json {
        return print_json(&stats);
    }
    match stats {
        Some(stats) => {
            println!("Index:   {}", stats.name);
            println!("Vectors: {}", stats.total_count);
        }
        None => println!("Index statistics unavailable"),
    }
    Ok(())
}

fn print_health(health: &SystemHealth) {
    let overall = match health.status {
        OverallStatus::Healthy => "healthy",
        OverallStatus::Degraded => "degraded",
    };
    println!("Status:  {overall}");
    println!("Version: {}", health.version);
    println!("Checked: {}", health.timestamp.to_rfc3339());
    for (name, status) in &health.services {
        println!("  {name:<14} {status}");
    }
}
