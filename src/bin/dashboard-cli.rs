use clap::{Parser, Subcommand};
use serde_json::Value;

use admin_gateway::client::{find_profile, roster, AdminSession, ClientError, DashboardClient};

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(about = "Operator CLI for the ride-sharing admin gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Roster id to act as; omit to call logged out
    #[arg(short, long)]
    admin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the identities that can be picked with --admin
    Roster,
    /// Dashboard summary for a city
    Overview {
        #[arg(long)]
        city: Option<String>,
    },
    /// Live driver positions for a city
    Fleet {
        #[arg(long)]
        city: Option<String>,
    },
    Drivers,
    Riders,
    /// Rides currently in progress
    ActiveRides,
    /// Admin audit log
    Logs,
    /// Change a driver's status (ADMIN)
    DriverStatus { driver_id: String, status: String },
    /// Credit a rider's wallet (ADMIN)
    Wallet { rider_id: String, amount: f64 },
    /// Assign a driver to a ride (ADMIN)
    Assign { ride_id: String, driver_id: String },
    /// Cancel a ride (ADMIN)
    Cancel { ride_id: String },
    /// Draft a support reply with the AI service
    Draft {
        ticket_id: String,
        complaint: String,
        #[arg(long, default_value = "")]
        ride_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let session = match cli.admin.as_deref() {
        Some(id) => {
            let profile = find_profile(id).ok_or_else(|| format!("unknown admin '{}'; see `roster`", id))?;
            AdminSession::logged_in(profile)
        }
        None => AdminSession::new(),
    };
    let client = DashboardClient::new(&cli.url)?;

    let result = match cli.command {
        Commands::Roster => {
            for profile in roster() {
                println!("{:<14} {:<16} {}", profile.id, profile.name, profile.role);
            }
            return Ok(());
        }
        Commands::Overview { city } => client.dashboard_overview(&session, city.as_deref()).await,
        Commands::Fleet { city } => client.live_fleet(&session, city.as_deref()).await,
        Commands::Drivers => client.drivers(&session).await,
        Commands::Riders => client.riders(&session).await,
        Commands::ActiveRides => client.active_rides(&session).await,
        Commands::Logs => client.logs(&session).await,
        Commands::DriverStatus { driver_id, status } => {
            client.set_driver_status(&session, &driver_id, &status).await
        }
        Commands::Wallet { rider_id, amount } => client.update_wallet(&session, &rider_id, amount).await,
        Commands::Assign { ride_id, driver_id } => {
            let payload = serde_json::json!({ "driverId": driver_id });
            client.assign_driver(&session, &ride_id, payload).await
        }
        Commands::Cancel { ride_id } => client.cancel_ride(&session, &ride_id).await,
        Commands::Draft {
            ticket_id,
            complaint,
            ride_id,
        } => client.draft_response(&session, &ticket_id, &complaint, &ride_id).await,
    };

    print_result(result)
}

fn print_result(result: Result<Value, ClientError>) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(ClientError::Status { status, body }) => {
            eprintln!("Error: gateway returned status {}", status);
            eprintln!("Response: {}", body);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
