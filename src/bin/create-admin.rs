//! Registers an operator account for the check-in service.

use clap::{Parser, ValueEnum};
use diesel::prelude::*;
use festival_checkin::{auth, config::Config, models::Role};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    BoothStaff,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::BoothStaff => Role::BoothStaff,
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Create an admin or booth staff login")]
struct Args {
    /// Login name.
    username: String,

    /// Password; read from CHECKIN_PASSWORD when omitted.
    #[arg(long, env = "CHECKIN_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long, value_enum, default_value = "admin")]
    role: RoleArg,

    /// Booth the account is scoped to (required for booth staff).
    #[arg(long)]
    booth_id: Option<i32>,

    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = Config::from_env()?;
    let mut conn = PgConnection::establish(&config.database_url)?;

    let user = auth::register_user(
        &mut conn,
        &config.context(),
        &args.username,
        &args.password,
        args.role.into(),
        args.booth_id,
        args.cost,
    )?;

    println!("created {} #{} ({})", user.username, user.id, user.role);
    Ok(())
}
