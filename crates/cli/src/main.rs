use clap::{Parser, Subcommand};
use rxstatus_core::{build_store, CoreConfig, Record, RecordForm, RecordService};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rxstatus")]
#[command(about = "Patient pharmacy status records CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all records
    List,
    /// Add a record
    Add {
        patient_name: String,
        pharmacy: String,
        status: String,
        /// Date of birth, as free text (e.g. 2/5/1999)
        dob: String,
    },
    /// Update only the given fields of a record
    Edit {
        /// Record ID
        id: String,
        #[arg(long)]
        patient_name: Option<String>,
        #[arg(long)]
        pharmacy: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        dob: Option<String>,
    },
    /// Delete a record
    Delete {
        /// Record ID
        id: String,
    },
}

impl Commands {
    /// The form submission equivalent to this command. `List` submits nothing.
    fn form(&self) -> RecordForm {
        match self {
            Commands::List => RecordForm::default(),
            Commands::Add {
                patient_name,
                pharmacy,
                status,
                dob,
            } => RecordForm {
                id: String::new(),
                patient_name: patient_name.clone(),
                pharmacy: pharmacy.clone(),
                status: status.clone(),
                dob: dob.clone(),
            },
            Commands::Edit {
                id,
                patient_name,
                pharmacy,
                status,
                dob,
            } => RecordForm {
                id: id.clone(),
                patient_name: patient_name.clone().unwrap_or_default(),
                pharmacy: pharmacy.clone().unwrap_or_default(),
                status: status.clone().unwrap_or_default(),
                dob: dob.clone().unwrap_or_default(),
            },
            Commands::Delete { id } => RecordForm {
                id: id.clone(),
                ..RecordForm::default()
            },
        }
    }
}

fn print_record(record: &Record) {
    let fields = &record.fields;
    println!(
        "ID: {}, Patient: {}, Pharmacy: {}, Status: {}, DOB: {}",
        record.id,
        fields.patient_name.as_deref().unwrap_or(""),
        fields.pharmacy.as_deref().unwrap_or(""),
        fields.status.as_deref().unwrap_or(""),
        fields.dob.as_deref().unwrap_or(""),
    );
}

fn list(service: &RecordService) -> ExitCode {
    match service.view() {
        Ok(records) if records.is_empty() => {
            println!("No records found.");
            ExitCode::SUCCESS
        }
        Ok(records) => {
            records.iter().for_each(print_record);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rxstatus_cli=warn".parse()?)
                .add_directive("rxstatus_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("Use 'rxstatus --help' for commands");
        return Ok(ExitCode::SUCCESS);
    };

    let cfg = CoreConfig::from_env()?;
    let service = RecordService::new(build_store(&cfg));

    let notice = match &command {
        Commands::List => return Ok(list(&service)),
        Commands::Add { .. } => service.add(&command.form()),
        Commands::Edit { .. } => service.edit(&command.form()),
        Commands::Delete { .. } => service.delete(&command.form()),
    };

    if notice.is_error() {
        eprintln!("{}", notice);
        Ok(ExitCode::FAILURE)
    } else {
        println!("{}", notice);
        Ok(ExitCode::SUCCESS)
    }
}
