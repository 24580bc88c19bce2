use clap::Parser;
use rehab_eval::config::cli::{ArmInput, CliArgs, Command};
use rehab_eval::core::arm_volume::{ArmSide, ArmVolumeReport, MeasurementSet};
use rehab_eval::core::completed::completed_view;
use rehab_eval::core::listing::TableState;
use rehab_eval::domain::model::{EvaluationType, Phase, SignInDto, UserEvaluation};
use rehab_eval::domain::ports::{AuthApi, ConfigProvider};
use rehab_eval::session::{has_capability, Capability};
use rehab_eval::utils::error::{AppError, ErrorSeverity, Result};
use rehab_eval::utils::format::format_display_number;
use rehab_eval::utils::logger;
use rehab_eval::utils::validation::{validate_required_field, Validate};
use rehab_eval::{
    AppConfig, ArmVolumeEstimator, EvaluationService, FileTokenStore, HttpApiClient,
    ResultCollector, SessionManager,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // a missing config file means defaults
    let mut config = if Path::new(&args.config).exists() {
        match AppConfig::from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    }
    .with_env_defaults();

    let verbose = args.verbose;
    if args.log_json || config.log_json() {
        logger::init_json_logger(verbose, config.log_level());
    } else {
        logger::init_cli_logger(verbose, config.log_level());
    }

    tracing::debug!("Using configuration file: {}", args.config);
    args.apply_overrides(&mut config);

    if let Err(e) = run(args.command, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Sugerencia: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Volume(input) => run_volume(config, &input),
        Command::Login {
            email,
            password,
            token,
        } => run_login(config, email, password, token).await,
        Command::Logout => {
            let mut manager = session_manager(config).await?;
            manager.logout().await?;
            println!("👋 Sesión cerrada");
            Ok(())
        }
        Command::Whoami => run_whoami(config).await,
        Command::List {
            phase,
            search,
            sort,
            page,
        } => run_list(config, phase, search.as_deref(), &sort, page).await,
        Command::Show {
            evaluation_id,
            phase,
        } => run_show(config, &evaluation_id, phase).await,
        Command::Submit {
            evaluation_id,
            phase,
            arms,
            results,
            selections,
        } => {
            let collector_input = CollectorInput {
                left: arms.left,
                right: arms.right,
                results,
                selections,
            };
            run_submit(config, &evaluation_id, phase, &collector_input).await
        }
    }
}

/// Validates the whole configuration before anything talks to the backend.
fn api_client(config: &AppConfig) -> Result<HttpApiClient> {
    config.validate()?;
    HttpApiClient::from_config(config)
}

async fn session_manager(config: &AppConfig) -> Result<SessionManager<FileTokenStore>> {
    SessionManager::init(FileTokenStore::new(config.token_path())).await
}

fn estimator(config: &AppConfig) -> Result<Option<ArmVolumeEstimator>> {
    config
        .segment_length_cm()
        .map(ArmVolumeEstimator::new)
        .transpose()
}

fn arm_inputs(left: &[String], right: &[String]) -> BTreeMap<String, String> {
    let mut inputs = BTreeMap::new();
    for (side, values) in ArmSide::BOTH.into_iter().zip([left, right]) {
        for (idx, raw) in values.iter().enumerate() {
            inputs.insert(side.field_key(idx + 1), raw.clone());
        }
    }
    inputs
}

fn print_report(report: &ArmVolumeReport) {
    let risk = report.risk();
    println!(
        "{}: {} ml",
        ArmSide::Left.label(),
        format_display_number(report.left_volume_ml, Some(2))
    );
    println!(
        "{}: {} ml",
        ArmSide::Right.label(),
        format_display_number(report.right_volume_ml, Some(2))
    );
    println!(
        "Diferencia: {} ml",
        format_display_number(report.difference_ml, Some(2))
    );
    println!("Resultado: {} ({})", risk.message(), risk.description());
}

fn run_volume(config: &AppConfig, input: &ArmInput) -> Result<()> {
    let configured = estimator(config)?;
    let estimator = *validate_required_field("arm_volume.segment_length_cm", &configured)?;
    let set = MeasurementSet::from_inputs(&arm_inputs(&input.left, &input.right))?;
    print_report(&estimator.estimate(&set));
    Ok(())
}

async fn run_login(
    config: &AppConfig,
    email: Option<String>,
    password: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let token = match (email, password, token) {
        (_, _, Some(token)) => token,
        (Some(email), Some(password), None) => {
            let client = api_client(config)?;
            client.sign_in(&SignInDto { email, password }).await?.access_token
        }
        _ => {
            return Err(AppError::validation(
                "Indica --email y --password, o bien --token.",
            ))
        }
    };

    let mut manager = session_manager(config).await?;
    let session = manager.login(token).await?;
    match session.display_name() {
        Some(name) => println!("✅ Sesión iniciada como {}", name),
        None => println!("✅ Sesión iniciada"),
    }
    Ok(())
}

async fn run_whoami(config: &AppConfig) -> Result<()> {
    let manager = session_manager(config).await?;
    let session = manager.require()?;
    let client = api_client(config)?;
    let profile = client.fetch_session_profile(session.bearer()?).await?;

    println!("{} <{}>", profile.full_name, profile.email);
    if let Some(role) = &profile.role {
        println!("Rol: {}", role);
    }
    if let Some(expires_at) = session.expires_at() {
        println!("Sesión válida hasta: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    }
    if has_capability(&profile, Capability::ManageContent) {
        println!("Puede administrar contenido");
    }
    Ok(())
}

fn status_label(user_evaluation: &UserEvaluation) -> String {
    if !user_evaluation.completed {
        return "pendiente".to_string();
    }
    let mut label = match user_evaluation.done_at {
        Some(done_at) => format!("completada {}", done_at.format("%d-%m-%Y")),
        None => "completada".to_string(),
    };
    if let Some(risk) = completed_view(user_evaluation).and_then(|view| view.risk) {
        label.push_str(&format!(" · {}", risk.message()));
    }
    label
}

async fn run_list(
    config: &AppConfig,
    phase: Phase,
    search: Option<&str>,
    sort: &[String],
    page: usize,
) -> Result<()> {
    let manager = session_manager(config).await?;
    let session = manager.require()?;
    let mut service = EvaluationService::new(api_client(config)?);
    let grouped = service.refresh(session).await?;

    let mut table = TableState::new(Some("name"));
    if let Some(search) = search {
        table.set_search(search);
    }
    for key in sort {
        table.toggle_sort(key);
    }
    table.set_page(page);

    let view = table.apply(grouped.for_phase(phase));
    println!("{}", phase.title());
    for ue in &view.items {
        println!(
            "{:>3}  {:<36} {:<16} {}",
            ue.evaluation.order,
            ue.evaluation.name,
            ue.evaluation.evaluation_type.as_str(),
            status_label(ue)
        );
    }
    println!(
        "Página {} de {} ({} evaluaciones)",
        view.page, view.total_pages, view.total_items
    );
    Ok(())
}

fn not_listed(evaluation_id: &str, phase: Phase) -> AppError {
    AppError::validation(format!(
        "La evaluación {} no está en {}.",
        evaluation_id,
        phase.title()
    ))
}

async fn run_show(config: &AppConfig, evaluation_id: &str, phase: Phase) -> Result<()> {
    let manager = session_manager(config).await?;
    let session = manager.require()?;
    let mut service = EvaluationService::new(api_client(config)?);
    let user_evaluation = service
        .refresh(session)
        .await?
        .find(phase, evaluation_id)
        .ok_or_else(|| not_listed(evaluation_id, phase))?;

    let Some(view) = completed_view(user_evaluation) else {
        println!(
            "⏳ \"{}\" está pendiente",
            user_evaluation.evaluation.name
        );
        return Ok(());
    };

    println!("✅ ¡Evaluación Completada!");
    println!("{}", view.name);
    if let Some(done_at) = user_evaluation.done_at {
        println!("Realizada el {}", done_at.format("%d-%m-%Y"));
    }
    for line in &view.lines {
        println!("{}: {}", line.label, line.value);
    }
    if let Some(risk) = view.risk {
        println!("Resultado: {} ({})", risk.message(), risk.description());
    }
    Ok(())
}

struct CollectorInput {
    left: Vec<String>,
    right: Vec<String>,
    results: Vec<(String, String)>,
    selections: Vec<String>,
}

/// Runs the countdown of a timed evaluation to the end, one tick a second.
async fn run_countdown(collector: &mut ResultCollector) {
    let Some(timer) = collector.timer_mut() else {
        return;
    };
    if !timer.start(Instant::now()) {
        return;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    while !timer.is_finished() {
        interval.tick().await;
        let remaining = timer.tick(Instant::now());
        eprint!("\r⏱  {:>4} s", remaining);
    }
    eprintln!();
}

async fn run_submit(
    config: &AppConfig,
    evaluation_id: &str,
    phase: Phase,
    input: &CollectorInput,
) -> Result<()> {
    let manager = session_manager(config).await?;
    let session = manager.require()?;
    let mut service = EvaluationService::new(api_client(config)?);

    let evaluation = service
        .refresh(session)
        .await?
        .find(phase, evaluation_id)
        .map(|ue| ue.evaluation.clone())
        .ok_or_else(|| not_listed(evaluation_id, phase))?;

    let mut collector = ResultCollector::for_evaluation(&evaluation, estimator(config)?)?;
    tracing::info!(
        evaluation = %evaluation.name,
        kind = %collector.evaluation_type(),
        "Collecting results"
    );

    match collector.evaluation_type() {
        EvaluationType::Time => {
            for (key, value) in &input.results {
                collector.set_value(key, value)?;
            }
            run_countdown(&mut collector).await;
        }
        EvaluationType::MovementRange => {
            for choice in &input.selections {
                collector.set_value(choice, "")?;
            }
        }
        EvaluationType::ArmMeasurement => {
            for (key, value) in arm_inputs(&input.left, &input.right) {
                collector.set_value(&key, &value)?;
            }
            if let Some(report) = collector.arm_report() {
                print_report(&report);
            }
        }
    }

    service
        .submit_collected(session, evaluation_id, phase, &collector)
        .await?;
    println!("✅ Evaluación \"{}\" completada", evaluation.name);
    Ok(())
}
