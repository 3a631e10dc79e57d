//! questionnaire - define and run parameterized questions against SQLite.

mod cli;
mod output;
mod prompt;

use cli::{Cli, Command, RunArgs};
use db_questionnaire::config::{Config, DatabaseConfig};
use db_questionnaire::error::{QuestionnaireError, Result};
use db_questionnaire::logging;
use db_questionnaire::query::PresetInputs;
use db_questionnaire::question::QuestionDraft;
use db_questionnaire::session::{Materialize, Session};
use prompt::TerminalPrompt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Where the question store is read from and written back to.
enum StoreFile {
    Questionnaire(PathBuf),
    State(PathBuf),
    None,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let log_target = logging::LogTarget::from_flags(cli.log_stderr, cli.log_file.clone());
    logging::init(&log_target, cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // CLI flags take precedence over the config file.
    let mut db_config = config.database.clone();
    db_config.merge(&cli.database_config());

    let store_file = match (&cli.state, cli.questionnaire_path(&config)) {
        (Some(state), _) => StoreFile::State(state.clone()),
        (None, Some(path)) => StoreFile::Questionnaire(path),
        (None, None) => StoreFile::None,
    };

    let mut session = Session::new();
    open_store(&mut session, &store_file, &db_config).await?;

    let result = execute(&cli, &config, &db_config, &mut session).await;

    if result.is_ok() && cli.modifies_questions() {
        save_store(&session, &store_file)?;
    }

    session.close().await?;
    result
}

async fn open_store(
    session: &mut Session,
    store_file: &StoreFile,
    db_config: &DatabaseConfig,
) -> Result<()> {
    match store_file {
        StoreFile::Questionnaire(path) if path.exists() => {
            let count = session.load_questionnaire(path)?;
            info!("Loaded {} questions from {}", count, path.display());
        }
        StoreFile::State(path) if path.exists() => {
            let report = session.load_state(path, db_config).await?;
            if let Some(e) = report.connection_error {
                eprintln!("Warning: {}", e.message());
            }
        }
        StoreFile::Questionnaire(path) | StoreFile::State(path) => {
            info!("{} does not exist yet; starting empty", path.display());
        }
        StoreFile::None => {}
    }
    Ok(())
}

fn save_store(session: &Session, store_file: &StoreFile) -> Result<()> {
    match store_file {
        StoreFile::Questionnaire(path) => session.save_questionnaire(path),
        StoreFile::State(path) => session.save_state(path),
        StoreFile::None => {
            warn!("No questionnaire or state file given; changes discarded");
            eprintln!("Note: changes were not saved (use --questionnaire or --state).");
            Ok(())
        }
    }
}

/// Loads the configured database unless one is already open.
async fn ensure_database(session: &mut Session, db_config: &DatabaseConfig) -> Result<()> {
    if session.database_path().is_some() {
        return Ok(());
    }
    if db_config.path.is_none() {
        return Err(QuestionnaireError::connection("Please load a database first."));
    }
    info!("Loading database: {}", db_config.display_string());
    session.load_database(db_config).await
}

/// Writes a state file. A configured database is loaded first so its path is
/// recorded; with none the state gets an empty `db_path`.
async fn save_state(session: &mut Session, db_config: &DatabaseConfig, path: &Path) -> Result<()> {
    if db_config.path.is_some() {
        ensure_database(session, db_config).await?;
    }
    session.save_state(path)
}

async fn execute(
    cli: &Cli,
    config: &Config,
    db_config: &DatabaseConfig,
    session: &mut Session,
) -> Result<()> {
    match &cli.command {
        Command::List => println!("{}", output::format_question_list(session.store())),
        Command::Show { name } => println!("{}", session.question_details(name)?),
        Command::Add(args) => {
            let draft = QuestionDraft::new(&args.name, &args.sql)
                .with_description(&args.description)
                .with_dynamic_inputs_text(&args.inputs.join("\n"))?;
            let name = session.create_question(draft)?;
            println!("Question '{name}' saved.");
        }
        Command::Remove { name } => {
            session.remove_question(name)?;
            println!("Question '{name}' removed.");
        }
        Command::Group { group, name } => {
            session.assign_to_group(group, name)?;
            println!("Question '{name}' is now in group '{group}'.");
        }
        Command::Ungroup { name } => {
            if session.ungroup(name)? {
                println!("Question '{name}' removed from its group.");
            } else {
                println!("Question '{name}' is not in a group.");
            }
        }
        Command::RemoveGroup { group } => {
            let members = session.remove_group(group)?;
            println!(
                "Group '{group}' removed; {} questions are now ungrouped.",
                members.len()
            );
        }
        Command::Run(args) => {
            ensure_database(session, db_config).await?;
            run_questions(args, config, session).await?;
        }
        Command::SaveState { path } => {
            save_state(session, db_config, path).await?;
            println!("State saved to {}.", path.display());
        }
    }
    Ok(())
}

async fn run_questions(args: &RunArgs, config: &Config, session: &mut Session) -> Result<()> {
    let names: Vec<String> = if args.all {
        session
            .store()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    } else if let Some(group) = &args.group {
        session.group_members(group)?
    } else {
        args.names.clone()
    };

    let materialize = match (&args.save_as, args.replace) {
        (Some(name), _) => Some(Materialize::Copy { name: name.clone() }),
        (None, true) => Some(Materialize::Replace),
        (None, false) => None,
    };
    if materialize.is_some() && names.len() != 1 {
        return Err(QuestionnaireError::config(
            "--save-as and --replace take exactly one question.",
        ));
    }

    let preset = PresetInputs::parse_pairs(args.inputs.iter().map(String::as_str))?;
    let mut prompt = TerminalPrompt::stdio(preset);

    let report = session.run_questions(&names, &mut prompt).await?;
    println!(
        "{}",
        output::format_report(&report, &config.display, args.format)
    );

    if let (Some(target), [name]) = (materialize, names.as_slice()) {
        if report.cancelled.is_some() {
            return Err(QuestionnaireError::validation(
                "Run was cancelled; nothing to save.",
            ));
        }
        let stored_as = session.materialize_result(name, target)?;
        println!("Saved run as question '{stored_as}'.");
    }

    Ok(())
}
