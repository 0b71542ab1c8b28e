use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

mod api_users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "api_users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "bancarella_admin")]
#[command(about = "Admin utilities for Bancarella (bootstrap API users, catalog, stars)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bancarella.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ApiUser(ApiUser),
    Catalog(Catalog),
    Stars(Stars),
}

#[derive(Args, Debug)]
struct ApiUser {
    #[command(subcommand)]
    command: ApiUserCommand,
}

#[derive(Subcommand, Debug)]
enum ApiUserCommand {
    /// Create credentials a bot instance uses against the HTTP API.
    Create(ApiUserCreateArgs),
}

#[derive(Args, Debug)]
struct ApiUserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Catalog {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Register a department, semester or year branch.
    AddBranch(AddBranchArgs),
    /// Add a purchasable paper.
    AddPaper(AddPaperArgs),
}

#[derive(Args, Debug)]
struct AddBranchArgs {
    #[arg(long)]
    department: String,
    #[arg(long)]
    semester: Option<String>,
    #[arg(long, requires = "semester")]
    year: Option<String>,
}

#[derive(Args, Debug)]
struct AddPaperArgs {
    #[arg(long)]
    department: String,
    #[arg(long)]
    semester: String,
    #[arg(long)]
    year: String,
    #[arg(long)]
    name: String,
    /// Telegram file id (or other locator) the bot delivers on purchase.
    #[arg(long)]
    locator: String,
    #[arg(long, default_value_t = engine::DEFAULT_PAPER_PRICE)]
    price: i64,
}

#[derive(Args, Debug)]
struct Stars {
    #[command(subcommand)]
    command: StarsCommand,
}

#[derive(Subcommand, Debug)]
enum StarsCommand {
    /// Credit stars to an account, creating it if needed.
    Grant(StarsGrantArgs),
}

#[derive(Args, Debug)]
struct StarsGrantArgs {
    #[arg(long)]
    telegram_id: i64,
    #[arg(long)]
    amount: i64,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::ApiUser(ApiUser {
            command: ApiUserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;

            if api_users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("api user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = api_users::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(password),
            };
            api_users::Entity::insert(user).exec(&db).await?;

            println!("created api user: {}", args.username);
        }
        Command::Catalog(Catalog {
            command: CatalogCommand::AddBranch(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            match (args.semester.as_deref(), args.year.as_deref()) {
                (None, _) => {
                    engine.new_department(&args.department).await?;
                    println!("created department: {}", args.department);
                }
                (Some(semester), None) => {
                    engine.new_semester(&args.department, semester).await?;
                    println!("created semester: {}/{semester}", args.department);
                }
                (Some(semester), Some(year)) => {
                    engine.new_year(&args.department, semester, year).await?;
                    println!("created year: {}/{semester}/{year}", args.department);
                }
            }
        }
        Command::Catalog(Catalog {
            command: CatalogCommand::AddPaper(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let paper = engine
                .new_paper(
                    &args.department,
                    &args.semester,
                    &args.year,
                    &args.name,
                    &args.locator,
                    args.price,
                )
                .await?;
            println!("created paper #{}: {}", paper.id, paper.name);
        }
        Command::Stars(Stars {
            command: StarsCommand::Grant(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let account = engine.get_or_create_account(args.telegram_id).await?;
            engine.credit(account.id, args.amount).await?;
            let refreshed = engine.account(args.telegram_id).await?;
            println!(
                "credited {} stars to {} (balance: {})",
                args.amount, args.telegram_id, refreshed.stars
            );
        }
    }

    Ok(())
}
