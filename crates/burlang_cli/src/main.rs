//! Command-line front end for the vocabulary core.
//!
//! # Responsibility
//! - Map one subcommand to one `VocabularyService` call.
//! - Print results as pretty JSON; use-case failures print
//!   `{"error": {"code", "message"}}` and exit with status 1.

use anyhow::{Context, Result};
use burlang_core::{
    init_logging_from, open_and_compose, CoreConfig, Language, PageRequest, Permission,
    SuggestionStatus, UserId, VocabularyError, VocabularyService, WordDraft, WordId,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde_json::{json, Value};
use std::path::PathBuf;

/// CLI wrapper for `Permission` to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPermission {
    Moderate,
    Admin,
}

impl From<CliPermission> for Permission {
    fn from(value: CliPermission) -> Self {
        match value {
            CliPermission::Moderate => Permission::Moderate,
            CliPermission::Admin => Permission::Admin,
        }
    }
}

/// CLI wrapper for `SuggestionStatus` to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStatus {
    New,
    Processing,
    Rejected,
}

impl From<CliStatus> for SuggestionStatus {
    fn from(value: CliStatus) -> Self {
        match value {
            CliStatus::New => SuggestionStatus::New,
            CliStatus::Processing => SuggestionStatus::Processing,
            CliStatus::Rejected => SuggestionStatus::Rejected,
        }
    }
}

#[derive(Args, Debug)]
struct WordArgs {
    /// Word language (`ru`/`russian` or `bua`/`buryat`)
    #[arg(short, long)]
    language: Language,

    #[arg(short, long)]
    text: String,

    #[arg(long)]
    dialect: Option<String>,

    /// May be repeated
    #[arg(long = "theme")]
    themes: Vec<String>,
}

impl WordArgs {
    fn draft(&self) -> WordDraft {
        let mut draft = WordDraft::new(self.language, self.text.clone());
        if let Some(dialect) = &self.dialect {
            draft = draft.with_dialect(dialect.clone());
        }
        for theme in &self.themes {
            draft = draft.with_theme(theme.clone());
        }
        draft
    }
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    per_page: Option<u32>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print core health and version
    Ping,
    /// Register a Telegram user or refresh its names
    Register {
        #[arg(long)]
        id: UserId,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
    },
    Profile {
        #[arg(long)]
        id: UserId,
    },
    /// Make the first admin of an empty installation
    ClaimAdmin {
        #[arg(long)]
        id: UserId,
    },
    Grant {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        target: UserId,
        #[arg(long, value_enum)]
        permission: CliPermission,
    },
    Revoke {
        #[arg(long)]
        actor: UserId,
        #[arg(long)]
        target: UserId,
        #[arg(long, value_enum)]
        permission: CliPermission,
    },
    /// Users ordered by rating
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Suggest a new word
    Suggest {
        #[arg(long)]
        user: UserId,
        #[command(flatten)]
        word: WordArgs,
    },
    /// Suggest a translation into the opposite language
    SuggestTranslation {
        #[arg(long)]
        user: UserId,
        #[command(flatten)]
        word: WordArgs,
        #[arg(long)]
        translation: String,
    },
    Accept {
        #[arg(long)]
        moderator: UserId,
        #[arg(long)]
        id: WordId,
    },
    Decline {
        #[arg(long)]
        moderator: UserId,
        #[arg(long)]
        id: WordId,
    },
    /// Vote for a suggestion; pass --reject to vote against
    Vote {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        id: WordId,
        #[arg(long)]
        reject: bool,
    },
    Unlink {
        #[arg(long)]
        moderator: UserId,
        #[arg(long)]
        word: WordId,
        #[arg(long)]
        translation: WordId,
    },
    /// Look up a word and its translations
    Find {
        #[arg(short, long)]
        language: Language,
        #[arg(short, long)]
        text: String,
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Prefix search over accepted words
    Search {
        #[arg(short, long)]
        language: Language,
        #[arg(short, long)]
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    Accepted {
        #[arg(short, long)]
        language: Language,
        #[command(flatten)]
        page: PageArgs,
    },
    Suggested {
        #[arg(short, long)]
        language: Language,
        #[arg(long, value_enum)]
        status: Option<CliStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    History {
        #[arg(long)]
        user: UserId,
        #[command(flatten)]
        page: PageArgs,
    },
    TopSearches {
        #[arg(short, long)]
        language: Language,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

/// Burlang - Buryat-Russian crowdsourced vocabulary
#[derive(Parser, Debug)]
#[command(name = "burlang")]
#[command(version)]
#[command(about = "Crowdsourced Buryat-Russian vocabulary")]
struct CommandLineOptions {
    /// JSON config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file; overrides config and environment
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let options = CommandLineOptions::parse();
    let config = load_config(&options)?;
    init_logging_from(&config).context("failed to start logging")?;

    let composition = open_and_compose(&config).context("failed to open database")?;
    let service = composition.service();
    info!("event=cli_command module=cli status=start");

    match run(&service, options.command) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => match err.downcast_ref::<VocabularyError>() {
            Some(failure) => {
                let body = json!({
                    "error": { "code": failure.code(), "message": failure.to_string() }
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

fn load_config(options: &CommandLineOptions) -> Result<CoreConfig> {
    let mut config = match &options.config {
        Some(path) => CoreConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CoreConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    if let Some(db) = &options.db {
        config.database_path = Some(db.clone());
    }
    Ok(config)
}

fn run(service: &VocabularyService<'_>, command: Commands) -> Result<Value> {
    let value = match command {
        Commands::Ping => json!({
            "ping": burlang_core::ping(),
            "version": burlang_core::core_version(),
        }),
        Commands::Register {
            id,
            username,
            first_name,
        } => serde_json::to_value(service.register_user(
            id,
            username.as_deref(),
            first_name.as_deref(),
        )?)?,
        Commands::Profile { id } => serde_json::to_value(service.user_profile(id)?)?,
        Commands::ClaimAdmin { id } => serde_json::to_value(service.claim_first_admin(id)?)?,
        Commands::Grant {
            actor,
            target,
            permission,
        } => serde_json::to_value(service.grant_permission(actor, target, permission.into())?)?,
        Commands::Revoke {
            actor,
            target,
            permission,
        } => serde_json::to_value(service.revoke_permission(actor, target, permission.into())?)?,
        Commands::Leaderboard { limit } => serde_json::to_value(service.leaderboard(limit)?)?,
        Commands::Suggest { user, word } => {
            serde_json::to_value(service.suggest_word(user, &word.draft())?)?
        }
        Commands::SuggestTranslation {
            user,
            word,
            translation,
        } => serde_json::to_value(service.suggest_translation(
            user,
            &word.draft(),
            &translation,
        )?)?,
        Commands::Accept { moderator, id } => {
            serde_json::to_value(service.accept(moderator, id)?)?
        }
        Commands::Decline { moderator, id } => {
            serde_json::to_value(service.decline(moderator, id)?)?
        }
        Commands::Vote { user, id, reject } => {
            serde_json::to_value(service.vote(user, id, !reject)?)?
        }
        Commands::Unlink {
            moderator,
            word,
            translation,
        } => serde_json::to_value(service.unlink_translation(moderator, word, translation)?)?,
        Commands::Find {
            language,
            text,
            user,
        } => serde_json::to_value(service.find_translation(user, language, &text)?)?,
        Commands::Search {
            language,
            query,
            limit,
        } => serde_json::to_value(service.search(language, &query, limit)?)?,
        Commands::Accepted { language, page } => {
            serde_json::to_value(service.paginate_accepted(language, page.request())?)?
        }
        Commands::Suggested {
            language,
            status,
            page,
        } => serde_json::to_value(service.paginate_suggested(
            language,
            status.map(Into::into),
            page.request(),
        )?)?,
        Commands::History { user, page } => {
            serde_json::to_value(service.search_history(user, page.request())?)?
        }
        Commands::TopSearches { language, limit } => {
            serde_json::to_value(service.top_searches(language, limit)?)?
        }
    };
    Ok(value)
}
